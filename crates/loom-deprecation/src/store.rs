// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Grouping of captured events by message.
//!
//! Ingesting a batch happens in three steps so that the session never holds
//! its state lock across source resolution:
//!
//! 1. [`AggregationStore::plan`] merges counts and urls synchronously and
//!    decides which stacks need resolving.
//! 2. [`IngestPlan::resolve`] resolves those stacks concurrently.
//! 3. [`AggregationStore::apply`] appends the resolved sources, unless the
//!    store was cleared in the meantime.

use std::collections::{HashMap, HashSet};

use futures::future::join_all;
use loom_deprecation_core::{DeprecationEvent, DeprecationGroup, GroupId, Location};
use loom_deprecation_symbolicate::SourceLocationResolver;
use tracing::{debug, instrument};

/// All groups seen since the last clear, in first-seen order.
#[derive(Debug, Default)]
pub struct AggregationStore {
	groups: Vec<DeprecationGroup>,
	index: HashMap<GroupId, usize>,
	total_merged: u64,
	generation: u64,
}

/// Outcome of [`AggregationStore::plan`]: the groups a batch touched and the
/// stacks still to be resolved.
#[derive(Debug)]
pub struct IngestPlan {
	generation: u64,
	affected: Vec<GroupId>,
	jobs: Vec<ResolutionJob>,
}

#[derive(Debug)]
struct ResolutionJob {
	group: GroupId,
	stack_str: String,
}

/// Resolved sources waiting to be applied.
#[derive(Debug)]
pub struct ResolvedBatch {
	generation: u64,
	affected: Vec<GroupId>,
	sources: Vec<(GroupId, String, Option<Location>)>,
}

impl AggregationStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of events merged since the last clear.
	pub fn total(&self) -> u64 {
		self.total_merged
	}

	pub fn len(&self) -> usize {
		self.groups.len()
	}

	pub fn is_empty(&self) -> bool {
		self.groups.is_empty()
	}

	/// Incremented on every clear; in-flight batches from an older generation
	/// are discarded by [`apply`](Self::apply).
	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn get(&self, id: &GroupId) -> Option<&DeprecationGroup> {
		self.index.get(id).map(|&i| &self.groups[i])
	}

	/// Every group, in first-seen order.
	pub fn snapshot(&self) -> Vec<DeprecationGroup> {
		self.groups.clone()
	}

	pub fn clear(&mut self) {
		self.groups.clear();
		self.index.clear();
		self.total_merged = 0;
		self.generation += 1;
		debug!(generation = self.generation, "aggregation store cleared");
	}

	/// Merge `batch` into the store and collect the stacks that need a source
	/// record. A stack already recorded on its group, or already scheduled
	/// earlier in the same batch, is not resolved again.
	pub fn plan(&mut self, batch: Vec<DeprecationEvent>) -> IngestPlan {
		let mut affected = Vec::new();
		let mut touched = HashSet::new();
		let mut scheduled = HashSet::new();
		let mut jobs = Vec::new();

		for event in batch {
			let id = GroupId::for_message(&event.message);
			let group = match self.index.get(&id) {
				Some(&i) => {
					let group = &mut self.groups[i];
					group.merge(&event);
					group
				}
				None => {
					self.index.insert(id.clone(), self.groups.len());
					self.groups.push(DeprecationGroup::from_event(id.clone(), &event));
					let last = self.groups.len() - 1;
					&mut self.groups[last]
				}
			};
			self.total_merged += 1;

			let pending = (id.clone(), event.stack_str);
			if !group.has_source(&pending.1) && scheduled.insert(pending.clone()) {
				jobs.push(ResolutionJob {
					group: pending.0,
					stack_str: pending.1,
				});
			}

			if touched.insert(id.clone()) {
				affected.push(id);
			}
		}

		IngestPlan {
			generation: self.generation,
			affected,
			jobs,
		}
	}

	/// Append resolved sources and return the affected groups in first-touch
	/// order. Returns `None` if the store was cleared since the batch was
	/// planned.
	pub fn apply(&mut self, resolved: ResolvedBatch) -> Option<Vec<DeprecationGroup>> {
		if resolved.generation != self.generation {
			debug!(
				planned = resolved.generation,
				current = self.generation,
				"discarding resolutions from a cleared store"
			);
			return None;
		}

		for (id, stack_str, location) in resolved.sources {
			if let Some(&i) = self.index.get(&id) {
				self.groups[i].push_source(stack_str, location);
			}
		}

		Some(
			resolved
				.affected
				.iter()
				.filter_map(|id| self.get(id).cloned())
				.collect(),
		)
	}

	/// Plan, resolve and apply in one go, for callers that own the store.
	pub async fn ingest(
		&mut self,
		batch: Vec<DeprecationEvent>,
		resolver: &SourceLocationResolver,
	) -> Vec<DeprecationGroup> {
		let plan = self.plan(batch);
		let resolved = plan.resolve(resolver).await;
		self.apply(resolved).unwrap_or_default()
	}
}

impl IngestPlan {
	pub fn affected(&self) -> &[GroupId] {
		&self.affected
	}

	/// Number of stacks that will be resolved.
	pub fn pending_resolutions(&self) -> usize {
		self.jobs.len()
	}

	/// Resolve every pending stack concurrently.
	#[instrument(skip_all, fields(jobs = self.jobs.len()))]
	pub async fn resolve(self, resolver: &SourceLocationResolver) -> ResolvedBatch {
		let locations = join_all(
			self.jobs
				.iter()
				.map(|job| resolver.resolve(&job.stack_str)),
		)
		.await;

		let sources = self
			.jobs
			.into_iter()
			.zip(locations)
			.map(|(job, location)| (job.group, job.stack_str, location))
			.collect();

		ResolvedBatch {
			generation: self.generation,
			affected: self.affected,
			sources,
		}
	}
}
