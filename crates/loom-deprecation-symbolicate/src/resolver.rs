// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolution of a deprecation's call site to an original source location.

use std::sync::Arc;

use loom_deprecation_core::{BuildSettings, Location};
use tracing::debug;

use crate::mapper::StackMapper;

/// Picks the original source location for a normalized stack.
///
/// Resolution never fails: production builds, empty stacks, mapping errors and
/// stacks without any mappable frame all resolve to `None`.
#[derive(Clone)]
pub struct SourceLocationResolver {
	settings: BuildSettings,
	mapper: Arc<dyn StackMapper>,
}

impl SourceLocationResolver {
	pub fn new(settings: BuildSettings, mapper: Arc<dyn StackMapper>) -> Self {
		Self { settings, mapper }
	}

	pub fn settings(&self) -> &BuildSettings {
		&self.settings
	}

	/// Resolves `stack_str`, preferring the first frame in first-party code.
	pub async fn resolve(&self, stack_str: &str) -> Option<Location> {
		if !self.settings.is_development_build || stack_str.is_empty() {
			return None;
		}

		let candidates = match self.mapper.map_stack(stack_str).await {
			Ok(candidates) => candidates,
			Err(e) => {
				debug!(error = %e, "Source resolution unavailable");
				return None;
			}
		};

		let first_party = candidates
			.iter()
			.position(|c| self.settings.is_first_party(&c.source));
		let (index, found) = match first_party {
			Some(index) => (index, true),
			None => (0, false),
		};

		candidates
			.into_iter()
			.nth(index)
			.map(|candidate| Location::from_candidate(candidate, found))
	}
}
