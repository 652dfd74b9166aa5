// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Mapping of whole stacks to original source positions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use loom_deprecation_core::MappedLocation;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::frame::parse_frames;
use crate::sourcemap::ParsedSourceMap;

/// Maps a normalized stack to candidate original locations, one per frame
/// that could be mapped, in frame order.
#[async_trait]
pub trait StackMapper: Send + Sync {
	async fn map_stack(&self, stack_str: &str) -> Result<Vec<MappedLocation>>;
}

/// Source of raw source map bytes for generated scripts.
#[async_trait]
pub trait ArtifactLookup: Send + Sync {
	/// Returns the source map for `script_url`, or `None` if the script has none.
	async fn source_map(&self, script_url: &str) -> Result<Option<Vec<u8>>>;
}

/// Source maps held in memory, keyed by generated script url.
#[derive(Debug, Clone, Default)]
pub struct InMemoryArtifacts {
	maps: HashMap<String, Vec<u8>>,
}

impl InMemoryArtifacts {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, script_url: impl Into<String>, source_map: Vec<u8>) {
		self.maps.insert(script_url.into(), source_map);
	}

	pub fn len(&self) -> usize {
		self.maps.len()
	}

	pub fn is_empty(&self) -> bool {
		self.maps.is_empty()
	}
}

#[async_trait]
impl ArtifactLookup for InMemoryArtifacts {
	async fn source_map(&self, script_url: &str) -> Result<Option<Vec<u8>>> {
		Ok(self.maps.get(script_url).cloned())
	}
}

/// [`StackMapper`] backed by v3 source maps.
///
/// Parsed maps are cached per script url for the lifetime of the mapper,
/// including scripts that turned out to have no usable map.
pub struct SourceMapStackMapper<A> {
	artifacts: A,
	cache: RwLock<HashMap<String, Option<Arc<ParsedSourceMap>>>>,
}

impl<A: ArtifactLookup> SourceMapStackMapper<A> {
	pub fn new(artifacts: A) -> Self {
		Self {
			artifacts,
			cache: RwLock::new(HashMap::new()),
		}
	}

	async fn parsed_map(&self, script_url: &str) -> Result<Option<Arc<ParsedSourceMap>>> {
		if let Some(cached) = self.cache.read().await.get(script_url) {
			return Ok(cached.clone());
		}

		let parsed = match self.artifacts.source_map(script_url).await? {
			Some(bytes) => match ParsedSourceMap::from_slice(&bytes) {
				Ok(map) => Some(Arc::new(map)),
				Err(e) => {
					debug!(script_url, error = %e, "Ignoring unparseable source map");
					None
				}
			},
			None => None,
		};

		// Another resolution may have filled the slot while this one fetched.
		let mut cache = self.cache.write().await;
		Ok(cache
			.entry(script_url.to_string())
			.or_insert(parsed)
			.clone())
	}
}

#[async_trait]
impl<A: ArtifactLookup> StackMapper for SourceMapStackMapper<A> {
	async fn map_stack(&self, stack_str: &str) -> Result<Vec<MappedLocation>> {
		let mut mapped = Vec::new();
		for frame in parse_frames(stack_str) {
			let Some(map) = self.parsed_map(&frame.url).await? else {
				continue;
			};
			match map.lookup(frame.line, frame.mapping_column()) {
				Ok(Some(location)) => mapped.push(location),
				Ok(None) => {}
				Err(e) => {
					debug!(
						script_url = %frame.url,
						line = frame.line,
						error = %e,
						"Skipping unmappable frame"
					);
				}
			}
		}
		Ok(mapped)
	}
}
