// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deprecation groups: the deduplicated aggregate of emissions sharing a message.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::event::DeprecationEvent;
use crate::location::Location;

/// Stable identifier for a deprecation group.
///
/// Derived only from the message text, so the same message always lands in the
/// same group regardless of url or stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
	pub fn for_message(message: &str) -> Self {
		let mut hasher = Sha256::new();
		hasher.update(b"deprecation|");
		hasher.update(message.as_bytes());
		Self(hex::encode(hasher.finalize()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for GroupId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// One distinct call stack observed for a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
	pub stack_str: String,
	/// Resolved original location, `None` when resolution was unavailable.
	#[serde(rename = "map", default)]
	pub resolved_location: Option<Location>,
}

/// All emissions sharing one message, with their distinct call sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecationGroup {
	pub id: GroupId,
	pub message: String,
	/// First non-null url seen for this group. Never overwritten once set.
	pub url: Option<String>,
	/// Number of raw events merged into this group. May exceed `sources.len()`.
	pub count: u64,
	pub sources: Vec<SourceRecord>,
	pub has_source_map: bool,
}

impl DeprecationGroup {
	/// Starts a group from its first event. The event's stack is not recorded
	/// here; sources are appended once resolution settles.
	pub fn from_event(id: GroupId, event: &DeprecationEvent) -> Self {
		Self {
			id,
			message: event.message.clone(),
			url: event.url.clone(),
			count: 1,
			sources: Vec::new(),
			has_source_map: false,
		}
	}

	/// Merges a later event sharing this group's message.
	pub fn merge(&mut self, event: &DeprecationEvent) {
		self.count += 1;
		if self.url.is_none() {
			self.url = event.url.clone();
		}
	}

	pub fn has_source(&self, stack_str: &str) -> bool {
		self.sources.iter().any(|s| s.stack_str == stack_str)
	}

	/// Appends a source record unless one with the same stack already exists.
	///
	/// Returns false when the stack was already present.
	pub fn push_source(&mut self, stack_str: String, resolved_location: Option<Location>) -> bool {
		if self.has_source(&stack_str) {
			return false;
		}
		if resolved_location.is_some() {
			self.has_source_map = true;
		}
		self.sources.push(SourceRecord {
			stack_str,
			resolved_location,
		});
		true
	}
}
