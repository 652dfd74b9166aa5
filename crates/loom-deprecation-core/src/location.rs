// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Original source positions produced by source-map resolution.

use serde::{Deserialize, Serialize};

/// A candidate position returned by the source-map facility for one stack frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedLocation {
	pub source: String,
	/// 1-indexed line in the original source.
	pub line: u32,
	/// 0-indexed column in the original source.
	pub column: u32,
}

/// The location chosen for a source record.
///
/// `found` is true when the location lies in first-party application code,
/// false when it is only the first available candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
	pub source: String,
	pub line: u32,
	pub column: u32,
	pub found: bool,
}

impl Location {
	pub fn from_candidate(candidate: MappedLocation, found: bool) -> Self {
		Self {
			source: candidate.source,
			line: candidate.line,
			column: candidate.column,
			found,
		}
	}
}
