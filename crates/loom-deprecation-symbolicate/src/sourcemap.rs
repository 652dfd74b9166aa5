// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Source map (v3) parsing and position lookup.

use loom_deprecation_core::MappedLocation;
use serde::Deserialize;

use crate::error::{Result, SymbolicateError};
use crate::vlq::{decode_mappings, LineMappings};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap {
	version: u32,
	#[serde(default)]
	source_root: Option<String>,
	sources: Vec<Option<String>>,
	#[serde(default)]
	mappings: String,
}

/// A parsed source map ready for lookups.
#[derive(Debug, Clone)]
pub struct ParsedSourceMap {
	/// Original source paths with `sourceRoot` already applied.
	sources: Vec<String>,
	mappings: LineMappings,
}

impl ParsedSourceMap {
	pub fn from_slice(data: &[u8]) -> Result<Self> {
		let raw: RawSourceMap = serde_json::from_slice(data)?;
		if raw.version != 3 {
			return Err(SymbolicateError::InvalidSourceMapVersion(raw.version));
		}

		let root = raw
			.source_root
			.as_deref()
			.map(|r| r.trim_end_matches('/'))
			.filter(|r| !r.is_empty());
		let sources = raw
			.sources
			.into_iter()
			.map(|source| {
				let source = source.unwrap_or_default();
				match root {
					Some(root) => format!("{root}/{source}"),
					None => source,
				}
			})
			.collect();

		Ok(Self {
			sources,
			mappings: decode_mappings(&raw.mappings)?,
		})
	}

	/// Looks up the original position for a generated position.
	///
	/// `line` is 1-indexed as in stack traces, `column` is 0-indexed. The
	/// returned location has a 1-indexed line.
	pub fn lookup(&self, line: u32, column: u32) -> Result<Option<MappedLocation>> {
		let Some(line_index) = line.checked_sub(1) else {
			return Ok(None);
		};
		let Some(mapping) = self.mappings.find(line_index, column) else {
			return Ok(None);
		};

		let source = self
			.sources
			.get(mapping.source_index as usize)
			.ok_or(SymbolicateError::InvalidSourceIndex(mapping.source_index))?;

		Ok(Some(MappedLocation {
			source: source.clone(),
			line: mapping.original_line.saturating_add(1),
			column: mapping.original_column,
		}))
	}

	pub fn sources(&self) -> &[String] {
		&self.sources
	}
}
