// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Extraction of generated script positions from normalized stack frames.

use regex::Regex;
use std::sync::LazyLock;

static FRAME_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?P<url>[^\s()@]+?):(?P<line>\d+)(?::(?P<column>\d+))?\)?\s*$").unwrap()
});

/// A position in a generated (bundled) script, as printed in a stack frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPosition {
	pub url: String,
	/// 1-indexed line.
	pub line: u32,
	/// 1-indexed column, when the frame carries one.
	pub column: Option<u32>,
}

impl GeneratedPosition {
	/// 0-indexed column as used by source map mappings.
	pub fn mapping_column(&self) -> u32 {
		self.column.map(|c| c.saturating_sub(1)).unwrap_or(0)
	}
}

/// Parses every frame of a normalized stack that ends in `url:line[:column]`.
///
/// Frames without a recognizable location are skipped.
pub fn parse_frames(stack_str: &str) -> Vec<GeneratedPosition> {
	stack_str.lines().filter_map(parse_frame).collect()
}

fn parse_frame(line: &str) -> Option<GeneratedPosition> {
	let captures = FRAME_LOCATION.captures(line.trim())?;
	let url = captures.name("url")?.as_str().to_string();
	let line = captures.name("line")?.as_str().parse().ok()?;
	let column = captures
		.name("column")
		.and_then(|c| c.as_str().parse().ok());
	Some(GeneratedPosition { url, line, column })
}
