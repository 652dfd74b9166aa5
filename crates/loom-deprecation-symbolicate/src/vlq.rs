// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Base64 VLQ decoding of source map `mappings`.
//!
//! `mappings` is a list of generated lines separated by `;`, each holding
//! `,`-separated segments. A segment has 1, 4 or 5 fields, all delta-encoded
//! against the previous segment: generated column (reset every line), source
//! index, original line, original column, and name index.

use crate::error::{Result, SymbolicateError};

const CONTINUATION_BIT: u32 = 0b10_0000;
const VALUE_MASK: u32 = 0b01_1111;

/// Largest shift a 32-bit value can need: seven digits of five bits.
const MAX_SHIFT: u32 = 30;

fn base64_value(ch: u8) -> Result<u32> {
	let value = match ch {
		b'A'..=b'Z' => ch - b'A',
		b'a'..=b'z' => ch - b'a' + 26,
		b'0'..=b'9' => ch - b'0' + 52,
		b'+' => 62,
		b'/' => 63,
		_ => return Err(SymbolicateError::InvalidVlqChar(ch as char)),
	};
	Ok(u32::from(value))
}

/// Decodes one segment into its signed field values.
pub fn decode_segment(segment: &str) -> Result<Vec<i64>> {
	let mut fields = Vec::with_capacity(5);
	let mut accumulator: i64 = 0;
	let mut shift = 0u32;
	let mut in_value = false;

	for ch in segment.bytes() {
		let digit = base64_value(ch)?;
		accumulator |= i64::from(digit & VALUE_MASK) << shift;
		in_value = digit & CONTINUATION_BIT != 0;

		if in_value {
			shift += 5;
			if shift > MAX_SHIFT {
				return Err(SymbolicateError::VlqOverflow(segment.to_string()));
			}
			continue;
		}

		// Lowest bit carries the sign.
		let magnitude = accumulator >> 1;
		fields.push(if accumulator & 1 == 1 { -magnitude } else { magnitude });
		accumulator = 0;
		shift = 0;
	}

	if in_value {
		return Err(SymbolicateError::TruncatedVlqSegment(segment.to_string()));
	}
	Ok(fields)
}

/// A decoded segment that carries original-source information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
	/// 0-indexed column in the generated file.
	pub generated_column: u32,
	pub source_index: u32,
	/// 0-indexed line in the original source.
	pub original_line: u32,
	/// 0-indexed column in the original source.
	pub original_column: u32,
}

/// Mappings grouped by generated line, each line sorted by generated column.
#[derive(Debug, Clone, Default)]
pub struct LineMappings {
	lines: Vec<Vec<Mapping>>,
}

impl LineMappings {
	/// Finds the mapping covering a 0-indexed generated position: the last
	/// segment on that line starting at or before `column`.
	pub fn find(&self, line: u32, column: u32) -> Option<&Mapping> {
		let segments = self.lines.get(line as usize)?;
		let idx = segments.partition_point(|m| m.generated_column <= column);
		idx.checked_sub(1).map(|i| &segments[i])
	}

	pub fn line_count(&self) -> usize {
		self.lines.len()
	}

	pub fn len(&self) -> usize {
		self.lines.iter().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.lines.iter().all(Vec::is_empty)
	}
}

fn to_index(value: i64) -> u32 {
	u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn accumulate(total: &mut i64, delta: i64, segment: &str) -> Result<()> {
	*total = total
		.checked_add(delta)
		.ok_or_else(|| SymbolicateError::VlqOverflow(segment.to_string()))?;
	Ok(())
}

/// Decodes a full `mappings` string.
pub fn decode_mappings(mappings: &str) -> Result<LineMappings> {
	let mut lines = Vec::new();
	let mut source: i64 = 0;
	let mut original_line: i64 = 0;
	let mut original_column: i64 = 0;

	for line in mappings.split(';') {
		let mut generated_column: i64 = 0;
		let mut segments = Vec::new();

		for segment in line.split(',').filter(|s| !s.is_empty()) {
			let fields = decode_segment(segment)?;
			let Some(column_delta) = fields.first() else {
				continue;
			};
			accumulate(&mut generated_column, *column_delta, segment)?;

			// Single-field segments only advance the generated column.
			if fields.len() < 4 {
				continue;
			}
			accumulate(&mut source, fields[1], segment)?;
			accumulate(&mut original_line, fields[2], segment)?;
			accumulate(&mut original_column, fields[3], segment)?;

			segments.push(Mapping {
				generated_column: to_index(generated_column),
				source_index: to_index(source),
				original_line: to_index(original_line),
				original_column: to_index(original_column),
			});
		}

		segments.sort_by_key(|m| m.generated_column);
		lines.push(segments);
	}

	Ok(LineMappings { lines })
}
