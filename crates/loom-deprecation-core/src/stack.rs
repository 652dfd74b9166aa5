// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stack normalization for marker stacks captured inside the deprecation handler.
//!
//! Hosts produce stack text in one of two historical dialects:
//!
//! ```text
//! V8                                     SpiderMonkey
//! Error: marker                          captureMarker@https://app/vendor.js:10:5
//!     at captureMarker (vendor.js:10:5)   handler@https://app/vendor.js:20:3
//!     at handler (vendor.js:20:3)         @https://app/app.js:3:1
//!     at https://app/app.js:3:1
//! ```
//!
//! Both are rewritten to one shape: one frame per line, indented by four
//! spaces, `name (location)` for named frames and `{anonymous}(location)` for
//! anonymous ones. The first two frames (marker construction and the handler
//! itself) are dropped. The result starts with a newline so it can be appended
//! directly under a header line.

/// Placeholder used for frames without a function name.
pub const ANONYMOUS_FRAME: &str = "{anonymous}";

/// Frames belonging to the capture machinery rather than the caller.
const INFRASTRUCTURE_FRAMES: usize = 2;

const FRAME_INDENT: &str = "    ";

/// Raw stack dialect, chosen by probing the text structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackDialect {
	/// Header line followed by indented `at ...` frames.
	V8,
	/// Unindented `name@location` frames, no header.
	SpiderMonkey,
	/// Anything else; each non-empty line is taken as a frame.
	Unknown,
}

impl StackDialect {
	pub fn detect(raw: &str) -> Self {
		if raw.lines().any(is_v8_frame) {
			StackDialect::V8
		} else if raw
			.lines()
			.any(|line| !line.starts_with(char::is_whitespace) && line.contains('@'))
		{
			StackDialect::SpiderMonkey
		} else {
			StackDialect::Unknown
		}
	}

	fn frames(self, raw: &str) -> Vec<String> {
		match self {
			StackDialect::V8 => raw
				.lines()
				.filter(|line| is_v8_frame(line))
				.map(canonical_v8_frame)
				.collect(),
			StackDialect::SpiderMonkey => raw
				.trim_end()
				.trim_end_matches("\n@:0")
				.lines()
				.map(str::trim)
				.filter(|line| !line.is_empty())
				.map(canonical_spidermonkey_frame)
				.collect(),
			StackDialect::Unknown => raw
				.lines()
				.map(str::trim)
				.filter(|line| !line.is_empty())
				.map(str::to_string)
				.collect(),
		}
	}
}

/// Normalizes a raw marker stack. `None` or blank input yields an empty string,
/// as does a stack with no frames beyond the capture machinery.
pub fn normalize_stack(raw: Option<&str>) -> String {
	let raw = match raw {
		Some(raw) if !raw.trim().is_empty() => raw,
		_ => return String::new(),
	};

	let frames = StackDialect::detect(raw).frames(raw);
	if frames.len() <= INFRASTRUCTURE_FRAMES {
		return String::new();
	}

	let mut out = String::new();
	for frame in &frames[INFRASTRUCTURE_FRAMES..] {
		out.push('\n');
		out.push_str(FRAME_INDENT);
		out.push_str(frame);
	}
	out
}

fn is_v8_frame(line: &str) -> bool {
	line.starts_with(char::is_whitespace) && line.trim_start().starts_with("at ")
}

fn canonical_v8_frame(line: &str) -> String {
	let frame = line.trim();
	let frame = frame.strip_prefix("at").map(str::trim_start).unwrap_or(frame);

	if let Some(rest) = frame.strip_prefix("Object.<anonymous>") {
		let rest = rest.trim_start();
		if rest.starts_with('(') {
			return format!("{ANONYMOUS_FRAME}{rest}");
		}
	}

	if frame.contains('(') {
		frame.to_string()
	} else {
		format!("{ANONYMOUS_FRAME}({frame})")
	}
}

fn canonical_spidermonkey_frame(line: &str) -> String {
	if line.starts_with('(') {
		return format!("{ANONYMOUS_FRAME}{line}");
	}
	match line.split_once('@') {
		Some(("", location)) => format!("{ANONYMOUS_FRAME}({location})"),
		Some((name, location)) => format!("{name} ({location})"),
		None => line.to_string(),
	}
}
