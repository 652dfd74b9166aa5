// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for source map resolution.

use thiserror::Error;

/// Errors that can occur while mapping a stack to original sources.
#[derive(Debug, Error)]
pub enum SymbolicateError {
	#[error("Invalid source map JSON: {0}")]
	InvalidSourceMapJson(#[from] serde_json::Error),

	#[error("Invalid source map version: expected 3, got {0}")]
	InvalidSourceMapVersion(u32),

	#[error("Invalid VLQ character: {0}")]
	InvalidVlqChar(char),

	#[error("VLQ segment ends in the middle of a value: {0}")]
	TruncatedVlqSegment(String),

	#[error("VLQ value out of range in segment: {0}")]
	VlqOverflow(String),

	#[error("Invalid source index: {0}")]
	InvalidSourceIndex(u32),

	#[error("Failed to fetch source map for {url}: {message}")]
	ArtifactFetch { url: String, message: String },
}

pub type Result<T> = std::result::Result<T, SymbolicateError>;
