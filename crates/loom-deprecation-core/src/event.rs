// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Raw deprecation events as captured from the host runtime.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single captured deprecation emission, queued until the next flush.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecationEvent {
	pub message: String,
	#[serde(default)]
	pub url: Option<String>,
	/// Normalized marker stack. Empty when the host supplied no stack.
	#[serde(default)]
	pub stack_str: String,
}

impl DeprecationEvent {
	pub fn new(message: impl Into<String>, url: Option<String>, stack_str: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			url,
			stack_str: stack_str.into(),
		}
	}

	/// Builds an event from the arguments the host hands to the deprecation handler.
	pub fn from_emission(message: &str, options: Option<&Value>, stack_str: String) -> Self {
		let options = EmissionOptions::from_value(options);
		Self {
			message: message.to_string(),
			url: options.url,
			stack_str,
		}
	}

	pub fn has_stack(&self) -> bool {
		!self.stack_str.is_empty()
	}
}

/// The subset of host emission options the tracker reads.
///
/// Hosts pass options as an untyped value that may be absent, an object, or
/// something else entirely. Only a string `url` field on an object is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmissionOptions {
	pub url: Option<String>,
}

impl EmissionOptions {
	pub fn from_value(value: Option<&Value>) -> Self {
		let url = match value {
			Some(Value::Object(map)) => map.get("url").and_then(Value::as_str).map(str::to_string),
			_ => None,
		};
		Self { url }
	}
}
