// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `LOOM_DEPRECATION_*` environment variables.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Quiet period before a burst of captures is delivered.
pub const DEFAULT_FLUSH_DELAY_MS: u64 = 100;

pub const ENV_FLUSH_DELAY_MS: &str = "LOOM_DEPRECATION_FLUSH_DELAY_MS";
pub const ENV_TOGGLE_WORKFLOW: &str = "LOOM_DEPRECATION_TOGGLE_WORKFLOW";
pub const ENV_IGNORE: &str = "LOOM_DEPRECATION_IGNORE";

/// Configuration for a [`DeprecationSession`](crate::DeprecationSession).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeprecationConfig {
	/// Debounce delay in milliseconds.
	pub flush_delay_ms: u64,
	/// Initial value of the pass-through option.
	pub toggle_deprecation_workflow: bool,
	/// When set, captures are passed through (subject to the pass-through
	/// option) but never queued.
	pub ignore: bool,
}

impl Default for DeprecationConfig {
	fn default() -> Self {
		Self {
			flush_delay_ms: DEFAULT_FLUSH_DELAY_MS,
			toggle_deprecation_workflow: false,
			ignore: false,
		}
	}
}

impl DeprecationConfig {
	pub fn flush_delay(&self) -> Duration {
		Duration::from_millis(self.flush_delay_ms)
	}

	/// Parse configuration from TOML text.
	pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
		toml::from_str(content).map_err(|source| ConfigError::TomlParse {
			path: "<inline>".into(),
			source,
		})
	}

	/// Load configuration from a TOML file. A missing file yields defaults.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		if !path.exists() {
			debug!(path = %path.display(), "deprecation config not found, using defaults");
			return Ok(Self::default());
		}

		let content = std::fs::read_to_string(path)?;
		let config = toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
			path: path.to_path_buf(),
			source,
		})?;
		debug!(path = %path.display(), "loaded deprecation config");
		Ok(config)
	}

	/// Load from `path`, apply process environment overrides, and validate.
	pub fn resolve(path: &Path) -> Result<Self, ConfigError> {
		Self::resolve_with(path, |key| std::env::var(key).ok())
	}

	/// [`resolve`](Self::resolve) with environment variables read through `lookup`.
	pub fn resolve_with<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let config = Self::load(path)?.with_env_overrides(lookup)?;
		config.validate()?;
		Ok(config)
	}

	/// Apply `LOOM_DEPRECATION_*` overrides read through `lookup`.
	pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(value) = lookup(ENV_FLUSH_DELAY_MS) {
			self.flush_delay_ms = value
				.trim()
				.parse()
				.map_err(|_| ConfigError::invalid_value(ENV_FLUSH_DELAY_MS, format!("not a number: {value}")))?;
		}
		if let Some(value) = lookup(ENV_TOGGLE_WORKFLOW) {
			self.toggle_deprecation_workflow = parse_flag(ENV_TOGGLE_WORKFLOW, &value)?;
		}
		if let Some(value) = lookup(ENV_IGNORE) {
			self.ignore = parse_flag(ENV_IGNORE, &value)?;
		}
		Ok(self)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.flush_delay_ms == 0 {
			return Err(ConfigError::invalid_value(
				"flush_delay_ms",
				"must be greater than zero",
			));
		}
		Ok(())
	}
}

fn parse_flag(field: &str, value: &str) -> Result<bool, ConfigError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		other => Err(ConfigError::invalid_value(
			field,
			format!("expected a boolean, got {other}"),
		)),
	}
}
