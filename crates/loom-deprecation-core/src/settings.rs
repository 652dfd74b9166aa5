// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read-only build settings supplied by the host application.

use serde::{Deserialize, Serialize};

/// Environment name the host uses for development builds.
pub const DEVELOPMENT_ENVIRONMENT: &str = "development";

/// Build information consulted before attempting source resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSettings {
	/// Source maps are only consulted for development builds.
	pub is_development_build: bool,
	/// Module-name prefix identifying first-party application code.
	pub first_party_module_prefix: String,
}

impl BuildSettings {
	pub fn new(is_development_build: bool, first_party_module_prefix: impl Into<String>) -> Self {
		Self {
			is_development_build,
			first_party_module_prefix: first_party_module_prefix.into(),
		}
	}

	/// Derives settings from the host's environment name and module prefix.
	pub fn from_environment(environment: &str, module_prefix: impl Into<String>) -> Self {
		Self::new(environment == DEVELOPMENT_ENVIRONMENT, module_prefix)
	}

	/// Returns true if `source` belongs to first-party application code.
	pub fn is_first_party(&self, source: &str) -> bool {
		source.contains(self.first_party_module_prefix.as_str())
	}
}
