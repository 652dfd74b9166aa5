// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the deprecation session.

use std::path::PathBuf;

use loom_deprecation_core::ProtocolError;
use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, DeprecationError>;

/// Errors surfaced by the deprecation session.
///
/// Capture and delivery never fail; these only come from session setup and
/// from inbound observer commands.
#[derive(Debug, Error)]
pub enum DeprecationError {
	/// An inbound message could not be decoded.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),

	/// Configuration could not be loaded.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The session was started outside a tokio runtime.
	#[error("deprecation session must be started inside a tokio runtime")]
	NoRuntime,

	/// A required collaborator was not supplied to the builder.
	#[error("{0} is required")]
	MissingCollaborator(&'static str),

	/// The session has been torn down.
	#[error("deprecation session has been destroyed")]
	SessionDestroyed,
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// I/O error reading the config file
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// TOML parsing error
	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// Invalid value
	#[error("Invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },
}

impl ConfigError {
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}
}
