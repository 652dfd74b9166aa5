// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the deprecation wire protocol.

use thiserror::Error;

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding inbound observer messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
	/// The message name is not one of the known commands.
	#[error("unknown deprecation command: {0}")]
	UnknownCommand(String),

	/// The message belongs to another port namespace.
	#[error("message {0} is not in the deprecation namespace")]
	WrongNamespace(String),

	/// The payload did not have the shape the command expects.
	#[error("invalid payload for {command}: {source}")]
	InvalidPayload {
		command: &'static str,
		#[source]
		source: serde_json::Error,
	},
}
