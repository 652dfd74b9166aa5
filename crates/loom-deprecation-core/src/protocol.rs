// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Messages exchanged with the observing client.
//!
//! Every message is a `(name, payload)` pair. Names are namespaced as
//! `deprecation:<name>` on the wire; inbound names without a namespace are
//! accepted as well.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, Result};
use crate::group::DeprecationGroup;

/// Namespace of the deprecation port.
pub const PORT_NAMESPACE: &str = "deprecation";

/// Header prepended to each stack forwarded by `sendStackTraces`.
pub const TRACE_HEADER: &str = "Inspector (Deprecation Trace)";

// Inbound command names
pub const COMMAND_WATCH: &str = "watch";
pub const COMMAND_RELEASE: &str = "release";
pub const COMMAND_GET_COUNT: &str = "getCount";
pub const COMMAND_CLEAR: &str = "clear";
pub const COMMAND_SET_OPTIONS: &str = "setOptions";
pub const COMMAND_SEND_STACK_TRACES: &str = "sendStackTraces";

// Outbound message names
pub const MESSAGE_DEPRECATIONS_ADDED: &str = "deprecationsAdded";
pub const MESSAGE_COUNT: &str = "count";

/// A named message on the port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortMessage {
	pub name: String,
	#[serde(default)]
	pub payload: Value,
}

impl PortMessage {
	pub fn new(name: impl Into<String>, payload: Value) -> Self {
		Self {
			name: name.into(),
			payload,
		}
	}

	/// Builds the namespaced wire message for an outbound payload.
	pub fn from_outbound(outbound: &Outbound) -> serde_json::Result<Self> {
		Ok(Self {
			name: format!("{PORT_NAMESPACE}:{}", outbound.name()),
			payload: serde_json::to_value(outbound)?,
		})
	}

	/// Message name with the port namespace removed.
	pub fn local_name(&self) -> Result<&str> {
		match self.name.split_once(':') {
			Some((PORT_NAMESPACE, local)) => Ok(local),
			Some(_) => Err(ProtocolError::WrongNamespace(self.name.clone())),
			None => Ok(&self.name),
		}
	}
}

/// Messages sent to the observer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outbound {
	DeprecationsAdded { deprecations: Vec<DeprecationGroup> },
	Count { count: u64 },
}

impl Outbound {
	pub fn name(&self) -> &'static str {
		match self {
			Outbound::DeprecationsAdded { .. } => MESSAGE_DEPRECATIONS_ADDED,
			Outbound::Count { .. } => MESSAGE_COUNT,
		}
	}
}

/// Commands accepted from the observer.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
	Watch,
	Release,
	GetCount,
	Clear,
	SetOptions { toggle_deprecation_workflow: bool },
	SendStackTraces(TraceRequest),
}

#[derive(Debug, Default, Deserialize)]
struct SetOptionsParams {
	#[serde(default)]
	options: OptionsParams,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionsParams {
	#[serde(default)]
	toggle_deprecation_workflow: bool,
}

#[derive(Debug, Deserialize)]
struct SendStackTracesParams {
	deprecation: TraceRequest,
}

impl Command {
	pub fn parse(message: &PortMessage) -> Result<Self> {
		let name = message.local_name()?;
		match name {
			COMMAND_WATCH => Ok(Command::Watch),
			COMMAND_RELEASE => Ok(Command::Release),
			COMMAND_GET_COUNT => Ok(Command::GetCount),
			COMMAND_CLEAR => Ok(Command::Clear),
			COMMAND_SET_OPTIONS => {
				let params: SetOptionsParams = decode(COMMAND_SET_OPTIONS, &message.payload)?;
				Ok(Command::SetOptions {
					toggle_deprecation_workflow: params.options.toggle_deprecation_workflow,
				})
			}
			COMMAND_SEND_STACK_TRACES => {
				let params: SendStackTracesParams =
					decode(COMMAND_SEND_STACK_TRACES, &message.payload)?;
				Ok(Command::SendStackTraces(params.deprecation))
			}
			other => Err(ProtocolError::UnknownCommand(other.to_string())),
		}
	}

	pub fn name(&self) -> &'static str {
		match self {
			Command::Watch => COMMAND_WATCH,
			Command::Release => COMMAND_RELEASE,
			Command::GetCount => COMMAND_GET_COUNT,
			Command::Clear => COMMAND_CLEAR,
			Command::SetOptions { .. } => COMMAND_SET_OPTIONS,
			Command::SendStackTraces(_) => COMMAND_SEND_STACK_TRACES,
		}
	}
}

fn decode<T: for<'de> Deserialize<'de>>(command: &'static str, payload: &Value) -> Result<T> {
	serde_json::from_value(payload.clone())
		.map_err(|source| ProtocolError::InvalidPayload { command, source })
}

/// The part of a group the observer echoes back when asking for stack traces.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TraceRequest {
	#[serde(default)]
	pub message: Option<String>,
	#[serde(default)]
	pub sources: Vec<TraceSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSource {
	#[serde(default)]
	pub stack_str: String,
}

impl TraceRequest {
	/// One log entry per source: the header line followed by the stack lines.
	pub fn reports(&self) -> Vec<String> {
		let message = self.message.as_deref().unwrap_or_default();
		self
			.sources
			.iter()
			.map(|source| {
				let mut lines = vec![format!("{TRACE_HEADER}: {message}")];
				lines.extend(source.stack_str.split('\n').map(str::to_string));
				lines.join("\n")
			})
			.collect()
	}
}
