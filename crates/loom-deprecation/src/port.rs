// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outbound transport and developer-console sinks.

use loom_deprecation_core::PortMessage;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Target used by [`TracingLogSink`] so console output can be filtered
/// separately from the crate's own diagnostics.
pub const CONSOLE_TARGET: &str = "loom_deprecation::console";

/// Channel to the observing client.
///
/// Sends are fire-and-forget; a port that has lost its peer reports
/// `is_connected() == false`, in which case the session stays out of the way
/// of the host's own deprecation handling.
pub trait MessagePort: Send + Sync {
	fn send_message(&self, message: PortMessage);

	fn is_connected(&self) -> bool {
		true
	}
}

/// Host developer console.
pub trait LogSink: Send + Sync {
	fn warn(&self, text: &str);
	fn log(&self, text: &str);
}

/// [`LogSink`] that forwards to `tracing` under [`CONSOLE_TARGET`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
	fn warn(&self, text: &str) {
		warn!(target: CONSOLE_TARGET, "{text}");
	}

	fn log(&self, text: &str) {
		info!(target: CONSOLE_TARGET, "{text}");
	}
}

/// [`MessagePort`] backed by an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelPort {
	tx: mpsc::UnboundedSender<PortMessage>,
}

impl ChannelPort {
	pub fn new() -> (Self, mpsc::UnboundedReceiver<PortMessage>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, rx)
	}
}

impl MessagePort for ChannelPort {
	fn send_message(&self, message: PortMessage) {
		if self.tx.send(message).is_err() {
			tracing::debug!("observer channel closed, dropping message");
		}
	}

	fn is_connected(&self) -> bool {
		!self.tx.is_closed()
	}
}
