// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared fixtures for session integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use loom_deprecation::{
	ChannelPort, DeprecationConfig, DeprecationSession, HandlerChain, LogSink, MessagePort,
	PortMessage, SourceLocationResolver, StackSource,
};
use loom_deprecation_core::MappedLocation;
use loom_deprecation_symbolicate::{Result as SymbolicateResult, StackMapper, SymbolicateError};
use serde_json::Value;
use tokio::sync::{mpsc, Notify};

/// Stack source whose next stack is set by the test.
#[derive(Default)]
pub struct ScriptedStack {
	next: Mutex<Option<String>>,
}

impl ScriptedStack {
	pub fn set(&self, raw: Option<&str>) {
		*self.next.lock().unwrap() = raw.map(str::to_string);
	}
}

impl StackSource for ScriptedStack {
	fn capture(&self) -> Option<String> {
		self.next.lock().unwrap().clone()
	}
}

#[derive(Default)]
pub struct RecordingLogSink {
	pub warnings: Mutex<Vec<String>>,
	pub logs: Mutex<Vec<String>>,
}

impl LogSink for RecordingLogSink {
	fn warn(&self, text: &str) {
		self.warnings.lock().unwrap().push(text.to_string());
	}

	fn log(&self, text: &str) {
		self.logs.lock().unwrap().push(text.to_string());
	}
}

/// Port whose peer has gone away.
pub struct DetachedPort;

impl MessagePort for DetachedPort {
	fn send_message(&self, _message: PortMessage) {
		panic!("detached port must not be written to");
	}

	fn is_connected(&self) -> bool {
		false
	}
}

/// Maps every stack to the same candidate list.
pub struct StaticMapper {
	pub candidates: Vec<MappedLocation>,
}

#[async_trait]
impl StackMapper for StaticMapper {
	async fn map_stack(&self, _stack_str: &str) -> SymbolicateResult<Vec<MappedLocation>> {
		Ok(self.candidates.clone())
	}
}

/// Mapper that always fails.
pub struct BrokenMapper;

#[async_trait]
impl StackMapper for BrokenMapper {
	async fn map_stack(&self, _stack_str: &str) -> SymbolicateResult<Vec<MappedLocation>> {
		Err(SymbolicateError::ArtifactFetch {
			url: "https://app.test/assets/app.js".to_string(),
			message: "connection reset".to_string(),
		})
	}
}

/// Mapper that blocks until released.
#[derive(Default)]
pub struct GatedMapper {
	pub release: Notify,
}

#[async_trait]
impl StackMapper for GatedMapper {
	async fn map_stack(&self, _stack_str: &str) -> SymbolicateResult<Vec<MappedLocation>> {
		self.release.notified().await;
		Ok(vec![MappedLocation {
			source: "app/routes/index.js".to_string(),
			line: 1,
			column: 0,
		}])
	}
}

/// Builds a V8-style marker stack whose caller frames are `frames`.
pub fn v8_stack(frames: &[&str]) -> String {
	let mut raw = String::from(
		"Error: marker\n    at captureMarker (vendor.js:1:1)\n    at handler (vendor.js:2:1)",
	);
	for frame in frames {
		raw.push_str("\n    at ");
		raw.push_str(frame);
	}
	raw
}

pub struct Harness {
	pub host: HandlerChain,
	pub session: DeprecationSession,
	pub outbound: mpsc::UnboundedReceiver<PortMessage>,
	pub console: Arc<RecordingLogSink>,
	pub stack: Arc<ScriptedStack>,
}

impl Harness {
	pub fn start() -> Self {
		Self::start_with(DeprecationConfig::default(), None)
	}

	pub fn start_with(config: DeprecationConfig, resolver: Option<SourceLocationResolver>) -> Self {
		let host = HandlerChain::new();
		let (port, outbound) = ChannelPort::new();
		let console = Arc::new(RecordingLogSink::default());
		let stack = Arc::new(ScriptedStack::default());

		let mut builder = DeprecationSession::builder()
			.config(config)
			.port(port)
			.log_sink(console.clone())
			.stack_source(stack.clone());
		if let Some(resolver) = resolver {
			builder = builder.resolver(resolver);
		}
		let session = builder.start(&host).unwrap();

		Self {
			host,
			session,
			outbound,
			console,
			stack,
		}
	}

	/// Emit through the host. Returns the emissions that reached the host's
	/// own handling.
	pub fn emit(&self, message: &str, options: Option<Value>) -> Vec<(String, Option<Value>)> {
		let reached = RefCell::new(Vec::new());
		self.host.emit(message, options.as_ref(), &|m, o| {
			reached.borrow_mut().push((m.to_string(), o.cloned()));
		});
		reached.into_inner()
	}

	pub fn emit_with_stack(&self, message: &str, frames: &[&str]) {
		self.stack.set(Some(&v8_stack(frames)));
		self.emit(message, None);
	}

	pub async fn command(&self, name: &str, payload: Value) {
		self.session
			.handle_message(PortMessage::new(format!("deprecation:{name}"), payload))
			.await
			.unwrap();
	}

	pub fn drain(&mut self) -> Vec<PortMessage> {
		let mut messages = Vec::new();
		while let Ok(message) = self.outbound.try_recv() {
			messages.push(message);
		}
		messages
	}

	pub fn warnings(&self) -> Vec<String> {
		self.console.warnings.lock().unwrap().clone()
	}

	pub fn logs(&self) -> Vec<String> {
		self.console.logs.lock().unwrap().clone()
	}
}

/// Let spawned tasks run to their next await point.
pub async fn settle() {
	for _ in 0..8 {
		tokio::task::yield_now().await;
	}
}

/// Advance paused time by `ms` and let woken tasks run.
pub async fn advance(ms: u64) {
	tokio::time::sleep(Duration::from_millis(ms)).await;
	settle().await;
}

pub fn names(messages: &[PortMessage]) -> Vec<&str> {
	messages.iter().map(|m| m.name.as_str()).collect()
}

pub fn count_of(message: &PortMessage) -> u64 {
	assert_eq!(message.name, "deprecation:count");
	message.payload["count"].as_u64().unwrap()
}

pub fn deprecations_of(message: &PortMessage) -> &Vec<Value> {
	assert_eq!(message.name, "deprecation:deprecationsAdded");
	message.payload["deprecations"].as_array().unwrap()
}
