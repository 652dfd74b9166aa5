// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: Capture a few deprecations and watch them arrive as an observer.
//!
//! Run with:
//!   cargo run --example watch -p loom-deprecation [-- path/to/deprecation.toml]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use loom_deprecation::{
	ChannelPort, DeprecationConfig, DeprecationSession, HandlerChain, PortMessage, StackSource,
};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

struct DemoStack;

impl StackSource for DemoStack {
	fn capture(&self) -> Option<String> {
		Some(
			"Error: marker\n    at captureMarker (vendor.js:1:1)\n    at handler (vendor.js:2:1)\n    at renderRoute (https://app.test/assets/app.js:120:14)\n    at https://app.test/assets/app.js:88:3"
				.to_string(),
		)
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
		)
		.init();

	let config_path = std::env::args()
		.nth(1)
		.map(PathBuf::from)
		.unwrap_or_else(|| PathBuf::from("deprecation.toml"));
	let config = DeprecationConfig::resolve(&config_path)?;
	let host = HandlerChain::new();
	let (port, mut outbound) = ChannelPort::new();

	let session = DeprecationSession::builder()
		.config(config.clone())
		.port(port)
		.stack_source(Arc::new(DemoStack))
		.start(&host)?;

	session
		.handle_message(PortMessage::new("deprecation:watch", Value::Null))
		.await?;

	let fallback = |message: &str, _: Option<&Value>| println!("host handled: {message}");
	host.emit("`String.prototype.fmt` is deprecated", None, &fallback);
	host.emit(
		"`String.prototype.fmt` is deprecated",
		Some(&json!({ "url": "https://deprecations.test/string-fmt" })),
		&fallback,
	);
	host.emit("`jQuery integration` is deprecated", None, &fallback);

	tokio::time::sleep(config.flush_delay() + Duration::from_millis(50)).await;

	while let Ok(message) = outbound.try_recv() {
		println!("{} {}", message.name, serde_json::to_string_pretty(&message.payload)?);
	}

	session.destroy();
	Ok(())
}
