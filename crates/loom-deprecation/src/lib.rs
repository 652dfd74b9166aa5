// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deprecation capture, grouping and throttled delivery.
//!
//! A [`DeprecationSession`] registers a handler with the host's deprecation
//! mechanism, queues every captured emission, and delivers grouped summaries
//! to an observing client over a [`MessagePort`]:
//!
//! - While the observer is watching, bursts of captures are coalesced into a
//!   single `deprecationsAdded` message sent after a quiet period.
//! - Otherwise only a `count` message is sent after the quiet period.
//!
//! # Example
//!
//! ```
//! use loom_deprecation::{ChannelPort, DeprecationSession, HandlerChain, PortMessage};
//! use serde_json::Value;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> loom_deprecation::Result<()> {
//! let host = HandlerChain::new();
//! let (port, mut outbound) = ChannelPort::new();
//! let session = DeprecationSession::builder().port(port).start(&host)?;
//!
//! session
//! 	.handle_message(PortMessage::new("deprecation:watch", Value::Null))
//! 	.await?;
//! host.emit("foo is deprecated", None, &|_, _| {});
//! assert_eq!(session.count(), 1);
//!
//! let first = outbound.try_recv().unwrap();
//! assert_eq!(first.name, "deprecation:deprecationsAdded");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod port;
pub mod scheduler;
pub mod session;
pub mod store;

pub use config::DeprecationConfig;
pub use error::{ConfigError, DeprecationError, Result};
pub use host::{
	DeprecationHandler, DeprecationHost, HandlerChain, NoStackSource, Registration, StackSource,
};
pub use port::{ChannelPort, LogSink, MessagePort, TracingLogSink};
pub use scheduler::{DeferredTask, DeliveryScheduler};
pub use session::{DeprecationSession, SessionBuilder, FIRST_CAPTURE_WARNING};
pub use store::{AggregationStore, IngestPlan, ResolvedBatch};

pub use loom_deprecation_core::{
	BuildSettings, Command, DeprecationEvent, DeprecationGroup, GroupId, Location, Outbound,
	PortMessage, SourceRecord,
};
pub use loom_deprecation_symbolicate::SourceLocationResolver;
