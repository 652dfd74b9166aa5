// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for Loom deprecation tracking.
//!
//! This crate holds the pieces shared by the resolver and the session:
//! - Deprecation events and the emission options they are built from
//! - Deprecation groups keyed by a stable identifier derived from the message
//! - The stack normalizer that turns raw marker stacks into canonical text
//! - The wire protocol spoken with the observing client
//! - Build settings consulted before attempting source resolution

pub mod error;
pub mod event;
pub mod group;
pub mod location;
pub mod protocol;
pub mod settings;
pub mod stack;

pub use error::{ProtocolError, Result};
pub use event::{DeprecationEvent, EmissionOptions};
pub use group::{DeprecationGroup, GroupId, SourceRecord};
pub use location::{Location, MappedLocation};
pub use protocol::{Command, Outbound, PortMessage, TraceRequest, PORT_NAMESPACE};
pub use settings::BuildSettings;
pub use stack::{normalize_stack, StackDialect};
