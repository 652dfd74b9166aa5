// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Source map resolution of deprecation call sites.
//!
//! This crate provides:
//! - Parsing of v3 source maps and their Base64 VLQ mappings
//! - Extraction of generated positions from normalized stack frames
//! - A [`StackMapper`] that maps a whole stack to original positions
//! - The [`SourceLocationResolver`] that picks the first-party location for a stack
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use loom_deprecation_core::BuildSettings;
//! use loom_deprecation_symbolicate::{InMemoryArtifacts, SourceLocationResolver, SourceMapStackMapper};
//!
//! let mut artifacts = InMemoryArtifacts::new();
//! artifacts.add(
//! 	"https://app.test/assets/app.js",
//! 	br#"{"version":3,"sources":["my-app/routes/index.js"],"names":[],"mappings":"AAAA"}"#.to_vec(),
//! );
//!
//! let mapper = SourceMapStackMapper::new(artifacts);
//! let resolver = SourceLocationResolver::new(BuildSettings::new(true, "my-app"), Arc::new(mapper));
//!
//! let location = tokio_test::block_on(
//! 	resolver.resolve("\n    {anonymous}(https://app.test/assets/app.js:1:1)"),
//! );
//! assert_eq!(location.unwrap().source, "my-app/routes/index.js");
//! ```

pub mod error;
pub mod frame;
pub mod mapper;
pub mod resolver;
pub mod sourcemap;
pub mod vlq;

pub use error::{Result, SymbolicateError};
pub use frame::{parse_frames, GeneratedPosition};
pub use mapper::{ArtifactLookup, InMemoryArtifacts, SourceMapStackMapper, StackMapper};
pub use resolver::SourceLocationResolver;
pub use sourcemap::ParsedSourceMap;
pub use vlq::{decode_mappings, decode_segment, LineMappings, Mapping};
