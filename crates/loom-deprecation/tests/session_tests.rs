// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Capture and delivery behaviour of a running session.
//!
//! Every test runs on a paused clock so the 100ms quiet period is exact.

mod support;

use std::sync::Arc;

use loom_deprecation::{
	BuildSettings, ChannelPort, DeprecationConfig, DeprecationError, DeprecationSession,
	HandlerChain, SourceLocationResolver, FIRST_CAPTURE_WARNING,
};
use loom_deprecation_core::MappedLocation;
use serde_json::{json, Value};
use loom_deprecation_symbolicate::{InMemoryArtifacts, SourceMapStackMapper};
use support::{
	advance, count_of, deprecations_of, names, settle, BrokenMapper, DetachedPort, GatedMapper,
	Harness, StaticMapper,
};

#[tokio::test(start_paused = true)]
async fn test_count_only_delivery_when_not_watching() {
	let mut harness = Harness::start();
	harness.emit("A", None);
	harness.emit("A", None);
	harness.emit("B", None);

	advance(99).await;
	assert!(harness.drain().is_empty());

	advance(2).await;
	let messages = harness.drain();
	assert_eq!(names(&messages), vec!["deprecation:count"]);
	assert_eq!(count_of(&messages[0]), 3);
}

#[tokio::test(start_paused = true)]
async fn test_burst_while_watching_is_delivered_once() {
	let mut harness = Harness::start();
	harness.command("watch", Value::Null).await;
	harness.drain();

	for i in 0..5 {
		harness.emit_with_stack("A", &[&format!("caller{i} (app.js:{i}:1)")]);
		advance(50).await;
	}
	assert!(harness.drain().is_empty());

	// Last capture at t=200, quiet period ends at t=300.
	advance(49).await;
	assert!(harness.drain().is_empty());

	advance(2).await;
	let messages = harness.drain();
	assert_eq!(
		names(&messages),
		vec!["deprecation:deprecationsAdded", "deprecation:count"]
	);
	let groups = deprecations_of(&messages[0]);
	assert_eq!(groups.len(), 1);
	assert_eq!(groups[0]["count"], 5);
	assert_eq!(groups[0]["sources"].as_array().unwrap().len(), 5);
	assert_eq!(count_of(&messages[1]), 5);
}

#[tokio::test(start_paused = true)]
async fn test_worked_example_groups_and_counts() {
	let mut harness = Harness::start();
	harness.command("watch", Value::Null).await;
	harness.drain();

	harness.emit_with_stack("foo is deprecated", &["a (app.js:1:1)", "b (app.js:2:1)"]);
	harness.emit_with_stack("foo is deprecated", &["a (app.js:1:1)", "b (app.js:2:1)"]);
	harness.emit_with_stack("bar", &["c (app.js:3:1)"]);
	advance(101).await;

	let messages = harness.drain();
	let groups = deprecations_of(&messages[0]);
	assert_eq!(groups.len(), 2);

	assert_eq!(groups[0]["message"], "foo is deprecated");
	assert_eq!(groups[0]["count"], 2);
	let sources = groups[0]["sources"].as_array().unwrap();
	assert_eq!(sources.len(), 1);
	assert_eq!(
		sources[0]["stackStr"],
		"\n    a (app.js:1:1)\n    b (app.js:2:1)"
	);
	assert_eq!(sources[0]["map"], Value::Null);
	assert_eq!(groups[0]["hasSourceMap"], false);

	assert_eq!(groups[1]["message"], "bar");
	assert_eq!(groups[1]["count"], 1);
	assert_eq!(groups[1]["sources"].as_array().unwrap().len(), 1);

	assert_eq!(count_of(&messages[1]), 3);
}

#[tokio::test(start_paused = true)]
async fn test_same_message_different_stacks_share_a_group() {
	let harness = Harness::start();
	harness.emit_with_stack("A", &["one (app.js:1:1)"]);
	harness.emit_with_stack("A", &["two (app.js:2:1)"]);
	harness.command("watch", Value::Null).await;

	let groups = harness.session.groups();
	assert_eq!(groups.len(), 1);
	assert_eq!(groups[0].count, 2);
	assert_eq!(groups[0].sources.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_first_url_is_kept() {
	let mut harness = Harness::start();
	harness.emit("A", None);
	harness.emit("A", Some(json!({ "url": "https://deprecations.test/a" })));
	harness.emit("A", Some(json!({ "url": "https://deprecations.test/other" })));
	harness.emit("A", Some(json!("not an object")));

	harness.command("watch", Value::Null).await;
	let messages = harness.drain();
	assert_eq!(
		names(&messages),
		vec![
			"deprecation:deprecationsAdded",
			"deprecation:deprecationsAdded",
			"deprecation:count"
		]
	);
	// Nothing was flushed before watch, so the snapshot is empty.
	assert!(deprecations_of(&messages[0]).is_empty());

	let groups = deprecations_of(&messages[1]);
	assert_eq!(groups[0]["url"], "https://deprecations.test/a");
	assert_eq!(groups[0]["count"], 4);
	assert_eq!(count_of(&messages[2]), 4);
}

#[tokio::test(start_paused = true)]
async fn test_first_capture_warns_once() {
	let harness = Harness::start();
	harness.emit("A", None);
	harness.emit("B", None);
	harness.emit("A", None);

	assert_eq!(harness.warnings(), vec![FIRST_CAPTURE_WARNING.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_pass_through_gate() {
	let harness = Harness::start();
	let options = json!({ "id": "old-api", "until": "5.0.0", "url": "https://deprecations.test" });

	assert!(harness.emit("A", Some(options.clone())).is_empty());

	harness
		.command(
			"setOptions",
			json!({ "options": { "toggleDeprecationWorkflow": true } }),
		)
		.await;
	let reached = harness.emit("A", Some(options.clone()));
	assert_eq!(reached, vec![("A".to_string(), Some(options))]);

	harness
		.command(
			"setOptions",
			json!({ "options": { "toggleDeprecationWorkflow": false } }),
		)
		.await;
	assert!(harness.emit("A", None).is_empty());

	assert_eq!(harness.session.count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_pass_through_from_config() {
	let config = DeprecationConfig {
		toggle_deprecation_workflow: true,
		..Default::default()
	};
	let harness = Harness::start_with(config, None);
	assert_eq!(harness.emit("A", None).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_ignore_flag_skips_queue() {
	let mut harness = Harness::start_with(
		DeprecationConfig {
			ignore: true,
			..Default::default()
		},
		None,
	);

	assert!(harness.emit("A", None).is_empty());
	assert_eq!(harness.session.pending(), 0);
	assert_eq!(harness.session.count(), 0);
	assert!(!harness.session.delivery_scheduled());
	assert!(harness.warnings().is_empty());

	advance(200).await;
	assert!(harness.drain().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_detached_port_passes_through_without_capturing() {
	let host = HandlerChain::new();
	let session = DeprecationSession::builder()
		.port(DetachedPort)
		.start(&host)
		.unwrap();

	let reached = std::cell::Cell::new(0);
	host.emit("A", None, &|_, _| reached.set(reached.get() + 1));

	assert_eq!(reached.get(), 1);
	assert_eq!(session.count(), 0);
	assert!(!session.delivery_scheduled());
}

#[tokio::test(start_paused = true)]
async fn test_spidermonkey_stacks_are_normalized() {
	let harness = Harness::start();
	harness.stack.set(Some(
		"captureMarker@https://app.test/vendor.js:10:5\nhandler@https://app.test/vendor.js:20:3\nrender@https://app.test/app.js:3:1\n@https://app.test/app.js:9:2\n",
	));
	harness.emit("A", None);
	harness.command("watch", Value::Null).await;

	let groups = harness.session.groups();
	assert_eq!(
		groups[0].sources[0].stack_str,
		"\n    render (https://app.test/app.js:3:1)\n    {anonymous}(https://app.test/app.js:9:2)"
	);
}

#[tokio::test(start_paused = true)]
async fn test_missing_stack_records_empty_source() {
	let harness = Harness::start();
	harness.emit("A", None);
	harness.emit("A", None);
	harness.command("watch", Value::Null).await;

	let groups = harness.session.groups();
	assert_eq!(groups[0].count, 2);
	assert_eq!(groups[0].sources.len(), 1);
	assert_eq!(groups[0].sources[0].stack_str, "");
	assert!(groups[0].sources[0].resolved_location.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_development_build_resolves_first_party_location() {
	let mapper = Arc::new(StaticMapper {
		candidates: vec![
			MappedLocation {
				source: "vendor/framework.js".to_string(),
				line: 10,
				column: 0,
			},
			MappedLocation {
				source: "my-app/routes/index.js".to_string(),
				line: 4,
				column: 2,
			},
		],
	});
	let resolver = SourceLocationResolver::new(BuildSettings::new(true, "my-app"), mapper);
	let mut harness = Harness::start_with(DeprecationConfig::default(), Some(resolver));

	harness.command("watch", Value::Null).await;
	harness.drain();
	harness.emit_with_stack("A", &["index (assets/my-app.js:1:200)"]);
	advance(101).await;

	let messages = harness.drain();
	let group = &deprecations_of(&messages[0])[0];
	assert_eq!(group["hasSourceMap"], true);
	assert_eq!(
		group["sources"][0]["map"],
		json!({ "source": "my-app/routes/index.js", "line": 4, "column": 2, "found": true })
	);
}

async fn assert_unresolved_delivery(resolver: SourceLocationResolver) {
	let mut harness = Harness::start_with(DeprecationConfig::default(), Some(resolver));
	harness.command("watch", Value::Null).await;
	harness.drain();

	harness.emit_with_stack("A", &["a (https://app.test/assets/app.js:1:1)"]);
	harness.emit_with_stack("A", &["b (https://app.test/assets/app.js:2:1)"]);
	advance(101).await;

	let messages = harness.drain();
	assert_eq!(
		names(&messages),
		vec!["deprecation:deprecationsAdded", "deprecation:count"]
	);
	let group = &deprecations_of(&messages[0])[0];
	assert_eq!(group["count"], 2);
	assert_eq!(group["hasSourceMap"], false);
	for source in group["sources"].as_array().unwrap() {
		assert_eq!(source["map"], Value::Null);
	}
	assert_eq!(count_of(&messages[1]), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failing_mapper_still_delivers() {
	let resolver =
		SourceLocationResolver::new(BuildSettings::new(true, "my-app"), Arc::new(BrokenMapper));
	assert_unresolved_delivery(resolver).await;
}

#[tokio::test(start_paused = true)]
async fn test_corrupt_source_maps_still_deliver() {
	for map in [
		&br#"{"version":3,"sources":["my-app/a.js"],"names":[],"mappings":"ggggggggggggggggB"}"#[..],
		&b"{ not json"[..],
		&br#"{"version":2,"sources":[],"names":[],"mappings":""}"#[..],
	] {
		let mut artifacts = InMemoryArtifacts::new();
		artifacts.add("https://app.test/assets/app.js", map.to_vec());
		let resolver = SourceLocationResolver::new(
			BuildSettings::new(true, "my-app"),
			Arc::new(SourceMapStackMapper::new(artifacts)),
		);
		assert_unresolved_delivery(resolver).await;
	}
}

#[tokio::test(start_paused = true)]
async fn test_count_includes_captures_made_during_a_flush() {
	let mapper = Arc::new(GatedMapper::default());
	let resolver = SourceLocationResolver::new(BuildSettings::new(true, "my-app"), mapper.clone());
	let mut harness = Harness::start_with(DeprecationConfig::default(), Some(resolver));

	harness.command("watch", Value::Null).await;
	harness.drain();

	harness.emit_with_stack("A", &["a (app.js:1:1)"]);
	advance(101).await;
	assert!(harness.drain().is_empty(), "flush is waiting on resolution");

	harness.emit_with_stack("B", &["b (app.js:2:1)"]);
	assert_eq!(harness.session.count(), 2);

	mapper.release.notify_one();
	settle().await;
	let messages = harness.drain();
	assert_eq!(deprecations_of(&messages[0])[0]["message"], "A");
	assert_eq!(count_of(&messages[1]), 2);

	mapper.release.notify_one();
	advance(101).await;
	let messages = harness.drain();
	assert_eq!(deprecations_of(&messages[0])[0]["message"], "B");
	assert_eq!(count_of(&messages[1]), 2);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_cancels_delivery_and_unregisters() {
	let mut harness = Harness::start();
	harness.emit("A", None);
	assert!(harness.session.delivery_scheduled());

	harness.session.destroy();
	assert!(harness.session.is_destroyed());
	assert!(harness.host.is_empty());

	advance(200).await;
	assert!(harness.drain().is_empty());

	// With the hook gone the host's own handling runs.
	assert_eq!(harness.emit("B", None).len(), 1);

	let err = harness
		.session
		.handle_message(loom_deprecation::PortMessage::new("deprecation:getCount", Value::Null))
		.await
		.unwrap_err();
	assert!(matches!(err, DeprecationError::SessionDestroyed));
}

#[tokio::test(start_paused = true)]
async fn test_destroy_discards_in_flight_flush() {
	let mapper = Arc::new(GatedMapper::default());
	let resolver = SourceLocationResolver::new(BuildSettings::new(true, "my-app"), mapper.clone());
	let mut harness = Harness::start_with(DeprecationConfig::default(), Some(resolver));

	harness.command("watch", Value::Null).await;
	harness.drain();
	harness.emit_with_stack("A", &["a (app.js:1:1)"]);
	advance(101).await;

	harness.session.destroy();
	mapper.release.notify_one();
	settle().await;
	assert!(harness.drain().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_session_releases_the_hook() {
	let harness = Harness::start();
	assert_eq!(harness.host.len(), 1);

	let host = harness.host.clone();
	drop(harness);
	assert!(host.is_empty());
}

#[test]
fn test_start_requires_runtime() {
	let (port, _rx) = ChannelPort::new();
	let err = DeprecationSession::builder()
		.port(port)
		.start(&HandlerChain::new())
		.unwrap_err();
	assert!(matches!(err, DeprecationError::NoRuntime));
}

#[tokio::test]
async fn test_start_requires_port() {
	let err = DeprecationSession::builder()
		.start(&HandlerChain::new())
		.unwrap_err();
	assert!(matches!(err, DeprecationError::MissingCollaborator("port")));
}

#[tokio::test]
async fn test_start_rejects_zero_delay() {
	let (port, _rx) = ChannelPort::new();
	let err = DeprecationSession::builder()
		.config(DeprecationConfig {
			flush_delay_ms: 0,
			..Default::default()
		})
		.port(port)
		.start(&HandlerChain::new())
		.unwrap_err();
	assert!(matches!(err, DeprecationError::Config(_)));
}
