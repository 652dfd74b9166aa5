// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The deprecation session: capture hook, observer commands and delivery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use loom_deprecation_core::{
	normalize_stack, BuildSettings, Command, DeprecationEvent, DeprecationGroup, Outbound,
	PortMessage,
};
use loom_deprecation_symbolicate::{InMemoryArtifacts, SourceLocationResolver, SourceMapStackMapper};
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, info, instrument, warn};

use crate::config::DeprecationConfig;
use crate::error::{DeprecationError, Result};
use crate::host::{DeprecationHandler, DeprecationHost, NoStackSource, Registration, StackSource};
use crate::port::{LogSink, MessagePort, TracingLogSink};
use crate::scheduler::DeliveryScheduler;
use crate::store::AggregationStore;

/// Console warning emitted the first time a deprecation is captured.
pub const FIRST_CAPTURE_WARNING: &str =
	"Deprecations were detected, see the inspector deprecations tab for more details.";

/// What a fired timer should deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
	Count,
	Pending,
}

struct SessionState {
	store: AggregationStore,
	queue: Vec<DeprecationEvent>,
	scheduler: DeliveryScheduler,
	watching: bool,
	toggle_deprecation_workflow: bool,
	ignore: bool,
	warned: bool,
}

struct SessionInner {
	state: Mutex<SessionState>,
	/// Serializes flushes so at most one is resolving at a time.
	flush_gate: tokio::sync::Mutex<()>,
	port: Arc<dyn MessagePort>,
	log: Arc<dyn LogSink>,
	stack_source: Arc<dyn StackSource>,
	resolver: SourceLocationResolver,
	destroyed: AtomicBool,
	registration: Mutex<Option<Registration>>,
}

/// Tracks deprecations emitted by the host and reports them to an observer.
///
/// Cheap to clone; all clones share one session.
#[derive(Clone)]
pub struct DeprecationSession {
	inner: Arc<SessionInner>,
}

/// Builder for [`DeprecationSession`].
#[derive(Default)]
pub struct SessionBuilder {
	config: DeprecationConfig,
	port: Option<Arc<dyn MessagePort>>,
	log: Option<Arc<dyn LogSink>>,
	stack_source: Option<Arc<dyn StackSource>>,
	resolver: Option<SourceLocationResolver>,
}

impl SessionBuilder {
	pub fn config(mut self, config: DeprecationConfig) -> Self {
		self.config = config;
		self
	}

	pub fn port(mut self, port: impl MessagePort + 'static) -> Self {
		self.port = Some(Arc::new(port));
		self
	}

	pub fn shared_port(mut self, port: Arc<dyn MessagePort>) -> Self {
		self.port = Some(port);
		self
	}

	pub fn log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
		self.log = Some(log);
		self
	}

	pub fn stack_source(mut self, stack_source: Arc<dyn StackSource>) -> Self {
		self.stack_source = Some(stack_source);
		self
	}

	pub fn resolver(mut self, resolver: SourceLocationResolver) -> Self {
		self.resolver = Some(resolver);
		self
	}

	/// Validate the configuration, register the capture hook with `host` and
	/// start the session. Must be called inside a tokio runtime.
	pub fn start(self, host: &dyn DeprecationHost) -> Result<DeprecationSession> {
		self.config.validate()?;
		let port = self.port.ok_or(DeprecationError::MissingCollaborator("port"))?;
		let runtime = Handle::try_current().map_err(|_| DeprecationError::NoRuntime)?;

		let resolver = self.resolver.unwrap_or_else(|| {
			SourceLocationResolver::new(
				BuildSettings::default(),
				Arc::new(SourceMapStackMapper::new(InMemoryArtifacts::new())),
			)
		});

		let state = SessionState {
			store: AggregationStore::new(),
			queue: Vec::new(),
			scheduler: DeliveryScheduler::new(runtime, self.config.flush_delay()),
			watching: false,
			toggle_deprecation_workflow: self.config.toggle_deprecation_workflow,
			ignore: self.config.ignore,
			warned: false,
		};

		let inner = Arc::new(SessionInner {
			state: Mutex::new(state),
			flush_gate: tokio::sync::Mutex::new(()),
			port,
			log: self.log.unwrap_or_else(|| Arc::new(TracingLogSink)),
			stack_source: self.stack_source.unwrap_or_else(|| Arc::new(NoStackSource)),
			resolver,
			destroyed: AtomicBool::new(false),
			registration: Mutex::new(None),
		});

		let registration = host.register_deprecation_handler(capture_handler(Arc::downgrade(&inner)));
		*lock(&inner.registration) = Some(registration);

		info!(
			flush_delay_ms = self.config.flush_delay_ms,
			development = inner.resolver.settings().is_development_build,
			"deprecation session started"
		);
		Ok(DeprecationSession { inner })
	}
}

/// The handler registered with the host. Holds the session weakly so the
/// host's handler list never keeps a session alive.
fn capture_handler(session: Weak<SessionInner>) -> DeprecationHandler {
	Arc::new(
		move |message: &str, options: Option<&Value>, proceed: &dyn Fn(&str, Option<&Value>)| {
			match session.upgrade() {
				Some(inner) => inner.capture(message, options, proceed),
				None => proceed(message, options),
			}
		},
	)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DeprecationSession {
	pub fn builder() -> SessionBuilder {
		SessionBuilder::default()
	}

	/// Capture an emission as the registered host handler would.
	pub fn capture(
		&self,
		message: &str,
		options: Option<&Value>,
		proceed: &dyn Fn(&str, Option<&Value>),
	) {
		Arc::clone(&self.inner).capture(message, options, proceed);
	}

	/// Decode and handle an inbound observer message.
	pub async fn handle_message(&self, message: PortMessage) -> Result<()> {
		let command = match Command::parse(&message) {
			Ok(command) => command,
			Err(e) => {
				warn!(name = %message.name, error = %e, "rejected observer message");
				return Err(e.into());
			}
		};
		self.handle_command(command).await
	}

	#[instrument(skip_all, fields(command = command.name()))]
	pub async fn handle_command(&self, command: Command) -> Result<()> {
		if self.is_destroyed() {
			return Err(DeprecationError::SessionDestroyed);
		}
		let inner = &self.inner;

		match command {
			Command::Watch => {
				let snapshot = {
					let mut state = inner.state();
					state.watching = true;
					state.store.snapshot()
				};
				inner.send(Outbound::DeprecationsAdded {
					deprecations: snapshot,
				});
				Arc::clone(inner).flush_pending().await;
			}
			Command::Release => {
				let mut state = inner.state();
				state.watching = false;
				if state.scheduler.cancel() {
					debug!("pending delivery cancelled on release");
				}
			}
			Command::GetCount => inner.send_count(),
			Command::Clear => {
				{
					let mut state = inner.state();
					let cancelled = state.scheduler.cancel();
					let dropped = state.queue.len();
					state.queue.clear();
					state.store.clear();
					debug!(cancelled, dropped, "deprecations cleared");
				}
				inner.send_count();
			}
			Command::SetOptions {
				toggle_deprecation_workflow,
			} => {
				inner.state().toggle_deprecation_workflow = toggle_deprecation_workflow;
			}
			Command::SendStackTraces(request) => {
				for report in request.reports() {
					inner.log.log(&report);
				}
			}
		}
		Ok(())
	}

	/// Total events captured since the last clear, including queued ones.
	pub fn count(&self) -> u64 {
		self.inner.state().count()
	}

	/// Every group seen since the last clear.
	pub fn groups(&self) -> Vec<DeprecationGroup> {
		self.inner.state().store.snapshot()
	}

	/// Events captured but not yet flushed.
	pub fn pending(&self) -> usize {
		self.inner.state().queue.len()
	}

	pub fn is_watching(&self) -> bool {
		self.inner.state().watching
	}

	pub fn delivery_scheduled(&self) -> bool {
		self.inner.state().scheduler.is_pending()
	}

	pub fn is_destroyed(&self) -> bool {
		self.inner.destroyed.load(Ordering::SeqCst)
	}

	/// Tear the session down: cancel any pending delivery, unregister the
	/// capture hook and drop the results of any flush still resolving.
	pub fn destroy(&self) {
		if self.inner.destroyed.swap(true, Ordering::SeqCst) {
			return;
		}
		self.inner.state().scheduler.cancel();
		if let Some(registration) = lock(&self.inner.registration).take() {
			registration.unregister();
		}
		info!("deprecation session destroyed");
	}
}

impl std::fmt::Debug for DeprecationSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DeprecationSession")
			.field("destroyed", &self.is_destroyed())
			.finish_non_exhaustive()
	}
}

impl SessionState {
	fn count(&self) -> u64 {
		self.store.total() + self.queue.len() as u64
	}
}

impl SessionInner {
	fn state(&self) -> MutexGuard<'_, SessionState> {
		lock(&self.state)
	}

	fn is_destroyed(&self) -> bool {
		self.destroyed.load(Ordering::SeqCst)
	}

	fn capture(
		self: Arc<Self>,
		message: &str,
		options: Option<&Value>,
		proceed: &dyn Fn(&str, Option<&Value>),
	) {
		if self.is_destroyed() || !self.port.is_connected() {
			proceed(message, options);
			return;
		}

		let stack_str = normalize_stack(self.stack_source.capture().as_deref());
		let event = DeprecationEvent::from_emission(message, options, stack_str);

		let (pass_through, first_capture) = {
			let mut state = self.state();
			let mut first_capture = false;
			if state.ignore {
				debug!("ignoring deprecation");
			} else {
				state.queue.push(event);
				let delivery = if state.watching {
					Delivery::Pending
				} else {
					Delivery::Count
				};
				let session = Arc::clone(&self);
				state.scheduler.schedule(async move {
					match delivery {
						Delivery::Pending => session.flush_pending().await,
						Delivery::Count => session.send_count(),
					}
				});
				first_capture = !std::mem::replace(&mut state.warned, true);
			}
			(state.toggle_deprecation_workflow, first_capture)
		};

		if first_capture {
			self.log.warn(FIRST_CAPTURE_WARNING);
		}
		if pass_through {
			proceed(message, options);
		}
	}

	/// Move every queued event into the store and deliver the groups the batch
	/// touched, followed by the new count.
	async fn flush_pending(self: Arc<Self>) {
		let _gate = self.flush_gate.lock().await;
		if self.is_destroyed() {
			return;
		}

		let plan = {
			let mut state = self.state();
			let batch = std::mem::take(&mut state.queue);
			state.store.plan(batch)
		};
		debug!(
			groups = plan.affected().len(),
			resolutions = plan.pending_resolutions(),
			"flushing deprecations"
		);

		let resolved = plan.resolve(&self.resolver).await;

		let groups = {
			let mut state = self.state();
			if self.is_destroyed() {
				return;
			}
			state.store.apply(resolved)
		};

		if let Some(deprecations) = groups {
			self.send(Outbound::DeprecationsAdded { deprecations });
			self.send_count();
		}
	}

	fn send_count(&self) {
		let count = self.state().count();
		self.send(Outbound::Count { count });
	}

	fn send(&self, outbound: Outbound) {
		if self.is_destroyed() {
			return;
		}
		match PortMessage::from_outbound(&outbound) {
			Ok(message) => self.port.send_message(message),
			Err(e) => warn!(error = %e, message = outbound.name(), "failed to encode outbound message"),
		}
	}
}
