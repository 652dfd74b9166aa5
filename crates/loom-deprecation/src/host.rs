// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Host-side deprecation handler registration.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

/// Continuation that hands an emission to the next handler in the host's chain.
pub type Proceed<'a> = &'a dyn Fn(&str, Option<&Value>);

/// A deprecation handler as registered with the host.
///
/// Receives the message, the untyped emission options and the continuation.
/// A handler that does not call the continuation swallows the emission.
pub type DeprecationHandler =
	Arc<dyn Fn(&str, Option<&Value>, &dyn Fn(&str, Option<&Value>)) + Send + Sync>;

/// The host's process-wide deprecation mechanism.
pub trait DeprecationHost: Send + Sync {
	fn register_deprecation_handler(&self, handler: DeprecationHandler) -> Registration;
}

/// Supplies the raw call stack at the point a deprecation is emitted.
pub trait StackSource: Send + Sync {
	/// `None` when the runtime exposes no stack.
	fn capture(&self) -> Option<String>;
}

/// [`StackSource`] for hosts that expose no stacks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStackSource;

impl StackSource for NoStackSource {
	fn capture(&self) -> Option<String> {
		None
	}
}

/// Handle to a registered handler. Unregisters on drop.
pub struct Registration {
	unregister: Option<Box<dyn FnOnce() + Send>>,
}

impl Registration {
	pub fn new(unregister: impl FnOnce() + Send + 'static) -> Self {
		Self {
			unregister: Some(Box::new(unregister)),
		}
	}

	/// A registration with nothing to undo.
	pub fn noop() -> Self {
		Self { unregister: None }
	}

	pub fn unregister(mut self) {
		self.run();
	}

	fn run(&mut self) {
		if let Some(unregister) = self.unregister.take() {
			unregister();
		}
	}
}

impl Drop for Registration {
	fn drop(&mut self) {
		self.run();
	}
}

impl std::fmt::Debug for Registration {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Registration")
			.field("active", &self.unregister.is_some())
			.finish()
	}
}

/// In-process [`DeprecationHost`] with chained handlers.
///
/// The most recently registered handler runs first; its continuation invokes
/// the next one, and the last continuation invokes the host's fallback.
#[derive(Clone, Default)]
pub struct HandlerChain {
	handlers: Arc<Mutex<Vec<(u64, DeprecationHandler)>>>,
	next_id: Arc<AtomicU64>,
}

impl HandlerChain {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	/// Emit a deprecation through the chain.
	pub fn emit(
		&self,
		message: &str,
		options: Option<&Value>,
		fallback: &dyn Fn(&str, Option<&Value>),
	) {
		// Snapshot so handlers may register or unregister while running.
		let handlers: Vec<DeprecationHandler> =
			self.lock().iter().map(|(_, h)| Arc::clone(h)).collect();
		run_chain(&handlers, message, options, fallback);
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(u64, DeprecationHandler)>> {
		self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

fn run_chain(
	handlers: &[DeprecationHandler],
	message: &str,
	options: Option<&Value>,
	fallback: &dyn Fn(&str, Option<&Value>),
) {
	match handlers.split_last() {
		Some((handler, rest)) => handler(message, options, &|m: &str, o: Option<&Value>| {
			run_chain(rest, m, o, fallback)
		}),
		None => fallback(message, options),
	}
}

impl DeprecationHost for HandlerChain {
	fn register_deprecation_handler(&self, handler: DeprecationHandler) -> Registration {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		self.lock().push((id, handler));

		let handlers = Arc::downgrade(&self.handlers);
		Registration::new(move || {
			if let Some(handlers) = handlers.upgrade() {
				handlers
					.lock()
					.unwrap_or_else(PoisonError::into_inner)
					.retain(|(existing, _)| *existing != id);
			}
		})
	}
}

impl std::fmt::Debug for HandlerChain {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HandlerChain")
			.field("handlers", &self.len())
			.finish()
	}
}
