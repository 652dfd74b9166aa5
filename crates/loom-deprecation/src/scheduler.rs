// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Trailing-edge debounce for deliveries.

use std::future::Future;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

/// A timer waiting to start a delivery. Aborted on drop.
///
/// Only the wait is cancellable: once the delay elapses the action is spawned
/// as its own task, so cancelling a fired timer never interrupts a delivery
/// that is already running.
#[derive(Debug)]
pub struct DeferredTask {
	handle: JoinHandle<()>,
}

impl DeferredTask {
	pub fn cancel(self) {
		self.handle.abort();
	}

	/// True while the delay has not yet elapsed.
	pub fn is_pending(&self) -> bool {
		!self.handle.is_finished()
	}
}

impl Drop for DeferredTask {
	fn drop(&mut self) {
		self.handle.abort();
	}
}

/// Holds at most one pending [`DeferredTask`].
///
/// Every [`schedule`](Self::schedule) replaces whatever was pending, so a
/// burst of schedules runs only the last action, one delay after the last
/// schedule.
#[derive(Debug)]
pub struct DeliveryScheduler {
	runtime: Handle,
	delay: Duration,
	pending: Option<DeferredTask>,
}

impl DeliveryScheduler {
	pub fn new(runtime: Handle, delay: Duration) -> Self {
		Self {
			runtime,
			delay,
			pending: None,
		}
	}

	pub fn delay(&self) -> Duration {
		self.delay
	}

	/// Cancel any pending action and arm `action` to run after the delay.
	pub fn schedule<F>(&mut self, action: F)
	where
		F: Future<Output = ()> + Send + 'static,
	{
		self.cancel();

		let delay = self.delay;
		let runtime = self.runtime.clone();
		let handle = self.runtime.spawn(async move {
			tokio::time::sleep(delay).await;
			runtime.spawn(action);
		});
		trace!(delay_ms = delay.as_millis() as u64, "delivery scheduled");
		self.pending = Some(DeferredTask { handle });
	}

	/// Cancel the pending action, if any. Returns whether one was still waiting.
	pub fn cancel(&mut self) -> bool {
		match self.pending.take() {
			Some(task) => {
				let was_pending = task.is_pending();
				task.cancel();
				was_pending
			}
			None => false,
		}
	}

	pub fn is_pending(&self) -> bool {
		self.pending.as_ref().is_some_and(DeferredTask::is_pending)
	}
}
