//! CPU/GPU synchronization via `GLsync` fences, exposed as a monotonically increasing timeline value.
//!
//! Grounded on `OpenGLFence`/`SyncPoint` in `original_source/RHI_OpenGL/Private/OpenGLSync.h`: each
//! `signal` inserts a new `glFenceSync` object stamped with the next timeline value; `wait`/`poll`
//! walk forward from the last-known-signalled value, client-waiting on each `GLsync` in turn so a
//! caller waiting for value N only blocks on the fences between the last observed value and N.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{Result, RhiError};

struct SyncPoint {
	value: u64,
	sync: gl::types::GLsync,
}

// GLsync is an opaque driver pointer; moving it between threads is the same contract as any other GL
// object name, so long as callers don't call gl functions on it from a thread without the context.
unsafe impl Send for SyncPoint {}

pub struct Fence {
	pending: Mutex<VecDeque<SyncPoint>>,
	last_signalled: std::sync::atomic::AtomicU64,
	signalled_value: std::sync::atomic::AtomicU64,
}

impl Fence {
	pub fn new() -> Self {
		Fence {
			pending: Mutex::new(VecDeque::new()),
			last_signalled: std::sync::atomic::AtomicU64::new(0),
			signalled_value: std::sync::atomic::AtomicU64::new(0),
		}
	}

	/// Inserts a new sync object into the GL command stream, associated with `value`. Must be called
	/// from the GL thread, after the work that should precede `value` has been submitted. `value` must
	/// be strictly greater than every value signalled so far; out-of-order calls are logged and ignored
	/// rather than corrupting the timeline.
	pub fn signal(&self, gl: &gl::Gl, value: u64) {
		let signalled_value = self.signalled_value.load(std::sync::atomic::Ordering::Acquire);
		if value <= signalled_value {
			log::warn!("fence signal called with non-increasing value {value} (already at {signalled_value})");
			return
		}

		let sync = unsafe { gl.FenceSync(gl::SYNC_GPU_COMMANDS_COMPLETE, 0) };
		self.pending.lock().unwrap().push_back(SyncPoint { value, sync });
		self.signalled_value.store(value, std::sync::atomic::Ordering::Release);
	}

	/// Returns the highest timeline value known to have completed, without blocking. Polls every
	/// pending sync object in order and stops at the first one that hasn't signalled yet.
	pub fn poll(&self, gl: &gl::Gl) -> u64 {
		let mut pending = self.pending.lock().unwrap();

		while let Some(front) = pending.front() {
			let status = unsafe { gl.ClientWaitSync(front.sync, 0, 0) };
			if status == gl::ALREADY_SIGNALED || status == gl::CONDITION_SATISFIED {
				let completed = pending.pop_front().unwrap();
				unsafe { gl.DeleteSync(completed.sync) }
				self.last_signalled.store(completed.value, std::sync::atomic::Ordering::Release);
			} else {
				break
			}
		}

		self.last_signalled.load(std::sync::atomic::Ordering::Acquire)
	}

	/// Blocks the calling thread until the timeline reaches at least `value`, or `timeout_ns` elapses.
	pub fn wait(&self, gl: &gl::Gl, value: u64, timeout_ns: u64) -> Result<()> {
		if self.last_signalled.load(std::sync::atomic::Ordering::Acquire) >= value {
			return Ok(())
		}

		let target: Option<gl::types::GLsync> = {
			let pending = self.pending.lock().unwrap();
			pending.iter().find(|p| p.value >= value).map(|p| p.sync)
		};

		if let Some(sync) = target {
			let status = unsafe { gl.ClientWaitSync(sync, gl::SYNC_FLUSH_COMMANDS_BIT, timeout_ns) };
			if status == gl::TIMEOUT_EXPIRED {
				return Err(RhiError::gpu_timeout(format!("fence wait for value {value} timed out after {timeout_ns}ns")))
			}
			if status == gl::WAIT_FAILED {
				return Err(RhiError::gpu_timeout("ClientWaitSync failed"))
			}
		}

		self.poll(gl);
		Ok(())
	}

	pub fn last_signalled_value(&self) -> u64 {
		self.last_signalled.load(std::sync::atomic::Ordering::Acquire)
	}

	/// Deletes every outstanding sync object without waiting on them. Used on device shutdown.
	///
	/// Sync objects are deleted directly here and in `poll`, not routed through `DeletionQueue`: the
	/// queue's whole purpose is delaying a delete until the GPU has caught up with in-flight reads of a
	/// resource, but a `GLsync` is only ever deleted after `ClientWaitSync`/`poll` has already observed
	/// its corresponding work complete (or, here, unconditionally at shutdown) - there's nothing further
	/// to wait out.
	pub fn flush(&self, gl: &gl::Gl) {
		let mut pending = self.pending.lock().unwrap();
		for point in pending.drain(..) {
			unsafe { gl.DeleteSync(point.sync) }
		}
	}
}

impl Default for Fence {
	fn default() -> Self { Self::new() }
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fresh_fence_reports_zero_signalled() {
		let fence = Fence::new();
		assert_eq!(fence.last_signalled_value(), 0);
	}

	#[test]
	fn signalled_value_tracks_the_high_water_mark() {
		let fence = Fence::new();
		fence.signalled_value.store(5, std::sync::atomic::Ordering::Release);
		assert_eq!(fence.signalled_value.load(std::sync::atomic::Ordering::Acquire), 5);
	}
}
