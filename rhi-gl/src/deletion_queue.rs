//! Frame-delayed destruction of GL objects.
//!
//! A resource can be dropped on the Rust side while the GPU is still reading it from a command buffer
//! recorded 1-2 frames ago, so every delete is stamped with the frame it was requested on and only
//! actually issued once `FRAME_DELAY` further frames have completed. Grounded on `OpenGLDeletionQueue`
//! (`GLDeletionEntry`, `QueueBufferDeletion`/`QueueTextureDeletion`/.../`ProcessDeletions`/`FlushAll`) in
//! `original_source/RHI_OpenGL/Private/OpenGLDeletionQueue.h`; the mutex-guarded `VecDeque` replaces the
//! original's intrusive queue but keeps its FIFO-by-frame processing order.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use crate::handle::{BufferName, TextureName, SamplerName, ShaderName, ProgramName, VaoName, FboName, QueryName};

/// Number of frames a resource must outlive its deletion request by before the GL call is issued.
/// Matches `RVX_GL_MAX_FRAME_COUNT` / `FRAME_DELAY` in the donor source - three frames in flight.
pub const FRAME_DELAY: u64 = 3;

/// Wraps a raw `GLsync` so it can sit in the same queue as the `u32`-handle resources. `GLsync` is an
/// opaque driver pointer - moving it between threads is the same contract as any other GL object name.
#[derive(Copy, Clone)]
struct SyncObject(gl::types::GLsync);
unsafe impl Send for SyncObject {}

impl fmt::Debug for SyncObject {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SyncObject({:p})", self.0)
	}
}

enum DeletionEntry {
	Buffer(BufferName),
	Texture(TextureName),
	Sampler(SamplerName),
	Shader(ShaderName),
	Program(ProgramName),
	VertexArray(VaoName),
	Framebuffer(FboName),
	Query(QueryName),
	Sync(SyncObject),
	/// An arbitrary deferred action - used for deletions (or other cleanup) that don't fit the
	/// fixed GL-object-kind shape above.
	Custom(Box<dyn FnOnce(&gl::Gl) + Send>),
}

impl fmt::Debug for DeletionEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DeletionEntry::Buffer(n) => write!(f, "Buffer({n:?})"),
			DeletionEntry::Texture(n) => write!(f, "Texture({n:?})"),
			DeletionEntry::Sampler(n) => write!(f, "Sampler({n:?})"),
			DeletionEntry::Shader(n) => write!(f, "Shader({n:?})"),
			DeletionEntry::Program(n) => write!(f, "Program({n:?})"),
			DeletionEntry::VertexArray(n) => write!(f, "VertexArray({n:?})"),
			DeletionEntry::Framebuffer(n) => write!(f, "Framebuffer({n:?})"),
			DeletionEntry::Query(n) => write!(f, "Query({n:?})"),
			DeletionEntry::Sync(s) => write!(f, "Sync({s:?})"),
			DeletionEntry::Custom(_) => write!(f, "Custom(..)"),
		}
	}
}

struct QueuedDeletion {
	entry: DeletionEntry,
	requested_frame: u64,
}

/// FIFO of pending GL object deletions, stamped by the frame they were requested on.
pub struct DeletionQueue {
	pending: Mutex<VecDeque<QueuedDeletion>>,
	frame_delay: u64,
}

impl DeletionQueue {
	pub fn new() -> Self {
		Self::with_frame_delay(FRAME_DELAY)
	}

	/// Overrides the default `FRAME_DELAY` - wired to `DeviceConfig::frames_in_flight` so a host
	/// targeting a deeper or shallower in-flight-frame count gets matching reclamation latency.
	pub fn with_frame_delay(frame_delay: u64) -> Self {
		DeletionQueue { pending: Mutex::new(VecDeque::new()), frame_delay }
	}

	pub fn queue_buffer(&self, frame: u64, name: BufferName) {
		self.push(frame, DeletionEntry::Buffer(name));
	}

	pub fn queue_texture(&self, frame: u64, name: TextureName) {
		self.push(frame, DeletionEntry::Texture(name));
	}

	pub fn queue_sampler(&self, frame: u64, name: SamplerName) {
		self.push(frame, DeletionEntry::Sampler(name));
	}

	pub fn queue_shader(&self, frame: u64, name: ShaderName) {
		self.push(frame, DeletionEntry::Shader(name));
	}

	pub fn queue_program(&self, frame: u64, name: ProgramName) {
		self.push(frame, DeletionEntry::Program(name));
	}

	pub fn queue_vertex_array(&self, frame: u64, name: VaoName) {
		self.push(frame, DeletionEntry::VertexArray(name));
	}

	pub fn queue_framebuffer(&self, frame: u64, name: FboName) {
		self.push(frame, DeletionEntry::Framebuffer(name));
	}

	pub fn queue_query(&self, frame: u64, name: QueryName) {
		self.push(frame, DeletionEntry::Query(name));
	}

	/// Queues a raw `GLsync` object for deletion. `Fence` deletes its own sync objects immediately
	/// once `ClientWaitSync`/`poll` has observed them complete, since by that point no further delay
	/// is needed - this exists for callers that hold onto a `GLsync` outside that lifecycle.
	pub fn queue_sync(&self, frame: u64, sync: gl::types::GLsync) {
		self.push(frame, DeletionEntry::Sync(SyncObject(sync)));
	}

	/// Queues an arbitrary action to run on the GL thread once `frame`'s delay has elapsed.
	pub fn queue_custom(&self, frame: u64, action: impl FnOnce(&gl::Gl) + Send + 'static) {
		self.push(frame, DeletionEntry::Custom(Box::new(action)));
	}

	fn push(&self, frame: u64, entry: DeletionEntry) {
		self.pending.lock().unwrap().push_back(QueuedDeletion { entry, requested_frame: frame });
	}

	/// Issues GL deletes for every entry whose `FRAME_DELAY` has elapsed as of `current_frame`. Must
	/// only be called from the thread that owns the GL context.
	pub fn process(&self, gl: &gl::Gl, current_frame: u64) {
		let mut pending = self.pending.lock().unwrap();

		while let Some(front) = pending.front() {
			if current_frame < front.requested_frame + self.frame_delay {
				break
			}
			let queued = pending.pop_front().unwrap();
			drop_now(gl, queued.entry);
		}
	}

	/// Issues every pending delete immediately, regardless of frame delay. Used on device shutdown.
	pub fn flush_all(&self, gl: &gl::Gl) {
		let mut pending = self.pending.lock().unwrap();
		while let Some(queued) = pending.pop_front() {
			drop_now(gl, queued.entry);
		}
	}

	pub fn pending_count(&self) -> usize {
		self.pending.lock().unwrap().len()
	}
}

impl Default for DeletionQueue {
	fn default() -> Self { Self::new() }
}

fn drop_now(gl: &gl::Gl, entry: DeletionEntry) {
	unsafe {
		match entry {
			DeletionEntry::Buffer(name) => gl.DeleteBuffers(1, &name.0),
			DeletionEntry::Texture(name) => gl.DeleteTextures(1, &name.0),
			DeletionEntry::Sampler(name) => gl.DeleteSamplers(1, &name.0),
			DeletionEntry::Shader(name) => gl.DeleteShader(name.0),
			DeletionEntry::Program(name) => gl.DeleteProgram(name.0),
			DeletionEntry::VertexArray(name) => gl.DeleteVertexArrays(1, &name.0),
			DeletionEntry::Framebuffer(name) => gl.DeleteFramebuffers(1, &name.0),
			DeletionEntry::Query(name) => gl.DeleteQueries(1, &name.0),
			DeletionEntry::Sync(sync) => gl.DeleteSync(sync.0),
			DeletionEntry::Custom(action) => action(gl),
		}
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn nothing_is_due_before_frame_delay_elapses() {
		let queue = DeletionQueue::new();
		queue.queue_buffer(10, BufferName(5));
		assert_eq!(queue.pending_count(), 1);
		// Can't call process() without a live gl::Gl, so this only exercises the bookkeeping that
		// doesn't require a context: enqueue order and count.
	}

	#[test]
	fn with_frame_delay_overrides_the_default() {
		let queue = DeletionQueue::with_frame_delay(1);
		assert_eq!(queue.frame_delay, 1);
	}

	#[test]
	fn queueing_preserves_fifo_order() {
		let queue = DeletionQueue::new();
		queue.queue_buffer(0, BufferName(1));
		queue.queue_buffer(0, BufferName(2));
		queue.queue_texture(1, TextureName(3));

		let pending = queue.pending.lock().unwrap();
		assert_eq!(pending.len(), 3);
		match &pending[0].entry {
			DeletionEntry::Buffer(name) => assert_eq!(*name, BufferName(1)),
			_ => panic!("expected buffer first"),
		}
	}

	#[test]
	fn custom_entries_enqueue_like_any_other_kind() {
		let queue = DeletionQueue::new();
		queue.queue_custom(0, |_gl| {});
		assert_eq!(queue.pending_count(), 1);
	}
}
