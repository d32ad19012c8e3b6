//! Ties the rest of the crate together: owns the GL function table, the derived-object caches, the
//! deletion queue, and the per-frame counter that stamps both.
//!
//! Grounded on `toybox-gfx/src/core.rs`'s `Core` (the single object a consuming application holds,
//! wrapping `gl::Gl` plus the subsystems built on top of it) and `OpenGLDevice`'s constructor/
//! capability-query/subsystem-accessor shape in
//! `original_source/RHI_OpenGL/Private/OpenGLDevice.h`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::ThreadId;

use crate::caches::{FboCache, VaoCache};
use crate::capabilities::Capabilities;
use crate::command_context::CommandContext;
use crate::debug;
use crate::deletion_queue::DeletionQueue;
use crate::error::Result;
use crate::fence::Fence;
use crate::pipeline::{ComputePipeline, GraphicsPipeline, GraphicsPipelineState, VertexInputLayout};
use crate::program::Program;
use crate::query::{QueryKind, QueryPool};
use crate::resources::buffer::{Buffer, BufferDesc};
use crate::resources::sampler::{Sampler, SamplerDesc};
use crate::resources::texture::{Texture, TextureDesc};
use crate::resources::texture_view::{TextureView, TextureViewDesc};
use crate::shader::{Shader, ShaderStage};
use crate::state_cache::StateCache;
use std::sync::Arc;

pub struct DeviceConfig {
	/// Installs the `KHR_debug` callback and enables synchronous debug output. Only meaningful if
	/// the context was itself created with a debug flag - enabling this against a non-debug context
	/// is harmless but the callback simply never fires.
	pub enable_debug_layer: bool,
	/// Number of frames a deletion-queue entry must outlive its enqueue frame by before its GL
	/// deleter is actually called. Matches `crate::deletion_queue::FRAME_DELAY` by default.
	pub frames_in_flight: u64,
}

impl Default for DeviceConfig {
	fn default() -> Self {
		DeviceConfig {
			enable_debug_layer: cfg!(debug_assertions),
			frames_in_flight: crate::deletion_queue::FRAME_DELAY,
		}
	}
}

pub struct Device {
	gl: gl::Gl,
	capabilities: Capabilities,

	state_cache: StateCache,
	fbo_cache: FboCache,
	vao_cache: VaoCache,
	deletion_queue: DeletionQueue,
	frame_fence: Fence,

	current_frame: AtomicU64,
	gl_thread_id: ThreadId,
}

impl Device {
	/// `gl` must come from an already-current OpenGL 4.5 core context; this crate never creates one.
	pub fn new(gl: gl::Gl, config: DeviceConfig) -> Result<Device> {
		let _span = tracing::info_span!("rhi-gl device init").entered();

		let capabilities = Capabilities::query(&gl);
		log::info!("opengl {}.{} ({} / {})", capabilities.major_version, capabilities.minor_version,
			capabilities.vendor, capabilities.renderer);

		if capabilities.major_version < 4 || (capabilities.major_version == 4 && capabilities.minor_version < 5) {
			return Err(crate::error::RhiError::unsupported(format!(
				"backend requires OpenGL 4.5, found {}.{}", capabilities.major_version, capabilities.minor_version)))
		}

		if config.enable_debug_layer && capabilities.supports_debug_output {
			debug::install_debug_callback(&gl);
		}

		Ok(Device {
			gl,
			capabilities,
			state_cache: StateCache::new(),
			fbo_cache: FboCache::new(),
			vao_cache: VaoCache::new(),
			deletion_queue: DeletionQueue::with_frame_delay(config.frames_in_flight),
			frame_fence: Fence::new(),
			current_frame: AtomicU64::new(0),
			gl_thread_id: std::thread::current().id(),
		})
	}

	/// Whether the calling thread is the one the GL context was current on at construction. Intended
	/// for `debug_assert!`s at the top of GL-calling entry points, not as a runtime-enforced guard.
	pub fn is_on_gl_thread(&self) -> bool {
		std::thread::current().id() == self.gl_thread_id
	}

	/// Blocks the calling thread until all previously issued GL commands have completed.
	pub fn wait_idle(&self) {
		unsafe { self.gl.Finish() }
	}

	pub fn gl(&self) -> &gl::Gl {
		&self.gl
	}

	pub fn capabilities(&self) -> &Capabilities {
		&self.capabilities
	}

	pub fn current_frame(&self) -> u64 {
		self.current_frame.load(Ordering::Acquire)
	}

	pub fn deletion_queue(&self) -> &DeletionQueue {
		&self.deletion_queue
	}

	pub fn state_cache(&self) -> &StateCache {
		&self.state_cache
	}

	pub fn fbo_cache(&self) -> &FboCache {
		&self.fbo_cache
	}

	pub fn vao_cache(&self) -> &VaoCache {
		&self.vao_cache
	}

	pub fn frame_fence(&self) -> &Fence {
		&self.frame_fence
	}

	/// Thin pass-throughs to each resource type's own `create`/`compile`/`link` constructor - `Device`
	/// is the single entry point a consuming application reaches for, but the construction logic itself
	/// stays on the resource types so it's usable (e.g. in tests) without a whole `Device` in hand.
	pub fn create_buffer(&self, desc: &BufferDesc) -> Result<Buffer> {
		Buffer::create(&self.gl, desc)
	}

	pub fn create_texture(&self, desc: &TextureDesc) -> Result<Texture> {
		Texture::create(&self.gl, desc)
	}

	pub fn create_texture_view(&self, desc: &TextureViewDesc) -> Result<TextureView> {
		TextureView::create(&self.gl, desc)
	}

	pub fn create_sampler(&self, desc: &SamplerDesc) -> Result<Sampler> {
		Sampler::create(&self.gl, desc)
	}

	pub fn create_shader(&self, stage: ShaderStage, source: &str, debug_label: Option<&str>) -> Result<Shader> {
		Shader::compile(&self.gl, stage, source, debug_label)
	}

	pub fn create_program(&self, stages: &[Shader], debug_label: Option<&str>) -> Result<Program> {
		Program::link(&self.gl, stages, debug_label)
	}

	pub fn create_query_pool(&self, kind: QueryKind, count: u32) -> Result<QueryPool> {
		QueryPool::create(&self.gl, kind, count)
	}

	/// No GL calls are issued here - a graphics pipeline is just a bundle of a linked program and fixed
	/// function state applied at draw time - but `Device` still offers the constructor so callers don't
	/// need to import `GraphicsPipeline` separately from everything else they build through `Device`.
	pub fn create_graphics_pipeline(&self, program: Arc<Program>, vertex_input: VertexInputLayout, state: GraphicsPipelineState) -> GraphicsPipeline {
		GraphicsPipeline::new(program, vertex_input, state)
	}

	pub fn create_compute_pipeline(&self, program: Arc<Program>) -> ComputePipeline {
		ComputePipeline::new(program)
	}

	pub fn begin_frame(&self) -> CommandContext<'_> {
		let frame = self.current_frame.load(Ordering::Acquire);
		CommandContext::new(&self.state_cache, &self.fbo_cache, &self.vao_cache, &self.deletion_queue, frame)
	}

	/// Processes due deletions, runs cache age-based cleanup, signals the frame fence, and advances
	/// the frame counter. Must be the last thing called for a frame, on the GL thread.
	#[tracing::instrument(skip_all)]
	pub fn end_frame(&self) {
		let frame = self.current_frame.fetch_add(1, Ordering::AcqRel);

		self.deletion_queue.process(&self.gl, frame + 1);
		self.fbo_cache.cleanup(&self.deletion_queue, frame + 1);
		self.vao_cache.cleanup(&self.deletion_queue, frame + 1);
		self.frame_fence.signal(&self.gl, frame + 1);
	}

	/// Waits for all in-flight GPU work to complete, flushes every pending deletion, and tears down
	/// the derived-object caches. Call once, right before the context itself is destroyed.
	pub fn shutdown(&self) {
		self.wait_idle();

		self.frame_fence.flush(&self.gl);
		self.fbo_cache.clear(&self.deletion_queue, self.current_frame.load(Ordering::Acquire));
		self.vao_cache.clear(&self.deletion_queue, self.current_frame.load(Ordering::Acquire));
		self.deletion_queue.flush_all(&self.gl);

		self.state_cache.invalidate();
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_config_enables_debug_layer_only_in_debug_builds() {
		let config = DeviceConfig::default();
		assert_eq!(config.enable_debug_layer, cfg!(debug_assertions));
		assert_eq!(config.frames_in_flight, crate::deletion_queue::FRAME_DELAY);
	}
}
