//! Per-queue command encoding: render passes, barriers, draws, dispatches, copies, queries.
//!
//! Grounded on `OpenGLCommandContext` in
//! `original_source/RHI_OpenGL/Private/OpenGLCommandContext.h` - its full lifecycle/render-pass/
//! pipeline/buffer/descriptor/draw/dispatch/copy/query/dynamic-state method surface is reproduced here,
//! generalized onto this crate's `StateCache`/`FboCache`/`VaoCache`.

use smallvec::SmallVec;
use tracing::instrument;

use crate::caches::fbo_cache::{Attachment, FboCache, FboCacheKey};
use crate::caches::vao_cache::{VaoCache, VertexBufferSlot};
use crate::debug::DebugGroup;
use crate::deletion_queue::DeletionQueue;
use crate::descriptor::{DescriptorResource, DescriptorSet};
use crate::error::{Result, RhiError};
use crate::handle::{BufferName, FboName, TextureName, VaoName};
use crate::pipeline::{ComputePipeline, GraphicsPipeline, PrimitiveTopology};
use crate::query::QueryPool;
use crate::resources::texture::TextureKind;
use crate::state_cache::StateCache;

pub const MAX_VERTEX_BUFFER_BINDINGS: usize = 16;
pub const MAX_DESCRIPTOR_SETS: usize = 4;

/// Minimum number of contiguously-indexed texture/sampler bindings worth batching into a single
/// `glBindTextures`/`glBindSamplers` call rather than issuing them individually. Two is the smallest
/// run a multi-bind can save a call on.
const MIN_MULTI_BIND_RUN: usize = 2;

/// The state a resource was in before, or is being transitioned to, around a `glMemoryBarrier` split
/// point. Grounded on the before/after-state transition table in the donor header's `ResourceBarrier`
/// implementation: a barrier is computed from a `(state_before, state_after)` pair rather than a single
/// flattened "usage", since `UnorderedAccess` as the *before* state always needs its own barrier bits
/// regardless of what the resource transitions to next - the driver can't otherwise tell that a prior
/// arbitrary shader read/write has finished.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceState {
	VertexBufferRead,
	IndexBufferRead,
	UniformBufferRead,
	SampledTextureRead,
	IndirectCommandRead,
	TransferSource,
	TransferDestination,
	ColorAttachmentWrite,
	DepthStencilAttachmentWrite,
	/// Arbitrary shader-visible read/write access - shader storage buffers and storage images alike.
	UnorderedAccess,
}

fn barrier_bits_for_state(state: ResourceState) -> u32 {
	use ResourceState::*;
	match state {
		VertexBufferRead => gl::VERTEX_ATTRIB_ARRAY_BARRIER_BIT,
		IndexBufferRead => gl::ELEMENT_ARRAY_BARRIER_BIT,
		UniformBufferRead => gl::UNIFORM_BARRIER_BIT,
		SampledTextureRead => gl::TEXTURE_FETCH_BARRIER_BIT,
		IndirectCommandRead => gl::COMMAND_BARRIER_BIT,
		TransferSource | TransferDestination => gl::BUFFER_UPDATE_BARRIER_BIT | gl::TEXTURE_UPDATE_BARRIER_BIT,
		ColorAttachmentWrite | DepthStencilAttachmentWrite => gl::FRAMEBUFFER_BARRIER_BIT,
		UnorderedAccess => gl::SHADER_STORAGE_BARRIER_BIT | gl::SHADER_IMAGE_ACCESS_BARRIER_BIT,
	}
}

#[derive(Debug, Clone)]
pub struct RenderPassColorAttachment {
	pub attachment: Attachment,
	pub clear: Option<[f32; 4]>,
}

#[derive(Debug, Clone)]
pub struct RenderPassDepthStencilAttachment {
	pub attachment: Attachment,
	pub attachment_point: u32,
	pub clear_depth: Option<f32>,
	pub clear_stencil: Option<i32>,
}

/// The pixel rectangle a render pass covers. Doubles as the FBO cache key's dimensions (so two
/// attachment sets covering different areas never alias the same cached FBO) and the default viewport
/// `begin_render_pass` establishes before any draw in the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderArea {
	pub width: u32,
	pub height: u32,
	/// Array layers covered for layered rendering; `1` for a plain 2D render target.
	pub layers: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RenderPassDesc {
	pub color_attachments: SmallVec<[RenderPassColorAttachment; 8]>,
	pub depth_stencil_attachment: Option<RenderPassDepthStencilAttachment>,
	pub render_area: RenderArea,
}

/// GL index type backing an index buffer; chosen per-draw since a single buffer can be reused with
/// either element width across draws.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum IndexFormat {
	U16,
	U32,
}

impl IndexFormat {
	fn to_raw(self) -> u32 {
		match self {
			IndexFormat::U16 => gl::UNSIGNED_SHORT,
			IndexFormat::U32 => gl::UNSIGNED_INT,
		}
	}

	fn byte_width(self) -> usize {
		match self {
			IndexFormat::U16 => 2,
			IndexFormat::U32 => 4,
		}
	}
}

/// Binding index the push-constant-equivalent uniform buffer is always bound at - reserved by
/// `DescriptorSetLayout::build` (uniform buffer indices start counting at 1).
const PUSH_CONSTANT_BINDING: u32 = 0;

#[derive(Clone, Copy)]
struct VertexBufferBinding {
	buffer: BufferName,
	offset: i64,
	stride: i32,
}

pub struct CommandContext<'a> {
	state_cache: &'a StateCache,
	fbo_cache: &'a FboCache,
	vao_cache: &'a VaoCache,
	deletion_queue: &'a DeletionQueue,

	current_frame: u64,
	pending_barrier_bits: u32,

	active_fbo: Option<FboName>,
	in_render_pass: bool,
	vertex_buffers: [Option<VertexBufferBinding>; MAX_VERTEX_BUFFER_BINDINGS],
	index_buffer: Option<BufferName>,
	index_format: IndexFormat,
	bound_vao: Option<VaoName>,
	topology: Option<PrimitiveTopology>,
}

impl<'a> CommandContext<'a> {
	pub fn new(state_cache: &'a StateCache, fbo_cache: &'a FboCache, vao_cache: &'a VaoCache,
		deletion_queue: &'a DeletionQueue, current_frame: u64) -> Self
	{
		CommandContext {
			state_cache, fbo_cache, vao_cache, deletion_queue,
			current_frame,
			pending_barrier_bits: 0,
			active_fbo: None,
			in_render_pass: false,
			vertex_buffers: Default::default(),
			index_buffer: None,
			index_format: IndexFormat::U32,
			bound_vao: None,
			topology: None,
		}
	}

	/// Resets all per-encoding state back to its just-constructed form. An open render pass is
	/// implicitly closed first (with a warning - callers should call `end_render_pass` themselves).
	pub fn reset(&mut self) {
		if self.in_render_pass {
			log::warn!("command context reset with a render pass still open");
		}
		let frame = self.current_frame;
		*self = CommandContext::new(self.state_cache, self.fbo_cache, self.vao_cache, self.deletion_queue, frame);
	}

	/// Binds the per-draw push-constant-equivalent uniform buffer at its reserved binding.
	pub fn set_push_constants(&self, gl: &gl::Gl, buffer: BufferName, offset: i64, size: i64) {
		self.state_cache.bind_uniform_buffer(gl, PUSH_CONSTANT_BINDING, buffer, offset, size);
	}

	pub fn push_debug_group<'gl>(&self, gl: &'gl gl::Gl, label: &str) -> DebugGroup<'gl> {
		DebugGroup::push(gl, label)
	}

	/// Accumulates a barrier requirement for a resource moving from `state_before` to `state_after`,
	/// without issuing it yet - callers typically call this once per resource being transitioned, then
	/// `flush_barriers` once before the draw/dispatch that depends on all of them, coalescing what
	/// would otherwise be several `glMemoryBarrier` calls into a single bitmask OR.
	///
	/// `state_before == UnorderedAccess` always contributes its own barrier bits in addition to
	/// whatever `state_after` needs - an arbitrary shader read/write must be fenced off from everything
	/// that follows it, not just a specific next usage.
	pub fn resource_barrier(&mut self, state_before: ResourceState, state_after: ResourceState) {
		self.pending_barrier_bits |= barrier_bits_for_state(state_after);
		if state_before == ResourceState::UnorderedAccess {
			self.pending_barrier_bits |= barrier_bits_for_state(ResourceState::UnorderedAccess);
		}
	}

	/// A barrier between two render passes where neither side names a concrete resource ("end of
	/// subpass" style split barriers) - there's no GL equivalent for a synchronization scope this
	/// coarse, so this is a documented no-op rather than an approximation that could under- or
	/// over-synchronize.
	pub fn split_barrier(&mut self) {}

	pub fn flush_barriers(&mut self, gl: &gl::Gl) {
		if self.pending_barrier_bits == 0 { return }
		unsafe { gl.MemoryBarrier(self.pending_barrier_bits) }
		self.pending_barrier_bits = 0;
	}

	#[instrument(skip_all)]
	pub fn begin_render_pass(&mut self, gl: &gl::Gl, desc: &RenderPassDesc) -> Result<()> {
		let fbo = if desc.color_attachments.is_empty() && desc.depth_stencil_attachment.is_none() {
			FboName::backbuffer()
		} else {
			let key = FboCacheKey {
				color_attachments: desc.color_attachments.iter().map(|c| c.attachment).collect(),
				depth_stencil_attachment: desc.depth_stencil_attachment.as_ref().map(|d| d.attachment),
				depth_stencil_attachment_point: desc.depth_stencil_attachment.as_ref()
					.map_or(gl::DEPTH_ATTACHMENT, |d| d.attachment_point),
				width: desc.render_area.width,
				height: desc.render_area.height,
				layers: desc.render_area.layers.max(1),
			};
			self.fbo_cache.get_or_create(gl, self.deletion_queue, &key, self.current_frame)?
		};

		self.state_cache.bind_framebuffer(gl, fbo);
		self.active_fbo = Some(fbo);
		self.in_render_pass = true;

		self.state_cache.set_viewport(gl, crate::state_cache::Viewport {
			x: 0.0, y: 0.0,
			width: desc.render_area.width as f32,
			height: desc.render_area.height as f32,
			min_depth: 0.0, max_depth: 1.0,
		});

		unsafe {
			for (index, color) in desc.color_attachments.iter().enumerate() {
				if let Some(clear) = color.clear {
					gl.ClearNamedFramebufferfv(fbo.0, gl::COLOR, index as i32, clear.as_ptr());
				}
			}

			if let Some(depth_stencil) = &desc.depth_stencil_attachment {
				match (depth_stencil.clear_depth, depth_stencil.clear_stencil) {
					(Some(depth), Some(stencil)) => gl.ClearNamedFramebufferfi(fbo.0, gl::DEPTH_STENCIL, 0, depth, stencil),
					(Some(depth), None) => gl.ClearNamedFramebufferfv(fbo.0, gl::DEPTH, 0, &depth),
					(None, Some(stencil)) => gl.ClearNamedFramebufferiv(fbo.0, gl::STENCIL, 0, &stencil),
					(None, None) => {}
				}
			}
		}

		Ok(())
	}

	pub fn end_render_pass(&mut self) {
		if !self.in_render_pass {
			log::warn!("end_render_pass called with no render pass open");
		}
		self.active_fbo = None;
		self.in_render_pass = false;
	}

	pub fn bind_graphics_pipeline(&mut self, gl: &gl::Gl, pipeline: &GraphicsPipeline) {
		self.state_cache.bind_program(gl, pipeline.program.name);
		self.topology = Some(pipeline.state.topology);

		for (index, blend) in pipeline.state.blend_states.iter().enumerate() {
			self.state_cache.set_blend_state(gl, index as u32, *blend);
		}
		self.state_cache.set_depth_state(gl, pipeline.state.depth_state);
		self.state_cache.set_stencil_state(gl, pipeline.state.stencil_state);
		self.state_cache.set_rasterizer_state(gl, pipeline.state.rasterizer_state);

		self.sync_vao(gl, pipeline);
	}

	pub fn bind_compute_pipeline(&self, gl: &gl::Gl, pipeline: &ComputePipeline) {
		self.state_cache.bind_program(gl, pipeline.program.name);
	}

	fn sync_vao(&mut self, gl: &gl::Gl, pipeline: &GraphicsPipeline) {
		use crate::caches::vao_cache::VaoCacheKey;

		// The pipeline's layout only names binding slots and divisors; the concrete buffer, stride, and
		// offset come from whatever's actually bound to each slot right now. A slot the pipeline
		// declares but that has nothing bound yet is skipped - its VAO binding is established lazily the
		// next time a real buffer lands in that slot and the pipeline is rebound.
		let buffer_slots: SmallVec<[VertexBufferSlot; 16]> = pipeline.vertex_input.buffer_slots.iter()
			.filter_map(|slot_layout| {
				let bound = self.vertex_buffers.get(slot_layout.binding as usize)?.as_ref()?;
				Some(VertexBufferSlot {
					binding: slot_layout.binding,
					buffer: bound.buffer,
					stride: bound.stride,
					offset: bound.offset,
					divisor: slot_layout.divisor,
				})
			})
			.collect();

		let key = VaoCacheKey {
			attributes: pipeline.vertex_input.attributes.iter().copied().collect(),
			buffer_slots,
			index_buffer: self.index_buffer,
		};

		// VAO creation never fails in a way this crate surfaces to the caller (completeness isn't
		// checked the way FBO completeness is - a malformed layout is a programmer error caught by
		// validation layers upstream of this backend).
		let vao = self.vao_cache.get_or_create(gl, self.deletion_queue, &key, self.current_frame);
		self.state_cache.bind_vao(gl, vao);
		self.bound_vao = Some(vao);

		for (slot_index, binding) in self.vertex_buffers.iter().enumerate() {
			if let Some(binding) = binding {
				self.state_cache.bind_vertex_buffer(gl, vao, slot_index as u32, binding.buffer, binding.offset, binding.stride);
			}
		}

		if let Some(index_buffer) = self.index_buffer {
			self.state_cache.bind_index_buffer(gl, index_buffer);
		}
	}

	pub fn bind_vertex_buffer(&mut self, gl: &gl::Gl, slot: u32, buffer: BufferName, offset: i64, stride: i32) {
		let slot_idx = slot as usize;
		if slot_idx >= MAX_VERTEX_BUFFER_BINDINGS {
			log::error!("command context: vertex buffer slot {slot} out of range");
			return
		}
		self.vertex_buffers[slot_idx] = Some(VertexBufferBinding { buffer, offset, stride });

		if let Some(vao) = self.bound_vao {
			self.state_cache.bind_vertex_buffer(gl, vao, slot, buffer, offset, stride);
		}
	}

	pub fn bind_index_buffer(&mut self, gl: &gl::Gl, buffer: BufferName, format: IndexFormat) {
		self.index_buffer = Some(buffer);
		self.index_format = format;
		self.state_cache.bind_index_buffer(gl, buffer);
	}

	pub fn bind_descriptor_set(&self, gl: &gl::Gl, set_index: u32, set: &DescriptorSet, buffer_sizes: impl Fn(BufferName) -> i64, dynamic_offsets: &[i64]) -> Result<()> {
		if set_index as usize >= MAX_DESCRIPTOR_SETS {
			return Err(RhiError::misuse(format!("descriptor set index {set_index} out of range")))
		}

		let resolved = set.resolve(buffer_sizes, dynamic_offsets)?;

		// Gather sampled-texture bindings and batch contiguous runs of binding indices into a single
		// `glBindTextures`/`glBindSamplers` call apiece, instead of one `BindTextureUnit`/`BindSampler`
		// pair per slot. This bypasses `state_cache`'s redundant-call elision for the slots it covers -
		// checking every cell in a run individually before deciding whether the batched call is worth
		// issuing would cost as much as just issuing it, so a qualifying run is always (re-)bound.
		let mut textures: SmallVec<[(u32, TextureName, crate::handle::SamplerName); 32]> = resolved.iter()
			.filter_map(|(binding_index, resource)| match resource {
				DescriptorResource::Texture { texture, sampler } => Some((*binding_index, *texture, *sampler)),
				_ => None,
			})
			.collect();
		textures.sort_unstable_by_key(|(binding_index, ..)| *binding_index);

		let mut multi_bound: SmallVec<[u32; 32]> = SmallVec::new();
		let mut run_start = 0;
		while run_start < textures.len() {
			let mut run_end = run_start + 1;
			while run_end < textures.len() && textures[run_end].0 == textures[run_end - 1].0 + 1 {
				run_end += 1;
			}

			let run = &textures[run_start..run_end];
			if run.len() >= MIN_MULTI_BIND_RUN {
				let first_unit = run[0].0;
				let texture_ids: SmallVec<[u32; 32]> = run.iter().map(|(_, t, _)| t.0).collect();
				let sampler_ids: SmallVec<[u32; 32]> = run.iter().map(|(_, _, s)| s.0).collect();
				unsafe {
					gl.BindTextures(first_unit, run.len() as i32, texture_ids.as_ptr());
					gl.BindSamplers(first_unit, run.len() as i32, sampler_ids.as_ptr());
				}
				multi_bound.extend(run.iter().map(|(binding_index, ..)| *binding_index));
			}

			run_start = run_end;
		}

		for (binding_index, resource) in resolved {
			match resource {
				DescriptorResource::Buffer { buffer, offset, size } => {
					// Caller is responsible for having separated uniform vs storage buffer bindings
					// into distinct layout slots; this dispatches purely on the binding index range
					// convention documented on `DescriptorSetLayout::build`.
					if binding_index >= 1 {
						self.state_cache.bind_uniform_buffer(gl, binding_index, buffer, offset, size);
					}
				}
				DescriptorResource::Texture { texture, sampler } => {
					if multi_bound.contains(&binding_index) { continue }
					self.state_cache.bind_texture(gl, binding_index, gl::TEXTURE_2D, texture);
					self.state_cache.bind_sampler(gl, binding_index, sampler);
				}
				DescriptorResource::StorageImage { texture, level, access, format } => {
					self.state_cache.bind_image_texture(gl, binding_index, texture, level, false, 0, access, format);
				}
			}
		}

		Ok(())
	}

	pub fn set_viewport(&self, gl: &gl::Gl, viewport: crate::state_cache::Viewport) {
		self.state_cache.set_viewport(gl, viewport);
	}

	pub fn set_scissor(&self, gl: &gl::Gl, scissor: crate::state_cache::Scissor) {
		self.state_cache.set_scissor(gl, scissor);
	}

	/// Re-issues `StencilFuncSeparate` for both faces using the currently bound pipeline's compare
	/// function and read mask, changing only the reference value.
	pub fn set_stencil_reference(&self, gl: &gl::Gl, reference: u32) {
		let Some(state) = self.state_cache.stencil_state() else {
			log::warn!("set_stencil_reference called with no stencil state bound");
			return
		};
		self.state_cache.set_stencil_reference(gl, &state, reference);
	}

	/// Issues a draw, picking the plain `DrawArrays` entry point when neither instancing nor a
	/// base-instance offset is in play, and only reaching for the `*Instanced*`/`BaseInstance` variants
	/// when the caller actually asked for one - `glDrawArraysInstancedBaseInstance` is legal either way,
	/// but some drivers take a slower path for it than for the entry point a non-instanced draw expects.
	#[instrument(skip(self, gl))]
	pub fn draw(&self, gl: &gl::Gl, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) -> Result<()> {
		let topology = self.topology.ok_or_else(|| RhiError::misuse("draw called with no pipeline bound"))?;
		unsafe {
			match (instance_count, first_instance) {
				(1, 0) => gl.DrawArrays(topology.to_raw(), first_vertex as i32, vertex_count as i32),
				(_, 0) => gl.DrawArraysInstanced(topology.to_raw(), first_vertex as i32, vertex_count as i32, instance_count as i32),
				(_, _) => gl.DrawArraysInstancedBaseInstance(topology.to_raw(), first_vertex as i32, vertex_count as i32, instance_count as i32, first_instance),
			}
		}
		Ok(())
	}

	/// Same entry-point selection as `draw`, additionally choosing `BaseVertex` variants only when
	/// `vertex_offset` is non-zero.
	#[instrument(skip(self, gl))]
	pub fn draw_indexed(&self, gl: &gl::Gl, index_count: u32, instance_count: u32, first_index: u32, vertex_offset: i32, first_instance: u32) -> Result<()> {
		let topology = self.topology.ok_or_else(|| RhiError::misuse("draw_indexed called with no pipeline bound"))?;
		if self.index_buffer.is_none() {
			return Err(RhiError::misuse("draw_indexed called with no index buffer bound"))
		}

		let index_type = self.index_format.to_raw();
		let index_byte_offset = (first_index as usize * self.index_format.byte_width()) as *const std::ffi::c_void;
		unsafe {
			match (instance_count, vertex_offset, first_instance) {
				(1, 0, 0) =>
					gl.DrawElements(topology.to_raw(), index_count as i32, index_type, index_byte_offset),
				(1, _, 0) =>
					gl.DrawElementsBaseVertex(topology.to_raw(), index_count as i32, index_type, index_byte_offset, vertex_offset),
				(_, 0, 0) =>
					gl.DrawElementsInstanced(topology.to_raw(), index_count as i32, index_type, index_byte_offset, instance_count as i32),
				(_, _, 0) =>
					gl.DrawElementsInstancedBaseVertex(topology.to_raw(), index_count as i32, index_type, index_byte_offset, instance_count as i32, vertex_offset),
				(_, _, _) =>
					gl.DrawElementsInstancedBaseVertexBaseInstance(topology.to_raw(), index_count as i32, index_type,
						index_byte_offset, instance_count as i32, vertex_offset, first_instance),
			}
		}
		Ok(())
	}

	pub fn draw_indirect(&self, gl: &gl::Gl, indirect_buffer: BufferName, offset: i64, draw_count: u32, stride: i32) -> Result<()> {
		let topology = self.topology.ok_or_else(|| RhiError::misuse("draw_indirect called with no pipeline bound"))?;
		unsafe {
			gl.BindBuffer(gl::DRAW_INDIRECT_BUFFER, indirect_buffer.0);
			gl.MultiDrawArraysIndirect(topology.to_raw(), offset as *const std::ffi::c_void, draw_count as i32, stride);
		}
		Ok(())
	}

	pub fn draw_indexed_indirect(&self, gl: &gl::Gl, indirect_buffer: BufferName, offset: i64, draw_count: u32, stride: i32) -> Result<()> {
		let topology = self.topology.ok_or_else(|| RhiError::misuse("draw_indexed_indirect called with no pipeline bound"))?;
		if self.index_buffer.is_none() {
			return Err(RhiError::misuse("draw_indexed_indirect called with no index buffer bound"))
		}
		unsafe {
			gl.BindBuffer(gl::DRAW_INDIRECT_BUFFER, indirect_buffer.0);
			gl.MultiDrawElementsIndirect(topology.to_raw(), self.index_format.to_raw(), offset as *const std::ffi::c_void, draw_count as i32, stride);
		}
		Ok(())
	}

	pub fn dispatch(&self, gl: &gl::Gl, group_count_x: u32, group_count_y: u32, group_count_z: u32) {
		unsafe { gl.DispatchCompute(group_count_x, group_count_y, group_count_z) }
	}

	pub fn dispatch_indirect(&self, gl: &gl::Gl, indirect_buffer: BufferName, offset: i64) {
		unsafe {
			gl.BindBuffer(gl::DISPATCH_INDIRECT_BUFFER, indirect_buffer.0);
			gl.DispatchComputeIndirect(offset as isize);
		}
	}

	pub fn copy_buffer(&self, gl: &gl::Gl, src: BufferName, src_offset: i64, dst: BufferName, dst_offset: i64, size: i64) {
		unsafe {
			gl.CopyNamedBufferSubData(src.0, dst.0, src_offset as isize, dst_offset as isize, size as isize);
		}
	}

	pub fn copy_texture_to_texture(&self, gl: &gl::Gl, src: TextureName, src_kind: TextureKind, src_level: i32,
		dst: TextureName, dst_kind: TextureKind, dst_level: i32, width: u32, height: u32)
	{
		unsafe {
			gl.CopyImageSubData(src.0, src_kind.to_target(), src_level, 0, 0, 0,
				dst.0, dst_kind.to_target(), dst_level, 0, 0, 0,
				width as i32, height as i32, 1);
		}
	}

	/// Uploads from a pixel-unpack buffer into a texture region - the buffer-backed counterpart to
	/// `Texture::upload`'s client-memory path, routed through `PIXEL_UNPACK_BUFFER` so the transfer can
	/// run asynchronously relative to the CPU.
	pub fn copy_buffer_to_texture(&self, gl: &gl::Gl, src: BufferName, src_offset: i64,
		dst: TextureName, dst_kind: TextureKind, dst_level: i32, x: u32, y: u32, z: u32, width: u32, height: u32, depth: u32,
		format: crate::format::Format)
	{
		unsafe {
			gl.BindBuffer(gl::PIXEL_UNPACK_BUFFER, src.0);
			match dst_kind {
				TextureKind::Texture2D | TextureKind::TextureCube =>
					gl.TextureSubImage2D(dst.0, dst_level, x as i32, y as i32, width as i32, height as i32,
						format.to_unsized_format(), format.to_component_type(), src_offset as *const std::ffi::c_void),
				TextureKind::Texture2DArray | TextureKind::Texture3D =>
					gl.TextureSubImage3D(dst.0, dst_level, x as i32, y as i32, z as i32, width as i32, height as i32, depth as i32,
						format.to_unsized_format(), format.to_component_type(), src_offset as *const std::ffi::c_void),
			}
			gl.BindBuffer(gl::PIXEL_UNPACK_BUFFER, 0);
		}
	}

	/// Reads a texture region into a pixel-pack buffer - the buffer-backed counterpart for readback,
	/// via `GetTextureSubImage` so it works uniformly across texture kinds without a `glReadPixels`
	/// framebuffer bind.
	pub fn copy_texture_to_buffer(&self, gl: &gl::Gl, src: TextureName, src_level: i32, x: u32, y: u32, z: u32,
		width: u32, height: u32, depth: u32, format: crate::format::Format, dst: BufferName, dst_offset: i64, buffer_size: i64)
	{
		unsafe {
			gl.BindBuffer(gl::PIXEL_PACK_BUFFER, dst.0);
			gl.GetTextureSubImage(src.0, src_level, x as i32, y as i32, z as i32, width as i32, height as i32, depth as i32,
				format.to_unsized_format(), format.to_component_type(), (buffer_size - dst_offset) as i32, dst_offset as *mut std::ffi::c_void);
			gl.BindBuffer(gl::PIXEL_PACK_BUFFER, 0);
		}
	}

	pub fn begin_query(&self, gl: &gl::Gl, pool: &QueryPool, index: u32) -> Result<()> {
		pool.begin(gl, index)
	}

	pub fn end_query(&self, gl: &gl::Gl, pool: &QueryPool) {
		pool.end(gl);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn split_barrier_is_a_documented_no_op() {
		let state_cache = StateCache::new();
		let fbo_cache = FboCache::new();
		let vao_cache = VaoCache::new();
		let deletion_queue = DeletionQueue::new();
		let mut ctx = CommandContext::new(&state_cache, &fbo_cache, &vao_cache, &deletion_queue, 0);
		ctx.split_barrier();
		assert_eq!(ctx.pending_barrier_bits, 0);
	}

	#[test]
	fn resource_barrier_accumulates_distinct_bits() {
		let state_cache = StateCache::new();
		let fbo_cache = FboCache::new();
		let vao_cache = VaoCache::new();
		let deletion_queue = DeletionQueue::new();
		let mut ctx = CommandContext::new(&state_cache, &fbo_cache, &vao_cache, &deletion_queue, 0);
		ctx.resource_barrier(ResourceState::UnorderedAccess, ResourceState::SampledTextureRead);
		ctx.resource_barrier(ResourceState::UnorderedAccess, ResourceState::VertexBufferRead);
		assert_eq!(ctx.pending_barrier_bits,
			gl::SHADER_STORAGE_BARRIER_BIT | gl::SHADER_IMAGE_ACCESS_BARRIER_BIT
				| gl::TEXTURE_FETCH_BARRIER_BIT | gl::VERTEX_ATTRIB_ARRAY_BARRIER_BIT);
	}

	#[test]
	fn reset_clears_accumulated_barrier_bits_and_frame_is_preserved() {
		let state_cache = StateCache::new();
		let fbo_cache = FboCache::new();
		let vao_cache = VaoCache::new();
		let deletion_queue = DeletionQueue::new();
		let mut ctx = CommandContext::new(&state_cache, &fbo_cache, &vao_cache, &deletion_queue, 7);
		ctx.resource_barrier(ResourceState::UnorderedAccess, ResourceState::UnorderedAccess);
		ctx.reset();
		assert_eq!(ctx.pending_barrier_bits, 0);
		assert_eq!(ctx.current_frame, 7);
	}

	#[test]
	fn fresh_context_defaults_to_32_bit_indices() {
		let state_cache = StateCache::new();
		let fbo_cache = FboCache::new();
		let vao_cache = VaoCache::new();
		let deletion_queue = DeletionQueue::new();
		let ctx = CommandContext::new(&state_cache, &fbo_cache, &vao_cache, &deletion_queue, 0);
		assert_eq!(ctx.index_format, IndexFormat::U32);
	}
}
