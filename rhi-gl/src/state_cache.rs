//! Mirrors the GL global context so that redundant driver calls are elided.
//!
//! Every setter compares the new value against the mirror first and only issues the GL call (and
//! updates the mirror) on a mismatch. `invalidate()` resets every mirror to "unknown", after which the
//! next call of any kind goes through unconditionally. Grounded on the `Cell<Option<T>>`-guarded setter
//! idiom (`bound_shader_pipeline`, `current_blend_mode`, `depth_test_enabled` in the donor crate's
//! `core/global_state.rs` and `core/shader_pipeline.rs`), generalized to the full tracked-state set.

use std::cell::Cell;
use crate::handle::{BufferName, ProgramName, TextureName, SamplerName, VaoName, FboName};

pub const MAX_TEXTURE_SLOTS: usize = 32;
pub const MAX_UBO_SLOTS: usize = 16;
pub const MAX_SSBO_SLOTS: usize = 16;
pub const MAX_VERTEX_BUFFERS: usize = 16;
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
	pub x: f32,
	pub y: f32,
	pub width: f32,
	pub height: f32,
	pub min_depth: f32,
	pub max_depth: f32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Scissor {
	pub x: i32,
	pub y: i32,
	pub width: u32,
	pub height: u32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BlendState {
	pub enabled: bool,
	pub src_rgb: u32,
	pub dst_rgb: u32,
	pub src_alpha: u32,
	pub dst_alpha: u32,
	pub op_rgb: u32,
	pub op_alpha: u32,
	pub write_mask: u8,
}

impl Default for BlendState {
	fn default() -> Self {
		BlendState {
			enabled: false,
			src_rgb: gl::ONE, dst_rgb: gl::ZERO,
			src_alpha: gl::ONE, dst_alpha: gl::ZERO,
			op_rgb: gl::FUNC_ADD, op_alpha: gl::FUNC_ADD,
			write_mask: 0xF,
		}
	}
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DepthState {
	pub test_enabled: bool,
	pub write_enabled: bool,
	pub compare_func: u32,
}

impl Default for DepthState {
	fn default() -> Self {
		DepthState { test_enabled: false, write_enabled: true, compare_func: gl::LESS }
	}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StencilFaceState {
	pub fail_op: u32,
	pub depth_fail_op: u32,
	pub pass_op: u32,
	pub compare_func: u32,
	pub compare_mask: u32,
	pub write_mask: u32,
	pub reference: u32,
}

impl Default for StencilFaceState {
	fn default() -> Self {
		StencilFaceState {
			fail_op: gl::KEEP, depth_fail_op: gl::KEEP, pass_op: gl::KEEP,
			compare_func: gl::ALWAYS, compare_mask: 0xFFFF_FFFF, write_mask: 0xFFFF_FFFF,
			reference: 0,
		}
	}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct StencilState {
	pub enabled: bool,
	pub front: StencilFaceState,
	pub back: StencilFaceState,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RasterizerState {
	pub cull_mode: u32,
	pub front_face: u32,
	pub polygon_mode: u32,
	pub cull_enabled: bool,
	pub scissor_enabled: bool,
	pub depth_clamp_enabled: bool,
	pub depth_bias_constant: f32,
	pub depth_bias_slope: f32,
	pub line_width: f32,
}

impl Default for RasterizerState {
	fn default() -> Self {
		RasterizerState {
			cull_mode: gl::BACK, front_face: gl::CCW, polygon_mode: gl::FILL,
			cull_enabled: true, scissor_enabled: false, depth_clamp_enabled: false,
			depth_bias_constant: 0.0, depth_bias_slope: 0.0, line_width: 1.0,
		}
	}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct IndexedBufferBinding {
	buffer: BufferName,
	offset: i64,
	size: i64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct TextureBinding {
	target: u32,
	texture: TextureName,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct VertexBufferBinding {
	buffer: BufferName,
	offset: i64,
	stride: i32,
}

fn cell_array<T, const N: usize>() -> [Cell<Option<T>>; N] {
	std::array::from_fn(|_| Cell::new(None))
}

pub struct StateCache {
	bound_program: Cell<Option<ProgramName>>,
	bound_vao: Cell<Option<VaoName>>,
	bound_draw_fbo: Cell<Option<FboName>>,
	bound_read_fbo: Cell<Option<FboName>>,
	bound_index_buffer: Cell<Option<BufferName>>,

	ubo_bindings: [Cell<Option<IndexedBufferBinding>>; MAX_UBO_SLOTS],
	ssbo_bindings: [Cell<Option<IndexedBufferBinding>>; MAX_SSBO_SLOTS],
	texture_bindings: [Cell<Option<TextureBinding>>; MAX_TEXTURE_SLOTS],
	sampler_bindings: [Cell<Option<SamplerName>>; MAX_TEXTURE_SLOTS],
	vertex_buffer_bindings: [Cell<Option<VertexBufferBinding>>; MAX_VERTEX_BUFFERS],

	viewport: Cell<Option<Viewport>>,
	scissor: Cell<Option<Scissor>>,
	blend_states: [Cell<Option<BlendState>>; MAX_COLOR_ATTACHMENTS],
	depth_state: Cell<Option<DepthState>>,
	stencil_state: Cell<Option<StencilState>>,
	rasterizer_state: Cell<Option<RasterizerState>>,
	primitive_topology: Cell<Option<u32>>,
}

impl StateCache {
	pub fn new() -> Self {
		StateCache {
			bound_program: Cell::new(None),
			bound_vao: Cell::new(None),
			bound_draw_fbo: Cell::new(None),
			bound_read_fbo: Cell::new(None),
			bound_index_buffer: Cell::new(None),

			ubo_bindings: cell_array(),
			ssbo_bindings: cell_array(),
			texture_bindings: cell_array(),
			sampler_bindings: cell_array(),
			vertex_buffer_bindings: cell_array(),

			viewport: Cell::new(None),
			scissor: Cell::new(None),
			blend_states: cell_array(),
			depth_state: Cell::new(None),
			stencil_state: Cell::new(None),
			rasterizer_state: Cell::new(None),
			primitive_topology: Cell::new(None),
		}
	}

	/// Reset every mirror to "unknown". The next setter of any category issues its GL call
	/// unconditionally.
	pub fn invalidate(&self) {
		self.bound_program.set(None);
		self.bound_vao.set(None);
		self.bound_draw_fbo.set(None);
		self.bound_read_fbo.set(None);
		self.bound_index_buffer.set(None);

		for cell in &self.ubo_bindings { cell.set(None); }
		for cell in &self.ssbo_bindings { cell.set(None); }
		for cell in &self.texture_bindings { cell.set(None); }
		for cell in &self.sampler_bindings { cell.set(None); }
		for cell in &self.vertex_buffer_bindings { cell.set(None); }

		self.viewport.set(None);
		self.scissor.set(None);
		for cell in &self.blend_states { cell.set(None); }
		self.depth_state.set(None);
		self.stencil_state.set(None);
		self.rasterizer_state.set(None);
		self.primitive_topology.set(None);
	}

	pub fn bind_program(&self, gl: &gl::Gl, program: ProgramName) {
		if self.bound_program.get() == Some(program) { return }
		self.bound_program.set(Some(program));
		unsafe { gl.UseProgram(program.0) }
	}

	pub fn bind_vao(&self, gl: &gl::Gl, vao: VaoName) {
		if self.bound_vao.get() == Some(vao) { return }
		self.bound_vao.set(Some(vao));
		self.bound_index_buffer.set(None); // the element-array binding lives on the VAO
		unsafe { gl.BindVertexArray(vao.0) }
	}

	pub fn bind_draw_framebuffer(&self, gl: &gl::Gl, fbo: FboName) {
		if self.bound_draw_fbo.get() == Some(fbo) { return }
		self.bound_draw_fbo.set(Some(fbo));
		unsafe { gl.BindFramebuffer(gl::DRAW_FRAMEBUFFER, fbo.0) }
	}

	pub fn bind_read_framebuffer(&self, gl: &gl::Gl, fbo: FboName) {
		if self.bound_read_fbo.get() == Some(fbo) { return }
		self.bound_read_fbo.set(Some(fbo));
		unsafe { gl.BindFramebuffer(gl::READ_FRAMEBUFFER, fbo.0) }
	}

	/// Binds both draw and read targets, as `begin_render_pass` wants.
	pub fn bind_framebuffer(&self, gl: &gl::Gl, fbo: FboName) {
		self.bind_draw_framebuffer(gl, fbo);
		self.bind_read_framebuffer(gl, fbo);
	}

	pub fn bind_index_buffer(&self, gl: &gl::Gl, buffer: BufferName) {
		if self.bound_index_buffer.get() == Some(buffer) { return }
		self.bound_index_buffer.set(Some(buffer));
		// Relies on a VAO already being bound - index buffer state lives on the VAO in core GL.
		unsafe { gl.VertexArrayElementBuffer(self.bound_vao.get().unwrap_or(VaoName(0)).0, buffer.0) }
	}

	pub fn bind_uniform_buffer(&self, gl: &gl::Gl, slot: u32, buffer: BufferName, offset: i64, size: i64) {
		self.bind_indexed_buffer(gl, gl::UNIFORM_BUFFER, &self.ubo_bindings, slot, buffer, offset, size, MAX_UBO_SLOTS)
	}

	pub fn bind_storage_buffer(&self, gl: &gl::Gl, slot: u32, buffer: BufferName, offset: i64, size: i64) {
		self.bind_indexed_buffer(gl, gl::SHADER_STORAGE_BUFFER, &self.ssbo_bindings, slot, buffer, offset, size, MAX_SSBO_SLOTS)
	}

	fn bind_indexed_buffer(&self, gl: &gl::Gl, target: u32, bindings: &[Cell<Option<IndexedBufferBinding>>],
		slot: u32, buffer: BufferName, offset: i64, size: i64, max_slots: usize)
	{
		let slot = slot as usize;
		if slot >= max_slots {
			log::error!("state cache: indexed buffer slot {slot} out of range (max {max_slots})");
			return
		}

		let binding = IndexedBufferBinding { buffer, offset, size };
		if bindings[slot].get() == Some(binding) { return }
		bindings[slot].set(Some(binding));

		unsafe {
			if size == 0 {
				gl.BindBufferBase(target, slot as u32, buffer.0);
			} else {
				gl.BindBufferRange(target, slot as u32, buffer.0, offset as isize, size as isize);
			}
		}
	}

	pub fn bind_texture(&self, gl: &gl::Gl, slot: u32, target: u32, texture: TextureName) {
		let slot_idx = slot as usize;
		if slot_idx >= MAX_TEXTURE_SLOTS {
			log::error!("state cache: texture slot {slot} out of range (max {MAX_TEXTURE_SLOTS})");
			return
		}

		let binding = TextureBinding { target, texture };
		if self.texture_bindings[slot_idx].get() == Some(binding) { return }
		self.texture_bindings[slot_idx].set(Some(binding));
		unsafe { gl.BindTextureUnit(slot, texture.0) }
	}

	pub fn bind_sampler(&self, gl: &gl::Gl, slot: u32, sampler: SamplerName) {
		let slot_idx = slot as usize;
		if slot_idx >= MAX_TEXTURE_SLOTS {
			log::error!("state cache: sampler slot {slot} out of range (max {MAX_TEXTURE_SLOTS})");
			return
		}

		if self.sampler_bindings[slot_idx].get() == Some(sampler) { return }
		self.sampler_bindings[slot_idx].set(Some(sampler));
		unsafe { gl.BindSampler(slot, sampler.0) }
	}

	pub fn bind_image_texture(&self, gl: &gl::Gl, slot: u32, texture: TextureName, level: i32,
		layered: bool, layer: i32, access: u32, format: u32)
	{
		// Image unit bindings aren't a simple equality-of-slot mirror in the donor spec (level/layer/
		// access/format all participate), so this goes straight through - it's already used sparingly
		// relative to sampled-texture binds.
		unsafe {
			gl.BindImageTexture(slot, texture.0, level, layered as u8, layer, access, format);
		}
	}

	pub fn bind_vertex_buffer(&self, gl: &gl::Gl, vao: VaoName, slot: u32, buffer: BufferName, offset: i64, stride: i32) {
		let slot_idx = slot as usize;
		if slot_idx >= MAX_VERTEX_BUFFERS {
			log::error!("state cache: vertex buffer slot {slot} out of range (max {MAX_VERTEX_BUFFERS})");
			return
		}

		let binding = VertexBufferBinding { buffer, offset, stride };
		if self.vertex_buffer_bindings[slot_idx].get() == Some(binding) { return }
		self.vertex_buffer_bindings[slot_idx].set(Some(binding));
		unsafe { gl.VertexArrayVertexBuffer(vao.0, slot, buffer.0, offset as isize, stride) }
	}

	pub fn set_viewport(&self, gl: &gl::Gl, viewport: Viewport) {
		if self.viewport.get() == Some(viewport) { return }
		self.viewport.set(Some(viewport));
		unsafe {
			gl.ViewportIndexedf(0, viewport.x, viewport.y, viewport.width, viewport.height);
			gl.DepthRangef(viewport.min_depth, viewport.max_depth);
		}
	}

	pub fn set_scissor(&self, gl: &gl::Gl, scissor: Scissor) {
		if self.scissor.get() == Some(scissor) { return }
		self.scissor.set(Some(scissor));
		unsafe { gl.ScissorIndexed(0, scissor.x, scissor.y, scissor.width as i32, scissor.height as i32) }
	}

	pub fn set_blend_state(&self, gl: &gl::Gl, attachment: u32, state: BlendState) {
		let idx = attachment as usize;
		if idx >= MAX_COLOR_ATTACHMENTS {
			log::error!("state cache: blend attachment {attachment} out of range (max {MAX_COLOR_ATTACHMENTS})");
			return
		}

		if self.blend_states[idx].get() == Some(state) { return }
		self.blend_states[idx].set(Some(state));

		unsafe {
			if state.enabled {
				gl.Enablei(gl::BLEND, attachment);
			} else {
				gl.Disablei(gl::BLEND, attachment);
			}
			gl.BlendFuncSeparatei(attachment, state.src_rgb, state.dst_rgb, state.src_alpha, state.dst_alpha);
			gl.BlendEquationSeparatei(attachment, state.op_rgb, state.op_alpha);
			gl.ColorMaski(attachment,
				((state.write_mask & 0x1) != 0) as u8,
				((state.write_mask & 0x2) != 0) as u8,
				((state.write_mask & 0x4) != 0) as u8,
				((state.write_mask & 0x8) != 0) as u8);
		}
	}

	pub fn set_depth_state(&self, gl: &gl::Gl, state: DepthState) {
		if self.depth_state.get() == Some(state) { return }
		self.depth_state.set(Some(state));

		unsafe {
			if state.test_enabled { gl.Enable(gl::DEPTH_TEST) } else { gl.Disable(gl::DEPTH_TEST) }
			gl.DepthMask(state.write_enabled as u8);
			gl.DepthFunc(state.compare_func);
		}
	}

	pub fn set_stencil_state(&self, gl: &gl::Gl, state: StencilState) {
		if self.stencil_state.get() == Some(state) { return }
		self.stencil_state.set(Some(state));

		unsafe {
			if state.enabled { gl.Enable(gl::STENCIL_TEST) } else { gl.Disable(gl::STENCIL_TEST) }
			Self::apply_stencil_face(gl, gl::FRONT, &state.front);
			Self::apply_stencil_face(gl, gl::BACK, &state.back);
		}
	}

	/// Re-issues `StencilFuncSeparate` for both faces using the pipeline's captured compare function
	/// and read mask, replacing only the reference value - resolving the "should a dynamic stencil
	/// reference respect the pipeline's compare setup" open question in favor of respecting it.
	pub fn set_stencil_reference(&self, gl: &gl::Gl, state: &StencilState, reference: u32) {
		let mut front = state.front;
		let mut back = state.back;
		front.reference = reference;
		back.reference = reference;

		unsafe {
			gl.StencilFuncSeparate(gl::FRONT, front.compare_func, reference as i32, front.compare_mask);
			gl.StencilFuncSeparate(gl::BACK, back.compare_func, reference as i32, back.compare_mask);
		}

		let mut new_state = *state;
		new_state.front.reference = reference;
		new_state.back.reference = reference;
		self.stencil_state.set(Some(new_state));
	}

	fn apply_stencil_face(gl: &gl::Gl, face: u32, state: &StencilFaceState) {
		unsafe {
			gl.StencilFuncSeparate(face, state.compare_func, state.reference as i32, state.compare_mask);
			gl.StencilOpSeparate(face, state.fail_op, state.depth_fail_op, state.pass_op);
			gl.StencilMaskSeparate(face, state.write_mask);
		}
	}

	pub fn set_rasterizer_state(&self, gl: &gl::Gl, state: RasterizerState) {
		if self.rasterizer_state.get() == Some(state) { return }
		self.rasterizer_state.set(Some(state));

		unsafe {
			if state.cull_enabled { gl.Enable(gl::CULL_FACE) } else { gl.Disable(gl::CULL_FACE) }
			gl.CullFace(state.cull_mode);
			gl.FrontFace(state.front_face);
			gl.PolygonMode(gl::FRONT_AND_BACK, state.polygon_mode);
			if state.scissor_enabled { gl.Enable(gl::SCISSOR_TEST) } else { gl.Disable(gl::SCISSOR_TEST) }
			if state.depth_clamp_enabled { gl.Enable(gl::DEPTH_CLAMP) } else { gl.Disable(gl::DEPTH_CLAMP) }
			gl.PolygonOffset(state.depth_bias_slope, state.depth_bias_constant);
			gl.LineWidth(state.line_width);
		}
	}

	pub fn set_primitive_topology(&self, topology: u32) {
		// Topology isn't itself a GL call - it's consulted at draw-call time to pick the draw entry
		// point - but mirroring it here keeps all "what did we last ask for" state in one place.
		self.primitive_topology.set(Some(topology));
	}

	pub fn primitive_topology(&self) -> Option<u32> {
		self.primitive_topology.get()
	}

	pub fn depth_state(&self) -> Option<DepthState> {
		self.depth_state.get()
	}

	pub fn stencil_state(&self) -> Option<StencilState> {
		self.stencil_state.get()
	}
}

impl Default for StateCache {
	fn default() -> Self { Self::new() }
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn blend_default_is_disabled_additive_identity() {
		let state = BlendState::default();
		assert!(!state.enabled);
		assert_eq!(state.src_rgb, gl::ONE);
		assert_eq!(state.dst_rgb, gl::ZERO);
	}

	#[test]
	fn invalidate_resets_every_mirror() {
		let cache = StateCache::new();
		cache.bound_program.set(Some(ProgramName(7)));
		cache.viewport.set(Some(Viewport { x: 0.0, y: 0.0, width: 800.0, height: 600.0, min_depth: 0.0, max_depth: 1.0 }));
		cache.invalidate();

		assert_eq!(cache.bound_program.get(), None);
		assert_eq!(cache.viewport.get(), None);
	}
}
