//! Graphics and compute pipeline state objects.
//!
//! Unlike Vulkan-style backends, GL has no monolithic pipeline object to create up front - a
//! "pipeline" here is a bundle of a linked `Program` plus the fixed-function state
//! (`command_context`/`state_cache` apply at draw time) and a vertex input layout description the VAO
//! cache hashes against. Grounded on `OpenGLCommandContext::SetGraphicsPipeline`'s captured-state shape
//! in `original_source/RHI_OpenGL/Private/OpenGLCommandContext.h`.

use std::sync::Arc;

use crate::caches::vao_cache::VertexAttribute;
use crate::program::Program;
use crate::state_cache::{BlendState, DepthState, RasterizerState, StencilState};

/// A vertex buffer slot as declared by a pipeline's input layout - binding index and instancing
/// divisor only. The concrete buffer, stride, and offset aren't known until a buffer is actually bound
/// at draw time, so they live on `crate::caches::vao_cache::VertexBufferSlot` instead, assembled by
/// `CommandContext::sync_vao` from this layout plus the currently bound vertex buffers.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct VertexBufferSlotLayout {
	pub binding: u32,
	pub divisor: u32,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum PrimitiveTopology {
	Points,
	Lines,
	LineStrip,
	Triangles,
	TriangleStrip,
}

impl PrimitiveTopology {
	pub fn to_raw(self) -> u32 {
		match self {
			PrimitiveTopology::Points => gl::POINTS,
			PrimitiveTopology::Lines => gl::LINES,
			PrimitiveTopology::LineStrip => gl::LINE_STRIP,
			PrimitiveTopology::Triangles => gl::TRIANGLES,
			PrimitiveTopology::TriangleStrip => gl::TRIANGLE_STRIP,
		}
	}
}

#[derive(Debug, Clone)]
pub struct VertexInputLayout {
	pub attributes: Vec<VertexAttribute>,
	pub buffer_slots: Vec<VertexBufferSlotLayout>,
}

impl VertexInputLayout {
	/// A structural hash used as (part of) the VAO cache key; kept separate from `Hash`/`Eq` on the
	/// cache key type itself so pipelines can precompute it once at creation instead of re-hashing
	/// the attribute list on every draw.
	pub fn input_layout_hash(&self) -> u64 {
		use std::hash::{Hash, Hasher};
		let mut hasher = std::collections::hash_map::DefaultHasher::new();
		self.attributes.hash(&mut hasher);
		self.buffer_slots.hash(&mut hasher);
		hasher.finish()
	}
}

#[derive(Debug, Clone, Copy)]
pub struct GraphicsPipelineState {
	pub topology: PrimitiveTopology,
	pub blend_states: [BlendState; crate::state_cache::MAX_COLOR_ATTACHMENTS],
	pub depth_state: DepthState,
	pub stencil_state: StencilState,
	pub rasterizer_state: RasterizerState,
}

pub struct GraphicsPipeline {
	pub program: Arc<Program>,
	pub vertex_input: VertexInputLayout,
	pub state: GraphicsPipelineState,
}

impl GraphicsPipeline {
	pub fn new(program: Arc<Program>, vertex_input: VertexInputLayout, state: GraphicsPipelineState) -> GraphicsPipeline {
		GraphicsPipeline { program, vertex_input, state }
	}
}

pub struct ComputePipeline {
	pub program: Arc<Program>,
}

impl ComputePipeline {
	pub fn new(program: Arc<Program>) -> ComputePipeline {
		ComputePipeline { program }
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identical_vertex_layouts_hash_identically() {
		let layout_a = VertexInputLayout {
			attributes: vec![VertexAttribute {
				location: 0, buffer_slot: 0,
				component_type: crate::format::VertexComponentType::F32,
				component_count: 3, normalized: false, relative_offset: 0,
			}],
			buffer_slots: vec![VertexBufferSlotLayout { binding: 0, divisor: 0 }],
		};
		let layout_b = layout_a.clone();
		assert_eq!(layout_a.input_layout_hash(), layout_b.input_layout_hash());
	}
}
