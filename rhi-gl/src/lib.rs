//! An OpenGL 4.5 (Direct State Access) backend for a render hardware interface.
//!
//! Built around a single [`device::Device`] owning the GL function table, a frame-stamped
//! [`deletion_queue::DeletionQueue`], derived-object caches for framebuffers and vertex array
//! objects, and a [`state_cache::StateCache`] mirror that elides redundant driver calls.
//! [`command_context::CommandContext`] is the per-frame recording surface built on top of all of it.

pub mod capabilities;
pub mod caches;
pub mod command_context;
pub mod debug;
pub mod deletion_queue;
pub mod descriptor;
pub mod device;
pub mod error;
pub mod fence;
pub mod format;
pub mod handle;
pub mod pipeline;
pub mod program;
pub mod query;
pub mod resources;
pub mod shader;
pub mod state_cache;
pub mod swap_chain;

pub mod prelude {
	pub use crate::capabilities::Capabilities;
	pub use crate::command_context::{CommandContext, IndexFormat, RenderArea, RenderPassDesc, ResourceState};
	pub use crate::descriptor::{BindingKind, DescriptorResource, DescriptorSet, DescriptorSetLayout, LayoutBindingDesc};
	pub use crate::device::{Device, DeviceConfig};
	pub use crate::error::{Result, RhiError};
	pub use crate::fence::Fence;
	pub use crate::format::{Format, VertexComponentType};
	pub use crate::handle::{BufferName, FboName, ProgramName, QueryName, SamplerName, ShaderName, TextureName, VaoName};
	pub use crate::pipeline::{ComputePipeline, GraphicsPipeline, GraphicsPipelineState, PrimitiveTopology, VertexBufferSlotLayout, VertexInputLayout};
	pub use crate::program::Program;
	pub use crate::query::{QueryKind, QueryPool};
	pub use crate::resources::{Buffer, BufferDesc, BufferUsage, Sampler, SamplerDesc, Texture, TextureDesc, TextureKind, TextureUsage, TextureView, TextureViewDesc};
	pub use crate::shader::{Shader, ShaderStage};
	pub use crate::swap_chain::{PresentableSurface, SwapChain};
}
