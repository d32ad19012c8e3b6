//! GPU resource creation: buffers, textures, texture views, samplers.
//!
//! Grounded on `toybox-gfx/src/core/buffer.rs`'s `impl Core { create_buffer / destroy_buffer /
//! allocate_buffer_storage / map_buffer }` shape and `OpenGLResources.h`'s `OpenGLBuffer`/
//! `OpenGLTexture`/`OpenGLTextureView`/`OpenGLSampler` field layout. Functions here take `&gl::Gl`
//! directly rather than hanging off a single god object, since `Device` (this crate's analogue of the
//! donor's `Core`) composes them instead of inlining GL calls itself.

pub mod buffer;
pub mod texture;
pub mod texture_view;
pub mod sampler;

pub use buffer::{Buffer, BufferDesc, BufferUsage};
pub use texture::{Texture, TextureDesc, TextureKind, TextureUsage};
pub use texture_view::{TextureView, TextureViewDesc};
pub use sampler::{Sampler, SamplerDesc, FilterMode, WrapMode};
