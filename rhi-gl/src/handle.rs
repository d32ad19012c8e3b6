//! Newtype GL object handles.
//!
//! Every GPU object is an opaque non-zero `u32` the driver allocated. `0` is reserved: for
//! framebuffers it denotes the default framebuffer, elsewhere "none/invalid". Wrapping each kind in its
//! own type keeps a buffer handle from being passed where a texture handle is expected.

use std::fmt;

/// The GL object classes the deletion queue and debug layer need to distinguish.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceKind {
	Buffer,
	Texture,
	Sampler,
	Shader,
	Program,
	VertexArray,
	Framebuffer,
	Query,
}

/// Implemented by every handle newtype so generic code (deletion queue, debug labelling) can dispatch
/// on the right `gl::DELETE_*`/`gl::*_IDENTIFIER` entry points without a big match statement at every
/// call site.
pub trait ResourceName: Copy + fmt::Debug {
	const KIND: ResourceKind;
	const GL_IDENTIFIER: u32;

	fn as_raw(&self) -> u32;
	fn from_raw(raw: u32) -> Self;

	fn is_valid(&self) -> bool {
		self.as_raw() != 0
	}
}

macro_rules! gl_handle {
	($name:ident, $kind:expr, $gl_identifier:expr) => {
		#[derive(Copy, Clone, Eq, PartialEq, Hash)]
		pub struct $name(pub u32);

		impl $name {
			pub const INVALID: $name = $name(0);
		}

		impl fmt::Debug for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, concat!(stringify!($name), "({})"), self.0)
			}
		}

		impl ResourceName for $name {
			const KIND: ResourceKind = $kind;
			const GL_IDENTIFIER: u32 = $gl_identifier;

			fn as_raw(&self) -> u32 { self.0 }
			fn from_raw(raw: u32) -> Self { $name(raw) }
		}
	};
}

gl_handle!(BufferName, ResourceKind::Buffer, gl::BUFFER);
gl_handle!(TextureName, ResourceKind::Texture, gl::TEXTURE);
gl_handle!(SamplerName, ResourceKind::Sampler, gl::SAMPLER);
gl_handle!(ShaderName, ResourceKind::Shader, gl::SHADER);
gl_handle!(ProgramName, ResourceKind::Program, gl::PROGRAM);
gl_handle!(VaoName, ResourceKind::VertexArray, gl::VERTEX_ARRAY);
gl_handle!(FboName, ResourceKind::Framebuffer, gl::FRAMEBUFFER);
gl_handle!(QueryName, ResourceKind::Query, gl::QUERY);

impl FboName {
	/// The default, presentable framebuffer. Never stored in the FBO cache.
	pub const fn backbuffer() -> FboName { FboName(0) }
}
