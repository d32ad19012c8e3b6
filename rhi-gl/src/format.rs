//! Mapping from the crate's own pixel/vertex format vocabulary to concrete GL enums.
//!
//! Every other resource-creation path (texture storage allocation, texture views, FBO attachment
//! classification, vertex attribute setup) needs one of the queries below instead of hand-rolling a
//! GL enum match at the call site.

/// A color or depth/stencil format, named the way the rest of the public API spells it.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Format {
	R8Unorm,
	Rg8Unorm,
	Rgba8Unorm,
	Rgba8Srgb,
	R16Float,
	Rg16Float,
	Rgba16Float,
	R32Float,
	Rg32Float,
	Rgba32Float,
	R32Uint,
	R32Sint,
	Rgba32Uint,
	Rgba32Sint,
	R11G11B10Float,
	Rgb10A2Unorm,
	Rgb10A2Uint,
	Depth16Unorm,
	Depth32Float,
	Depth24UnormStencil8,
	Depth32FloatStencil8,
	Stencil8,
}

impl Format {
	/// Sized internal format used for storage allocation (`TexStorage*`, `NamedBufferStorage` doesn't
	/// apply here — this is textures only).
	pub fn to_internal_format(self) -> u32 {
		use Format::*;
		match self {
			R8Unorm => gl::R8,
			Rg8Unorm => gl::RG8,
			Rgba8Unorm => gl::RGBA8,
			Rgba8Srgb => gl::SRGB8_ALPHA8,
			R16Float => gl::R16F,
			Rg16Float => gl::RG16F,
			Rgba16Float => gl::RGBA16F,
			R32Float => gl::R32F,
			Rg32Float => gl::RG32F,
			Rgba32Float => gl::RGBA32F,
			R32Uint => gl::R32UI,
			R32Sint => gl::R32I,
			Rgba32Uint => gl::RGBA32UI,
			Rgba32Sint => gl::RGBA32I,
			R11G11B10Float => gl::R11F_G11F_B10F,
			Rgb10A2Unorm => gl::RGB10_A2,
			Rgb10A2Uint => gl::RGB10_A2UI,
			Depth16Unorm => gl::DEPTH_COMPONENT16,
			Depth32Float => gl::DEPTH_COMPONENT32F,
			Depth24UnormStencil8 => gl::DEPTH24_STENCIL8,
			Depth32FloatStencil8 => gl::DEPTH32F_STENCIL8,
			Stencil8 => gl::STENCIL_INDEX8,
		}
	}

	/// Unsized base format used for `TexSubImage*`/`GetTextureSubImage` transfer calls.
	pub fn to_unsized_format(self) -> u32 {
		use Format::*;
		match self {
			R8Unorm | R16Float | R32Float => gl::RED,
			R32Uint | R32Sint => gl::RED_INTEGER,
			Rg8Unorm | Rg16Float | Rg32Float => gl::RG,
			Rgba8Unorm | Rgba8Srgb | Rgba16Float | Rgba32Float
				| R11G11B10Float | Rgb10A2Unorm => gl::RGBA,
			Rgba32Uint | Rgba32Sint | Rgb10A2Uint => gl::RGBA_INTEGER,
			Depth16Unorm | Depth32Float => gl::DEPTH_COMPONENT,
			Depth24UnormStencil8 | Depth32FloatStencil8 => gl::DEPTH_STENCIL,
			Stencil8 => gl::STENCIL_INDEX,
		}
	}

	/// Component type used alongside `to_unsized_format` for transfer calls.
	pub fn to_component_type(self) -> u32 {
		use Format::*;
		match self {
			R8Unorm | Rg8Unorm | Rgba8Unorm | Rgba8Srgb => gl::UNSIGNED_BYTE,
			R16Float | Rg16Float | Rgba16Float => gl::HALF_FLOAT,
			R32Float | Rg32Float | Rgba32Float => gl::FLOAT,
			R32Uint | Rgba32Uint => gl::UNSIGNED_INT,
			R32Sint | Rgba32Sint => gl::INT,
			R11G11B10Float => gl::UNSIGNED_INT_10F_11F_11F_REV,
			Rgb10A2Unorm => gl::UNSIGNED_INT_2_10_10_10_REV,
			Rgb10A2Uint => gl::UNSIGNED_INT_2_10_10_10_REV,
			Depth16Unorm => gl::UNSIGNED_SHORT,
			Depth32Float => gl::FLOAT,
			Depth24UnormStencil8 => gl::UNSIGNED_INT_24_8,
			Depth32FloatStencil8 => gl::FLOAT_32_UNSIGNED_INT_24_8_REV,
			Stencil8 => gl::UNSIGNED_BYTE,
		}
	}

	pub fn texel_byte_size(self) -> u32 {
		use Format::*;
		match self {
			R8Unorm | Stencil8 => 1,
			Rg8Unorm | R16Float | Depth16Unorm => 2,
			Rgba8Unorm | Rgba8Srgb | Rg16Float | R32Float | R32Uint | R32Sint
				| R11G11B10Float | Rgb10A2Unorm | Rgb10A2Uint
				| Depth32Float | Depth24UnormStencil8 => 4,
			Rgba16Float | Rg32Float => 8,
			Rgba32Float | Rgba32Uint | Rgba32Sint => 16,
			Depth32FloatStencil8 => 5,
		}
	}

	pub fn is_depth(self) -> bool {
		matches!(self, Format::Depth16Unorm | Format::Depth32Float
			| Format::Depth24UnormStencil8 | Format::Depth32FloatStencil8)
	}

	pub fn is_stencil(self) -> bool {
		matches!(self, Format::Stencil8)
	}

	pub fn is_depth_stencil(self) -> bool {
		matches!(self, Format::Depth24UnormStencil8 | Format::Depth32FloatStencil8)
	}

	/// Which `DEPTH_ATTACHMENT` vs `DEPTH_STENCIL_ATTACHMENT` the FBO cache should bind this format to.
	pub fn depth_stencil_attachment_point(self) -> u32 {
		if self.is_depth_stencil() {
			gl::DEPTH_STENCIL_ATTACHMENT
		} else if self.is_stencil() {
			gl::STENCIL_ATTACHMENT
		} else {
			gl::DEPTH_ATTACHMENT
		}
	}
}


/// Vertex attribute component type, independent of `Format` (vertex buffers aren't textures).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexComponentType {
	F32,
	U8,
	U16,
	U32,
	I8,
	I16,
	I32,
}

impl VertexComponentType {
	pub fn to_raw(self) -> u32 {
		match self {
			VertexComponentType::F32 => gl::FLOAT,
			VertexComponentType::U8 => gl::UNSIGNED_BYTE,
			VertexComponentType::U16 => gl::UNSIGNED_SHORT,
			VertexComponentType::U32 => gl::UNSIGNED_INT,
			VertexComponentType::I8 => gl::BYTE,
			VertexComponentType::I16 => gl::SHORT,
			VertexComponentType::I32 => gl::INT,
		}
	}

	/// Integer attribute types must be set up via `VertexArrayAttribIFormat`, not the float path.
	pub fn is_integer(self) -> bool {
		!matches!(self, VertexComponentType::F32)
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn depth_stencil_format_picks_combined_attachment() {
		assert_eq!(Format::Depth24UnormStencil8.depth_stencil_attachment_point(), gl::DEPTH_STENCIL_ATTACHMENT);
		assert_eq!(Format::Depth32FloatStencil8.depth_stencil_attachment_point(), gl::DEPTH_STENCIL_ATTACHMENT);
	}

	#[test]
	fn depth_only_format_picks_depth_attachment() {
		assert_eq!(Format::Depth32Float.depth_stencil_attachment_point(), gl::DEPTH_ATTACHMENT);
		assert_eq!(Format::Depth16Unorm.depth_stencil_attachment_point(), gl::DEPTH_ATTACHMENT);
	}

	#[test]
	fn texel_sizes_match_known_layouts() {
		assert_eq!(Format::Rgba8Unorm.texel_byte_size(), 4);
		assert_eq!(Format::Rgba32Float.texel_byte_size(), 16);
		assert_eq!(Format::R8Unorm.texel_byte_size(), 1);
	}
}
