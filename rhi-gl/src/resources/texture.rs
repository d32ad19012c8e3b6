//! Texture storage allocation (2D, 2D array, 3D, cube) via DSA `TexStorage*`.
//!
//! Grounded on `OpenGLTexture`'s field layout (`Handle`, `Target`, `Format`, `Extent`, `MipLevels`,
//! `ArrayLayers`) in `original_source/RHI_OpenGL/Private/OpenGLResources.h`, and its
//! `CreateFromExisting` path (used for swap-chain proxy textures) in the same header.

use bitflags::bitflags;

use crate::error::{Result, RhiError};
use crate::format::Format;
use crate::handle::TextureName;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureKind {
	Texture2D,
	Texture2DArray,
	Texture3D,
	TextureCube,
}

impl TextureKind {
	pub(crate) fn to_target(self) -> u32 {
		match self {
			TextureKind::Texture2D => gl::TEXTURE_2D,
			TextureKind::Texture2DArray => gl::TEXTURE_2D_ARRAY,
			TextureKind::Texture3D => gl::TEXTURE_3D,
			TextureKind::TextureCube => gl::TEXTURE_CUBE_MAP,
		}
	}
}

bitflags! {
	/// How a texture is used, beyond plain sampling - consulted when binding it as a storage image so
	/// the access mode (`GL_READ_ONLY`/`GL_WRITE_ONLY`/`GL_READ_WRITE`) can be inferred from the
	/// resource's declared usage rather than supplied at every bind site.
	#[derive(Debug, Copy, Clone, Eq, PartialEq)]
	pub struct TextureUsage: u32 {
		const SAMPLED          = 1 << 0;
		const RENDER_TARGET    = 1 << 1;
		const STORAGE_READ     = 1 << 2;
		const STORAGE_WRITE    = 1 << 3;
	}
}

#[derive(Debug, Clone)]
pub struct TextureDesc<'a> {
	pub kind: TextureKind,
	pub format: Format,
	pub width: u32,
	pub height: u32,
	/// Array layers for `Texture2DArray`, depth for `Texture3D`; unused otherwise.
	pub depth_or_layers: u32,
	pub mip_levels: u32,
	pub samples: u32,
	pub usage: TextureUsage,
	pub debug_label: Option<&'a str>,
}

#[derive(Debug, Copy, Clone)]
pub struct Texture {
	pub name: TextureName,
	pub kind: TextureKind,
	pub format: Format,
	pub width: u32,
	pub height: u32,
	pub depth_or_layers: u32,
	pub mip_levels: u32,
	pub samples: u32,
	pub usage: TextureUsage,
}

impl Texture {
	pub fn create(gl: &gl::Gl, desc: &TextureDesc) -> Result<Texture> {
		if desc.mip_levels == 0 {
			return Err(RhiError::misuse("texture mip_levels must be at least 1"))
		}

		let target = if desc.samples > 1 { multisample_target(desc.kind)? } else { desc.kind.to_target() };

		let mut raw = 0u32;
		unsafe { gl.CreateTextures(target, 1, &mut raw) }
		let name = TextureName(raw);

		if let Some(label) = desc.debug_label {
			crate::debug::set_object_label(gl, name, label);
		}

		let internal_format = desc.format.to_internal_format();

		unsafe {
			match (desc.kind, desc.samples > 1) {
				(TextureKind::Texture2D, false) =>
					gl.TextureStorage2D(name.0, desc.mip_levels as i32, internal_format, desc.width as i32, desc.height as i32),
				(TextureKind::Texture2D, true) =>
					gl.TextureStorage2DMultisample(name.0, desc.samples as i32, internal_format, desc.width as i32, desc.height as i32, gl::TRUE),
				(TextureKind::TextureCube, false) =>
					gl.TextureStorage2D(name.0, desc.mip_levels as i32, internal_format, desc.width as i32, desc.height as i32),
				(TextureKind::Texture2DArray, false) =>
					gl.TextureStorage3D(name.0, desc.mip_levels as i32, internal_format, desc.width as i32, desc.height as i32, desc.depth_or_layers as i32),
				(TextureKind::Texture3D, false) =>
					gl.TextureStorage3D(name.0, desc.mip_levels as i32, internal_format, desc.width as i32, desc.height as i32, desc.depth_or_layers as i32),
				(_, true) => return Err(RhiError::unsupported("multisample storage is only implemented for Texture2D")),
			}
		}

		Ok(Texture {
			name, kind: desc.kind, format: desc.format,
			width: desc.width, height: desc.height, depth_or_layers: desc.depth_or_layers,
			mip_levels: desc.mip_levels, samples: desc.samples, usage: desc.usage,
		})
	}

	/// Wraps a texture the GL implementation created out of band - used for swap-chain backbuffer
	/// proxy textures, which the windowing layer owns rather than this crate.
	pub fn from_existing(name: TextureName, kind: TextureKind, format: Format, width: u32, height: u32) -> Texture {
		Texture { name, kind, format, width, height, depth_or_layers: 1, mip_levels: 1, samples: 1, usage: TextureUsage::RENDER_TARGET }
	}

	/// Maps this texture's declared usage onto a storage-image access mode. Read-write wins if both
	/// bits are set; a texture with neither storage bit set falls back to read-write with a warning,
	/// since binding it as a storage image at all means some caller expects shader access to it.
	pub fn storage_image_access(&self) -> u32 {
		let readable = self.usage.contains(TextureUsage::STORAGE_READ);
		let writable = self.usage.contains(TextureUsage::STORAGE_WRITE);
		match (readable, writable) {
			(true, true) => gl::READ_WRITE,
			(true, false) => gl::READ_ONLY,
			(false, true) => gl::WRITE_ONLY,
			(false, false) => {
				log::warn!("storage_image_access: texture {:?} declares neither STORAGE_READ nor STORAGE_WRITE", self.name);
				gl::READ_WRITE
			}
		}
	}

	pub fn upload(&self, gl: &gl::Gl, level: u32, x: u32, y: u32, width: u32, height: u32, data: &[u8]) -> Result<()> {
		let expected = (width * height) as usize * self.format.texel_byte_size() as usize;
		if data.len() < expected {
			return Err(RhiError::misuse(format!("upload data too small: got {} bytes, need {expected}", data.len())))
		}

		unsafe {
			match self.kind {
				TextureKind::Texture2D | TextureKind::TextureCube =>
					gl.TextureSubImage2D(self.name.0, level as i32, x as i32, y as i32, width as i32, height as i32,
						self.format.to_unsized_format(), self.format.to_component_type(), data.as_ptr().cast()),
				TextureKind::Texture2DArray | TextureKind::Texture3D =>
					gl.TextureSubImage3D(self.name.0, level as i32, x as i32, y as i32, 0, width as i32, height as i32, 1,
						self.format.to_unsized_format(), self.format.to_component_type(), data.as_ptr().cast()),
			}
		}

		Ok(())
	}

	/// Queues the texture for deletion and drops every cached framebuffer that attaches it, so a
	/// stale FBO never outlives the texture it referenced.
	pub fn destroy(self, gl: &gl::Gl, fbo_cache: &crate::caches::fbo_cache::FboCache,
		deletion_queue: &crate::deletion_queue::DeletionQueue, current_frame: u64)
	{
		fbo_cache.invalidate_texture(gl, deletion_queue, self.name, current_frame);
		deletion_queue.queue_texture(current_frame, self.name);
	}
}

fn multisample_target(kind: TextureKind) -> Result<u32> {
	match kind {
		TextureKind::Texture2D => Ok(gl::TEXTURE_2D_MULTISAMPLE),
		_ => Err(RhiError::unsupported("multisampling is only implemented for Texture2D")),
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cube_and_2d_share_a_storage_target() {
		assert_eq!(TextureKind::Texture2D.to_target(), gl::TEXTURE_2D);
		assert_eq!(TextureKind::TextureCube.to_target(), gl::TEXTURE_CUBE_MAP);
	}

	#[test]
	fn storage_access_prefers_read_write_when_both_bits_set() {
		let texture = Texture {
			name: TextureName(1), kind: TextureKind::Texture2D, format: Format::Rgba8Unorm,
			width: 1, height: 1, depth_or_layers: 1, mip_levels: 1, samples: 1,
			usage: TextureUsage::STORAGE_READ | TextureUsage::STORAGE_WRITE,
		};
		assert_eq!(texture.storage_image_access(), gl::READ_WRITE);
	}

	#[test]
	fn storage_access_is_write_only_for_write_only_usage() {
		let texture = Texture {
			name: TextureName(1), kind: TextureKind::Texture2D, format: Format::Rgba8Unorm,
			width: 1, height: 1, depth_or_layers: 1, mip_levels: 1, samples: 1,
			usage: TextureUsage::STORAGE_WRITE,
		};
		assert_eq!(texture.storage_image_access(), gl::WRITE_ONLY);
	}
}
