//! Reinterpreting views over an existing texture's storage (`TextureView`, core since 4.3).
//!
//! Grounded on `OpenGLTextureView` in `original_source/RHI_OpenGL/Private/OpenGLResources.h`, which
//! tracks the parent handle alongside its own so invalidation can walk from a texture to its views.

use crate::error::{Result, RhiError};
use crate::format::Format;
use crate::handle::TextureName;
use crate::resources::texture::TextureKind;

#[derive(Debug, Clone)]
pub struct TextureViewDesc<'a> {
	pub parent: TextureName,
	pub parent_target: TextureKind,
	pub view_kind: TextureKind,
	pub format: Format,
	pub min_level: u32,
	pub level_count: u32,
	pub min_layer: u32,
	pub layer_count: u32,
	pub debug_label: Option<&'a str>,
}

#[derive(Debug, Copy, Clone)]
pub struct TextureView {
	pub name: TextureName,
	pub parent: TextureName,
	pub format: Format,
}

impl TextureView {
	pub fn create(gl: &gl::Gl, desc: &TextureViewDesc) -> Result<TextureView> {
		if !is_compatible_view(desc.parent_target, desc.view_kind) {
			return Err(RhiError::misuse(format!(
				"texture view kind {:?} is not a valid view of parent kind {:?}", desc.view_kind, desc.parent_target)))
		}

		let target = view_target(desc.view_kind);

		let mut raw = 0u32;
		unsafe {
			gl.GenTextures(1, &mut raw);
			gl.TextureView(raw, target, desc.parent.0, desc.format.to_internal_format(),
				desc.min_level, desc.level_count, desc.min_layer, desc.layer_count);
		}
		let name = TextureName(raw);

		if let Some(label) = desc.debug_label {
			crate::debug::set_object_label(gl, name, label);
		}

		Ok(TextureView { name, parent: desc.parent, format: desc.format })
	}

	pub fn destroy(self, deletion_queue: &crate::deletion_queue::DeletionQueue, current_frame: u64) {
		deletion_queue.queue_texture(current_frame, self.name);
	}
}

fn view_target(kind: TextureKind) -> u32 {
	match kind {
		TextureKind::Texture2D => gl::TEXTURE_2D,
		TextureKind::Texture2DArray => gl::TEXTURE_2D_ARRAY,
		TextureKind::Texture3D => gl::TEXTURE_3D,
		TextureKind::TextureCube => gl::TEXTURE_CUBE_MAP,
	}
}

/// `glTextureView`'s view-class compatibility rules restrict which kinds can reinterpret which -
/// a 3D texture's storage layout isn't compatible with any 2D-shaped view, for instance.
fn is_compatible_view(parent: TextureKind, view: TextureKind) -> bool {
	use TextureKind::*;
	match (parent, view) {
		(a, b) if a == b => true,
		(TextureCube, Texture2D) | (TextureCube, Texture2DArray) => true,
		(Texture2DArray, Texture2D) | (Texture2DArray, TextureCube) => true,
		_ => false,
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cube_parent_accepts_2d_and_2d_array_views() {
		assert!(is_compatible_view(TextureKind::TextureCube, TextureKind::Texture2D));
		assert!(is_compatible_view(TextureKind::TextureCube, TextureKind::Texture2DArray));
	}

	#[test]
	fn texture_3d_has_no_compatible_view_kind_other_than_itself() {
		assert!(is_compatible_view(TextureKind::Texture3D, TextureKind::Texture3D));
		assert!(!is_compatible_view(TextureKind::Texture3D, TextureKind::Texture2D));
	}
}
