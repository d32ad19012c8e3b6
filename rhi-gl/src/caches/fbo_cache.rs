//! Memoizes framebuffer objects by their attachment structure.
//!
//! Grounded on `OpenGLFramebufferCache::GetOrCreateFBO`/`CreateFBO`/`InvalidateTexture` in
//! `original_source/RHI_OpenGL/Private/OpenGLCaches.cpp`: DSA-created FBO, attachments bound via
//! `NamedFramebufferTexture`/`NamedFramebufferTextureLayer`, draw buffers set from the color-attachment
//! count, completeness checked with `CheckNamedFramebufferStatus`.

use std::collections::HashMap;
use std::sync::Mutex;

use smallvec::SmallVec;

use crate::deletion_queue::DeletionQueue;
use crate::handle::{FboName, TextureName};
use crate::caches::MAX_UNUSED_FRAMES;

pub const MAX_CACHED_FBOS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attachment {
	pub texture: TextureName,
	pub level: i32,
	/// `None` for a plain 2D texture attachment; `Some(layer)` for an array layer, cube face, or 3D slice.
	pub layer: Option<i32>,
	/// The attached texture's sized internal format, part of the key so that two attachments sharing
	/// a handle/level/layer but created with different formats (e.g. after a handle is reused) never
	/// collide.
	pub internal_format: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FboCacheKey {
	pub color_attachments: SmallVec<[Attachment; 8]>,
	pub depth_stencil_attachment: Option<Attachment>,
	pub depth_stencil_attachment_point: u32,
	pub width: u32,
	pub height: u32,
	pub layers: u32,
}

struct CacheEntry {
	fbo: FboName,
	last_used_frame: u64,
}

pub struct FboCache {
	entries: Mutex<HashMap<FboCacheKey, CacheEntry>>,
}

impl FboCache {
	pub fn new() -> Self {
		FboCache { entries: Mutex::new(HashMap::new()) }
	}

	pub fn get_or_create(&self, gl: &gl::Gl, deletion_queue: &DeletionQueue, key: &FboCacheKey, current_frame: u64) -> crate::error::Result<FboName> {
		let mut entries = self.entries.lock().unwrap();

		if let Some(entry) = entries.get_mut(key) {
			entry.last_used_frame = current_frame;
			return Ok(entry.fbo)
		}

		if entries.len() >= MAX_CACHED_FBOS {
			evict_one(&mut entries, gl, deletion_queue, current_frame);
		}

		let fbo = create_fbo(gl, key)?;
		entries.insert(key.clone(), CacheEntry { fbo, last_used_frame: current_frame });
		Ok(fbo)
	}

	/// Removes and queues deletion of every cached FBO that references `texture` in any attachment
	/// point. Linear scan, matching the donor cache's `InvalidateTexture`.
	pub fn invalidate_texture(&self, gl: &gl::Gl, deletion_queue: &DeletionQueue, texture: TextureName, current_frame: u64) {
		let mut entries = self.entries.lock().unwrap();
		let stale: Vec<FboCacheKey> = entries.iter()
			.filter(|(key, _)| {
				key.color_attachments.iter().any(|a| a.texture == texture)
					|| key.depth_stencil_attachment.map_or(false, |a| a.texture == texture)
			})
			.map(|(key, _)| key.clone())
			.collect();

		for key in stale {
			if let Some(entry) = entries.remove(&key) {
				let _ = gl;
				deletion_queue.queue_framebuffer(current_frame, entry.fbo);
			}
		}
	}

	/// Drops entries that haven't been touched in `MAX_UNUSED_FRAMES` frames.
	pub fn cleanup(&self, deletion_queue: &DeletionQueue, current_frame: u64) {
		let mut entries = self.entries.lock().unwrap();
		let stale: Vec<FboCacheKey> = entries.iter()
			.filter(|(_, entry)| current_frame.saturating_sub(entry.last_used_frame) > MAX_UNUSED_FRAMES)
			.map(|(key, _)| key.clone())
			.collect();

		for key in stale {
			if let Some(entry) = entries.remove(&key) {
				deletion_queue.queue_framebuffer(current_frame, entry.fbo);
			}
		}
	}

	/// Queues every cached FBO for deletion and empties the map. Used on device shutdown.
	pub fn clear(&self, deletion_queue: &DeletionQueue, current_frame: u64) {
		let mut entries = self.entries.lock().unwrap();
		for (_, entry) in entries.drain() {
			deletion_queue.queue_framebuffer(current_frame, entry.fbo);
		}
	}

	pub fn len(&self) -> usize {
		self.entries.lock().unwrap().len()
	}
}

impl Default for FboCache {
	fn default() -> Self { Self::new() }
}

fn evict_one(entries: &mut HashMap<FboCacheKey, CacheEntry>, gl: &gl::Gl, deletion_queue: &DeletionQueue, current_frame: u64) {
	let _ = gl;
	let oldest_key = entries.iter()
		.min_by_key(|(_, entry)| entry.last_used_frame)
		.map(|(key, _)| key.clone());

	if let Some(key) = oldest_key {
		if let Some(entry) = entries.remove(&key) {
			deletion_queue.queue_framebuffer(current_frame, entry.fbo);
		}
	}
}

fn create_fbo(gl: &gl::Gl, key: &FboCacheKey) -> crate::error::Result<FboName> {
	let mut raw = 0u32;
	unsafe { gl.CreateFramebuffers(1, &mut raw) }
	let fbo = FboName(raw);

	unsafe {
		for (index, attachment) in key.color_attachments.iter().enumerate() {
			attach(gl, fbo, gl::COLOR_ATTACHMENT0 + index as u32, attachment);
		}

		if let Some(attachment) = &key.depth_stencil_attachment {
			attach(gl, fbo, key.depth_stencil_attachment_point, attachment);
		}

		if key.color_attachments.is_empty() {
			gl.NamedFramebufferDrawBuffer(fbo.0, gl::NONE);
		} else {
			let draw_buffers: SmallVec<[u32; 8]> = (0..key.color_attachments.len())
				.map(|i| gl::COLOR_ATTACHMENT0 + i as u32)
				.collect();
			gl.NamedFramebufferDrawBuffers(fbo.0, draw_buffers.len() as i32, draw_buffers.as_ptr());
		}

		let status = gl.CheckNamedFramebufferStatus(fbo.0, gl::DRAW_FRAMEBUFFER);
		if status != gl::FRAMEBUFFER_COMPLETE {
			gl.DeleteFramebuffers(1, &fbo.0);
			return Err(crate::error::RhiError::creation_failed(format!("framebuffer incomplete: status 0x{status:x}")))
		}
	}

	Ok(fbo)
}

unsafe fn attach(gl: &gl::Gl, fbo: FboName, attachment_point: u32, attachment: &Attachment) {
	match attachment.layer {
		Some(layer) => gl.NamedFramebufferTextureLayer(fbo.0, attachment_point, attachment.texture.0, attachment.level, layer),
		None => gl.NamedFramebufferTexture(fbo.0, attachment_point, attachment.texture.0, attachment.level),
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keys_with_same_attachments_are_equal() {
		let a = FboCacheKey {
			color_attachments: smallvec::smallvec![Attachment { texture: TextureName(1), level: 0, layer: None, internal_format: gl::RGBA8 }],
			depth_stencil_attachment: None,
			depth_stencil_attachment_point: gl::DEPTH_ATTACHMENT,
			width: 1920, height: 1080, layers: 1,
		};
		let b = a.clone();
		assert_eq!(a, b);
	}

	#[test]
	fn keys_differing_by_layer_are_distinct() {
		let a = FboCacheKey {
			color_attachments: smallvec::smallvec![Attachment { texture: TextureName(1), level: 0, layer: Some(0), internal_format: gl::RGBA8 }],
			depth_stencil_attachment: None,
			depth_stencil_attachment_point: gl::DEPTH_ATTACHMENT,
			width: 1920, height: 1080, layers: 1,
		};
		let b = FboCacheKey {
			color_attachments: smallvec::smallvec![Attachment { texture: TextureName(1), level: 0, layer: Some(1), internal_format: gl::RGBA8 }],
			depth_stencil_attachment: None,
			depth_stencil_attachment_point: gl::DEPTH_ATTACHMENT,
			width: 1920, height: 1080, layers: 1,
		};
		assert_ne!(a, b);
	}

	#[test]
	fn keys_differing_by_internal_format_are_distinct() {
		let a = FboCacheKey {
			color_attachments: smallvec::smallvec![Attachment { texture: TextureName(1), level: 0, layer: None, internal_format: gl::RGBA8 }],
			depth_stencil_attachment: None,
			depth_stencil_attachment_point: gl::DEPTH_ATTACHMENT,
			width: 1920, height: 1080, layers: 1,
		};
		let b = FboCacheKey {
			color_attachments: smallvec::smallvec![Attachment { texture: TextureName(1), level: 0, layer: None, internal_format: gl::RGBA16F }],
			depth_stencil_attachment: None,
			depth_stencil_attachment_point: gl::DEPTH_ATTACHMENT,
			width: 1920, height: 1080, layers: 1,
		};
		assert_ne!(a, b);
	}

	#[test]
	fn keys_differing_by_dimensions_are_distinct() {
		let a = FboCacheKey {
			color_attachments: smallvec::smallvec![Attachment { texture: TextureName(1), level: 0, layer: None, internal_format: gl::RGBA8 }],
			depth_stencil_attachment: None,
			depth_stencil_attachment_point: gl::DEPTH_ATTACHMENT,
			width: 1920, height: 1080, layers: 1,
		};
		let b = FboCacheKey { width: 1280, height: 720, ..a.clone() };
		assert_ne!(a, b);
	}
}
