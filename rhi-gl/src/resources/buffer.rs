//! Immutable-storage GPU buffers, optionally persistently mapped for CPU->GPU streaming.
//!
//! Grounded on `toybox-gfx/src/core/buffer.rs` (`create_buffer`/`allocate_buffer_storage`/`map_buffer`/
//! `unmap_buffer`) and the `OpenGLBuffer` field layout (`Handle`, `Size`, `Usage`, `MappedPtr`) in
//! `original_source/RHI_OpenGL/Private/OpenGLResources.h`.

use bitflags::bitflags;

use crate::error::{Result, RhiError};
use crate::handle::BufferName;

bitflags! {
	#[derive(Debug, Copy, Clone, Eq, PartialEq)]
	pub struct BufferUsage: u32 {
		const DYNAMIC_STORAGE = gl::DYNAMIC_STORAGE_BIT;
		const MAP_READ        = gl::MAP_READ_BIT;
		const MAP_WRITE       = gl::MAP_WRITE_BIT;
		const MAP_PERSISTENT  = gl::MAP_PERSISTENT_BIT;
		const MAP_COHERENT    = gl::MAP_COHERENT_BIT;
		const CLIENT_STORAGE  = gl::CLIENT_STORAGE_BIT;
	}
}

#[derive(Debug, Clone)]
pub struct BufferDesc<'a> {
	pub size: usize,
	pub usage: BufferUsage,
	pub initial_data: Option<&'a [u8]>,
	pub debug_label: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
pub struct Buffer {
	pub name: BufferName,
	pub size: usize,
	pub usage: BufferUsage,
	/// Set for buffers created with `MAP_PERSISTENT`; valid for the buffer's whole lifetime.
	pub persistent_ptr: Option<*mut u8>,
}

impl Buffer {
	pub fn create(gl: &gl::Gl, desc: &BufferDesc) -> Result<Buffer> {
		let mut raw = 0u32;
		unsafe { gl.CreateBuffers(1, &mut raw) }
		let name = BufferName(raw);

		if let Some(label) = desc.debug_label {
			crate::debug::set_object_label(gl, name, label);
		}

		let data_ptr = desc.initial_data.map_or(std::ptr::null(), |d| d.as_ptr().cast());
		if let Some(data) = desc.initial_data {
			if data.len() != desc.size {
				unsafe { gl.DeleteBuffers(1, &raw) }
				return Err(RhiError::misuse(format!(
					"buffer initial_data length {} does not match declared size {}", data.len(), desc.size)))
			}
		}

		unsafe {
			gl.NamedBufferStorage(name.0, desc.size as isize, data_ptr, desc.usage.bits());
		}

		let persistent_ptr = if desc.usage.contains(BufferUsage::MAP_PERSISTENT) {
			let map_flags = desc.usage.bits() & (gl::MAP_READ_BIT | gl::MAP_WRITE_BIT | gl::MAP_PERSISTENT_BIT | gl::MAP_COHERENT_BIT);
			let ptr = unsafe { gl.MapNamedBufferRange(name.0, 0, desc.size as isize, map_flags) };
			if ptr.is_null() {
				unsafe { gl.DeleteBuffers(1, &raw) }
				return Err(RhiError::creation_failed("persistent buffer mapping returned null"))
			}
			Some(ptr.cast())
		} else {
			None
		};

		Ok(Buffer { name, size: desc.size, usage: desc.usage, persistent_ptr })
	}

	/// SAFETY: caller must ensure no GPU work that reads/writes this range is still in flight, and
	/// that `offset + data.len() <= self.size`.
	pub unsafe fn write_mapped(&self, gl: &gl::Gl, offset: usize, data: &[u8]) {
		let Some(ptr) = self.persistent_ptr else {
			log::error!("write_mapped called on a buffer that was not persistently mapped");
			return
		};
		debug_assert!(offset + data.len() <= self.size);
		unsafe {
			std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.add(offset), data.len());

			if !self.usage.contains(BufferUsage::MAP_COHERENT) {
				gl.FlushMappedNamedBufferRange(self.name.0, offset as isize, data.len() as isize);
			}
		}
	}

	/// SAFETY: the buffer's persistent mapping (if any) must not be used after this call.
	pub unsafe fn destroy(self, gl: &gl::Gl, deletion_queue: &crate::deletion_queue::DeletionQueue, current_frame: u64) {
		if self.persistent_ptr.is_some() {
			unsafe { gl.UnmapNamedBuffer(self.name.0) }
		}
		deletion_queue.queue_buffer(current_frame, self.name);
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn usage_flags_compose_via_bitflags() {
		let usage = BufferUsage::MAP_PERSISTENT | BufferUsage::MAP_COHERENT | BufferUsage::MAP_WRITE;
		assert!(usage.contains(BufferUsage::MAP_PERSISTENT));
		assert!(usage.contains(BufferUsage::MAP_WRITE));
		assert!(!usage.contains(BufferUsage::DYNAMIC_STORAGE));
	}
}
