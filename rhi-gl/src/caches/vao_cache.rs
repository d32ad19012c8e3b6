//! Memoizes vertex array objects by their attribute layout.
//!
//! Grounded on `OpenGLVAOCache::GetOrCreateVAO`/`CreateVAO` in
//! `original_source/RHI_OpenGL/Private/OpenGLCaches.cpp`: DSA-created VAO, attributes enabled and bound
//! via `VertexArrayAttribFormat`/`VertexArrayAttribIFormat` (the original distinguishes float vs integer
//! attribute format entry points, carried over here as `VertexComponentType::is_integer`),
//! `VertexArrayAttribBinding` ties each attribute to its vertex-buffer binding slot, and
//! `VertexArrayBindingDivisor` sets the instancing rate.

use std::collections::HashMap;
use std::sync::Mutex;

use smallvec::SmallVec;

use crate::format::VertexComponentType;
use crate::handle::{BufferName, VaoName};
use crate::deletion_queue::DeletionQueue;
use crate::caches::MAX_UNUSED_FRAMES;

pub const MAX_CACHED_VAOS: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
	pub location: u32,
	pub buffer_slot: u32,
	pub component_type: VertexComponentType,
	pub component_count: u32,
	pub normalized: bool,
	pub relative_offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferSlot {
	pub binding: u32,
	pub buffer: BufferName,
	pub stride: i32,
	pub offset: i64,
	pub divisor: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VaoCacheKey {
	pub attributes: SmallVec<[VertexAttribute; 16]>,
	pub buffer_slots: SmallVec<[VertexBufferSlot; 16]>,
	pub index_buffer: Option<BufferName>,
}

struct CacheEntry {
	vao: VaoName,
	last_used_frame: u64,
}

pub struct VaoCache {
	entries: Mutex<HashMap<VaoCacheKey, CacheEntry>>,
}

impl VaoCache {
	pub fn new() -> Self {
		VaoCache { entries: Mutex::new(HashMap::new()) }
	}

	pub fn get_or_create(&self, gl: &gl::Gl, deletion_queue: &DeletionQueue, key: &VaoCacheKey, current_frame: u64) -> VaoName {
		let mut entries = self.entries.lock().unwrap();

		if let Some(entry) = entries.get_mut(key) {
			entry.last_used_frame = current_frame;
			return entry.vao
		}

		if entries.len() >= MAX_CACHED_VAOS {
			evict_one(&mut entries, deletion_queue, current_frame);
		}

		let vao = create_vao(gl, key);
		entries.insert(key.clone(), CacheEntry { vao, last_used_frame: current_frame });
		vao
	}

	/// Removes every cached VAO that references `buffer` as a vertex buffer or as its index buffer.
	/// Matches the FBO cache's per-resource invalidation granularity: identity of the actual buffer,
	/// not the binding slot it happened to occupy.
	pub fn invalidate_buffer(&self, deletion_queue: &DeletionQueue, buffer: BufferName, current_frame: u64) {
		let mut entries = self.entries.lock().unwrap();
		let stale: Vec<VaoCacheKey> = entries.iter()
			.filter(|(key, _)| {
				key.buffer_slots.iter().any(|s| s.buffer == buffer)
					|| key.index_buffer == Some(buffer)
			})
			.map(|(key, _)| key.clone())
			.collect();

		for key in stale {
			if let Some(entry) = entries.remove(&key) {
				deletion_queue.queue_vertex_array(current_frame, entry.vao);
			}
		}
	}

	pub fn cleanup(&self, deletion_queue: &DeletionQueue, current_frame: u64) {
		let mut entries = self.entries.lock().unwrap();
		let stale: Vec<VaoCacheKey> = entries.iter()
			.filter(|(_, entry)| current_frame.saturating_sub(entry.last_used_frame) > MAX_UNUSED_FRAMES)
			.map(|(key, _)| key.clone())
			.collect();

		for key in stale {
			if let Some(entry) = entries.remove(&key) {
				deletion_queue.queue_vertex_array(current_frame, entry.vao);
			}
		}
	}

	pub fn clear(&self, deletion_queue: &DeletionQueue, current_frame: u64) {
		let mut entries = self.entries.lock().unwrap();
		for (_, entry) in entries.drain() {
			deletion_queue.queue_vertex_array(current_frame, entry.vao);
		}
	}

	pub fn len(&self) -> usize {
		self.entries.lock().unwrap().len()
	}
}

impl Default for VaoCache {
	fn default() -> Self { Self::new() }
}

fn evict_one(entries: &mut HashMap<VaoCacheKey, CacheEntry>, deletion_queue: &DeletionQueue, current_frame: u64) {
	let oldest_key = entries.iter()
		.min_by_key(|(_, entry)| entry.last_used_frame)
		.map(|(key, _)| key.clone());

	if let Some(key) = oldest_key {
		if let Some(entry) = entries.remove(&key) {
			deletion_queue.queue_vertex_array(current_frame, entry.vao);
		}
	}
}

fn create_vao(gl: &gl::Gl, key: &VaoCacheKey) -> VaoName {
	let mut raw = 0u32;
	unsafe { gl.CreateVertexArrays(1, &mut raw) }
	let vao = VaoName(raw);

	unsafe {
		for attribute in &key.attributes {
			gl.EnableVertexArrayAttrib(vao.0, attribute.location);

			if attribute.component_type.is_integer() {
				gl.VertexArrayAttribIFormat(vao.0, attribute.location, attribute.component_count as i32,
					attribute.component_type.to_raw(), attribute.relative_offset);
			} else {
				gl.VertexArrayAttribFormat(vao.0, attribute.location, attribute.component_count as i32,
					attribute.component_type.to_raw(), attribute.normalized as u8, attribute.relative_offset);
			}

			gl.VertexArrayAttribBinding(vao.0, attribute.location, attribute.buffer_slot);
		}

		for slot in &key.buffer_slots {
			gl.VertexArrayVertexBuffer(vao.0, slot.binding, slot.buffer.0, slot.offset as isize, slot.stride);
			gl.VertexArrayBindingDivisor(vao.0, slot.binding, slot.divisor);
		}

		if let Some(index_buffer) = key.index_buffer {
			gl.VertexArrayElementBuffer(vao.0, index_buffer.0);
		}
	}

	vao
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identical_layouts_hash_equal() {
		let mut attrs = SmallVec::new();
		attrs.push(VertexAttribute { location: 0, buffer_slot: 0, component_type: VertexComponentType::F32, component_count: 3, normalized: false, relative_offset: 0 });
		let key_a = VaoCacheKey { attributes: attrs.clone(), buffer_slots: SmallVec::new(), index_buffer: None };
		let key_b = VaoCacheKey { attributes: attrs, buffer_slots: SmallVec::new(), index_buffer: None };
		assert_eq!(key_a, key_b);
	}

	#[test]
	fn differing_component_type_breaks_equality() {
		let mut float_attrs = SmallVec::new();
		float_attrs.push(VertexAttribute { location: 0, buffer_slot: 0, component_type: VertexComponentType::F32, component_count: 3, normalized: false, relative_offset: 0 });
		let mut int_attrs = SmallVec::new();
		int_attrs.push(VertexAttribute { location: 0, buffer_slot: 0, component_type: VertexComponentType::I32, component_count: 3, normalized: false, relative_offset: 0 });

		let key_a = VaoCacheKey { attributes: float_attrs, buffer_slots: SmallVec::new(), index_buffer: None };
		let key_b = VaoCacheKey { attributes: int_attrs, buffer_slots: SmallVec::new(), index_buffer: None };
		assert_ne!(key_a, key_b);
	}

	#[test]
	fn differing_vertex_buffer_identity_breaks_equality() {
		let attrs: SmallVec<[VertexAttribute; 16]> = SmallVec::new();
		let slots_a = smallvec::smallvec![VertexBufferSlot { binding: 0, buffer: BufferName(1), stride: 12, offset: 0, divisor: 0 }];
		let slots_b = smallvec::smallvec![VertexBufferSlot { binding: 0, buffer: BufferName(2), stride: 12, offset: 0, divisor: 0 }];
		let key_a = VaoCacheKey { attributes: attrs.clone(), buffer_slots: slots_a, index_buffer: None };
		let key_b = VaoCacheKey { attributes: attrs, buffer_slots: slots_b, index_buffer: None };
		assert_ne!(key_a, key_b);
	}

	#[test]
	fn differing_index_buffer_breaks_equality() {
		let attrs: SmallVec<[VertexAttribute; 16]> = SmallVec::new();
		let key_a = VaoCacheKey { attributes: attrs.clone(), buffer_slots: SmallVec::new(), index_buffer: Some(BufferName(1)) };
		let key_b = VaoCacheKey { attributes: attrs, buffer_slots: SmallVec::new(), index_buffer: Some(BufferName(2)) };
		assert_ne!(key_a, key_b);
	}
}
