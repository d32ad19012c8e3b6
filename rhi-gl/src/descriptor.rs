//! Descriptor set layouts and the binding-index bookkeeping they drive.
//!
//! Grounded on `OpenGLBindingEntry`'s buffer/texture/sampler/image fields in
//! `original_source/RHI_OpenGL/Private/OpenGLDescriptor.h`. Binding indices are assigned
//! deterministically at layout-build time from five independent per-kind counters rather than being
//! supplied by the caller, mirroring the order fields are walked in the donor header: uniform buffers
//! start counting at 1 (binding 0 is reserved for the per-draw push-constant-equivalent block),
//! storage buffers, texture units, sampler units, and image units each start at 0.

use smallvec::SmallVec;

use crate::error::{Result, RhiError};
use crate::handle::{BufferName, SamplerName, TextureName};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BindingKind {
	UniformBuffer,
	StorageBuffer,
	SampledTexture,
	Sampler,
	StorageImage,
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutBindingDesc {
	pub kind: BindingKind,
	pub count: u32,
	/// Whether this binding consumes a dynamic offset supplied at bind time (uniform/storage
	/// buffers only).
	pub dynamic_offset: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolvedBinding {
	pub kind: BindingKind,
	pub first_index: u32,
	pub count: u32,
	pub dynamic_offset: bool,
}

/// A descriptor set layout: an ordered list of binding slots, each assigned a contiguous run of
/// per-kind indices when the layout is built.
pub struct DescriptorSetLayout {
	bindings: Vec<ResolvedBinding>,
	dynamic_offset_count: u32,
}

impl DescriptorSetLayout {
	pub fn build(descs: &[LayoutBindingDesc]) -> DescriptorSetLayout {
		// Uniform buffer binding 0 is reserved, so that counter starts at 1; every other kind starts
		// at 0, per the assignment order the donor's binding entry walks in.
		let mut ubo_counter = 1u32;
		let mut ssbo_counter = 0u32;
		let mut texture_counter = 0u32;
		let mut sampler_counter = 0u32;
		let mut image_counter = 0u32;
		let mut dynamic_offset_count = 0u32;

		let bindings = descs.iter().map(|desc| {
			let counter = match desc.kind {
				BindingKind::UniformBuffer => &mut ubo_counter,
				BindingKind::StorageBuffer => &mut ssbo_counter,
				BindingKind::SampledTexture => &mut texture_counter,
				BindingKind::Sampler => &mut sampler_counter,
				BindingKind::StorageImage => &mut image_counter,
			};

			let first_index = *counter;
			*counter += desc.count;

			if desc.dynamic_offset {
				dynamic_offset_count += desc.count;
			}

			ResolvedBinding { kind: desc.kind, first_index, count: desc.count, dynamic_offset: desc.dynamic_offset }
		}).collect();

		DescriptorSetLayout { bindings, dynamic_offset_count }
	}

	pub fn bindings(&self) -> &[ResolvedBinding] {
		&self.bindings
	}

	pub fn dynamic_offset_count(&self) -> u32 {
		self.dynamic_offset_count
	}
}

#[derive(Debug, Clone, Copy)]
pub enum DescriptorResource {
	Buffer { buffer: BufferName, offset: i64, size: i64 },
	Texture { texture: TextureName, sampler: SamplerName },
	/// `access` is derived from the bound texture's `TextureUsage` at write time via
	/// `Texture::storage_image_access`, rather than supplied by the caller at every bind site.
	StorageImage { texture: TextureName, level: i32, access: u32, format: u32 },
}

/// A set of concrete resources written against a `DescriptorSetLayout`'s binding slots, ready for the
/// command context to apply.
pub struct DescriptorSet<'layout> {
	layout: &'layout DescriptorSetLayout,
	resources: Vec<Option<DescriptorResource>>,
}

impl<'layout> DescriptorSet<'layout> {
	pub fn new(layout: &'layout DescriptorSetLayout) -> DescriptorSet<'layout> {
		DescriptorSet { layout, resources: vec![None; layout.bindings.len()] }
	}

	pub fn write(&mut self, binding_slot: usize, resource: DescriptorResource) -> Result<()> {
		if binding_slot >= self.resources.len() {
			return Err(RhiError::misuse(format!("descriptor binding slot {binding_slot} out of range")))
		}
		self.resources[binding_slot] = Some(resource);
		Ok(())
	}

	/// Writes a storage image binding, deriving its access mode from the texture's own declared usage
	/// instead of requiring the caller to restate read/write intent that's already on the resource.
	pub fn write_storage_image(&mut self, binding_slot: usize, texture: &crate::resources::texture::Texture,
		level: i32, format: u32) -> Result<()>
	{
		self.write(binding_slot, DescriptorResource::StorageImage {
			texture: texture.name, level, access: texture.storage_image_access(), format,
		})
	}

	/// Resolves `WHOLE_SIZE` (size 0) buffer ranges against the buffer's declared size, and consumes
	/// dynamic offsets from `dynamic_offsets` in binding-declaration order.
	pub fn resolve(&self, buffer_sizes: impl Fn(BufferName) -> i64, dynamic_offsets: &[i64]) -> Result<SmallVec<[(u32, DescriptorResource); 32]>> {
		let mut resolved = SmallVec::new();
		let mut dynamic_index = 0usize;

		for (binding, resource) in self.layout.bindings.iter().zip(self.resources.iter()) {
			let Some(resource) = resource else { continue };

			let resolved_resource = match *resource {
				DescriptorResource::Buffer { buffer, mut offset, size } => {
					if binding.dynamic_offset {
						let dynamic_offset = *dynamic_offsets.get(dynamic_index)
							.ok_or_else(|| RhiError::misuse("not enough dynamic offsets supplied for descriptor set"))?;
						dynamic_index += 1;
						offset += dynamic_offset;
					}

					let resolved_size = if size == 0 {
						buffer_sizes(buffer) - offset
					} else {
						size
					};

					DescriptorResource::Buffer { buffer, offset, size: resolved_size }
				}
				other => other,
			};

			resolved.push((binding.first_index, resolved_resource));
		}

		Ok(resolved)
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn uniform_buffers_start_at_one_other_kinds_start_at_zero() {
		let layout = DescriptorSetLayout::build(&[
			LayoutBindingDesc { kind: BindingKind::UniformBuffer, count: 1, dynamic_offset: false },
			LayoutBindingDesc { kind: BindingKind::StorageBuffer, count: 1, dynamic_offset: false },
			LayoutBindingDesc { kind: BindingKind::SampledTexture, count: 2, dynamic_offset: false },
		]);

		let bindings = layout.bindings();
		assert_eq!(bindings[0].first_index, 1);
		assert_eq!(bindings[1].first_index, 0);
		assert_eq!(bindings[2].first_index, 0);
		assert_eq!(bindings[2].count, 2);
	}

	#[test]
	fn repeated_kind_bindings_pack_contiguously() {
		let layout = DescriptorSetLayout::build(&[
			LayoutBindingDesc { kind: BindingKind::UniformBuffer, count: 2, dynamic_offset: false },
			LayoutBindingDesc { kind: BindingKind::UniformBuffer, count: 1, dynamic_offset: false },
		]);

		let bindings = layout.bindings();
		assert_eq!(bindings[0].first_index, 1);
		assert_eq!(bindings[1].first_index, 3);
	}

	#[test]
	fn whole_size_buffer_resolves_against_declared_buffer_size() {
		let layout = DescriptorSetLayout::build(&[
			LayoutBindingDesc { kind: BindingKind::UniformBuffer, count: 1, dynamic_offset: false },
		]);
		let mut set = DescriptorSet::new(&layout);
		set.write(0, DescriptorResource::Buffer { buffer: BufferName(1), offset: 64, size: 0 }).unwrap();

		let resolved = set.resolve(|_| 256, &[]).unwrap();
		match resolved[0].1 {
			DescriptorResource::Buffer { size, .. } => assert_eq!(size, 256 - 64),
			_ => panic!("expected buffer resource"),
		}
	}

	#[test]
	fn dynamic_offsets_are_consumed_in_declaration_order() {
		let layout = DescriptorSetLayout::build(&[
			LayoutBindingDesc { kind: BindingKind::UniformBuffer, count: 1, dynamic_offset: true },
			LayoutBindingDesc { kind: BindingKind::StorageBuffer, count: 1, dynamic_offset: true },
		]);
		let mut set = DescriptorSet::new(&layout);
		set.write(0, DescriptorResource::Buffer { buffer: BufferName(1), offset: 0, size: 128 }).unwrap();
		set.write(1, DescriptorResource::Buffer { buffer: BufferName(2), offset: 0, size: 64 }).unwrap();

		let resolved = set.resolve(|_| 0, &[16, 32]).unwrap();
		match resolved[0].1 {
			DescriptorResource::Buffer { offset, .. } => assert_eq!(offset, 16),
			_ => panic!(),
		}
		match resolved[1].1 {
			DescriptorResource::Buffer { offset, .. } => assert_eq!(offset, 32),
			_ => panic!(),
		}
	}
}
