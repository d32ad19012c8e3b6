//! Sampler objects, decoupled from textures the way core GL (and this backend's binding model) wants.

use crate::error::Result;
use crate::handle::SamplerName;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FilterMode {
	Nearest,
	Linear,
}

impl FilterMode {
	fn min_filter(self, mipmapped: bool) -> u32 {
		match (self, mipmapped) {
			(FilterMode::Nearest, false) => gl::NEAREST,
			(FilterMode::Nearest, true) => gl::NEAREST_MIPMAP_NEAREST,
			(FilterMode::Linear, false) => gl::LINEAR,
			(FilterMode::Linear, true) => gl::LINEAR_MIPMAP_LINEAR,
		}
	}

	fn mag_filter(self) -> u32 {
		match self {
			FilterMode::Nearest => gl::NEAREST,
			FilterMode::Linear => gl::LINEAR,
		}
	}
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum WrapMode {
	Repeat,
	MirroredRepeat,
	ClampToEdge,
	ClampToBorder,
}

impl WrapMode {
	fn to_raw(self) -> u32 {
		match self {
			WrapMode::Repeat => gl::REPEAT,
			WrapMode::MirroredRepeat => gl::MIRRORED_REPEAT,
			WrapMode::ClampToEdge => gl::CLAMP_TO_EDGE,
			WrapMode::ClampToBorder => gl::CLAMP_TO_BORDER,
		}
	}
}

#[derive(Debug, Clone)]
pub struct SamplerDesc<'a> {
	pub min_filter: FilterMode,
	pub mag_filter: FilterMode,
	pub mipmapped: bool,
	pub wrap_u: WrapMode,
	pub wrap_v: WrapMode,
	pub wrap_w: WrapMode,
	pub max_anisotropy: f32,
	pub border_color: [f32; 4],
	pub debug_label: Option<&'a str>,
}

impl Default for SamplerDesc<'_> {
	fn default() -> Self {
		SamplerDesc {
			min_filter: FilterMode::Linear,
			mag_filter: FilterMode::Linear,
			mipmapped: false,
			wrap_u: WrapMode::Repeat,
			wrap_v: WrapMode::Repeat,
			wrap_w: WrapMode::Repeat,
			max_anisotropy: 1.0,
			border_color: [0.0; 4],
			debug_label: None,
		}
	}
}

#[derive(Debug, Copy, Clone)]
pub struct Sampler {
	pub name: SamplerName,
}

impl Sampler {
	pub fn create(gl: &gl::Gl, desc: &SamplerDesc) -> Result<Sampler> {
		let mut raw = 0u32;
		unsafe { gl.CreateSamplers(1, &mut raw) }
		let name = SamplerName(raw);

		unsafe {
			gl.SamplerParameteri(name.0, gl::TEXTURE_MIN_FILTER, desc.min_filter.min_filter(desc.mipmapped) as i32);
			gl.SamplerParameteri(name.0, gl::TEXTURE_MAG_FILTER, desc.mag_filter.mag_filter() as i32);
			gl.SamplerParameteri(name.0, gl::TEXTURE_WRAP_S, desc.wrap_u.to_raw() as i32);
			gl.SamplerParameteri(name.0, gl::TEXTURE_WRAP_T, desc.wrap_v.to_raw() as i32);
			gl.SamplerParameteri(name.0, gl::TEXTURE_WRAP_R, desc.wrap_w.to_raw() as i32);
			gl.SamplerParameterf(name.0, gl::TEXTURE_MAX_ANISOTROPY, desc.max_anisotropy.max(1.0));
			gl.SamplerParameterfv(name.0, gl::TEXTURE_BORDER_COLOR, desc.border_color.as_ptr());
		}

		if let Some(label) = desc.debug_label {
			crate::debug::set_object_label(gl, name, label);
		}

		Ok(Sampler { name })
	}

	pub fn destroy(self, deletion_queue: &crate::deletion_queue::DeletionQueue, current_frame: u64) {
		deletion_queue.queue_sampler(current_frame, self.name);
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mipmapped_linear_picks_trilinear_min_filter() {
		assert_eq!(FilterMode::Linear.min_filter(true), gl::LINEAR_MIPMAP_LINEAR);
		assert_eq!(FilterMode::Linear.min_filter(false), gl::LINEAR);
	}
}
