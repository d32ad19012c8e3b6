//! Individual shader stage compilation.
//!
//! Uses the traditional `glCreateShader`/`glShaderSource`/`glCompileShader` model rather than the
//! separate-shader-object (`glCreateShaderProgramv`) path the donor crate's shader pipeline favours -
//! this backend links multi-stage programs the way `OpenGLShader`/`OpenGLProgram` in
//! `original_source/RHI_OpenGL/Private/OpenGLShader.h` do, so compiled stages are attached and linked
//! rather than bound individually through a program pipeline. The info-log formatting and
//! destroy-on-failure idiom is carried over from the donor's `core/shader_pipeline.rs` regardless.

use crate::error::{Result, RhiError};
use crate::handle::ShaderName;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
	Vertex,
	Fragment,
	Geometry,
	TessControl,
	TessEvaluation,
	Compute,
}

impl ShaderStage {
	fn to_raw(self) -> u32 {
		match self {
			ShaderStage::Vertex => gl::VERTEX_SHADER,
			ShaderStage::Fragment => gl::FRAGMENT_SHADER,
			ShaderStage::Geometry => gl::GEOMETRY_SHADER,
			ShaderStage::TessControl => gl::TESS_CONTROL_SHADER,
			ShaderStage::TessEvaluation => gl::TESS_EVALUATION_SHADER,
			ShaderStage::Compute => gl::COMPUTE_SHADER,
		}
	}
}

#[derive(Debug, Copy, Clone)]
pub struct Shader {
	pub name: ShaderName,
	pub stage: ShaderStage,
}

impl Shader {
	pub fn compile(gl: &gl::Gl, stage: ShaderStage, source: &str, debug_label: Option<&str>) -> Result<Shader> {
		let name = ShaderName(unsafe { gl.CreateShader(stage.to_raw()) });

		let source_ptr = source.as_ptr() as *const i8;
		let source_len = source.len() as i32;

		unsafe {
			gl.ShaderSource(name.0, 1, &source_ptr, &source_len);
			gl.CompileShader(name.0);
		}

		let mut status = 0;
		unsafe { gl.GetShaderiv(name.0, gl::COMPILE_STATUS, &mut status) }

		if status == 0 {
			let log = read_info_log(gl, name.0, InfoLogKind::Shader);
			unsafe { gl.DeleteShader(name.0) }
			return Err(RhiError::creation_failed(format!("{stage:?} shader compilation failed:\n{log}")))
		}

		if let Some(label) = debug_label {
			crate::debug::set_object_label(gl, name, label);
		}

		Ok(Shader { name, stage })
	}

	pub fn destroy(self, deletion_queue: &crate::deletion_queue::DeletionQueue, current_frame: u64) {
		deletion_queue.queue_shader(current_frame, self.name);
	}
}

pub(crate) enum InfoLogKind {
	Shader,
	Program,
}

pub(crate) fn read_info_log(gl: &gl::Gl, name: u32, kind: InfoLogKind) -> String {
	let mut length = 0;
	unsafe {
		match kind {
			InfoLogKind::Shader => gl.GetShaderiv(name, gl::INFO_LOG_LENGTH, &mut length),
			InfoLogKind::Program => gl.GetProgramiv(name, gl::INFO_LOG_LENGTH, &mut length),
		}
	}

	if length <= 0 {
		return String::new()
	}

	let mut buffer = vec![0u8; length as usize];
	let mut written = 0;
	unsafe {
		match kind {
			InfoLogKind::Shader => gl.GetShaderInfoLog(name, length, &mut written, buffer.as_mut_ptr() as *mut i8),
			InfoLogKind::Program => gl.GetProgramInfoLog(name, length, &mut written, buffer.as_mut_ptr() as *mut i8),
		}
	}

	buffer.truncate(written.max(0) as usize);
	String::from_utf8_lossy(&buffer).into_owned()
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn stage_enum_maps_to_distinct_gl_constants() {
		let stages = [
			ShaderStage::Vertex, ShaderStage::Fragment, ShaderStage::Geometry,
			ShaderStage::TessControl, ShaderStage::TessEvaluation, ShaderStage::Compute,
		];
		let mut raws: Vec<u32> = stages.iter().map(|s| s.to_raw()).collect();
		raws.sort_unstable();
		raws.dedup();
		assert_eq!(raws.len(), stages.len());
	}
}
