//! Linked, multi-stage GL programs with cached introspection maps.
//!
//! Grounded on `OpenGLProgram` in `original_source/RHI_OpenGL/Private/OpenGLShader.h`: attaches each
//! compiled stage, links, then eagerly resolves and caches uniform locations, uniform block indices,
//! and shader storage block indices so later `SetUniform*` calls are a `HashMap` lookup instead of a
//! round trip through `glGetUniformLocation` every frame.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::{Result, RhiError};
use crate::handle::ProgramName;
use crate::shader::{Shader, read_info_log, InfoLogKind};

pub struct Program {
	pub name: ProgramName,
	uniform_locations: RefCell<HashMap<String, i32>>,
	uniform_block_indices: RefCell<HashMap<String, u32>>,
	storage_block_indices: RefCell<HashMap<String, u32>>,
}

impl Program {
	pub fn link(gl: &gl::Gl, stages: &[Shader], debug_label: Option<&str>) -> Result<Program> {
		if stages.is_empty() {
			return Err(RhiError::misuse("a program needs at least one shader stage"))
		}

		let raw = unsafe { gl.CreateProgram() };
		let name = ProgramName(raw);

		unsafe {
			for stage in stages {
				gl.AttachShader(raw, stage.name.0);
			}
			gl.LinkProgram(raw);
		}

		let mut status = 0;
		unsafe { gl.GetProgramiv(raw, gl::LINK_STATUS, &mut status) }

		unsafe {
			for stage in stages {
				gl.DetachShader(raw, stage.name.0);
			}
		}

		if status == 0 {
			let log = read_info_log(gl, raw, InfoLogKind::Program);
			unsafe { gl.DeleteProgram(raw) }
			return Err(RhiError::creation_failed(format!("program link failed:\n{log}")))
		}

		if let Some(label) = debug_label {
			crate::debug::set_object_label(gl, name, label);
		}

		Ok(Program {
			name,
			uniform_locations: RefCell::new(HashMap::new()),
			uniform_block_indices: RefCell::new(HashMap::new()),
			storage_block_indices: RefCell::new(HashMap::new()),
		})
	}

	fn uniform_location(&self, gl: &gl::Gl, name: &str) -> i32 {
		if let Some(&location) = self.uniform_locations.borrow().get(name) {
			return location
		}

		let c_name = std::ffi::CString::new(name).expect("uniform name must not contain NUL bytes");
		let location = unsafe { gl.GetUniformLocation(self.name.0, c_name.as_ptr()) };
		self.uniform_locations.borrow_mut().insert(name.to_owned(), location);
		location
	}

	pub fn uniform_block_index(&self, gl: &gl::Gl, name: &str) -> Option<u32> {
		if let Some(&index) = self.uniform_block_indices.borrow().get(name) {
			return if index == gl::INVALID_INDEX { None } else { Some(index) }
		}

		let c_name = std::ffi::CString::new(name).expect("block name must not contain NUL bytes");
		let index = unsafe { gl.GetUniformBlockIndex(self.name.0, c_name.as_ptr()) };
		self.uniform_block_indices.borrow_mut().insert(name.to_owned(), index);
		if index == gl::INVALID_INDEX { None } else { Some(index) }
	}

	pub fn storage_block_index(&self, gl: &gl::Gl, name: &str) -> Option<u32> {
		if let Some(&index) = self.storage_block_indices.borrow().get(name) {
			return if index == gl::INVALID_INDEX { None } else { Some(index) }
		}

		let c_name = std::ffi::CString::new(name).expect("block name must not contain NUL bytes");
		let index = unsafe { gl.GetProgramResourceIndex(self.name.0, gl::SHADER_STORAGE_BLOCK, c_name.as_ptr()) };
		self.storage_block_indices.borrow_mut().insert(name.to_owned(), index);
		if index == gl::INVALID_INDEX { None } else { Some(index) }
	}

	pub fn set_uniform_1i(&self, gl: &gl::Gl, name: &str, value: i32) {
		let location = self.uniform_location(gl, name);
		if location >= 0 {
			unsafe { gl.ProgramUniform1i(self.name.0, location, value) }
		}
	}

	pub fn set_uniform_1f(&self, gl: &gl::Gl, name: &str, value: f32) {
		let location = self.uniform_location(gl, name);
		if location >= 0 {
			unsafe { gl.ProgramUniform1f(self.name.0, location, value) }
		}
	}

	pub fn set_uniform_3f(&self, gl: &gl::Gl, name: &str, value: [f32; 3]) {
		let location = self.uniform_location(gl, name);
		if location >= 0 {
			unsafe { gl.ProgramUniform3f(self.name.0, location, value[0], value[1], value[2]) }
		}
	}

	pub fn set_uniform_4f(&self, gl: &gl::Gl, name: &str, value: [f32; 4]) {
		let location = self.uniform_location(gl, name);
		if location >= 0 {
			unsafe { gl.ProgramUniform4f(self.name.0, location, value[0], value[1], value[2], value[3]) }
		}
	}

	pub fn set_uniform_mat4(&self, gl: &gl::Gl, name: &str, value: &[f32; 16]) {
		let location = self.uniform_location(gl, name);
		if location >= 0 {
			unsafe { gl.ProgramUniformMatrix4fv(self.name.0, location, 1, gl::FALSE, value.as_ptr()) }
		}
	}

	pub fn bind_uniform_block(&self, gl: &gl::Gl, block_name: &str, binding: u32) {
		if let Some(index) = self.uniform_block_index(gl, block_name) {
			unsafe { gl.UniformBlockBinding(self.name.0, index, binding) }
		} else {
			log::warn!("program: no uniform block named {block_name:?}");
		}
	}

	pub fn bind_storage_block(&self, gl: &gl::Gl, block_name: &str, binding: u32) {
		if let Some(index) = self.storage_block_index(gl, block_name) {
			unsafe { gl.ShaderStorageBlockBinding(self.name.0, index, binding) }
		} else {
			log::warn!("program: no shader storage block named {block_name:?}");
		}
	}

	pub fn destroy(self, deletion_queue: &crate::deletion_queue::DeletionQueue, current_frame: u64) {
		deletion_queue.queue_program(current_frame, self.name);
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fresh_program_has_empty_caches() {
		let program = Program {
			name: ProgramName(1),
			uniform_locations: RefCell::new(HashMap::new()),
			uniform_block_indices: RefCell::new(HashMap::new()),
			storage_block_indices: RefCell::new(HashMap::new()),
		};
		assert!(program.uniform_locations.borrow().is_empty());
	}
}
