//! `KHR_debug` object labelling, debug groups, and the driver message callback.
//!
//! Grounded on `OpenGLCommandContext.h`'s `PushDebugGroup`/`PopDebugGroup`/`SetObjectLabel` trio and the
//! callback-installation shape implied by `OpenGLDevice`'s debug-context constructor path; the RAII group
//! guard itself follows the teacher's `Drop`-based scope-guard idiom (see `core/debug_group.rs`'s
//! `DebugGroup` type, which this mirrors almost verbatim).

use crate::handle::ResourceName;

/// Installs the `KHR_debug` message callback. Only call this on a context that was created with
/// the debug flag set - calling it otherwise is harmless but the callback will simply never fire.
pub fn install_debug_callback(gl: &gl::Gl) {
	unsafe {
		gl.Enable(gl::DEBUG_OUTPUT);
		gl.Enable(gl::DEBUG_OUTPUT_SYNCHRONOUS);
		gl.DebugMessageCallback(Some(gl_debug_callback), std::ptr::null());
		gl.DebugMessageControl(gl::DONT_CARE, gl::DONT_CARE, gl::DONT_CARE, 0, std::ptr::null(), 1);
	}
}

extern "system" fn gl_debug_callback(
	source: u32,
	kind: u32,
	id: u32,
	severity: u32,
	length: i32,
	message: *const i8,
	_user_param: *mut std::ffi::c_void,
) {
	let message = unsafe {
		let slice = std::slice::from_raw_parts(message as *const u8, length.max(0) as usize);
		String::from_utf8_lossy(slice)
	};

	let source = debug_source_name(source);
	let kind_name = debug_type_name(kind);

	match severity {
		gl::DEBUG_SEVERITY_HIGH => log::error!("gl[{source}/{kind_name}/{id}]: {message}"),
		gl::DEBUG_SEVERITY_MEDIUM => log::warn!("gl[{source}/{kind_name}/{id}]: {message}"),
		gl::DEBUG_SEVERITY_LOW => log::info!("gl[{source}/{kind_name}/{id}]: {message}"),
		_ => log::debug!("gl[{source}/{kind_name}/{id}]: {message}"),
	}
}

fn debug_source_name(source: u32) -> &'static str {
	match source {
		gl::DEBUG_SOURCE_API => "api",
		gl::DEBUG_SOURCE_WINDOW_SYSTEM => "window-system",
		gl::DEBUG_SOURCE_SHADER_COMPILER => "shader-compiler",
		gl::DEBUG_SOURCE_THIRD_PARTY => "third-party",
		gl::DEBUG_SOURCE_APPLICATION => "application",
		_ => "other",
	}
}

fn debug_type_name(kind: u32) -> &'static str {
	match kind {
		gl::DEBUG_TYPE_ERROR => "error",
		gl::DEBUG_TYPE_DEPRECATED_BEHAVIOR => "deprecated",
		gl::DEBUG_TYPE_UNDEFINED_BEHAVIOR => "undefined-behavior",
		gl::DEBUG_TYPE_PORTABILITY => "portability",
		gl::DEBUG_TYPE_PERFORMANCE => "performance",
		gl::DEBUG_TYPE_MARKER => "marker",
		gl::DEBUG_TYPE_PUSH_GROUP => "push-group",
		gl::DEBUG_TYPE_POP_GROUP => "pop-group",
		_ => "other",
	}
}

/// Attaches a human-readable label to a GL object, visible in external debuggers (RenderDoc, Nsight).
pub fn set_object_label<T: ResourceName>(gl: &gl::Gl, name: T, label: &str) {
	if !name.is_valid() { return }
	unsafe {
		gl.ObjectLabel(T::GL_IDENTIFIER, name.as_raw(), label.len() as i32, label.as_ptr() as *const i8);
	}
}

/// Pushes a named debug group, popped automatically when the returned guard drops - mirrors the
/// command-context's `PushDebugGroup`/`PopDebugGroup` pair as a scope guard instead of two free calls
/// a caller could mismatch.
pub struct DebugGroup<'gl> {
	gl: &'gl gl::Gl,
}

impl<'gl> DebugGroup<'gl> {
	pub fn push(gl: &'gl gl::Gl, label: &str) -> Self {
		unsafe {
			gl.PushDebugGroup(gl::DEBUG_SOURCE_APPLICATION, 0, label.len() as i32, label.as_ptr() as *const i8);
		}
		DebugGroup { gl }
	}
}

impl Drop for DebugGroup<'_> {
	fn drop(&mut self) {
		unsafe { self.gl.PopDebugGroup() }
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn source_and_type_names_cover_the_common_cases() {
		assert_eq!(debug_source_name(gl::DEBUG_SOURCE_API), "api");
		assert_eq!(debug_source_name(0xDEAD), "other");
		assert_eq!(debug_type_name(gl::DEBUG_TYPE_ERROR), "error");
		assert_eq!(debug_type_name(gl::DEBUG_TYPE_PUSH_GROUP), "push-group");
	}
}
