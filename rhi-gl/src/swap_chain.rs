//! Presentation surface abstraction.
//!
//! This backend never creates a window or a GL context itself - `Device::new` takes an already-current
//! context, the way `toybox-host`'s `Host` hands a `Core` a `host::Surface` + `host::GlContext` it
//! bootstrapped beforehand (`toybox-host/src/lib.rs`'s `ApplicationHost::resumed`). `PresentableSurface`
//! is the seam: callers implement it over whatever windowing crate they use (`glutin`, SDL2, GLFW) and
//! hand the boxed trait object to `SwapChain::new`. The backbuffer is exposed as a proxy `Texture`
//! (name `0`, never owned by this crate, never routed through the deletion queue) so render passes can
//! target it like any other attachment, mirroring `OpenGLSwapChain`'s "default framebuffer appears as a
//! regular resource" design in `original_source/RHI_OpenGL/Private/OpenGLSwapChain.h`.

use crate::error::{Result, RhiError};
use crate::format::Format;
use crate::handle::{FboName, TextureName};
use crate::resources::texture::{Texture, TextureKind};

/// Implemented by the windowing layer the host application brought; this crate only calls through it.
/// The `HasWindowHandle` bound keeps the surface identifiable across windowing backends (winit,
/// SDL2, raw GLFW) without this crate depending on any one of them, the same role `raw-window-handle`
/// plays at the glutin/winit boundary `toybox-host` sits on.
pub trait PresentableSurface: raw_window_handle::HasWindowHandle {
	fn swap_buffers(&self) -> anyhow::Result<()>;
	fn size(&self) -> (u32, u32);
}

pub struct SwapChain {
	surface: Box<dyn PresentableSurface>,
	backbuffer: Texture,
	color_format: Format,
}

impl SwapChain {
	pub fn new(surface: Box<dyn PresentableSurface>, color_format: Format) -> SwapChain {
		let (width, height) = surface.size();
		let backbuffer = Texture::from_existing(TextureName(0), TextureKind::Texture2D, color_format, width, height);
		SwapChain { surface, backbuffer, color_format }
	}

	/// The default framebuffer, which the FBO cache never stores entries for - render passes that
	/// target it bind framebuffer `0` directly instead of resolving through `FboCache::get_or_create`.
	pub fn acquire_backbuffer_framebuffer(&self) -> FboName {
		FboName::backbuffer()
	}

	pub fn backbuffer_texture(&self) -> Texture {
		self.backbuffer
	}

	pub fn present(&self) -> Result<()> {
		self.surface.swap_buffers().map_err(|err| RhiError::gpu_timeout(format!("swap_buffers failed: {err}")))
	}

	/// Called when the host window is resized; updates the proxy texture's reported dimensions to
	/// match without touching any GL state (the default framebuffer resizes itself with the window).
	pub fn resize(&mut self, width: u32, height: u32) {
		self.backbuffer = Texture::from_existing(TextureName(0), TextureKind::Texture2D, self.color_format, width, height);
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	struct StubSurface { width: u32, height: u32 }

	impl raw_window_handle::HasWindowHandle for StubSurface {
		fn window_handle(&self) -> Result<raw_window_handle::WindowHandle<'_>, raw_window_handle::HandleError> {
			use raw_window_handle::{RawWindowHandle, WebWindowHandle, WindowHandle};
			let raw = RawWindowHandle::Web(WebWindowHandle::new(1));
			Ok(unsafe { WindowHandle::borrow_raw(raw) })
		}
	}

	impl PresentableSurface for StubSurface {
		fn swap_buffers(&self) -> anyhow::Result<()> { Ok(()) }
		fn size(&self) -> (u32, u32) { (self.width, self.height) }
	}

	#[test]
	fn backbuffer_framebuffer_is_always_the_default() {
		let swap_chain = SwapChain::new(Box::new(StubSurface { width: 1920, height: 1080 }), Format::Rgba8Unorm);
		assert_eq!(swap_chain.acquire_backbuffer_framebuffer(), FboName::backbuffer());
		assert_eq!(swap_chain.backbuffer_texture().width, 1920);
	}

	#[test]
	fn resize_updates_reported_backbuffer_dimensions() {
		let mut swap_chain = SwapChain::new(Box::new(StubSurface { width: 800, height: 600 }), Format::Rgba8Unorm);
		swap_chain.resize(1280, 720);
		assert_eq!(swap_chain.backbuffer_texture().width, 1280);
		assert_eq!(swap_chain.backbuffer_texture().height, 720);
	}
}
