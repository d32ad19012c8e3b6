//! Derived-object caches: FBOs and VAOs are cheap to re-derive from a render pass/vertex layout
//! description but expensive to recreate every frame, so both are memoized behind a structural key.
//!
//! Grounded on `OpenGLFramebufferCache`/`OpenGLVAOCache` in
//! `original_source/RHI_OpenGL/Private/OpenGLCaches.cpp`.

pub mod fbo_cache;
pub mod vao_cache;

pub use fbo_cache::{FboCache, FboCacheKey};
pub use vao_cache::{VaoCache, VaoCacheKey};

/// Shared eviction policy knobs. Both caches use a linear scan over their entry map to find a
/// candidate rather than maintaining a separate LRU list — acceptable at these small capacities and
/// it keeps `invalidate_*` (which must also linear-scan to find every affected entry) the only scan
/// style in this file.
pub(crate) const MAX_UNUSED_FRAMES: u64 = 120;
