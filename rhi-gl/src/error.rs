//! The caller-facing error taxonomy.
//!
//! Internal plumbing (shader compilation, program linking, FBO/VAO completeness checks) composes
//! `anyhow::Result` the way the rest of this crate's ancestry does; this enum is what finally crosses
//! the public API boundary for failures that fall into one of the closed kinds below. Runtime GL errors
//! observed by `gl_check!` never become an `RhiError` — by the time they're observed the call has
//! already issued, so there's nothing left to recover.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RhiError {
	#[error("creation failed: {0}")]
	CreationFailed(String),

	#[error("misuse: {0}")]
	Misuse(String),

	#[error("gpu operation timed out: {0}")]
	GpuTimeout(String),

	#[error("not supported: {0}")]
	Unsupported(String),
}

impl RhiError {
	pub fn creation_failed(detail: impl Into<String>) -> Self {
		Self::CreationFailed(detail.into())
	}

	pub fn misuse(detail: impl Into<String>) -> Self {
		Self::Misuse(detail.into())
	}

	pub fn gpu_timeout(detail: impl Into<String>) -> Self {
		Self::GpuTimeout(detail.into())
	}

	pub fn unsupported(detail: impl Into<String>) -> Self {
		Self::Unsupported(detail.into())
	}
}

pub type Result<T> = std::result::Result<T, RhiError>;
