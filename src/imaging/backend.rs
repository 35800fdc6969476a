//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the cache engine
//! needs from a codec: identify (natural dimensions of a source) and
//! thumbnail (decode → crop/resample → encode → publish).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests substitute a recording mock.

use super::params::ThumbnailParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Natural dimensions of the image, read from the file itself.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Derive a thumbnail and publish it at `params.output`.
    ///
    /// Implementations must not leave a partially written file at the output
    /// path when they fail.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;
}
