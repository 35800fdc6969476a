//! High-level image operations.
//!
//! These functions combine the geometry calculations with backend execution.
//! They take a thumbnail configuration, compute parameters, and call the
//! backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::resolve_geometry;
use super::params::{CropMode, Quality, Size, SourceFormat, ThumbnailParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// What a single thumbnail should look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThumbnailConfig {
    pub size: Size,
    pub crop: CropMode,
    pub quality: Quality,
}

/// Plan a thumbnail operation without executing it.
///
/// `source_dims` are the natural dimensions of the source as read from the
/// file, never a caller-supplied value.
pub fn plan_thumbnail(
    source: &Path,
    output: &Path,
    format: SourceFormat,
    source_dims: (u32, u32),
    config: &ThumbnailConfig,
) -> ThumbnailParams {
    let geometry = resolve_geometry(source_dims, config.size, config.crop);

    ThumbnailParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        format,
        sample: geometry.sample,
        output_size: geometry.output,
        quality: config.quality,
    }
}

/// Create a thumbnail at `output`.
///
/// Reads the source dimensions through the backend, resolves the geometry and
/// has the backend derive and publish the file. Returns the executed plan.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    format: SourceFormat,
    config: &ThumbnailConfig,
) -> Result<ThumbnailParams> {
    let dims = backend.identify(source)?;
    let params = plan_thumbnail(source, output, format, (dims.width, dims.height), config);
    backend.thumbnail(&params)?;
    Ok(params)
}
