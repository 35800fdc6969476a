//! Image processing: pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Geometry** | [`resolve_geometry`]: contain fit, center crop, explicit crop |
//! | **Resample** | `crop_imm` + `resize_exact` (Lanczos3) |
//! | **Encode** | progressive JPEG, RGBA PNG, default GIF |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{Geometry, resolve_geometry};
pub use operations::{ThumbnailConfig, create_thumbnail, plan_thumbnail};
pub use params::{
    CropMode, CropRect, MIN_CROP_EDGE, OutputSize, Quality, SampleRect, Size, SourceFormat,
    ThumbnailParams,
};
pub use rust_backend::RustBackend;
