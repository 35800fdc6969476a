//! Parameter types for thumbnail operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`operations`](super::operations) module (which plans
//! a thumbnail from a request) and the [`backend`](super::backend) (which does
//! the pixel work). This separation allows swapping backends (e.g. for testing
//! with a mock) without changing planning logic.
//!
//! ## Types
//!
//! - [`Quality`]: Encoding quality (0–100, default 85). Ceil-then-clamp on construction.
//! - [`Size`]: A requested thumbnail size; a zero edge means "derive from aspect ratio".
//! - [`CropMode`] / [`CropRect`]: How the source region is chosen.
//! - [`SampleRect`] / [`OutputSize`]: Resolved geometry: what to read, what to write.
//! - [`SourceFormat`]: The three supported formats, classified by extension.
//! - [`ThumbnailParams`]: Everything needed to derive one thumbnail.

use image::ImageFormat;
use std::fmt;
use std::path::{Path, PathBuf};

/// Quality setting for thumbnail encoding (0-100).
///
/// Callers may pass fractional or out-of-range values: the input is rounded
/// up to the next integer, then clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: f64) -> Self {
        // NaN falls through both clamps and casts to 0.
        Self(value.ceil().clamp(0.0, 100.0) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// PNG compression level on the encoder's 0–9 scale.
    ///
    /// `0` means "no explicit compression hint"; anything else is
    /// `ceil(quality / 10)`, capped at 9.
    pub fn png_compression_level(self) -> u8 {
        if self.0 == 0 {
            0
        } else {
            self.0.div_ceil(10).min(9)
        }
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

impl From<u8> for Quality {
    fn from(value: u8) -> Self {
        Self::new(f64::from(value))
    }
}

/// A requested thumbnail size. Either edge may be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Name of the cache directory holding every thumbnail at this size.
    pub fn bucket_name(self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(75, 75)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Smallest edge an explicit crop rectangle may have.
pub const MIN_CROP_EDGE: i32 = 16;

/// Caller-supplied crop rectangle in source pixel coordinates.
///
/// Coordinates are signed because they usually come straight from a
/// client-side selection widget and may be garbage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CropRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A selection bug on the client can produce an all-zero rectangle, which
    /// would resample into a black thumbnail. Such rectangles are rejected.
    pub fn is_valid(&self) -> bool {
        self.x >= 0 && self.y >= 0 && self.width >= MIN_CROP_EDGE && self.height >= MIN_CROP_EDGE
    }
}

/// How the region of the source to sample is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropMode {
    /// Contain fit: keep the whole image, shrink the box to its aspect ratio.
    #[default]
    None,
    /// Crop the center of the source to the target aspect ratio.
    Center,
    /// Sample exactly this rectangle. Invalid rectangles fall back to [`CropMode::Center`].
    Explicit(CropRect),
    /// Center crop without clamping the requested size to the source size.
    AllowUpscale,
}

/// Region of the source image to read, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SampleRect {
    /// The whole source image.
    pub const fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Dimensions of the encoded thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

/// Source formats that thumbnails can be derived from and written back as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Jpeg,
    Png,
    Gif,
}

impl SourceFormat {
    /// Classify a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Gif => ImageFormat::Gif,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
        })
    }
}

/// Parameters for a thumbnail operation (decode, crop, resample, encode).
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub format: SourceFormat,
    pub sample: SampleRect,
    pub output_size: OutputSize,
    pub quality: Quality,
}
