//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode (JPEG, PNG, GIF) | `image::load_from_memory_with_format` |
//! | Crop + resample | `DynamicImage::crop_imm` + `resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `jpeg_encoder` (progressive scans) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (RGBA, 0–9 level mapped to compression presets) |
//! | Encode → GIF | `image` GIF encoder, default settings |
//! | Publish | `tempfile` in the destination directory, then rename |
//!
//! The three codec primitives [`decode`], [`resample`] and [`encode`] are
//! public so callers can drive them on in-memory buffers.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{OutputSize, Quality, SampleRect, SourceFormat, ThumbnailParams};
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, GenericImageView, ImageEncoder};
use std::io::{Cursor, Write};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode source bytes of a known format.
pub fn decode(bytes: &[u8], format: SourceFormat) -> Result<DynamicImage, BackendError> {
    image::load_from_memory_with_format(bytes, format.image_format()).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to decode {format}: {e}"))
    })
}

/// Cut `sample` out of `img` and resample it to exactly `size`.
///
/// A sample rectangle reaching past the image is clipped to the image
/// bounds. One that starts outside the image has nothing to sample and
/// fails.
pub fn resample(
    img: &DynamicImage,
    sample: SampleRect,
    size: OutputSize,
) -> Result<DynamicImage, BackendError> {
    let (width, height) = img.dimensions();
    if sample.x >= width || sample.y >= height || sample.width == 0 || sample.height == 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "Sample region {}x{}+{}+{} lies outside the {}x{} source",
            sample.width, sample.height, sample.x, sample.y, width, height
        )));
    }

    let region = img.crop_imm(sample.x, sample.y, sample.width, sample.height);
    Ok(region.resize_exact(size.width, size.height, FilterType::Lanczos3))
}

/// Encode an image in `format`.
///
/// - JPEG: progressive, `quality` passed through (the encoder floor is 1).
/// - PNG: RGBA canvas so transparency survives; quality picks the compression preset.
/// - GIF: default encoder settings, quality ignored.
pub fn encode(
    img: &DynamicImage,
    format: SourceFormat,
    quality: Quality,
) -> Result<Vec<u8>, BackendError> {
    match format {
        SourceFormat::Jpeg => encode_jpeg(img, quality),
        SourceFormat::Png => encode_png(img, quality),
        SourceFormat::Gif => encode_gif(img),
    }
}

fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let rgb = img.to_rgb8();
    let (width, height) = jpeg_dimensions(rgb.width(), rgb.height())?;

    let mut bytes = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut bytes, quality.value().max(1));
    encoder.set_progressive(true);
    encoder
        .encode(rgb.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
    Ok(bytes)
}

fn jpeg_dimensions(width: u32, height: u32) -> Result<(u16, u16), BackendError> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(BackendError::ProcessingFailed(format!(
            "JPEG cannot hold a {width}x{height} image"
        ))),
    }
}

/// Map the 0–9 level onto the presets the PNG encoder offers.
fn png_compression(level: u8) -> CompressionType {
    match level {
        0 => CompressionType::Default,
        1..=3 => CompressionType::Fast,
        4..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

fn encode_png(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    // Resampled pixels replace the canvas; nothing is blended onto a background.
    let canvas = img.to_rgba8();

    let mut bytes = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut bytes,
        png_compression(quality.png_compression_level()),
        PngFilterType::Adaptive,
    );
    encoder
        .write_image(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {e}")))?;
    Ok(bytes)
}

fn encode_gif(img: &DynamicImage) -> Result<Vec<u8>, BackendError> {
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img.to_rgba8())
        .write_to(&mut cursor, image::ImageFormat::Gif)
        .map_err(|e| BackendError::ProcessingFailed(format!("GIF encode failed: {e}")))?;
    Ok(cursor.into_inner())
}

/// Write `bytes` to `output` atomically.
///
/// The data lands in a hidden temp file next to `output` first and is renamed
/// into place, so readers never see a truncated thumbnail and a failed write
/// leaves nothing behind.
fn publish(output: &Path, bytes: &[u8]) -> Result<(), BackendError> {
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut builder = tempfile::Builder::new();
    builder.prefix(".").suffix(".part");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o644));
    }

    let mut tmp = builder.tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(output).map_err(|e| BackendError::Io(e.error))?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Dimensions { width, height })
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let bytes = std::fs::read(&params.source)?;
        let img = decode(&bytes, params.format)?;
        let resized = resample(&img, params.sample, params.output_size)?;
        let encoded = encode(&resized, params.format, params.quality)?;
        publish(&params.output, &encoded)
    }
}
