//! Shared test utilities for the image-version test suite.
//!
//! Synthetic source images in every supported format, plus mtime helpers.
//! Freshness is decided at whole-second resolution, so tests that expect a
//! cache hit must move the source's mtime into the past first.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let source = tmp.path().join("photos/dawn.jpg");
//! create_test_jpeg(&source, 800, 400);
//! backdate(&source, 60);
//! ```

use image::{ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::{Duration, SystemTime};

// =========================================================================
// Synthetic images
// =========================================================================

fn writer_for(path: &Path) -> BufWriter<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    BufWriter::new(File::create(path).unwrap())
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write a small valid JPEG, creating parent directories.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    image::codecs::jpeg::JpegEncoder::new(writer_for(path))
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a PNG whose left half is fully transparent.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let alpha = if x < width / 2 { 0 } else { 255 };
        Rgba([(x % 256) as u8, (y % 256) as u8, 200, alpha])
    });
    image::codecs::png::PngEncoder::new(writer_for(path))
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .unwrap();
}

/// Write a single-frame GIF.
pub fn create_test_gif(path: &Path, width: u32, height: u32) {
    let img = image::DynamicImage::ImageRgb8(gradient(width, height));
    let mut writer = writer_for(path);
    img.write_to(&mut writer, image::ImageFormat::Gif).unwrap();
}

// =========================================================================
// Modification times
// =========================================================================

/// Set a file's modification time.
pub fn set_mtime(path: &Path, time: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

/// Move a file's modification time `secs` seconds into the past.
pub fn backdate(path: &Path, secs: u64) {
    set_mtime(path, SystemTime::now() - Duration::from_secs(secs));
}

pub fn mtime(path: &Path) -> SystemTime {
    std::fs::metadata(path).unwrap().modified().unwrap()
}
