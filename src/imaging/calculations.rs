//! Pure calculation functions for thumbnail geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! [`resolve_geometry`] is total: degenerate inputs clamp instead of failing,
//! and every returned edge is at least one pixel.
//!
//! Fractional output edges are truncated. Only the center-crop sample
//! rectangle rounds to the nearest pixel.

use super::params::{CropMode, CropRect, OutputSize, SampleRect, Size};

/// What to read from the source and how big to write it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub sample: SampleRect,
    pub output: OutputSize,
}

/// Map a source size, a requested size and a crop mode to the sample
/// rectangle and the output size.
///
/// Steps, in order:
/// 1. Unless `crop` is [`CropMode::AllowUpscale`], requested edges larger
///    than the source are clamped to the source.
/// 2. A single zero edge is derived from the source aspect ratio; two zero
///    edges mean "source size".
/// 3. [`CropMode::None`] shrinks the box to the source aspect ratio and
///    samples the whole source (contain fit).
/// 4. A valid [`CropMode::Explicit`] rectangle is sampled as-is and resampled
///    to the *originally* requested size, ignoring step 1.
/// 5. Everything else center-crops the source to the box's aspect ratio.
///
/// # Examples
/// ```
/// # use image_version::imaging::{CropMode, Size, resolve_geometry};
/// // 2:1 source contained in a square box → 100x50, nothing cropped
/// let g = resolve_geometry((800, 400), Size::new(100, 100), CropMode::None);
/// assert_eq!((g.output.width, g.output.height), (100, 50));
///
/// // Same request, center crop → exact 100x100 from the middle 400px
/// let g = resolve_geometry((800, 400), Size::new(100, 100), CropMode::Center);
/// assert_eq!((g.sample.x, g.sample.width), (200, 400));
/// ```
pub fn resolve_geometry(source: (u32, u32), requested: Size, crop: CropMode) -> Geometry {
    let src_w = f64::from(source.0.max(1));
    let src_h = f64::from(source.1.max(1));

    let mut box_w = f64::from(requested.width);
    let mut box_h = f64::from(requested.height);

    if crop != CropMode::AllowUpscale {
        box_w = box_w.min(src_w);
        box_h = box_h.min(src_h);
    }

    let (box_w, box_h) = infer_missing_edge((src_w, src_h), (box_w, box_h));

    match crop {
        CropMode::None => contain(src_w, src_h, box_w, box_h),
        CropMode::Explicit(rect) if rect.is_valid() => explicit(rect, requested),
        _ => center_crop(src_w, src_h, box_w, box_h),
    }
}

/// Fill in a zero edge from the reference aspect ratio.
///
/// Both edges zero yields the reference size itself.
fn infer_missing_edge(reference: (f64, f64), target: (f64, f64)) -> (f64, f64) {
    let (ref_w, ref_h) = reference;
    match target {
        (w, h) if w > 0.0 && h > 0.0 => (w, h),
        (w, _) if w > 0.0 => (w, (ref_h * w / ref_w).max(1.0)),
        (_, h) if h > 0.0 => ((ref_w * h / ref_h).max(1.0), h),
        _ => (ref_w, ref_h),
    }
}

/// Shrink the box to the source aspect ratio; sample everything.
fn contain(src_w: f64, src_h: f64, box_w: f64, box_h: f64) -> Geometry {
    // Multiply before dividing so whole-pixel results stay exact.
    let (out_w, out_h) = if box_w * src_h > src_w * box_h {
        (box_h * src_w / src_h, box_h)
    } else {
        (box_w, box_w * src_h / src_w)
    };

    Geometry {
        sample: SampleRect::full(px(src_w), px(src_h)),
        output: OutputSize {
            width: px(out_w),
            height: px(out_h),
        },
    }
}

/// Sample the caller's rectangle and resample to the size they asked for.
fn explicit(rect: CropRect, requested: Size) -> Geometry {
    let crop_w = f64::from(rect.width);
    let crop_h = f64::from(rect.height);
    let (out_w, out_h) = infer_missing_edge(
        (crop_w, crop_h),
        (f64::from(requested.width), f64::from(requested.height)),
    );

    Geometry {
        sample: SampleRect {
            x: rect.x.unsigned_abs(),
            y: rect.y.unsigned_abs(),
            width: rect.width.unsigned_abs(),
            height: rect.height.unsigned_abs(),
        },
        output: OutputSize {
            width: px(out_w),
            height: px(out_h),
        },
    }
}

/// Cut the largest centered region with the box's aspect ratio.
fn center_crop(src_w: f64, src_h: f64, box_w: f64, box_h: f64) -> Geometry {
    let cmp_x = src_w / box_w;
    let cmp_y = src_h / box_h;

    let sample = if cmp_x > cmp_y {
        let width = src_w / cmp_x * cmp_y;
        let x = ((src_w - width) / 2.0).round();
        SampleRect {
            x: x as u32,
            y: 0,
            width: nearest(width).min(nearest(src_w - x)),
            height: px(src_h),
        }
    } else if cmp_y > cmp_x {
        let height = src_h / cmp_y * cmp_x;
        let y = ((src_h - height) / 2.0).round();
        SampleRect {
            x: 0,
            y: y as u32,
            width: px(src_w),
            height: nearest(height).min(nearest(src_h - y)),
        }
    } else {
        SampleRect::full(px(src_w), px(src_h))
    };

    Geometry {
        sample,
        output: OutputSize {
            width: px(box_w),
            height: px(box_h),
        },
    }
}

/// Truncate to whole pixels, never below one.
fn px(value: f64) -> u32 {
    value.floor().max(1.0) as u32
}

/// Round to the nearest pixel, never below one.
fn nearest(value: f64) -> u32 {
    value.round().max(1.0) as u32
}
