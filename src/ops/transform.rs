// ============================================================================
// TRANSFORM OPERATIONS — sub-rectangle extraction + resampling for crops
// ============================================================================

use image::{RgbaImage, imageops};

/// Interpolation method for resize operations.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl Interpolation {
    pub fn to_filter(&self) -> imageops::FilterType {
        match self {
            Interpolation::Nearest => imageops::FilterType::Nearest,
            Interpolation::Bilinear => imageops::FilterType::Triangle,
            Interpolation::Bicubic => imageops::FilterType::CatmullRom,
            Interpolation::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Extract a natural-space sub-rectangle of `src` and resample it to
/// `out_w` × `out_h`.
///
/// The rectangle is given in (possibly fractional) natural pixels; it is
/// rounded to the pixel grid and clamped to the image bounds.  When the
/// clamped source already matches the output dimensions the resample is
/// skipped, so a 1:1 crop copies pixels exactly.  Callers validate against
/// zero-area requests; a degenerate rectangle still yields at least one
/// source pixel here rather than panicking.
pub fn crop_to_region(
    src: &RgbaImage,
    rect_x: f32,
    rect_y: f32,
    rect_w: f32,
    rect_h: f32,
    out_w: u32,
    out_h: u32,
    interp: Interpolation,
) -> RgbaImage {
    let (src_w, src_h) = src.dimensions();
    if src_w == 0 || src_h == 0 || out_w == 0 || out_h == 0 {
        return RgbaImage::new(out_w.max(1), out_h.max(1));
    }

    let x = (rect_x.round() as i64).clamp(0, src_w as i64 - 1) as u32;
    let y = (rect_y.round() as i64).clamp(0, src_h as i64 - 1) as u32;
    let w = (rect_w.round() as i64).clamp(1, (src_w - x) as i64) as u32;
    let h = (rect_h.round() as i64).clamp(1, (src_h - y) as i64) as u32;

    let region = imageops::crop_imm(src, x, y, w, h).to_image();
    if (w, h) == (out_w, out_h) {
        return region;
    }
    imageops::resize(&region, out_w, out_h, interp.to_filter())
}
