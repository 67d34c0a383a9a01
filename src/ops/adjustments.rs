// ============================================================================
// ADJUSTMENTS — the live brightness/contrast/saturate/sepia/grayscale chain
// ============================================================================
//
// `Adjustments` is a pure value type: five bounded dials plus the raster
// pipeline that renders them.  The same pipeline runs for live preview and
// for the destructive bake, so the two can never drift apart.
// Stage order is fixed (brightness → contrast → saturate → sepia →
// grayscale); every stage consumes the previous stage's output, clamped to
// channel range.  Rows are parallelized via rayon.
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Percentage bounds for the multiplicative dials.
pub const ADJUST_RANGE: (f32, f32) = (0.0, 200.0);
/// Percentage bounds for the blend dials (sepia, grayscale).
pub const BLEND_RANGE: (f32, f32) = (0.0, 100.0);

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    /// 0-200, neutral 100
    pub brightness: f32,
    /// 0-200, neutral 100
    pub contrast: f32,
    /// 0-200, neutral 100
    pub saturate: f32,
    /// 0-100, neutral 0
    pub sepia: f32,
    /// 0-100, neutral 0
    pub grayscale: f32,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturate: 100.0,
            sepia: 0.0,
            grayscale: 0.0,
        }
    }
}

impl Adjustments {
    pub fn set_brightness(&mut self, v: f32) {
        self.brightness = v.clamp(ADJUST_RANGE.0, ADJUST_RANGE.1);
    }

    pub fn set_contrast(&mut self, v: f32) {
        self.contrast = v.clamp(ADJUST_RANGE.0, ADJUST_RANGE.1);
    }

    pub fn set_saturate(&mut self, v: f32) {
        self.saturate = v.clamp(ADJUST_RANGE.0, ADJUST_RANGE.1);
    }

    pub fn set_sepia(&mut self, v: f32) {
        self.sepia = v.clamp(BLEND_RANGE.0, BLEND_RANGE.1);
    }

    pub fn set_grayscale(&mut self, v: f32) {
        self.grayscale = v.clamp(BLEND_RANGE.0, BLEND_RANGE.1);
    }

    /// Clamp every dial into its documented range (used when values arrive
    /// from an edit plan rather than the setters).
    pub fn clamped(mut self) -> Self {
        self.set_brightness(self.brightness);
        self.set_contrast(self.contrast);
        self.set_saturate(self.saturate);
        self.set_sepia(self.sepia);
        self.set_grayscale(self.grayscale);
        self
    }

    /// Structural equality against the neutral chain.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// The ordered filter chain as a display expression, e.g.
    /// `brightness(150%) contrast(100%) saturate(100%) sepia(0%) grayscale(0%)`.
    pub fn filter_expression(&self) -> String {
        format!(
            "brightness({}%) contrast({}%) saturate({}%) sepia({}%) grayscale({}%)",
            self.brightness, self.contrast, self.saturate, self.sepia, self.grayscale
        )
    }

    /// Render the chain over `src`, returning a new surface of the same size.
    /// Neutral stages are skipped, so the neutral chain is an exact identity.
    /// Alpha is never modified.
    pub fn apply_to(&self, src: &RgbaImage) -> RgbaImage {
        let w = src.width() as usize;
        let h = src.height() as usize;
        if w == 0 || h == 0 || self.is_default() {
            return src.clone();
        }

        let brightness = self.brightness / 100.0;
        let contrast = self.contrast / 100.0;
        let saturate = self.saturate / 100.0;
        let sepia = self.sepia / 100.0;
        let grayscale = self.grayscale / 100.0;

        let src_raw = src.as_raw();
        let mut dst_raw = vec![0u8; w * h * 4];
        let stride = w * 4;

        dst_raw
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row_out)| {
                let row_in = &src_raw[y * stride..(y + 1) * stride];
                for x in 0..w {
                    let pi = x * 4;
                    let mut r = row_in[pi] as f32;
                    let mut g = row_in[pi + 1] as f32;
                    let mut b = row_in[pi + 2] as f32;

                    if brightness != 1.0 {
                        r = (r * brightness).clamp(0.0, 255.0);
                        g = (g * brightness).clamp(0.0, 255.0);
                        b = (b * brightness).clamp(0.0, 255.0);
                    }
                    if contrast != 1.0 {
                        r = ((r - 127.5) * contrast + 127.5).clamp(0.0, 255.0);
                        g = ((g - 127.5) * contrast + 127.5).clamp(0.0, 255.0);
                        b = ((b - 127.5) * contrast + 127.5).clamp(0.0, 255.0);
                    }
                    if saturate != 1.0 {
                        // Blend between luma gray (s=0) and the pixel (s=1);
                        // s > 1 pushes past the original for over-saturation.
                        let gray = 0.213 * r + 0.715 * g + 0.072 * b;
                        r = (gray + (r - gray) * saturate).clamp(0.0, 255.0);
                        g = (gray + (g - gray) * saturate).clamp(0.0, 255.0);
                        b = (gray + (b - gray) * saturate).clamp(0.0, 255.0);
                    }
                    if sepia != 0.0 {
                        let sr = 0.393 * r + 0.769 * g + 0.189 * b;
                        let sg = 0.349 * r + 0.686 * g + 0.168 * b;
                        let sb = 0.272 * r + 0.534 * g + 0.131 * b;
                        r = (r + (sr - r) * sepia).clamp(0.0, 255.0);
                        g = (g + (sg - g) * sepia).clamp(0.0, 255.0);
                        b = (b + (sb - b) * sepia).clamp(0.0, 255.0);
                    }
                    if grayscale != 0.0 {
                        let gray = 0.2126 * r + 0.7152 * g + 0.0722 * b;
                        r += (gray - r) * grayscale;
                        g += (gray - g) * grayscale;
                        b += (gray - b) * grayscale;
                    }

                    row_out[pi] = r.round().clamp(0.0, 255.0) as u8;
                    row_out[pi + 1] = g.round().clamp(0.0, 255.0) as u8;
                    row_out[pi + 2] = b.round().clamp(0.0, 255.0) as u8;
                    row_out[pi + 3] = row_in[pi + 3];
                }
            });

        // from_raw only fails on a size mismatch, which the allocation above rules out
        RgbaImage::from_raw(w as u32, h as u32, dst_raw).unwrap_or_else(|| src.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn uniform(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(px))
    }

    #[test]
    fn test_default_is_neutral() {
        let adj = Adjustments::default();
        assert!(adj.is_default());
        assert_eq!(
            adj.filter_expression(),
            "brightness(100%) contrast(100%) saturate(100%) sepia(0%) grayscale(0%)"
        );
    }

    #[test]
    fn test_setters_clamp() {
        let mut adj = Adjustments::default();
        adj.set_brightness(350.0);
        adj.set_contrast(-20.0);
        adj.set_sepia(140.0);
        adj.set_grayscale(-1.0);
        assert_eq!(adj.brightness, 200.0);
        assert_eq!(adj.contrast, 0.0);
        assert_eq!(adj.sepia, 100.0);
        assert_eq!(adj.grayscale, 0.0);
        assert!(!adj.is_default());
    }

    #[test]
    fn test_expression_orders_stages() {
        let mut adj = Adjustments::default();
        adj.set_brightness(150.0);
        adj.set_grayscale(25.0);
        assert_eq!(
            adj.filter_expression(),
            "brightness(150%) contrast(100%) saturate(100%) sepia(0%) grayscale(25%)"
        );
    }

    #[test]
    fn test_neutral_apply_is_identity() {
        let img = uniform(4, 3, [12, 200, 99, 128]);
        let out = Adjustments::default().apply_to(&img);
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn test_brightness_scales_channels() {
        let img = uniform(2, 2, [100, 200, 0, 255]);
        let mut adj = Adjustments::default();
        adj.set_brightness(150.0);
        let out = adj.apply_to(&img);
        // 100*1.5 = 150, 200*1.5 clamps at 255
        assert_eq!(out.get_pixel(0, 0), &Rgba([150, 255, 0, 255]));
    }

    #[test]
    fn test_zero_contrast_flattens_to_mid_gray() {
        let img = uniform(1, 1, [10, 250, 90, 40]);
        let mut adj = Adjustments::default();
        adj.set_contrast(0.0);
        let out = adj.apply_to(&img);
        // (c - 127.5) * 0 + 127.5 rounds to 128; alpha untouched
        assert_eq!(out.get_pixel(0, 0), &Rgba([128, 128, 128, 40]));
    }

    #[test]
    fn test_full_grayscale_equalizes_channels() {
        let img = uniform(1, 1, [255, 0, 0, 255]);
        let mut adj = Adjustments::default();
        adj.set_grayscale(100.0);
        let out = adj.apply_to(&img);
        let px = out.get_pixel(0, 0);
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
        // Rec.709 luma of pure red: 0.2126 * 255 ≈ 54
        assert_eq!(px[0], 54);
    }

    #[test]
    fn test_full_sepia_on_white() {
        let img = uniform(1, 1, [255, 255, 255, 255]);
        let mut adj = Adjustments::default();
        adj.set_sepia(100.0);
        let out = adj.apply_to(&img);
        // Sepia matrix rows sum to 1.351 / 1.203 / 0.937
        assert_eq!(out.get_pixel(0, 0), &Rgba([255, 255, 239, 255]));
    }

    #[test]
    fn test_desaturate_uses_saturate_luma() {
        let img = uniform(1, 1, [255, 0, 0, 255]);
        let mut adj = Adjustments::default();
        adj.set_saturate(0.0);
        let out = adj.apply_to(&img);
        // 0.213 * 255 ≈ 54 on every channel
        assert_eq!(out.get_pixel(0, 0), &Rgba([54, 54, 54, 255]));
    }

    #[test]
    fn test_partial_plan_deserializes_with_neutral_rest() {
        let adj: Adjustments = serde_json::from_str(r#"{"brightness": 150}"#).unwrap();
        assert_eq!(adj.brightness, 150.0);
        assert_eq!(adj.contrast, 100.0);
        assert_eq!(adj.sepia, 0.0);
    }
}
