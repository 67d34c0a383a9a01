// ============================================================================
// TEXT OPERATIONS — system font resolution + glyph rasterization
// ============================================================================
//
// Text layers carry a family name and style flags; nothing is rasterized
// until composite time.  `FontCatalog` resolves (family, bold, italic) to a
// loaded face once per session, falling back to a platform sans-serif when
// the family is missing.  When no styled face exists the rasterizer applies
// a synthetic bold double-strike / italic shear instead, so the style flags
// always have a visible effect.
// ============================================================================

use ab_glyph::{Font, FontArc, GlyphId, ScaleFont, point};
use std::collections::HashMap;

/// Families tried when the requested one cannot be resolved.
#[cfg(target_os = "linux")]
const FALLBACK_FAMILIES: &[&str] = &["Liberation Sans", "DejaVu Sans"];
#[cfg(not(target_os = "linux"))]
const FALLBACK_FAMILIES: &[&str] = &["Arial", "Helvetica"];

/// A loaded face plus the synthetic-style flags the rasterizer must apply
/// because the matched face does not itself carry the requested style.
#[derive(Clone)]
pub struct ResolvedFont {
    pub font: FontArc,
    pub synthetic_bold: bool,
    pub synthetic_italic: bool,
}

/// Per-session font resolution cache keyed by (family, bold, italic).
#[derive(Default)]
pub struct FontCatalog {
    cache: HashMap<(String, bool, bool), ResolvedFont>,
}

impl FontCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a face for the family and style, trying the family itself,
    /// then the platform fallbacks, then the generic sans-serif family.
    pub fn resolve(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
    ) -> Result<ResolvedFont, String> {
        let key = (family.to_string(), bold, italic);
        if let Some(found) = self.cache.get(&key) {
            return Ok(found.clone());
        }

        let weight = if bold { 700 } else { 400 };
        let mut resolved = load_system_font(family, weight, italic);
        if resolved.is_none() {
            for fallback in FALLBACK_FAMILIES {
                resolved = load_system_font(fallback, weight, italic);
                if resolved.is_some() {
                    log_warn!("Font family '{}' not found, using '{}'", family, fallback);
                    break;
                }
            }
        }
        if resolved.is_none() {
            resolved = load_generic_sans(weight, italic);
        }

        let Some((font, props)) = resolved else {
            return Err(format!("No usable font found for family '{}'", family));
        };

        // The best match may be a plain face; note what still has to be faked.
        let got_bold = props.weight.0 >= 600.0;
        let got_italic = matches!(
            props.style,
            font_kit::properties::Style::Italic | font_kit::properties::Style::Oblique
        );
        let entry = ResolvedFont {
            font,
            synthetic_bold: bold && !got_bold,
            synthetic_italic: italic && !got_italic,
        };
        self.cache.insert(key, entry.clone());
        Ok(entry)
    }

    /// Number of distinct (family, style) faces resolved so far.
    pub fn cached_faces(&self) -> usize {
        self.cache.len()
    }
}

/// Load a font by family name, weight, and style from the system.
/// `weight` is a CSS-style weight value (100=Thin, 400=Regular, 700=Bold).
/// Returns the face and its actual properties, or None if not found.
fn load_system_font(
    family: &str,
    weight: u16,
    italic: bool,
) -> Option<(FontArc, font_kit::properties::Properties)> {
    use font_kit::family_name::FamilyName;

    select_font(&[FamilyName::Title(family.to_string())], weight, italic)
}

/// Last-resort resolution against the platform's generic sans-serif family.
fn load_generic_sans(
    weight: u16,
    italic: bool,
) -> Option<(FontArc, font_kit::properties::Properties)> {
    use font_kit::family_name::FamilyName;

    select_font(&[FamilyName::SansSerif], weight, italic)
}

fn select_font(
    families: &[font_kit::family_name::FamilyName],
    weight: u16,
    italic: bool,
) -> Option<(FontArc, font_kit::properties::Properties)> {
    use font_kit::properties::{Properties, Style, Weight};
    use font_kit::source::SystemSource;

    let mut props = Properties::new();
    props.weight = Weight(weight as f32);
    if italic {
        props.style = Style::Italic;
    }

    let source = SystemSource::new();
    let handle = source.select_best_match(families, &props).ok()?;

    let font_data = handle.load().ok()?;
    let actual_props = font_data.properties();
    let font_data_copy = font_data.copy_font_data()?;
    let bytes: Vec<u8> = (*font_data_copy).clone();
    let font = FontArc::try_from_vec(bytes).ok()?;
    Some((font, actual_props))
}

/// Enumerate system font families (family names only, no weight variants).
/// Returns a sorted, deduplicated list of font family names.
pub fn enumerate_system_fonts() -> Vec<String> {
    match font_kit::source::SystemSource::new().all_families() {
        Ok(mut families) => {
            families.sort();
            families.dedup();
            families
        }
        Err(_) => FALLBACK_FAMILIES.iter().map(|s| s.to_string()).collect(),
    }
}

/// Lay out a single line of text, left-aligned at x=0.
/// Returns `(glyphs as (id, x, baseline_y), total_width, ascent, line_height)`
/// where `baseline_y` is relative to the line's top edge.
pub fn layout_line(
    font: &FontArc,
    text: &str,
    font_size: f32,
) -> (Vec<(GlyphId, f32, f32)>, f32, f32, f32) {
    let scaled = font.as_scaled(font_size);
    let ascent = scaled.ascent();
    let line_height = scaled.height();

    let mut glyphs = Vec::new();
    let mut cursor_x = 0.0f32;
    let mut last_glyph: Option<GlyphId> = None;

    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = last_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }
        glyphs.push((glyph_id, cursor_x, ascent));
        cursor_x += scaled.h_advance(glyph_id);
        last_glyph = Some(glyph_id);
    }

    (glyphs, cursor_x, ascent, line_height)
}

/// Result from rasterize_text: an RGBA patch plus its placement on the
/// surface it was rasterized against.
pub struct RasterizedText {
    pub buf: Vec<u8>,
    pub buf_w: u32,
    pub buf_h: u32,
    pub off_x: i32,
    pub off_y: i32,
}

impl RasterizedText {
    pub fn is_empty(&self) -> bool {
        self.buf_w == 0 || self.buf_h == 0
    }

    /// The patch as an image, ready to blend onto a surface at
    /// (`off_x`, `off_y`).  None when nothing was rasterized.
    pub fn to_image(&self) -> Option<image::RgbaImage> {
        if self.is_empty() {
            return None;
        }
        image::RgbaImage::from_raw(self.buf_w, self.buf_h, self.buf.clone())
    }

    fn empty() -> Self {
        Self {
            buf: Vec::new(),
            buf_w: 0,
            buf_h: 0,
            off_x: 0,
            off_y: 0,
        }
    }
}

/// Rasterize text into an RGBA patch clipped to a `canvas_w` × `canvas_h`
/// surface.
///
/// `origin` is the top-left corner of the first line (top-aligned baseline:
/// the first baseline sits `ascent` below `origin_y`).  Multiline text via
/// '\n', each line advanced by the face's line height.  `bold` / `italic`
/// request the synthetic treatments; pass the flags from
/// [`ResolvedFont`], not the layer, so real styled faces are not doubled up.
pub fn rasterize_text(
    font: &FontArc,
    text: &str,
    font_size: f32,
    origin_x: f32,
    origin_y: f32,
    color: [u8; 4],
    bold: bool,
    italic: bool,
    canvas_w: u32,
    canvas_h: u32,
) -> RasterizedText {
    let scaled = font.as_scaled(font_size);
    let ascent = scaled.ascent();
    let line_height = scaled.height();

    // Lay out every line, offsetting each by the line height
    let lines: Vec<&str> = text.split('\n').collect();
    let mut all_glyphs: Vec<(GlyphId, f32, f32)> = Vec::new();
    for (line_idx, line) in lines.iter().enumerate() {
        let y_offset = line_idx as f32 * line_height;
        let (mut glyphs, _, _, _) = layout_line(font, line, font_size);
        for glyph in &mut glyphs {
            glyph.2 += y_offset;
        }
        all_glyphs.extend(glyphs);
    }

    if all_glyphs.is_empty() {
        return RasterizedText::empty();
    }

    // Bounding box of all glyphs via glyph_bounds (no outlining needed)
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;

    for &(glyph_id, gx, gy) in &all_glyphs {
        let glyph = glyph_id.with_scale_and_position(font_size, point(gx, gy));
        let bounds = font.glyph_bounds(&glyph);
        min_x = min_x.min(bounds.min.x);
        min_y = min_y.min(bounds.min.y);
        max_x = max_x.max(bounds.max.x);
        max_y = max_y.max(bounds.max.y);
    }

    if min_x >= max_x || min_y >= max_y {
        return RasterizedText::empty();
    }

    // Padding; the italic shear pushes top-edge pixels right by ~ascent/5
    let pad = 2.0;
    min_x -= pad;
    min_y -= pad;
    max_x += pad + if italic { ascent * 0.2 } else { 0.0 };
    max_y += pad;

    // Convert to surface space and clamp
    let buf_x0 = (origin_x + min_x).floor() as i32;
    let buf_y0 = (origin_y + min_y).floor() as i32;
    let buf_x1 = (origin_x + max_x).ceil() as i32;
    let buf_y1 = (origin_y + max_y).ceil() as i32;

    let x0 = buf_x0.max(0);
    let y0 = buf_y0.max(0);
    let x1 = buf_x1.min(canvas_w as i32);
    let y1 = buf_y1.min(canvas_h as i32);
    let buf_w = (x1 - x0).max(0) as u32;
    let buf_h = (y1 - y0).max(0) as u32;

    if buf_w == 0 || buf_h == 0 {
        return RasterizedText::empty();
    }

    // Single-channel coverage accumulator
    let needed = buf_w as usize * buf_h as usize;
    let mut coverage = vec![0.0f32; needed];

    for &(glyph_id, gx, gy) in &all_glyphs {
        let draw_x = gx.round();
        let draw_y = gy.round();
        let glyph = glyph_id.with_scale_and_position(font_size, point(0.0, 0.0));
        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };
        let b = outlined.px_bounds();
        let actual_bx = b.min.x + draw_x;
        let actual_by = b.min.y + draw_y;
        let baseline_y = origin_y + draw_y;

        outlined.draw(|px, py, cov| {
            let mut cx = px as f32 + origin_x + actual_bx;
            let cy = py as f32 + origin_y + actual_by;

            if italic {
                cx += (baseline_y - cy) * 0.2;
            }

            let ix = cx.round() as i32 - x0;
            let iy = cy.round() as i32 - y0;
            if ix >= 0 && iy >= 0 && (ix as u32) < buf_w && (iy as u32) < buf_h {
                let idx = iy as usize * buf_w as usize + ix as usize;
                coverage[idx] = coverage[idx].max(cov);
                if bold && ix + 1 < buf_w as i32 {
                    coverage[idx + 1] = coverage[idx + 1].max(cov);
                }
            }
        });
    }

    // Convert coverage to RGBA in the fill color
    let mut buf = vec![0u8; needed * 4];
    for i in 0..needed {
        let cov = coverage[i];
        if cov > 0.001 {
            let idx = i * 4;
            let a = (color[3] as f32 * cov).round().min(255.0) as u8;
            buf[idx] = color[0];
            buf[idx + 1] = color[1];
            buf[idx + 2] = color[2];
            buf[idx + 3] = a;
        }
    }

    RasterizedText {
        buf,
        buf_w,
        buf_h,
        off_x: x0,
        off_y: y0,
    }
}
