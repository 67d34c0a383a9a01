// ============================================================================
// CANVAS — coordinate spaces, the compositor, and the bake operations
// ============================================================================
//
// Three coordinate spaces flow through every tool:
//   natural    — the image's intrinsic pixel grid
//   displayed  — the on-screen box the embedder renders the image into
//   percentage — 0-100 of a container, resize-invariant
//
// All conversions live here as named functions; nothing else in the crate
// does inline ratio math.  The displayed↔natural mapping is per-axis: each
// axis scales by its own natural/displayed ratio, which is only exact when
// the on-screen box keeps the image's aspect ratio.
// ============================================================================

use image::{RgbaImage, imageops};

use crate::components::layers::Overlays;
use crate::io::{ImagePayload, IoError};
use crate::ops::adjustments::Adjustments;
use crate::ops::text::FontCatalog;
use crate::ops::transform::{Interpolation, crop_to_region};

// ============================================================================
// GEOMETRY PRIMITIVES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in a single coordinate space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f32 {
        (self.width * self.height).max(0.0)
    }
}

// ============================================================================
// COORDINATE MAPPING
// ============================================================================

/// Convert a percentage position (0-100) into pixels of `container`.
pub fn percentage_to_pixels(pct: f32, container: f32) -> f32 {
    (pct / 100.0) * container
}

/// Convert a pixel position into a percentage (0-100) of `container`.
/// Inverse of [`percentage_to_pixels`] for any `container > 0`.
pub fn pixels_to_percentage(px: f32, container: f32) -> f32 {
    if container == 0.0 {
        return 0.0;
    }
    (px / container) * 100.0
}

/// The natural and displayed sizes of the image currently on screen.
/// Owns every displayed↔natural conversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewMetrics {
    pub natural: Size,
    pub displayed: Size,
}

impl ViewMetrics {
    pub fn new(natural: Size, displayed: Size) -> Self {
        Self { natural, displayed }
    }

    /// Metrics for a view rendered at the image's own resolution — the
    /// headless case, where no display box exists.
    pub fn one_to_one(natural: Size) -> Self {
        Self {
            natural,
            displayed: natural,
        }
    }

    /// Per-axis natural/displayed ratios.
    pub fn scale_x(&self) -> f32 {
        if self.displayed.width == 0.0 {
            1.0
        } else {
            self.natural.width / self.displayed.width
        }
    }

    pub fn scale_y(&self) -> f32 {
        if self.displayed.height == 0.0 {
            1.0
        } else {
            self.natural.height / self.displayed.height
        }
    }

    /// Map a displayed-space point into natural space, axis by axis.
    pub fn displayed_to_natural(&self, pt: Point) -> Point {
        Point::new(pt.x * self.scale_x(), pt.y * self.scale_y())
    }

    /// Map a natural-space point into displayed space, axis by axis.
    pub fn natural_to_displayed(&self, pt: Point) -> Point {
        Point::new(
            pt.x / self.scale_x().max(f32::EPSILON),
            pt.y / self.scale_y().max(f32::EPSILON),
        )
    }

    /// Map a displayed-space rectangle into natural space.
    pub fn displayed_rect_to_natural(&self, rect: Rect) -> Rect {
        Rect::new(
            rect.x * self.scale_x(),
            rect.y * self.scale_y(),
            rect.width * self.scale_x(),
            rect.height * self.scale_y(),
        )
    }

    /// Ratio applied to stored logical pixel sizes (sticker widths, font
    /// sizes) when they land on an output surface `surface_width` wide.
    /// Computed fresh at composite time, never at drag time.
    pub fn composite_scale(&self, surface_width: f32) -> f32 {
        if self.displayed.width == 0.0 {
            1.0
        } else {
            surface_width / self.displayed.width
        }
    }
}

// ============================================================================
// HOTSPOT + CROP REGION
// ============================================================================

/// A retouch target: the natural-pixel point the generative backend receives,
/// plus the displayed-pixel point it was clicked at (kept in sync so the
/// embedder can draw the marker without re-deriving it).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hotspot {
    /// Natural-space target, rounded to the pixel grid.
    pub natural_x: i32,
    pub natural_y: i32,
    /// The click position in displayed space.
    pub displayed: Point,
}

impl Hotspot {
    /// Build a hotspot from a click in displayed space.
    pub fn from_displayed(displayed: Point, view: &ViewMetrics) -> Self {
        let natural = view.displayed_to_natural(displayed);
        Self {
            natural_x: natural.x.round() as i32,
            natural_y: natural.y.round() as i32,
            displayed,
        }
    }
}

/// Aspect-ratio locks the crop tool offers.  `None` = free-form.
pub const CROP_ASPECTS: &[(&str, Option<f32>)] = &[
    ("Free", None),
    ("1:1", Some(1.0)),
    ("16:9", Some(16.0 / 9.0)),
    ("9:16", Some(9.0 / 16.0)),
    ("4:3", Some(4.0 / 3.0)),
    ("3:2", Some(3.0 / 2.0)),
];

/// A pending crop selection in displayed space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRegion {
    pub rect: Rect,
    /// Locked width/height ratio, or `None` for free-form.
    pub aspect: Option<f32>,
}

impl CropRegion {
    pub fn new(rect: Rect, aspect: Option<f32>) -> Self {
        Self { rect, aspect }
    }

    pub fn is_zero_area(&self) -> bool {
        self.rect.width <= 0.0 || self.rect.height <= 0.0
    }
}

// ============================================================================
// RENDER ERRORS
// ============================================================================

/// Local rasterization failure: decode/encode, sticker asset, or font.
#[derive(Debug)]
pub enum RenderError {
    Image(IoError),
    Asset(String),
    Font(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Image(e) => write!(f, "Image processing failed: {}", e),
            RenderError::Asset(msg) => write!(f, "Sticker asset failed to load: {}", msg),
            RenderError::Font(msg) => write!(f, "Font resolution failed: {}", msg),
        }
    }
}

impl From<IoError> for RenderError {
    fn from(e: IoError) -> Self {
        RenderError::Image(e)
    }
}

// ============================================================================
// STICKER ASSETS
// ============================================================================

/// Built-in sticker catalog keys resolvable without a path.
pub const STICKER_CATALOG: &[&str] = &[
    "sunglasses",
    "party-hat",
    "heart",
    "star",
    "crown",
    "mustache",
];

/// Resolves a sticker layer's source reference to pixels.  Pluggable so tests
/// and embedders can serve assets from memory.
pub trait StickerAssets {
    fn load(&self, source: &str) -> Result<RgbaImage, String>;
}

/// Default loader: a literal file path, or a [`STICKER_CATALOG`] key resolved
/// against a sticker directory as `<key>-sticker.png`.  Anything else is
/// rejected before touching the filesystem.
pub struct FileStickerAssets {
    sticker_dir: std::path::PathBuf,
}

impl FileStickerAssets {
    pub fn new(sticker_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            sticker_dir: sticker_dir.into(),
        }
    }
}

impl Default for FileStickerAssets {
    fn default() -> Self {
        Self::new("stickers")
    }
}

impl StickerAssets for FileStickerAssets {
    fn load(&self, source: &str) -> Result<RgbaImage, String> {
        let direct = std::path::Path::new(source);
        let path = if direct.exists() {
            direct.to_path_buf()
        } else if STICKER_CATALOG.contains(&source) {
            self.sticker_dir.join(format!("{}-sticker.png", source))
        } else {
            return Err(format!(
                "'{}' is neither a file nor a catalog key (known keys: {})",
                source,
                STICKER_CATALOG.join(", ")
            ));
        };
        let img = image::open(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
        Ok(img.to_rgba8())
    }
}

// ============================================================================
// COMPOSITOR
// ============================================================================

/// Flattens a base image and overlay layers into one output image.
///
/// Holds the per-session font cache and the sticker loader; the pipeline
/// itself is stateless, so compositing the same overlays over the same base
/// twice is pixel-identical.
pub struct Compositor {
    fonts: FontCatalog,
    assets: Box<dyn StickerAssets>,
}

impl Compositor {
    pub fn new(assets: Box<dyn StickerAssets>) -> Self {
        Self {
            fonts: FontCatalog::new(),
            assets,
        }
    }

    /// Rasterize `overlays` onto `base` at its natural resolution.
    ///
    /// Pipeline: decode → draw base → resolve every sticker asset (any
    /// failure aborts before an overlay is drawn) → draw stickers in
    /// insertion order → draw text in insertion order → return the surface.
    /// Stickers always render beneath text, independent of insertion order.
    pub fn composite(
        &mut self,
        base: &ImagePayload,
        overlays: &Overlays,
        view: &ViewMetrics,
    ) -> Result<RgbaImage, RenderError> {
        let mut surface = base.decode()?;
        let surface_w = surface.width();
        let surface_h = surface.height();
        let scale = view.composite_scale(surface_w as f32);

        // Resolve all assets up front so a bad sticker cannot leave a
        // half-drawn surface behind.
        let mut sticker_images = Vec::with_capacity(overlays.sticker_layers().len());
        for sticker in overlays.sticker_layers() {
            let img = self
                .assets
                .load(&sticker.source)
                .map_err(RenderError::Asset)?;
            if img.width() == 0 || img.height() == 0 {
                return Err(RenderError::Asset(format!(
                    "'{}' decoded to an empty image",
                    sticker.source
                )));
            }
            sticker_images.push(img);
        }

        for (sticker, img) in overlays.sticker_layers().iter().zip(&sticker_images) {
            let x = percentage_to_pixels(sticker.x_pct, surface_w as f32);
            let y = percentage_to_pixels(sticker.y_pct, surface_h as f32);
            let draw_w = (sticker.width * scale).round().max(1.0) as u32;
            let aspect = img.height() as f32 / img.width() as f32;
            let draw_h = (draw_w as f32 * aspect).round().max(1.0) as u32;

            let scaled = if (draw_w, draw_h) == img.dimensions() {
                img.clone()
            } else {
                imageops::resize(img, draw_w, draw_h, Interpolation::Bilinear.to_filter())
            };
            imageops::overlay(&mut surface, &scaled, x.round() as i64, y.round() as i64);
            log_info!(
                "Composite: sticker '{}' at ({:.1}, {:.1}) {}x{}",
                sticker.source,
                x,
                y,
                draw_w,
                draw_h
            );
        }

        for layer in overlays.text_layers() {
            let x = percentage_to_pixels(layer.x_pct, surface_w as f32);
            let y = percentage_to_pixels(layer.y_pct, surface_h as f32);
            let font_size = layer.size * scale;

            let resolved = self
                .fonts
                .resolve(&layer.font_family, layer.bold, layer.italic)
                .map_err(RenderError::Font)?;
            let raster = crate::ops::text::rasterize_text(
                &resolved.font,
                &layer.text,
                font_size,
                x,
                y,
                layer.color,
                resolved.synthetic_bold,
                resolved.synthetic_italic,
                surface_w,
                surface_h,
            );
            if let Some(patch) = raster.to_image() {
                imageops::overlay(&mut surface, &patch, raster.off_x as i64, raster.off_y as i64);
            }
            log_info!(
                "Composite: text layer {} ('{}') at ({:.1}, {:.1}) size {:.1}",
                layer.id,
                layer.text.lines().next().unwrap_or(""),
                x,
                y,
                font_size
            );
        }

        Ok(surface)
    }
}

// ============================================================================
// BAKE OPERATIONS
// ============================================================================

/// Manual-adjustment bake: apply the filter chain to the current image at its
/// natural resolution.  The neutral-chain guard lives with the controller.
pub fn bake_adjustments(
    base: &ImagePayload,
    adjustments: &Adjustments,
) -> Result<RgbaImage, RenderError> {
    let surface = base.decode()?;
    log_info!(
        "Bake: adjustments {} on {}x{}",
        adjustments.filter_expression(),
        surface.width(),
        surface.height()
    );
    Ok(adjustments.apply_to(&surface))
}

/// Crop bake: extract the natural-space sub-rectangle behind a displayed-space
/// selection and resample it to `rect * density` output pixels.  The only
/// operation that changes output resolution.  Zero-area selections are
/// validated by the controller before this runs.
pub fn bake_crop(
    base: &ImagePayload,
    region: &CropRegion,
    view: &ViewMetrics,
    density: f32,
) -> Result<RgbaImage, RenderError> {
    let surface = base.decode()?;
    let natural_rect = view.displayed_rect_to_natural(region.rect);
    let out_w = (region.rect.width * density).round().max(1.0) as u32;
    let out_h = (region.rect.height * density).round().max(1.0) as u32;
    log_info!(
        "Bake: crop displayed {:.1}x{:.1} -> natural {:.1}x{:.1} -> output {}x{}",
        region.rect.width,
        region.rect.height,
        natural_rect.width,
        natural_rect.height,
        out_w,
        out_h
    );
    Ok(crop_to_region(
        &surface,
        natural_rect.x,
        natural_rect.y,
        natural_rect.width,
        natural_rect.height,
        out_w,
        out_h,
        Interpolation::Lanczos3,
    ))
}
