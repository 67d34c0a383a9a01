// ============================================================================
// OVERLAY MODEL — text and sticker layers with a single active selection
// ============================================================================
//
// Two ordered collections share one monotonic id counter, so an id never
// names two layers.  At most one layer is active across both collections;
// edits only land on the active layer.  Render order is fixed: stickers
// beneath text, regardless of insertion order.

use serde::{Deserialize, Serialize};

/// Font families offered for new text layers.  Resolved against installed
/// system fonts at composite time, not here.
pub const FONT_FAMILIES: &[&str] = &[
    "Arial",
    "Verdana",
    "Times New Roman",
    "Courier New",
    "Georgia",
    "Comic Sans MS",
];

/// Font size bounds in logical pixels.
pub const FONT_SIZE_RANGE: (f32, f32) = (12.0, 128.0);

/// Where a freshly added layer lands.
pub const DEFAULT_LAYER_POSITION: (f32, f32) = (40.0, 40.0);

pub const DEFAULT_TEXT: &str = "Hello World";
pub const DEFAULT_FONT_SIZE: f32 = 48.0;
pub const DEFAULT_TEXT_COLOR: [u8; 4] = [0, 0, 0, 255];
pub const DEFAULT_STICKER_WIDTH: f32 = 100.0;

/// Parse a `#rrggbb` or `#rrggbbaa` hex color.  `None` for anything else.
pub fn parse_hex_color(s: &str) -> Option<[u8; 4]> {
    let hex = s.strip_prefix('#')?;
    let parse = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some([parse(0)?, parse(2)?, parse(4)?, 255]),
        8 => Some([parse(0)?, parse(2)?, parse(4)?, parse(6)?]),
        _ => None,
    }
}

// ============================================================================
// LAYER TYPES
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Text,
    Sticker,
}

/// One line-or-more of styled text in percentage space.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayer {
    pub id: u64,
    pub text: String,
    pub font_family: String,
    /// Logical px, clamped to [`FONT_SIZE_RANGE`]; rescaled at composite time.
    pub size: f32,
    pub color: [u8; 4],
    pub bold: bool,
    pub italic: bool,
    pub x_pct: f32,
    pub y_pct: f32,
}

/// An image overlay in percentage space.  Height is derived from the source
/// asset's aspect ratio when it is drawn, never stored.
#[derive(Clone, Debug, PartialEq)]
pub struct StickerLayer {
    pub id: u64,
    /// Catalog key or file path, resolved by the compositor's asset loader.
    pub source: String,
    pub x_pct: f32,
    pub y_pct: f32,
    /// Logical px at displayed size; rescaled at composite time.
    pub width: f32,
}

/// A partial update to the active text layer.
#[derive(Clone, Debug)]
pub enum TextEdit {
    Content(String),
    Family(String),
    Size(f32),
    Color([u8; 4]),
    Bold(bool),
    Italic(bool),
    Position(f32, f32),
}

/// A partial update to the active sticker layer.
#[derive(Clone, Debug)]
pub enum StickerEdit {
    Position(f32, f32),
    Width(f32),
}

// ============================================================================
// OVERLAYS
// ============================================================================

/// The two overlay collections plus the single active-layer reference.
#[derive(Default)]
pub struct Overlays {
    text: Vec<TextLayer>,
    stickers: Vec<StickerLayer>,
    active: Option<(LayerKind, u64)>,
    next_id: u64,
}

impl Overlays {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Add a text layer with default attributes and make it active.
    pub fn add_text(&mut self, font_family: &str) -> u64 {
        let id = self.take_id();
        self.text.push(TextLayer {
            id,
            text: DEFAULT_TEXT.to_string(),
            font_family: font_family.to_string(),
            size: DEFAULT_FONT_SIZE,
            color: DEFAULT_TEXT_COLOR,
            bold: false,
            italic: false,
            x_pct: DEFAULT_LAYER_POSITION.0,
            y_pct: DEFAULT_LAYER_POSITION.1,
        });
        self.active = Some((LayerKind::Text, id));
        log_info!("Overlays: added text layer {}", id);
        id
    }

    /// Add a sticker layer with default attributes and make it active.
    pub fn add_sticker(&mut self, source: &str) -> u64 {
        let id = self.take_id();
        self.stickers.push(StickerLayer {
            id,
            source: source.to_string(),
            x_pct: DEFAULT_LAYER_POSITION.0,
            y_pct: DEFAULT_LAYER_POSITION.1,
            width: DEFAULT_STICKER_WIDTH,
        });
        self.active = Some((LayerKind::Sticker, id));
        log_info!("Overlays: added sticker layer {} ('{}')", id, source);
        id
    }

    /// Apply an edit to the active text layer.  False when no text layer is
    /// active.
    pub fn update_active_text(&mut self, edit: TextEdit) -> bool {
        let Some((LayerKind::Text, id)) = self.active else {
            return false;
        };
        let Some(layer) = self.text.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        match edit {
            TextEdit::Content(text) => layer.text = text,
            TextEdit::Family(family) => layer.font_family = family,
            TextEdit::Size(size) => layer.size = size.clamp(FONT_SIZE_RANGE.0, FONT_SIZE_RANGE.1),
            TextEdit::Color(color) => layer.color = color,
            TextEdit::Bold(bold) => layer.bold = bold,
            TextEdit::Italic(italic) => layer.italic = italic,
            TextEdit::Position(x, y) => {
                layer.x_pct = x;
                layer.y_pct = y;
            }
        }
        true
    }

    /// Apply an edit to the active sticker layer.  False when no sticker
    /// layer is active.
    pub fn update_active_sticker(&mut self, edit: StickerEdit) -> bool {
        let Some((LayerKind::Sticker, id)) = self.active else {
            return false;
        };
        let Some(layer) = self.stickers.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        match edit {
            StickerEdit::Position(x, y) => {
                layer.x_pct = x;
                layer.y_pct = y;
            }
            StickerEdit::Width(width) => layer.width = width.max(1.0),
        }
        true
    }

    /// Move whichever layer is active, in percentage space.  Used by drags,
    /// which don't care about the layer kind.
    pub fn move_active(&mut self, x_pct: f32, y_pct: f32) -> bool {
        match self.active {
            Some((LayerKind::Text, _)) => self.update_active_text(TextEdit::Position(x_pct, y_pct)),
            Some((LayerKind::Sticker, _)) => {
                self.update_active_sticker(StickerEdit::Position(x_pct, y_pct))
            }
            None => false,
        }
    }

    /// Remove a layer by id from whichever collection holds it.  Clears the
    /// active reference when it pointed at the removed layer.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.text.len() + self.stickers.len();
        self.text.retain(|t| t.id != id);
        self.stickers.retain(|s| s.id != id);
        let removed = self.text.len() + self.stickers.len() < before;
        if removed {
            if let Some((_, active_id)) = self.active
                && active_id == id
            {
                self.active = None;
            }
            log_info!("Overlays: removed layer {}", id);
        }
        removed
    }

    /// Select a layer (or clear the selection with `None`).  Rejects ids that
    /// don't name a layer of the given kind.
    pub fn set_active(&mut self, selection: Option<(LayerKind, u64)>) -> bool {
        match selection {
            None => {
                self.active = None;
                true
            }
            Some((kind, id)) => {
                let exists = match kind {
                    LayerKind::Text => self.text.iter().any(|t| t.id == id),
                    LayerKind::Sticker => self.stickers.iter().any(|s| s.id == id),
                };
                if exists {
                    self.active = Some((kind, id));
                }
                exists
            }
        }
    }

    /// Drop every layer and the active reference.
    pub fn clear(&mut self) {
        self.text.clear();
        self.stickers.clear();
        self.active = None;
    }

    // ---- accessors ----------------------------------------------------

    pub fn active(&self) -> Option<(LayerKind, u64)> {
        self.active
    }

    pub fn active_text(&self) -> Option<&TextLayer> {
        let (LayerKind::Text, id) = self.active? else {
            return None;
        };
        self.text.iter().find(|t| t.id == id)
    }

    pub fn active_sticker(&self) -> Option<&StickerLayer> {
        let (LayerKind::Sticker, id) = self.active? else {
            return None;
        };
        self.stickers.iter().find(|s| s.id == id)
    }

    pub fn text_layers(&self) -> &[TextLayer] {
        &self.text
    }

    pub fn sticker_layers(&self) -> &[StickerLayer] {
        &self.stickers
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.stickers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.text.len() + self.stickers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic_across_both_collections() {
        let mut o = Overlays::new();
        let a = o.add_text("Arial");
        let b = o.add_sticker("heart");
        let c = o.add_text("Georgia");
        assert!(a < b && b < c);
        assert_eq!(o.len(), 3);
    }

    #[test]
    fn test_add_makes_layer_active() {
        let mut o = Overlays::new();
        let a = o.add_text("Arial");
        assert_eq!(o.active(), Some((LayerKind::Text, a)));
        let b = o.add_sticker("star");
        assert_eq!(o.active(), Some((LayerKind::Sticker, b)));
        assert!(o.active_sticker().is_some());
        assert!(o.active_text().is_none());
    }

    #[test]
    fn test_new_text_layer_defaults() {
        let mut o = Overlays::new();
        o.add_text("Verdana");
        let layer = o.active_text().unwrap();
        assert_eq!(layer.text, "Hello World");
        assert_eq!(layer.font_family, "Verdana");
        assert_eq!(layer.size, 48.0);
        assert_eq!(layer.color, [0, 0, 0, 255]);
        assert!(!layer.bold && !layer.italic);
        assert_eq!((layer.x_pct, layer.y_pct), (40.0, 40.0));
    }

    #[test]
    fn test_edits_only_land_on_active_layer() {
        let mut o = Overlays::new();
        let first = o.add_text("Arial");
        o.add_text("Arial");
        assert!(o.update_active_text(TextEdit::Content("second".into())));

        let texts = o.text_layers();
        assert_eq!(texts[0].id, first);
        assert_eq!(texts[0].text, "Hello World");
        assert_eq!(texts[1].text, "second");
    }

    #[test]
    fn test_kind_mismatched_edit_is_rejected() {
        let mut o = Overlays::new();
        o.add_sticker("crown");
        assert!(!o.update_active_text(TextEdit::Bold(true)));
        assert!(o.update_active_sticker(StickerEdit::Width(64.0)));
    }

    #[test]
    fn test_font_size_clamped_on_update() {
        let mut o = Overlays::new();
        o.add_text("Arial");
        o.update_active_text(TextEdit::Size(500.0));
        assert_eq!(o.active_text().unwrap().size, 128.0);
        o.update_active_text(TextEdit::Size(3.0));
        assert_eq!(o.active_text().unwrap().size, 12.0);
    }

    #[test]
    fn test_remove_clears_active_reference() {
        let mut o = Overlays::new();
        let keep = o.add_sticker("heart");
        let gone = o.add_sticker("star");
        assert!(o.remove(gone));
        assert_eq!(o.active(), None);
        assert_eq!(o.len(), 1);
        assert!(!o.remove(gone));
        assert!(o.set_active(Some((LayerKind::Sticker, keep))));
    }

    #[test]
    fn test_set_active_rejects_unknown_or_mismatched_id() {
        let mut o = Overlays::new();
        let id = o.add_text("Arial");
        assert!(!o.set_active(Some((LayerKind::Sticker, id))));
        assert!(!o.set_active(Some((LayerKind::Text, 9999))));
        assert!(o.set_active(None));
        assert_eq!(o.active(), None);
        assert!(o.set_active(Some((LayerKind::Text, id))));
    }

    #[test]
    fn test_move_active_works_for_both_kinds() {
        let mut o = Overlays::new();
        o.add_text("Arial");
        assert!(o.move_active(10.0, 20.0));
        assert_eq!(o.active_text().unwrap().x_pct, 10.0);

        o.add_sticker("heart");
        assert!(o.move_active(70.0, 80.0));
        let s = o.active_sticker().unwrap();
        assert_eq!((s.x_pct, s.y_pct), (70.0, 80.0));

        o.set_active(None);
        assert!(!o.move_active(0.0, 0.0));
    }

    #[test]
    fn test_clear_empties_everything() {
        let mut o = Overlays::new();
        o.add_text("Arial");
        o.add_sticker("heart");
        o.clear();
        assert!(o.is_empty());
        assert_eq!(o.active(), None);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#000000"), Some([0, 0, 0, 255]));
        assert_eq!(parse_hex_color("#ff8001"), Some([255, 128, 1, 255]));
        assert_eq!(parse_hex_color("#FF800180"), Some([255, 128, 1, 128]));
        assert_eq!(parse_hex_color("ff8001"), None);
        assert_eq!(parse_hex_color("#xyz"), None);
    }
}
