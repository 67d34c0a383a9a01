//! End-to-end pipeline coverage through the public API: upload, manual
//! adjustment bake, overlay composite, crop, and history navigation.

use image::{Rgba, RgbaImage};
use std::collections::HashMap;

use retouchfe::canvas::Rect;
use retouchfe::{
    Adjustments, AppSettings, CropRegion, EditorApp, ImagePayload, Size, StickerAssets,
    StickerEdit,
};

struct MemoryAssets(HashMap<String, RgbaImage>);

impl StickerAssets for MemoryAssets {
    fn load(&self, source: &str) -> Result<RgbaImage, String> {
        self.0
            .get(source)
            .cloned()
            .ok_or_else(|| format!("no sticker '{}'", source))
    }
}

fn editor_with_stickers() -> EditorApp {
    let mut assets = HashMap::new();
    // Square solid-white sticker so placement is easy to assert
    assets.insert(
        "badge".to_string(),
        RgbaImage::from_pixel(50, 50, Rgba([255, 255, 255, 255])),
    );
    EditorApp::with_assets(AppSettings::default(), Box::new(MemoryAssets(assets)))
}

fn upload(app: &mut EditorApp, w: u32, h: u32, px: [u8; 4]) {
    let img = RgbaImage::from_pixel(w, h, Rgba(px));
    let payload = ImagePayload::from_rgba("photo.png", &img).unwrap();
    app.upload_new(payload).unwrap();
}

#[test]
fn adjust_then_overlay_then_walk_history() {
    let mut app = editor_with_stickers();
    upload(&mut app, 100, 100, [100, 100, 100, 255]);
    let i0 = app.current().unwrap().clone();

    // --- bake brightness=150 -> I1 -------------------------------------
    let mut adj = Adjustments::default();
    adj.set_brightness(150.0);
    app.set_adjustments(adj);
    app.apply_manual_adjustments().unwrap();

    let i1 = app.current().unwrap().clone();
    let baked = i1.decode().unwrap();
    assert_eq!(baked.dimensions(), (100, 100));
    assert_eq!(baked.get_pixel(0, 0), &Rgba([150, 150, 150, 255]));
    assert!(i1.name().starts_with("adjusted-"));

    // --- sticker at (40%, 40%), width 100, displayed at half size -> I2 -
    app.set_displayed_size(Size::new(50.0, 50.0));
    app.add_sticker_layer("badge");
    app.update_active_sticker(StickerEdit::Width(10.0));
    app.apply_overlays().unwrap();

    let i2 = app.current().unwrap().clone();
    assert!(i2.name().starts_with("composited-"));
    let composited = i2.decode().unwrap();
    assert_eq!(composited.dimensions(), (100, 100));
    // 40% of 100 = 40; width 10 * (100/50) = 20 surface px, square sticker
    assert_eq!(composited.get_pixel(40, 40), &Rgba([255, 255, 255, 255]));
    assert_eq!(composited.get_pixel(59, 59), &Rgba([255, 255, 255, 255]));
    assert_eq!(composited.get_pixel(60, 40), &Rgba([150, 150, 150, 255]));
    assert_eq!(composited.get_pixel(39, 40), &Rgba([150, 150, 150, 255]));

    // Overlay layers were consumed by the commit
    assert!(app.overlays().is_empty());

    // --- undo twice -> I0, redo once -> I1 ------------------------------
    assert!(app.undo());
    assert!(app.undo());
    assert!(!app.undo());
    assert_eq!(app.current().unwrap().bytes(), i0.bytes());

    assert!(app.redo());
    assert_eq!(app.current().unwrap().bytes(), i1.bytes());
}

#[test]
fn commit_after_undo_discards_redo_branch() {
    let mut app = editor_with_stickers();
    upload(&mut app, 40, 40, [10, 20, 30, 255]);

    let mut adj = Adjustments::default();
    adj.set_grayscale(100.0);
    app.set_adjustments(adj);
    app.apply_manual_adjustments().unwrap();

    let mut adj = Adjustments::default();
    adj.set_sepia(50.0);
    app.set_adjustments(adj);
    app.apply_manual_adjustments().unwrap();
    assert_eq!(app.history().unwrap().len(), 3);

    app.undo();
    let mut adj = Adjustments::default();
    adj.set_brightness(120.0);
    app.set_adjustments(adj);
    app.apply_manual_adjustments().unwrap();

    let history = app.history().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history.cursor(), 2);
    assert!(!app.redo());
}

#[test]
fn crop_via_displayed_selection() {
    let mut app = editor_with_stickers();
    let img = RgbaImage::from_fn(200, 200, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 7, 255])
    });
    app.upload_new(ImagePayload::from_rgba("grid.png", &img).unwrap())
        .unwrap();

    // Displayed 1:1; 50x50 selection at density 1 -> exactly 50x50 out.
    app.set_displayed_size(Size::new(200.0, 200.0));
    app.set_crop_region(CropRegion::new(Rect::new(100.0, 20.0, 50.0, 50.0), None));
    app.apply_crop(1.0).unwrap();

    let out = app.current().unwrap().decode().unwrap();
    assert_eq!(out.dimensions(), (50, 50));
    assert_eq!(out.get_pixel(0, 0), img.get_pixel(100, 20));
    assert_eq!(out.get_pixel(49, 49), img.get_pixel(149, 69));

    // Undo restores the full-resolution version
    assert!(app.undo());
    let back = app.current().unwrap().decode().unwrap();
    assert_eq!(back.dimensions(), (200, 200));
}

#[test]
fn reset_keeps_redo_reachable() {
    let mut app = editor_with_stickers();
    upload(&mut app, 10, 10, [200, 0, 0, 255]);

    let mut adj = Adjustments::default();
    adj.set_grayscale(100.0);
    app.set_adjustments(adj);
    app.apply_manual_adjustments().unwrap();
    let edited = app.current().unwrap().clone();

    assert!(app.reset_to_original());
    assert_eq!(app.current().unwrap().name(), "photo.png");

    assert!(app.redo());
    assert_eq!(app.current().unwrap().bytes(), edited.bytes());
}

#[test]
fn failed_overlay_bake_preserves_everything() {
    let mut app = editor_with_stickers();
    upload(&mut app, 30, 30, [5, 5, 5, 255]);

    app.add_sticker_layer("badge");
    app.add_sticker_layer("missing");
    let err = app.apply_overlays().unwrap_err();
    assert!(err.to_string().contains("missing"));

    // History untouched, layers still staged, editor idle
    assert_eq!(app.history().unwrap().len(), 1);
    assert_eq!(app.overlays().len(), 2);
    assert!(!app.is_busy());
}
