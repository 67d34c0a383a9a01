// ============================================================================
// EDITOR APP — the tool controller and single state aggregate
// ============================================================================
//
// Everything mutable lives here, behind named transitions: the session
// (history), the active tool, transient tool state, overlays, and the busy
// flag.  History, overlays, and adjustments are each mutated only through
// their own operations; the app decides when, never how.
//
// Every history mutation funnels through one "version changed" point that
// resets all transient tool state, so no tool can act on a stale version.
// ============================================================================

use std::time::Instant;

use crate::canvas::{
    Compositor, CropRegion, FileStickerAssets, Hotspot, Point, RenderError, Size, StickerAssets,
    ViewMetrics, bake_adjustments, bake_crop,
};
use crate::components::history::EditHistory;
use crate::components::layers::{LayerKind, Overlays, StickerEdit, TextEdit};
use crate::components::tools::{DragController, Tool, ToolState};
use crate::io::{ImagePayload, timestamped_name};
use crate::ops::adjustments::Adjustments;
use crate::ops::ai::GenerativeBackend;
use crate::session::EditSession;
use crate::settings::AppSettings;

// ============================================================================
// ERRORS + NOTICES
// ============================================================================

/// Everything an operation can surface to the user.  Never fatal; every
/// failure leaves the editor in its pre-operation state.
#[derive(Debug)]
pub enum EditorError {
    /// Missing required input.  History untouched.
    Validation(String),
    /// The generative backend failed.  Message surfaced verbatim.
    Collaborator(String),
    /// Local compositing/decoding failure.
    Render(String),
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorError::Validation(msg)
            | EditorError::Collaborator(msg)
            | EditorError::Render(msg) => write!(f, "{}", msg),
        }
    }
}

impl From<RenderError> for EditorError {
    fn from(e: RenderError) -> Self {
        EditorError::Render(e.to_string())
    }
}

/// A user-visible message that auto-dismisses after the configured delay.
struct Notice {
    message: String,
    raised_at: Instant,
}

// ============================================================================
// EDITOR APP
// ============================================================================

pub struct EditorApp {
    settings: AppSettings,
    compositor: Compositor,

    session: Option<EditSession>,
    tool: Tool,
    tool_state: ToolState,
    overlays: Overlays,
    drag: DragController,

    /// Natural size of the current version, refreshed on every version change.
    natural: Option<Size>,
    /// On-screen box the embedder renders into; `None` headless.
    displayed: Option<Size>,

    /// True while a generative request is outstanding; blocks every mutating
    /// control so no two requests overlap.
    busy: bool,
    notice: Option<Notice>,
}

impl EditorApp {
    pub fn new(settings: AppSettings) -> Self {
        Self::with_assets(settings, Box::new(FileStickerAssets::default()))
    }

    /// Construct with a custom sticker loader (tests, embedders).
    pub fn with_assets(settings: AppSettings, assets: Box<dyn StickerAssets>) -> Self {
        Self {
            settings,
            compositor: Compositor::new(assets),
            session: None,
            tool: Tool::default(),
            tool_state: ToolState::default(),
            overlays: Overlays::new(),
            drag: DragController::new(),
            natural: None,
            displayed: None,
            busy: false,
            notice: None,
        }
    }

    // ---- session lifecycle --------------------------------------------

    /// Start a new session over an uploaded image, replacing any previous
    /// history.  Every tool resets.
    pub fn upload_new(&mut self, payload: ImagePayload) -> Result<(), EditorError> {
        self.ensure_idle()?;
        // Validate the bytes decode before they become the session root.
        let decoded = payload
            .decode()
            .map_err(|e| self.raise(EditorError::Render(e.to_string())))?;
        let natural = Size::new(decoded.width() as f32, decoded.height() as f32);
        self.session = Some(EditSession::new(payload));
        self.natural = Some(natural);
        self.on_version_changed(false);
        Ok(())
    }

    /// Drop the session entirely (back to the start screen).
    pub fn close_session(&mut self) {
        self.session = None;
        self.natural = None;
        self.on_version_changed(false);
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn current(&self) -> Option<&ImagePayload> {
        self.session.as_ref()?.history.current()
    }

    /// The first version, for compare-while-held rendering.
    pub fn original(&self) -> Option<&ImagePayload> {
        self.session.as_ref()?.history.original()
    }

    pub fn history(&self) -> Option<&EditHistory> {
        self.session.as_ref().map(|s| &s.history)
    }

    /// Current image under its download name, `edited-<original-name>`.
    pub fn download(&self) -> Option<ImagePayload> {
        self.session.as_ref()?.download()
    }

    // ---- view geometry ------------------------------------------------

    /// Tell the engine how large the image is rendered on screen.
    pub fn set_displayed_size(&mut self, size: Size) {
        self.displayed = if size.is_empty() { None } else { Some(size) };
    }

    /// Metrics for the current version.  Headless (no displayed size set)
    /// means displayed equals natural.
    pub fn view_metrics(&self) -> Option<ViewMetrics> {
        let natural = self.natural?;
        Some(match self.displayed {
            Some(displayed) => ViewMetrics::new(natural, displayed),
            None => ViewMetrics::one_to_one(natural),
        })
    }

    // ---- tool selection + transient state ------------------------------

    pub fn select_tool(&mut self, tool: Tool) {
        if self.tool != tool {
            log_info!("Tool: {} -> {}", self.tool.label(), tool.label());
            self.tool = tool;
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Place the retouch hotspot from a click in displayed space.  Ignored
    /// (not an error) while busy or outside the retouch tool.
    pub fn place_hotspot(&mut self, displayed: Point) -> bool {
        if self.busy || self.tool != Tool::Retouch {
            return false;
        }
        let Some(view) = self.view_metrics() else {
            return false;
        };
        let hotspot = Hotspot::from_displayed(displayed, &view);
        log_info!(
            "Hotspot placed at natural ({}, {})",
            hotspot.natural_x,
            hotspot.natural_y
        );
        self.tool_state.hotspot = Some(hotspot);
        true
    }

    pub fn hotspot(&self) -> Option<&Hotspot> {
        self.tool_state.hotspot.as_ref()
    }

    pub fn set_retouch_prompt(&mut self, prompt: impl Into<String>) {
        self.tool_state.retouch_prompt = prompt.into();
    }

    pub fn retouch_prompt(&self) -> &str {
        &self.tool_state.retouch_prompt
    }

    // ---- generative operations ----------------------------------------

    /// Submit the retouch prompt for the current hotspot.
    pub fn submit_retouch(&mut self, backend: &dyn GenerativeBackend) -> Result<(), EditorError> {
        self.ensure_idle()?;
        let current = self.require_current()?;
        if self.tool_state.retouch_prompt.trim().is_empty() {
            return Err(self.raise(EditorError::Validation(
                "Please enter a description for your edit.".to_string(),
            )));
        }
        let Some(hotspot) = self.tool_state.hotspot else {
            return Err(self.raise(EditorError::Validation(
                "Please click on the image to select an area to edit.".to_string(),
            )));
        };

        let prompt = self.tool_state.retouch_prompt.clone();
        self.busy = true;
        log_info!("Generative: retouch at ({}, {})", hotspot.natural_x, hotspot.natural_y);
        let result = backend.generate_edit(&current, &prompt, &hotspot);
        self.busy = false;

        match result {
            Ok(image) => {
                self.commit_payload("edited", image);
                Ok(())
            }
            Err(e) => Err(self.raise(EditorError::Collaborator(format!(
                "Failed to generate the image. {}",
                e.message()
            )))),
        }
    }

    /// Apply an AI stylistic filter to the whole image.
    pub fn apply_ai_filter(
        &mut self,
        backend: &dyn GenerativeBackend,
        prompt: &str,
    ) -> Result<(), EditorError> {
        self.run_whole_image(prompt, |backend, image, prompt| {
            backend.generate_filter(image, prompt)
        }, backend)
    }

    /// Apply an AI photographic adjustment to the whole image.
    pub fn apply_ai_adjustment(
        &mut self,
        backend: &dyn GenerativeBackend,
        prompt: &str,
    ) -> Result<(), EditorError> {
        self.run_whole_image(prompt, |backend, image, prompt| {
            backend.generate_adjustment(image, prompt)
        }, backend)
    }

    fn run_whole_image(
        &mut self,
        prompt: &str,
        call: impl Fn(
            &dyn GenerativeBackend,
            &ImagePayload,
            &str,
        ) -> Result<ImagePayload, crate::ops::ai::EditError>,
        backend: &dyn GenerativeBackend,
    ) -> Result<(), EditorError> {
        self.ensure_idle()?;
        let current = self.require_current()?;
        if prompt.trim().is_empty() {
            return Err(self.raise(EditorError::Validation(
                "Please select a preset or describe the change you want.".to_string(),
            )));
        }

        self.busy = true;
        let result = call(backend, &current, prompt);
        self.busy = false;

        match result {
            Ok(image) => {
                self.commit_payload("result", image);
                Ok(())
            }
            Err(e) => Err(self.raise(EditorError::Collaborator(e.message().to_string()))),
        }
    }

    // ---- manual adjustments -------------------------------------------

    pub fn adjustments(&self) -> &Adjustments {
        &self.tool_state.adjustments
    }

    pub fn set_adjustments(&mut self, adjustments: Adjustments) {
        self.tool_state.adjustments = adjustments.clamped();
    }

    pub fn reset_adjustments(&mut self) {
        self.tool_state.adjustments = Adjustments::default();
    }

    /// Bake the live adjustment chain into a committed version.
    pub fn apply_manual_adjustments(&mut self) -> Result<(), EditorError> {
        self.ensure_idle()?;
        let current = self.require_current()?;
        if self.tool_state.adjustments.is_default() {
            return Err(self.raise(EditorError::Validation(
                "Adjust a slider first — the current values change nothing.".to_string(),
            )));
        }

        let surface = bake_adjustments(&current, &self.tool_state.adjustments)
            .map_err(|e| self.raise(e.into()))?;
        self.commit_surface("adjusted", &surface)
    }

    // ---- crop ----------------------------------------------------------

    pub fn set_crop_region(&mut self, region: CropRegion) {
        self.tool_state.crop = Some(region);
    }

    pub fn clear_crop(&mut self) {
        self.tool_state.crop = None;
    }

    pub fn crop_region(&self) -> Option<&CropRegion> {
        self.tool_state.crop.as_ref()
    }

    /// Crop to the pending selection at the given device pixel density.
    /// Densities below 1 are legitimate (zoomed-out displays); only
    /// non-positive values fall back to 1.
    pub fn apply_crop(&mut self, density: f32) -> Result<(), EditorError> {
        self.ensure_idle()?;
        let current = self.require_current()?;
        let region = match self.tool_state.crop {
            Some(r) if !r.is_zero_area() => r,
            _ => {
                return Err(self.raise(EditorError::Validation(
                    "Please select an area to crop.".to_string(),
                )));
            }
        };
        let view = self.view_metrics().ok_or_else(|| {
            EditorError::Render("No image metrics available.".to_string())
        })?;

        let density = if density > 0.0 { density } else { 1.0 };
        let surface =
            bake_crop(&current, &region, &view, density).map_err(|e| self.raise(e.into()))?;
        self.commit_surface("cropped", &surface)
    }

    // ---- overlays ------------------------------------------------------

    pub fn overlays(&self) -> &Overlays {
        &self.overlays
    }

    pub fn add_text_layer(&mut self) -> u64 {
        let family = self.settings.default_font_family.clone();
        self.overlays.add_text(&family)
    }

    pub fn add_sticker_layer(&mut self, source: &str) -> u64 {
        self.overlays.add_sticker(source)
    }

    pub fn update_active_text(&mut self, edit: TextEdit) -> bool {
        self.overlays.update_active_text(edit)
    }

    pub fn update_active_sticker(&mut self, edit: StickerEdit) -> bool {
        self.overlays.update_active_sticker(edit)
    }

    pub fn remove_layer(&mut self, id: u64) -> bool {
        self.overlays.remove(id)
    }

    pub fn set_active_layer(&mut self, selection: Option<(LayerKind, u64)>) -> bool {
        self.overlays.set_active(selection)
    }

    /// Flatten the staged overlay layers into a committed version.
    pub fn apply_overlays(&mut self) -> Result<(), EditorError> {
        self.ensure_idle()?;
        let current = self.require_current()?;
        if self.overlays.is_empty() {
            return Err(self.raise(EditorError::Validation(
                "Add a text or sticker layer first.".to_string(),
            )));
        }
        let view = self.view_metrics().ok_or_else(|| {
            EditorError::Render("No image metrics available.".to_string())
        })?;

        let surface = self
            .compositor
            .composite(&current, &self.overlays, &view)
            .map_err(|e| self.raise(e.into()))?;
        self.commit_surface("composited", &surface)
    }

    // ---- overlay dragging ----------------------------------------------

    /// Grab a layer for dragging.  Pointer and layer origin are in displayed
    /// space relative to the container.
    pub fn begin_drag(
        &mut self,
        kind: LayerKind,
        id: u64,
        pointer: Point,
        layer_origin: Point,
    ) -> bool {
        if self.busy || !self.overlays.set_active(Some((kind, id))) {
            return false;
        }
        self.drag.begin(pointer, layer_origin);
        true
    }

    /// Pointer moved during a drag; the active layer follows synchronously.
    pub fn drag_to(&mut self, pointer: Point) -> bool {
        let Some(container) = self.displayed.or(self.natural) else {
            return false;
        };
        match self.drag.update(pointer, container) {
            Some((x, y)) => self.overlays.move_active(x, y),
            None => false,
        }
    }

    /// Pointer released; the final position is applied, never dropped.
    pub fn end_drag(&mut self, pointer: Point) -> bool {
        let Some(container) = self.displayed.or(self.natural) else {
            self.drag.cancel();
            return false;
        };
        match self.drag.end(pointer, container) {
            Some((x, y)) => self.overlays.move_active(x, y),
            None => false,
        }
    }

    // ---- history navigation --------------------------------------------

    pub fn undo(&mut self) -> bool {
        if self.busy {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let moved = session.history.undo();
        if moved {
            self.on_version_changed(true);
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        if self.busy {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let moved = session.history.redo();
        if moved {
            self.on_version_changed(true);
        }
        moved
    }

    /// Back to the first version.  Later versions stay redo-reachable.
    pub fn reset_to_original(&mut self) -> bool {
        if self.busy {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let moved = session.history.reset_to_original();
        if moved {
            self.notice = None;
            self.on_version_changed(true);
        }
        moved
    }

    pub fn can_undo(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.history.can_undo())
    }

    pub fn can_redo(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.history.can_redo())
    }

    // ---- notices -------------------------------------------------------

    /// The pending user-visible message, if it hasn't expired.
    pub fn notice(&self) -> Option<&str> {
        let notice = self.notice.as_ref()?;
        let ttl = std::time::Duration::from_secs(self.settings.notice_duration_secs);
        if notice.raised_at.elapsed() >= ttl {
            return None;
        }
        Some(&notice.message)
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // ---- internals -----------------------------------------------------

    fn ensure_idle(&mut self) -> Result<(), EditorError> {
        if self.busy {
            return Err(EditorError::Validation(
                "Another operation is still in progress.".to_string(),
            ));
        }
        Ok(())
    }

    fn require_current(&mut self) -> Result<ImagePayload, EditorError> {
        match self.session.as_ref().and_then(|s| s.history.current()) {
            Some(payload) => Ok(payload.clone()),
            None => Err(self.raise(EditorError::Validation(
                "Upload an image first.".to_string(),
            ))),
        }
    }

    /// Record the error as a notice and hand it back to the caller.
    fn raise(&mut self, err: EditorError) -> EditorError {
        log_err!("{}", err);
        self.notice = Some(Notice {
            message: err.to_string(),
            raised_at: Instant::now(),
        });
        err
    }

    /// Commit a generative result under a fresh timestamped name.
    fn commit_payload(&mut self, prefix: &str, image: ImagePayload) {
        let named = ImagePayload::from_bytes(timestamped_name(prefix), image.bytes().to_vec());
        if let Some(session) = self.session.as_mut() {
            session.history.commit(named);
        }
        self.on_version_changed(true);
    }

    /// Encode a baked surface and commit it.
    fn commit_surface(
        &mut self,
        prefix: &str,
        surface: &image::RgbaImage,
    ) -> Result<(), EditorError> {
        let payload = ImagePayload::from_rgba(timestamped_name(prefix), surface)
            .map_err(|e| self.raise(EditorError::Render(e.to_string())))?;
        if let Some(session) = self.session.as_mut() {
            session.history.commit(payload);
        }
        self.on_version_changed(true);
        Ok(())
    }

    /// The single reaction point for "current version changed": clears every
    /// transient tool state, then refreshes the cached natural size.
    fn on_version_changed(&mut self, refresh_natural: bool) {
        self.overlays.clear();
        self.tool_state.reset();
        self.drag.cancel();

        if refresh_natural {
            self.natural = match self.current().map(|p| p.decode()) {
                Some(Ok(img)) => Some(Size::new(img.width() as f32, img.height() as f32)),
                Some(Err(e)) => {
                    log_warn!("Could not decode current version: {}", e);
                    None
                }
                None => None,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Rect;
    use crate::ops::ai::EditError;
    use image::{Rgba, RgbaImage};
    use std::cell::Cell;
    use std::collections::HashMap;

    struct MemoryAssets(HashMap<String, RgbaImage>);

    impl StickerAssets for MemoryAssets {
        fn load(&self, source: &str) -> Result<RgbaImage, String> {
            self.0
                .get(source)
                .cloned()
                .ok_or_else(|| format!("no sticker '{}'", source))
        }
    }

    /// Backend that returns a fixed 1x1 result or a fixed failure.
    struct MockBackend {
        fail: bool,
        calls: Cell<u32>,
    }

    impl MockBackend {
        fn ok() -> Self {
            Self {
                fail: false,
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                calls: Cell::new(0),
            }
        }

        fn result(&self) -> Result<ImagePayload, EditError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                Err(EditError::new("model unavailable"))
            } else {
                let img = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 255, 255]));
                ImagePayload::from_rgba("mock.png", &img).map_err(|e| EditError::new(e.to_string()))
            }
        }
    }

    impl GenerativeBackend for MockBackend {
        fn generate_edit(
            &self,
            _image: &ImagePayload,
            _prompt: &str,
            _hotspot: &Hotspot,
        ) -> Result<ImagePayload, EditError> {
            self.result()
        }

        fn generate_filter(
            &self,
            _image: &ImagePayload,
            _prompt: &str,
        ) -> Result<ImagePayload, EditError> {
            self.result()
        }

        fn generate_adjustment(
            &self,
            _image: &ImagePayload,
            _prompt: &str,
        ) -> Result<ImagePayload, EditError> {
            self.result()
        }
    }

    fn app_with_image(w: u32, h: u32) -> EditorApp {
        let mut app = EditorApp::with_assets(
            AppSettings::default(),
            Box::new(MemoryAssets(HashMap::new())),
        );
        let img = RgbaImage::from_pixel(w, h, Rgba([120, 130, 140, 255]));
        let payload = ImagePayload::from_rgba("photo.png", &img).unwrap();
        app.upload_new(payload).unwrap();
        app
    }

    #[test]
    fn test_upload_rejects_undecodable_bytes() {
        let mut app = EditorApp::with_assets(
            AppSettings::default(),
            Box::new(MemoryAssets(HashMap::new())),
        );
        let err = app
            .upload_new(ImagePayload::from_bytes("bad.png", vec![0, 1, 2]))
            .unwrap_err();
        assert!(matches!(err, EditorError::Render(_)));
        assert!(!app.has_session());
    }

    #[test]
    fn test_retouch_requires_prompt_and_hotspot() {
        let mut app = app_with_image(10, 10);
        let backend = MockBackend::ok();

        let err = app.submit_retouch(&backend).unwrap_err();
        assert!(matches!(err, EditorError::Validation(_)));

        app.set_retouch_prompt("remove the lamp");
        let err = app.submit_retouch(&backend).unwrap_err();
        assert!(matches!(err, EditorError::Validation(_)));
        assert_eq!(backend.calls.get(), 0);
        assert_eq!(app.history().unwrap().len(), 1);

        assert!(app.place_hotspot(Point::new(5.0, 5.0)));
        app.set_retouch_prompt("remove the lamp");
        app.submit_retouch(&backend).unwrap();
        assert_eq!(backend.calls.get(), 1);
        assert_eq!(app.history().unwrap().len(), 2);
        assert!(app.current().unwrap().name().starts_with("edited-"));
    }

    #[test]
    fn test_hotspot_ignored_outside_retouch_tool() {
        let mut app = app_with_image(10, 10);
        app.select_tool(Tool::Crop);
        assert!(!app.place_hotspot(Point::new(1.0, 1.0)));
        app.select_tool(Tool::Retouch);
        assert!(app.place_hotspot(Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_collaborator_failure_leaves_history_untouched() {
        let mut app = app_with_image(10, 10);
        let backend = MockBackend::failing();

        let err = app.apply_ai_filter(&backend, "make it synthwave").unwrap_err();
        assert!(matches!(err, EditorError::Collaborator(_)));
        assert_eq!(err.to_string(), "model unavailable");
        assert_eq!(app.history().unwrap().len(), 1);
        assert!(!app.is_busy());
        assert_eq!(app.notice(), Some("model unavailable"));
    }

    #[test]
    fn test_ai_paths_commit_result_versions() {
        let mut app = app_with_image(10, 10);
        let backend = MockBackend::ok();
        app.apply_ai_filter(&backend, "anime style").unwrap();
        app.apply_ai_adjustment(&backend, "warmer light").unwrap();
        assert_eq!(app.history().unwrap().len(), 3);
        assert!(app.current().unwrap().name().starts_with("result-"));
    }

    #[test]
    fn test_neutral_bake_is_rejected() {
        let mut app = app_with_image(10, 10);
        let err = app.apply_manual_adjustments().unwrap_err();
        assert!(matches!(err, EditorError::Validation(_)));
        assert_eq!(app.history().unwrap().len(), 1);
    }

    #[test]
    fn test_manual_bake_commits_and_resets_sliders() {
        let mut app = app_with_image(4, 4);
        let mut adj = Adjustments::default();
        adj.set_brightness(150.0);
        app.set_adjustments(adj);

        app.apply_manual_adjustments().unwrap();
        assert_eq!(app.history().unwrap().len(), 2);
        assert!(app.current().unwrap().name().starts_with("adjusted-"));
        // Transient state cleared by the version change
        assert!(app.adjustments().is_default());

        let baked = app.current().unwrap().decode().unwrap();
        assert_eq!(baked.get_pixel(0, 0), &Rgba([180, 195, 210, 255]));
    }

    #[test]
    fn test_crop_requires_nonzero_selection() {
        let mut app = app_with_image(20, 20);
        let err = app.apply_crop(1.0).unwrap_err();
        assert!(matches!(err, EditorError::Validation(_)));

        app.set_crop_region(CropRegion::new(Rect::new(0.0, 0.0, 10.0, 0.0), None));
        let err = app.apply_crop(1.0).unwrap_err();
        assert!(matches!(err, EditorError::Validation(_)));
        assert_eq!(app.history().unwrap().len(), 1);
    }

    #[test]
    fn test_crop_changes_resolution() {
        let mut app = app_with_image(200, 200);
        app.set_crop_region(CropRegion::new(Rect::new(10.0, 10.0, 50.0, 50.0), None));
        app.apply_crop(1.0).unwrap();

        let cropped = app.current().unwrap().decode().unwrap();
        assert_eq!(cropped.dimensions(), (50, 50));
        assert!(app.current().unwrap().name().starts_with("cropped-"));
    }

    #[test]
    fn test_crop_density_below_one_shrinks_output() {
        let mut app = app_with_image(200, 200);
        app.set_crop_region(CropRegion::new(Rect::new(0.0, 0.0, 50.0, 50.0), None));
        app.apply_crop(0.5).unwrap();
        let out = app.current().unwrap().decode().unwrap();
        assert_eq!(out.dimensions(), (25, 25));

        // Non-positive densities fall back to 1
        assert!(app.undo());
        app.set_crop_region(CropRegion::new(Rect::new(0.0, 0.0, 50.0, 50.0), None));
        app.apply_crop(0.0).unwrap();
        let out = app.current().unwrap().decode().unwrap();
        assert_eq!(out.dimensions(), (50, 50));
    }

    #[test]
    fn test_apply_overlays_empty_is_validation() {
        let mut app = app_with_image(10, 10);
        let err = app.apply_overlays().unwrap_err();
        assert!(matches!(err, EditorError::Validation(_)));
    }

    #[test]
    fn test_overlay_bake_failure_is_atomic() {
        let mut app = app_with_image(10, 10);
        app.add_sticker_layer("does-not-exist");
        let err = app.apply_overlays().unwrap_err();
        assert!(matches!(err, EditorError::Render(_)));
        assert_eq!(app.history().unwrap().len(), 1);
        // Layers survive so the user can fix the problem
        assert_eq!(app.overlays().len(), 1);
    }

    #[test]
    fn test_version_change_clears_transient_state() {
        let mut app = app_with_image(10, 10);
        app.add_text_layer();
        app.place_hotspot(Point::new(2.0, 2.0));
        app.set_crop_region(CropRegion::new(Rect::new(0.0, 0.0, 5.0, 5.0), None));

        let backend = MockBackend::ok();
        app.apply_ai_filter(&backend, "glitch").unwrap();

        assert!(app.overlays().is_empty());
        assert!(app.hotspot().is_none());
        assert!(app.crop_region().is_none());
    }

    #[test]
    fn test_undo_redo_walk_versions() {
        let mut app = app_with_image(4, 4);
        let backend = MockBackend::ok();
        app.apply_ai_filter(&backend, "a").unwrap();
        app.apply_ai_filter(&backend, "b").unwrap();

        assert!(app.undo());
        assert!(app.undo());
        assert!(!app.undo());
        assert_eq!(app.current().unwrap().name(), "photo.png");

        assert!(app.redo());
        assert!(app.current().unwrap().name().starts_with("result-"));
    }

    #[test]
    fn test_drag_moves_active_layer_to_release_point() {
        let mut app = app_with_image(100, 100);
        app.set_displayed_size(Size::new(100.0, 100.0));
        let id = app.add_text_layer();

        // Layer at 40% of a 100px container = (40, 40) displayed.
        assert!(app.begin_drag(
            LayerKind::Text,
            id,
            Point::new(45.0, 45.0),
            Point::new(40.0, 40.0)
        ));
        assert!(app.drag_to(Point::new(65.0, 25.0)));
        assert!(app.end_drag(Point::new(75.0, 35.0)));

        let layer = app.overlays().text_layers().first().unwrap();
        assert!((layer.x_pct - 70.0).abs() < 1e-3);
        assert!((layer.y_pct - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_download_wraps_current_version() {
        let app = app_with_image(5, 5);
        let dl = app.download().unwrap();
        assert_eq!(dl.name(), "edited-photo.png");
    }
}
