//! RetouchFE — the editing core of an AI photo editor.
//!
//! A linear undo/redo version store, a coordinate-mapping and compositing
//! engine (manual adjustments, crop, text and sticker overlays), and a tool
//! controller that talks to an external generative backend through the
//! [`ops::ai::GenerativeBackend`] trait.  The binary wraps the same engine
//! as a headless CLI driven by JSON edit plans.

#[macro_use]
pub mod logger;

pub mod app;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod io;
pub mod ops;
pub mod session;
pub mod settings;

pub use app::{EditorApp, EditorError};
pub use canvas::{
    Compositor, CropRegion, FileStickerAssets, Hotspot, Point, Rect, RenderError, Size,
    StickerAssets, ViewMetrics,
};
pub use components::history::EditHistory;
pub use components::layers::{LayerKind, Overlays, StickerEdit, StickerLayer, TextEdit, TextLayer};
pub use components::tools::{DragController, Tool};
pub use io::ImagePayload;
pub use ops::adjustments::Adjustments;
pub use ops::ai::{EditError, GenerativeBackend};
pub use session::EditSession;
pub use settings::AppSettings;
