// ============================================================================
// TOOLS — tool selection, per-tool transient state, and overlay dragging
// ============================================================================

use crate::canvas::{CropRegion, Hotspot, Point, Size, pixels_to_percentage};
use crate::ops::adjustments::Adjustments;

/// The mutually exclusive editing tools.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    /// Click-to-place a hotspot, then prompt the generative backend.
    #[default]
    Retouch,
    Crop,
    /// Manual brightness/contrast/saturate/sepia/grayscale chain.
    Adjust,
    /// AI stylistic filters.
    Filters,
    /// AI photographic adjustments.
    AiEnhance,
    Text,
    Stickers,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Retouch => "Retouch",
            Tool::Crop => "Crop",
            Tool::Adjust => "Adjust",
            Tool::Filters => "Filters",
            Tool::AiEnhance => "AI Enhance",
            Tool::Text => "Text",
            Tool::Stickers => "Stickers",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[
            Tool::Retouch,
            Tool::Crop,
            Tool::Adjust,
            Tool::Filters,
            Tool::AiEnhance,
            Tool::Text,
            Tool::Stickers,
        ]
    }
}

/// Transient per-tool state.  Reset wholesale whenever the current version
/// changes; none of it survives a commit or history move.
#[derive(Default)]
pub struct ToolState {
    pub hotspot: Option<Hotspot>,
    pub crop: Option<CropRegion>,
    pub adjustments: Adjustments,
    pub retouch_prompt: String,
}

impl ToolState {
    pub fn reset(&mut self) {
        self.hotspot = None;
        self.crop = None;
        self.adjustments = Adjustments::default();
        self.retouch_prompt.clear();
    }
}

// ============================================================================
// DRAG CONTROLLER
// ============================================================================

/// Translates pointer motion into percentage-space positions for the active
/// overlay layer.
///
/// The grab offset (pointer minus the layer's displayed origin) is captured
/// at drag start so the layer doesn't jump under the cursor.  Every update is
/// applied synchronously per pointer event, and `end` re-applies the release
/// position so the final event can never be dropped.
#[derive(Default)]
pub struct DragController {
    grab: Option<(f32, f32)>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }

    /// Start a drag: `pointer` and `layer_origin` in displayed space,
    /// relative to the container's top-left corner.
    pub fn begin(&mut self, pointer: Point, layer_origin: Point) {
        self.grab = Some((pointer.x - layer_origin.x, pointer.y - layer_origin.y));
    }

    /// Pointer moved.  Returns the layer's new percentage position within
    /// `container`, or `None` when no drag is in progress.
    pub fn update(&mut self, pointer: Point, container: Size) -> Option<(f32, f32)> {
        let (off_x, off_y) = self.grab?;
        if container.is_empty() {
            return None;
        }
        let x = pointer.x - off_x;
        let y = pointer.y - off_y;
        Some((
            pixels_to_percentage(x, container.width),
            pixels_to_percentage(y, container.height),
        ))
    }

    /// Pointer released.  Returns the final position and clears the drag.
    pub fn end(&mut self, pointer: Point, container: Size) -> Option<(f32, f32)> {
        let last = self.update(pointer, container);
        self.grab = None;
        last
    }

    pub fn cancel(&mut self) {
        self.grab = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_list_is_complete_and_labeled() {
        assert_eq!(Tool::all().len(), 7);
        assert_eq!(Tool::default(), Tool::Retouch);
        for tool in Tool::all() {
            assert!(!tool.label().is_empty());
        }
    }

    #[test]
    fn test_tool_state_reset_clears_everything() {
        let mut state = ToolState::default();
        state.retouch_prompt = "remove the lamp".to_string();
        state.adjustments.set_brightness(150.0);
        state.reset();
        assert!(state.hotspot.is_none());
        assert!(state.crop.is_none());
        assert!(state.adjustments.is_default());
        assert!(state.retouch_prompt.is_empty());
    }

    #[test]
    fn test_drag_keeps_grab_offset() {
        let mut drag = DragController::new();
        let container = Size::new(200.0, 100.0);

        // Layer at (20, 10) displayed; grabbed 5px inside it.
        drag.begin(Point::new(25.0, 15.0), Point::new(20.0, 10.0));
        assert!(drag.is_dragging());

        let (x, y) = drag.update(Point::new(125.0, 65.0), container).unwrap();
        // New origin: (120, 60) -> 60% / 60%
        assert!((x - 60.0).abs() < 1e-4);
        assert!((y - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_release_position_is_never_dropped() {
        let mut drag = DragController::new();
        let container = Size::new(100.0, 100.0);
        drag.begin(Point::new(0.0, 0.0), Point::new(0.0, 0.0));

        // No intermediate updates; release alone must yield the position.
        let (x, y) = drag.end(Point::new(30.0, 70.0), container).unwrap();
        assert!((x - 30.0).abs() < 1e-3);
        assert!((y - 70.0).abs() < 1e-3);
        assert!(!drag.is_dragging());
        assert!(drag.update(Point::new(50.0, 50.0), container).is_none());
    }

    #[test]
    fn test_update_without_begin_is_none() {
        let mut drag = DragController::new();
        assert!(drag.update(Point::new(1.0, 1.0), Size::new(10.0, 10.0)).is_none());
        assert!(drag.end(Point::new(1.0, 1.0), Size::new(10.0, 10.0)).is_none());
    }

    #[test]
    fn test_cancel_discards_drag() {
        let mut drag = DragController::new();
        drag.begin(Point::new(0.0, 0.0), Point::new(0.0, 0.0));
        drag.cancel();
        assert!(!drag.is_dragging());
    }
}
