// ============================================================================
// AI OPERATIONS — the generative backend seam
// ============================================================================
//
// The editing core never talks to a model or a network itself.  Embedders
// supply a `GenerativeBackend`; the controller hands it the current payload
// plus a prompt and either commits the returned image or surfaces the error
// message verbatim.  Calls are blocking; the controller's busy flag keeps
// them serialized.

use crate::canvas::Hotspot;
use crate::io::ImagePayload;

/// Failure description from a generative call.  The message is shown to the
/// user as-is and never parsed.
#[derive(Debug, Clone)]
pub struct EditError {
    message: String,
}

impl EditError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for EditError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

/// The external generative collaborator.  Implementations own their transport,
/// credentials, timeouts, and retries; the core only distinguishes a new
/// image from a failure and never retries.
pub trait GenerativeBackend {
    /// Localized edit at a natural-pixel hotspot ("remove this blemish").
    fn generate_edit(
        &self,
        image: &ImagePayload,
        prompt: &str,
        hotspot: &Hotspot,
    ) -> Result<ImagePayload, EditError>;

    /// Whole-image stylistic filter ("make it synthwave").
    fn generate_filter(&self, image: &ImagePayload, prompt: &str)
    -> Result<ImagePayload, EditError>;

    /// Whole-image photographic adjustment ("blur the background").
    fn generate_adjustment(
        &self,
        image: &ImagePayload,
        prompt: &str,
    ) -> Result<ImagePayload, EditError>;
}

// ============================================================================
// PROMPT PRESETS
// ============================================================================

/// A named, ready-made prompt offered alongside the free-form field.
#[derive(Clone, Copy, Debug)]
pub struct PromptPreset {
    pub name: &'static str,
    pub prompt: &'static str,
}

/// Stylistic filter presets.
pub const FILTER_PRESETS: &[PromptPreset] = &[
    PromptPreset {
        name: "Synthwave",
        prompt: "Apply a vibrant 80s synthwave aesthetic with neon magenta and cyan glows, and subtle scan lines.",
    },
    PromptPreset {
        name: "Anime",
        prompt: "Give the image a vibrant Japanese anime style, with bold outlines, cel-shading, and saturated colors.",
    },
    PromptPreset {
        name: "Lomo",
        prompt: "Apply a Lomography-style cross-processing film effect with high-contrast, oversaturated colors, and dark vignetting.",
    },
    PromptPreset {
        name: "Glitch",
        prompt: "Transform the image into a futuristic holographic projection with digital glitch effects and chromatic aberration.",
    },
];

/// Photographic adjustment presets.
pub const ADJUSTMENT_PRESETS: &[PromptPreset] = &[
    PromptPreset {
        name: "Blur Background",
        prompt: "Apply a realistic depth-of-field effect, making the background blurry while keeping the main subject in sharp focus.",
    },
    PromptPreset {
        name: "Enhance Details",
        prompt: "Slightly enhance the sharpness and details of the image without making it look unnatural.",
    },
    PromptPreset {
        name: "Warmer Lighting",
        prompt: "Adjust the color temperature to give the image warmer, golden-hour style lighting.",
    },
    PromptPreset {
        name: "Studio Light",
        prompt: "Add dramatic, professional studio lighting to the main subject.",
    },
];

/// Preset-or-custom prompt selection.  Picking a preset clears the custom
/// text and vice versa, so at most one source is active.
#[derive(Clone, Debug, Default)]
pub struct PromptSelection {
    preset: Option<&'static str>,
    custom: String,
}

impl PromptSelection {
    pub fn choose_preset(&mut self, preset: &PromptPreset) {
        self.preset = Some(preset.prompt);
        self.custom.clear();
    }

    pub fn set_custom(&mut self, text: impl Into<String>) {
        self.custom = text.into();
        self.preset = None;
    }

    /// The prompt that would be submitted, if any.
    pub fn active(&self) -> Option<&str> {
        if let Some(preset) = self.preset {
            Some(preset)
        } else if self.custom.trim().is_empty() {
            None
        } else {
            Some(&self.custom)
        }
    }

    pub fn clear(&mut self) {
        self.preset = None;
        self.custom.clear();
    }
}
