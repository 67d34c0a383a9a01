// ============================================================================
// RetouchFE CLI — headless edit pipeline
// ============================================================================
//
// Usage examples:
//   retouchfe --input photo.png --plan edits.json --output result.png
//   retouchfe -i photo.jpg -o out.webp                (format from extension)
//   retouchfe -i a.png b.png --plan edits.json --output-dir processed/
//   retouchfe --list-fonts             (families usable in text plan steps)
//
// A plan is an ordered JSON list of steps applied through the same engine
// operations the interactive controller uses:
//
//   [
//     {"op": "adjust", "brightness": 150, "sepia": 20},
//     {"op": "text", "content": "Hi", "x": 10, "y": 10, "color": "#ff0000"},
//     {"op": "sticker", "source": "heart", "width": 120},
//     {"op": "overlays"},
//     {"op": "crop", "x": 0, "y": 0, "width": 800, "height": 600},
//     {"op": "undo"}
//   ]
//
// Displayed space equals natural space in headless mode.  Overlay layers
// still staged when the plan ends are baked before saving — a save always
// flattens.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use serde::Deserialize;

use crate::app::EditorApp;
use crate::canvas::{CropRegion, Rect};
use crate::components::layers::{
    DEFAULT_LAYER_POSITION, FONT_FAMILIES, StickerEdit, TextEdit, parse_hex_color,
};
use crate::io::{ImagePayload, SaveFormat, encode_and_write};
use crate::ops::adjustments::Adjustments;
use crate::ops::text::enumerate_system_fonts;
use crate::settings::AppSettings;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// RetouchFE headless photo editor.
///
/// Apply JSON edit plans to image files and convert between formats — no GUI
/// required.
#[derive(Parser, Debug)]
#[command(
    name = "retouchfe",
    about = "RetouchFE headless photo editor",
    long_about = "Run JSON edit plans (adjustments, crops, text and sticker overlays)\n\
                  on image files without a GUI. Supports PNG, JPEG, WEBP, BMP, TGA,\n\
                  and TIFF output.\n\n\
                  Example:\n  \
                  retouchfe --input photo.png --plan edits.json --output result.png"
)]
pub struct CliArgs {
    /// Input image file(s).
    #[arg(short, long, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// JSON edit plan applied to each input.
    /// If omitted, images are only loaded and re-saved (format conversion).
    #[arg(short, long, value_name = "PLAN.json")]
    pub plan: Option<PathBuf>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, webp, bmp, tga, tiff.
    /// When omitted, inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1-100). Defaults to the settings file's value.
    #[arg(short, long, value_name = "1-100")]
    pub quality: Option<u8>,

    /// List the curated and installed font families, then exit.
    #[arg(long)]
    pub list_fonts: bool,

    /// Print per-step and per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Plan steps
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum PlanStep {
    /// Set + bake the adjustment chain in one commit.
    Adjust {
        #[serde(flatten)]
        values: Adjustments,
    },
    /// One crop commit.  Coordinates are natural pixels (headless mode).
    Crop {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        density: Option<f32>,
    },
    /// Stage a text layer.
    Text {
        content: Option<String>,
        family: Option<String>,
        size: Option<f32>,
        /// `#rrggbb` or `#rrggbbaa`.
        color: Option<String>,
        bold: Option<bool>,
        italic: Option<bool>,
        x: Option<f32>,
        y: Option<f32>,
    },
    /// Stage a sticker layer.
    Sticker {
        source: String,
        x: Option<f32>,
        y: Option<f32>,
        width: Option<f32>,
    },
    /// Bake all staged layers in one commit.
    Overlays,
    Undo,
    Redo,
    Reset,
}

fn parse_plan(source: &str) -> Result<Vec<PlanStep>, String> {
    serde_json::from_str(source).map_err(|e| format!("invalid plan: {}", e))
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    if args.list_fonts {
        println!("Curated families:");
        for family in FONT_FAMILIES {
            println!("  {}", family);
        }
        println!("Installed families:");
        for family in enumerate_system_fonts() {
            println!("  {}", family);
        }
        return ExitCode::SUCCESS;
    }

    if args.input.is_empty() {
        eprintln!("error: no input files given (see --help).");
        return ExitCode::FAILURE;
    }

    if args.input.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            args.input.len()
        );
        return ExitCode::FAILURE;
    }

    let settings = AppSettings::load();
    let quality = args.quality.unwrap_or(settings.jpeg_quality).clamp(1, 100);
    let format = parse_format(args.format.as_deref(), args.output.as_deref());

    let plan: Vec<PlanStep> = match &args.plan {
        Some(path) => {
            let source = match std::fs::read_to_string(path) {
                Ok(src) => src,
                Err(e) => {
                    eprintln!("error: could not read plan '{}': {}", path.display(), e);
                    return ExitCode::FAILURE;
                }
            };
            match parse_plan(&source) {
                Ok(steps) => steps,
                Err(e) => {
                    eprintln!("error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        None => Vec::new(),
    };

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!(
            "error: could not create output directory '{}': {}",
            dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    // One app for the whole batch: the font cache warms once.
    let mut app = EditorApp::new(settings);

    let total = args.input.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in args.input.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        let output_path = match build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            format,
        ) {
            Some(p) => p,
            None => {
                eprintln!(
                    "  error: cannot determine output path for '{}'.",
                    input_path.display()
                );
                any_failure = true;
                continue;
            }
        };

        match run_one(&mut app, input_path, &output_path, &plan, format, quality, args.verbose) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    app: &mut EditorApp,
    input: &Path,
    output: &Path,
    plan: &[PlanStep],
    format: SaveFormat,
    quality: u8,
    verbose: bool,
) -> Result<(), String> {
    // -- Step 1: Load ----------------------------------------------------
    let payload = ImagePayload::from_file(input).map_err(|e| format!("load failed: {}", e))?;
    app.upload_new(payload)
        .map_err(|e| format!("load failed: {}", e))?;

    // -- Step 2: Apply the plan ------------------------------------------
    for (idx, step) in plan.iter().enumerate() {
        let step_start = Instant::now();
        apply_step(app, step).map_err(|e| format!("plan step {}: {}", idx + 1, e))?;
        if verbose {
            println!(
                "  [plan {}/{}] {:.0}ms",
                idx + 1,
                plan.len(),
                step_start.elapsed().as_secs_f64() * 1000.0
            );
        }
    }

    // Layers still staged bake before saving — a save always flattens.
    if !app.overlays().is_empty() {
        app.apply_overlays()
            .map_err(|e| format!("overlay bake failed: {}", e))?;
    }

    // -- Step 3: Save ----------------------------------------------------
    let current = app
        .current()
        .ok_or_else(|| "no image to save".to_string())?;
    let flat = current
        .decode()
        .map_err(|e| format!("decode failed: {}", e))?;
    encode_and_write(&flat, output, format, quality).map_err(|e| format!("save failed: {}", e))?;

    Ok(())
}

fn apply_step(app: &mut EditorApp, step: &PlanStep) -> Result<(), String> {
    match step {
        PlanStep::Adjust { values } => {
            app.set_adjustments(*values);
            app.apply_manual_adjustments().map_err(|e| e.to_string())
        }
        PlanStep::Crop {
            x,
            y,
            width,
            height,
            density,
        } => {
            app.set_crop_region(CropRegion::new(Rect::new(*x, *y, *width, *height), None));
            app.apply_crop(density.unwrap_or(1.0))
                .map_err(|e| e.to_string())
        }
        PlanStep::Text {
            content,
            family,
            size,
            color,
            bold,
            italic,
            x,
            y,
        } => {
            app.add_text_layer();
            if let Some(content) = content {
                app.update_active_text(TextEdit::Content(content.clone()));
            }
            if let Some(family) = family {
                app.update_active_text(TextEdit::Family(family.clone()));
            }
            if let Some(size) = size {
                app.update_active_text(TextEdit::Size(*size));
            }
            if let Some(color) = color {
                let rgba = parse_hex_color(color)
                    .ok_or_else(|| format!("bad color '{}' (expected #rrggbb)", color))?;
                app.update_active_text(TextEdit::Color(rgba));
            }
            if let Some(bold) = bold {
                app.update_active_text(TextEdit::Bold(*bold));
            }
            if let Some(italic) = italic {
                app.update_active_text(TextEdit::Italic(*italic));
            }
            if x.is_some() || y.is_some() {
                let (cur_x, cur_y) = app
                    .overlays()
                    .active_text()
                    .map(|t| (t.x_pct, t.y_pct))
                    .unwrap_or(DEFAULT_LAYER_POSITION);
                app.update_active_text(TextEdit::Position(
                    x.unwrap_or(cur_x),
                    y.unwrap_or(cur_y),
                ));
            }
            Ok(())
        }
        PlanStep::Sticker {
            source,
            x,
            y,
            width,
        } => {
            app.add_sticker_layer(source);
            if x.is_some() || y.is_some() {
                let (cur_x, cur_y) = app
                    .overlays()
                    .active_sticker()
                    .map(|s| (s.x_pct, s.y_pct))
                    .unwrap_or(DEFAULT_LAYER_POSITION);
                app.update_active_sticker(StickerEdit::Position(
                    x.unwrap_or(cur_x),
                    y.unwrap_or(cur_y),
                ));
            }
            if let Some(width) = width {
                app.update_active_sticker(StickerEdit::Width(*width));
            }
            Ok(())
        }
        PlanStep::Overlays => app.apply_overlays().map_err(|e| e.to_string()),
        PlanStep::Undo => {
            app.undo();
            Ok(())
        }
        PlanStep::Redo => {
            app.redo();
            Ok(())
        }
        PlanStep::Reset => {
            app.reset_to_original();
            Ok(())
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Choose the [`SaveFormat`] from the `--format` string or infer it from the
/// output file extension. Defaults to PNG when neither is known.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> SaveFormat {
    if let Some(f) = format_arg {
        return SaveFormat::from_extension(f).unwrap_or(SaveFormat::Png);
    }
    if let Some(out) = output {
        let ext = out.extension().and_then(|e| e.to_str()).unwrap_or("");
        return SaveFormat::from_extension(ext).unwrap_or(SaveFormat::Png);
    }
    SaveFormat::Png
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, single-file input)
/// 2. `--output-dir` (batch directory, `edited-<stem>.<ext>`)
/// 3. Fallback: next to the input as `edited-<stem>.<ext>`
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();
    let name = format!("edited-{}.{}", stem, ext);

    if let Some(dir) = output_dir {
        return Some(dir.join(name));
    }
    let parent = input.parent().unwrap_or(Path::new("."));
    Some(parent.join(name))
}
