//! The consolidated matte pipeline and its file-processing shell.
//!
//! One parameterized pipeline covers all four matting variants — the
//! hard/soft neural mattes and the hard/soft white-background heuristics
//! differ only in [`Mode`] and [`FilterParameters`], not in code paths.
//! [`apply_matte`] is the pure per-image core; [`MatteEngine`] wraps it with
//! the keyed model registry and load/save plumbing.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image::{ImageFormat, RgbaImage};
use log::debug;

use crate::crop;
use crate::error::{Error, Result};
use crate::filters;
use crate::inference::{make_input_tensor, InferenceBackend, ModelRegistry};
use crate::matte;
use crate::white;

/// Model key used when [`ProcessOptions::model`] is not set.
pub const DEFAULT_MODEL_KEY: &str = "u2netp";

/// How the matte is derived from the input image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Pick [`Mode::White`] or [`Mode::SoftMask`] via the white-background
    /// likelihood heuristic.
    Auto,
    /// Heuristic white-background extraction, no neural mask.
    White,
    /// Neural mask mapped through the gamma power curve (graded matte).
    SoftMask,
    /// Neural mask cut at a fixed threshold (strictly binary matte).
    HardMask,
}

/// White-background extractor variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhitePolicy {
    /// Binary near-white test (channel floor + spread check).
    Hard,
    /// Graded falloff below the tolerance, smoother near the boundary.
    Soft,
}

/// Immutable per-invocation tuning knobs for the pipeline.
///
/// All parameters are caller-supplied; out-of-range values are clamped
/// inside the stages rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParameters {
    /// Hard-matte cut level on the 0-255 alpha scale (140 ~ 0.55).
    pub threshold: u8,
    /// Box blur radius for the matte, 0 disables.
    pub blur_radius: u32,
    /// Feather amount; softens edges with a half-strength blur, 0 disables.
    pub feather: u32,
    /// Signed morphology: negative erodes, positive dilates, |amount|
    /// capped at 10.
    pub refine: i32,
    /// Soft-matte gamma times 100 (100 -> gamma 1.0).
    pub alpha_power: u32,
    /// Near-white channel floor for the white-background extractor.
    pub white_tolerance: u8,
    /// Which white-background policy to use.
    pub white_policy: WhitePolicy,
    /// Crop uniform near-white margins before any other stage.
    pub auto_crop: bool,
    /// Channel floor above which a margin pixel counts as near-white.
    pub margin_threshold: u8,
    /// Padding kept around the content bounding box when cropping.
    pub crop_padding: u32,
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            threshold: matte::DEFAULT_HARD_THRESHOLD,
            blur_radius: 0,
            feather: 0,
            refine: 0,
            alpha_power: 100,
            white_tolerance: 238,
            white_policy: WhitePolicy::Soft,
            auto_crop: false,
            margin_threshold: 245,
            crop_padding: 2,
        }
    }
}

/// The concrete pipeline branch an image went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatteRoute {
    /// White-background extractor, hard policy.
    WhiteHard,
    /// White-background extractor, soft policy.
    WhiteSoft,
    /// Neural mask, gamma power curve.
    SoftMask,
    /// Neural mask, binary threshold.
    HardMask,
}

impl fmt::Display for MatteRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::WhiteHard => "white-hard",
            Self::WhiteSoft => "white-soft",
            Self::SoftMask => "soft-mask",
            Self::HardMask => "hard-mask",
        };
        f.write_str(name)
    }
}

/// Output of a single pipeline run.
#[derive(Debug)]
pub struct MatteOutcome {
    /// Composited RGBA image with the matte in the alpha channel.
    pub image: RgbaImage,
    /// Pipeline branch taken (auto mode already resolved).
    pub route: MatteRoute,
    /// Whether the auto-crop stage changed the buffer geometry.
    pub cropped: bool,
    /// Wall-clock time of the whole pipeline, inference included.
    pub elapsed: Duration,
}

impl MatteOutcome {
    /// Human-readable diagnostic: stage taken and timing.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "route={} cropped={} elapsed={:.1}ms",
            self.route,
            self.cropped,
            self.elapsed.as_secs_f64() * 1000.0
        )
    }
}

/// Run the matte pipeline on a single image.
///
/// Stages: optional auto-crop, mode resolution, alpha derivation (white
/// heuristic or neural mask), refinement, compositing. The backend is only
/// touched on the neural routes; white routes run without one.
///
/// # Errors
///
/// - [`Error::InvalidInput`] for a zero-area image.
/// - [`Error::ModelUnavailable`] when a neural route is requested without a
///   backend.
/// - [`Error::MaskShape`] when the backend returns a wrong-length mask.
/// - Any error the backend itself reports.
pub fn apply_matte(
    image: &RgbaImage,
    mode: Mode,
    params: &FilterParameters,
    backend: Option<&mut dyn InferenceBackend>,
) -> Result<MatteOutcome> {
    let started = Instant::now();
    let (in_w, in_h) = image.dimensions();
    if in_w == 0 || in_h == 0 {
        return Err(Error::InvalidInput(format!(
            "zero-area image ({in_w}x{in_h})"
        )));
    }

    // Auto-crop first so every size-dependent stage sees cropped geometry.
    let work;
    let (source, cropped) = if params.auto_crop {
        work = crop::auto_crop(image, params.margin_threshold, params.crop_padding);
        let changed = work.dimensions() != image.dimensions();
        if changed {
            debug!(
                "auto-crop {}x{} -> {}x{}",
                in_w,
                in_h,
                work.width(),
                work.height()
            );
        }
        (&work, changed)
    } else {
        (image, false)
    };
    let (w, h) = source.dimensions();

    let route = resolve_route(mode, params, source);
    debug!("matte route: {route} ({w}x{h})");

    let alpha = match route {
        MatteRoute::WhiteHard | MatteRoute::WhiteSoft => {
            let alpha = match route {
                MatteRoute::WhiteHard => white::white_alpha_hard(source, params.white_tolerance),
                _ => white::white_alpha_soft(source, params.white_tolerance),
            };
            filters::feather(alpha, w, h, params.feather)
        }
        MatteRoute::SoftMask | MatteRoute::HardMask => {
            let backend = backend.ok_or_else(|| {
                Error::ModelUnavailable("no inference backend for the neural matte path".to_string())
            })?;
            let alpha = neural_alpha(source, route, params, backend)?;
            let alpha = filters::morph(alpha, w, h, params.refine);
            let alpha = filters::box_blur(alpha, w, h, params.blur_radius);
            filters::feather(alpha, w, h, params.feather)
        }
    };

    Ok(MatteOutcome {
        image: matte::composite(source, &alpha),
        route,
        cropped,
        elapsed: started.elapsed(),
    })
}

/// Resolve the requested mode to a concrete pipeline branch.
fn resolve_route(mode: Mode, params: &FilterParameters, image: &RgbaImage) -> MatteRoute {
    let white_route = match params.white_policy {
        WhitePolicy::Hard => MatteRoute::WhiteHard,
        WhitePolicy::Soft => MatteRoute::WhiteSoft,
    };
    match mode {
        Mode::White => white_route,
        Mode::SoftMask => MatteRoute::SoftMask,
        Mode::HardMask => MatteRoute::HardMask,
        Mode::Auto => {
            if white::is_white_background(image) {
                white_route
            } else {
                MatteRoute::SoftMask
            }
        }
    }
}

/// Neural-mask alpha derivation at full working resolution.
///
/// Soft: gamma-map at model resolution, then resample. Hard: resample the
/// normalized grayscale mask first, then cut at the threshold so the
/// full-resolution matte stays strictly binary.
fn neural_alpha(
    source: &RgbaImage,
    route: MatteRoute,
    params: &FilterParameters,
    backend: &mut dyn InferenceBackend,
) -> Result<Vec<u8>> {
    let (w, h) = source.dimensions();
    let size = backend.input_size();
    if size == 0 {
        return Err(Error::InvalidInput(
            "inference backend reports zero input size".to_string(),
        ));
    }

    let tensor = make_input_tensor(source, size);
    let mask = backend.infer(&tensor)?;
    let expected = (size * size) as usize;
    if mask.len() != expected {
        return Err(Error::MaskShape {
            expected,
            actual: mask.len(),
        });
    }

    let mask = matte::normalize_mask(&mask);
    let alpha = match route {
        MatteRoute::SoftMask => {
            #[allow(clippy::cast_precision_loss)]
            let gamma = params.alpha_power as f32 / 100.0;
            let graded = matte::soft_alpha(&mask, gamma);
            matte::resample(&graded, size, size, w, h)
        }
        _ => {
            let gray = matte::soft_alpha(&mask, 1.0);
            let scaled = matte::resample(&gray, size, size, w, h);
            matte::hard_alpha(&scaled, params.threshold)
        }
    };
    Ok(alpha)
}

/// Options controlling file-level processing.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Matte derivation mode.
    pub mode: Mode,
    /// Pipeline tuning knobs.
    pub params: FilterParameters,
    /// Model registry key; `None` uses [`DEFAULT_MODEL_KEY`].
    pub model: Option<String>,
    /// Enable verbose per-file diagnostics.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Auto,
            params: FilterParameters::default(),
            model: None,
            verbose: false,
            quiet: false,
        }
    }
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Pipeline branch taken, when the pipeline ran to completion.
    pub route: Option<MatteRoute>,
    /// Human-readable status message.
    pub message: String,
}

/// The matte engine: pure pipeline plus model registry and file plumbing.
///
/// Create once, register inference backends under model keys, and reuse for
/// any number of images. Each image is processed independently; nothing is
/// shared between batch items except the registry itself.
#[derive(Default)]
pub struct MatteEngine {
    registry: ModelRegistry,
}

impl MatteEngine {
    /// Create an engine with no registered inference backends.
    ///
    /// White and auto-resolved-to-white processing work immediately; the
    /// neural routes need [`register_model`](Self::register_model) first.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an inference backend under a model key.
    pub fn register_model(&mut self, key: impl Into<String>, backend: Box<dyn InferenceBackend>) {
        self.registry.register(key, backend);
    }

    /// Whether a backend is registered under the given key.
    #[must_use]
    pub fn has_model(&self, key: &str) -> bool {
        self.registry.contains(key)
    }

    /// Process a single in-memory image.
    ///
    /// # Errors
    ///
    /// See [`apply_matte`]; additionally names the missing model key when a
    /// neural route finds no registered backend.
    pub fn process_image(
        &mut self,
        image: &RgbaImage,
        opts: &ProcessOptions,
    ) -> Result<MatteOutcome> {
        let key = opts.model.as_deref().unwrap_or(DEFAULT_MODEL_KEY);
        let backend = self.registry.get(key);
        match apply_matte(image, opts.mode, &opts.params, backend) {
            Err(Error::ModelUnavailable(_)) => Err(Error::ModelUnavailable(format!(
                "no inference backend registered for model '{key}'"
            ))),
            other => other,
        }
    }

    /// Process a single image file: load, build matte, save.
    ///
    /// Never panics; failures are reported in the returned [`ProcessResult`]
    /// and leave any previously written output untouched.
    #[must_use]
    pub fn process_file(
        &mut self,
        input: &Path,
        output: &Path,
        opts: &ProcessOptions,
    ) -> ProcessResult {
        let mut result = ProcessResult {
            path: input.to_path_buf(),
            success: false,
            route: None,
            message: String::new(),
        };

        let image = match image::open(input) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                result.message = format!("Failed to load: {e}");
                return result;
            }
        };

        let outcome = match self.process_image(&image, opts) {
            Ok(outcome) => outcome,
            Err(e) => {
                result.message = format!("Failed to build matte: {e}");
                return result;
            }
        };

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match save_image(&outcome.image, output) {
            Ok(()) => {
                result.success = true;
                result.route = Some(outcome.route);
                result.message = outcome.summary();
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }

    /// Process all supported images in a directory, strictly sequentially.
    ///
    /// One image's full pipeline (inference included) completes before the
    /// next begins, and one failing image never aborts the remaining batch.
    /// Outputs are written as PNG files named after each input.
    #[must_use]
    pub fn process_directory(
        &mut self,
        input_dir: &Path,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> Vec<ProcessResult> {
        let fail = |path: &Path, message: String| ProcessResult {
            path: path.to_path_buf(),
            success: false,
            route: None,
            message,
        };

        let mut inputs: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .map(|e| e.path())
                .filter(|p| p.is_file() && is_supported_image(p))
                .collect(),
            Err(e) => {
                return vec![fail(input_dir, format!("Failed to read directory: {e}"))];
            }
        };
        inputs.sort();

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![fail(
                    output_dir,
                    format!("Failed to create output directory: {e}"),
                )];
            }
        }

        inputs
            .iter()
            .map(|input| {
                let stem = input
                    .file_stem()
                    .map_or_else(|| "output".to_string(), |s| s.to_string_lossy().to_string());
                let output = output_dir.join(format!("{stem}.png"));
                self.process_file(input, &output, opts)
            })
            .collect()
    }
}

/// Check if a file has a supported input image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an RGBA matte to a lossless, alpha-capable format.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for formats that cannot carry the
/// alpha channel losslessly (JPEG and friends), or an encoding error from
/// the underlying writer.
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Png | ImageFormat::WebP => {
            image.save(path)?;
            Ok(())
        }
        _ => Err(Error::UnsupportedFormat(format!(
            "{format:?} cannot carry a lossless alpha channel; use png or webp"
        ))),
    }
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_matte.png"` — the extension is
/// always PNG so the alpha channel survives.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_matte.png"))
}
