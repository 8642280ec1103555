//! Turn a raw neural-network saliency mask (or a color heuristic) into a
//! clean alpha matte composited over the original image.
//!
//! The crate is built around one parameterized pipeline: optional auto-crop
//! of near-white margins, mode resolution, alpha derivation (neural mask or
//! white-background heuristic), morphological refinement and blur, and a
//! final straight-alpha composite. The segmentation model itself is an
//! opaque collaborator injected through [`InferenceBackend`].
//!
//! # Quick Start
//!
//! ```no_run
//! use bg_matte::{MatteEngine, Mode, ProcessOptions};
//!
//! let mut engine = MatteEngine::new();
//! let img = image::open("product.jpg").unwrap().to_rgba8();
//! let opts = ProcessOptions {
//!     mode: Mode::White,
//!     ..ProcessOptions::default()
//! };
//! let outcome = engine.process_image(&img, &opts).unwrap();
//! println!("{}", outcome.summary());
//! outcome.image.save("product_matte.png").unwrap();
//! ```
//!
//! # Neural mattes
//!
//! The soft and hard mask modes need a saliency model. Register any
//! [`InferenceBackend`] implementation under a model key and select it via
//! [`ProcessOptions::model`]:
//!
//! ```no_run
//! use bg_matte::{InferenceBackend, MatteEngine, Mode, ProcessOptions, Result};
//!
//! struct MyBackend;
//! impl InferenceBackend for MyBackend {
//!     fn input_size(&self) -> u32 { 320 }
//!     fn infer(&mut self, input: &[f32]) -> Result<Vec<f32>> {
//!         // hand `input` (planar 3xSxS RGB floats) to the real model
//!         # let _ = input;
//!         # Ok(vec![0.0; 320 * 320])
//!     }
//! }
//!
//! let mut engine = MatteEngine::new();
//! engine.register_model("u2netp", Box::new(MyBackend));
//! ```

#![deny(missing_docs)]

pub mod crop;
pub mod engine;
pub mod error;
pub mod filters;
pub mod inference;
pub mod matte;
pub mod white;

pub use engine::{
    apply_matte, default_output_path, is_supported_image, save_image, FilterParameters,
    MatteEngine, MatteOutcome, MatteRoute, Mode, ProcessOptions, ProcessResult, WhitePolicy,
    DEFAULT_MODEL_KEY,
};
pub use error::{Error, Result};
pub use inference::{make_input_tensor, InferenceBackend, ModelRegistry};
