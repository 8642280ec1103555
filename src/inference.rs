//! Inference collaborator abstraction.
//!
//! The segmentation model is an opaque capability: the core hands it a
//! planar float tensor and receives a raw saliency mask back. Concrete
//! backends (ONNX runtimes, remote services, test stubs) live outside this
//! crate and are injected through [`InferenceBackend`]; the engine caches
//! them behind an explicit keyed [`ModelRegistry`].

use std::collections::HashMap;

use image::{imageops, RgbaImage};

use crate::error::Result;

/// Trait for saliency inference backends.
///
/// Input layout contract: `3 * S * S` floats, planar, channel order R, G, B,
/// values in `[0, 1]` scaled from the 8-bit source, where `S` is
/// [`input_size`](Self::input_size). Output contract: `S * S` floats of
/// arbitrary numeric range (callers normalize before use).
pub trait InferenceBackend {
    /// Side length `S` of the model's fixed square input resolution.
    fn input_size(&self) -> u32;

    /// Run inference on a prepared input tensor.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot produce a mask (model not
    /// loaded, runtime failure). The caller aborts the current image only;
    /// a batch continues with the remaining items.
    fn infer(&mut self, input: &[f32]) -> Result<Vec<f32>>;
}

/// Keyed store of inference backends.
///
/// Owned by the caller-facing shell, never by the pure pipeline functions:
/// the pipeline receives at most one `&mut dyn InferenceBackend` per image.
#[derive(Default)]
pub struct ModelRegistry {
    backends: HashMap<String, Box<dyn InferenceBackend>>,
}

impl ModelRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a backend under a model key.
    pub fn register(&mut self, key: impl Into<String>, backend: Box<dyn InferenceBackend>) {
        self.backends.insert(key.into(), backend);
    }

    /// Look up a backend by model key.
    pub fn get(&mut self, key: &str) -> Option<&mut dyn InferenceBackend> {
        match self.backends.get_mut(key) {
            Some(b) => Some(b.as_mut()),
            None => None,
        }
    }

    /// Whether a backend is registered under the given key.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.backends.contains_key(key)
    }

    /// Number of registered backends.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Whether no backend is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

/// Build the model input tensor from an RGBA image.
///
/// The image is smoothly resized to `size x size` and unpacked into planar
/// R, G, B float planes scaled to `[0, 1]`. Alpha is dropped.
#[must_use]
pub fn make_input_tensor(image: &RgbaImage, size: u32) -> Vec<f32> {
    let scaled = if image.dimensions() == (size, size) {
        image.clone()
    } else {
        imageops::resize(image, size, size, imageops::FilterType::Triangle)
    };

    let hw = (size * size) as usize;
    let mut tensor = vec![0.0f32; 3 * hw];
    for (i, px) in scaled.pixels().enumerate() {
        tensor[i] = f32::from(px[0]) / 255.0;
        tensor[i + hw] = f32::from(px[1]) / 255.0;
        tensor[i + 2 * hw] = f32::from(px[2]) / 255.0;
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use image::Rgba;

    struct FixedMask {
        size: u32,
        value: f32,
    }

    impl InferenceBackend for FixedMask {
        fn input_size(&self) -> u32 {
            self.size
        }

        fn infer(&mut self, input: &[f32]) -> Result<Vec<f32>> {
            assert_eq!(input.len(), (3 * self.size * self.size) as usize);
            Ok(vec![self.value; (self.size * self.size) as usize])
        }
    }

    struct Broken;

    impl InferenceBackend for Broken {
        fn input_size(&self) -> u32 {
            4
        }

        fn infer(&mut self, _input: &[f32]) -> Result<Vec<f32>> {
            Err(Error::Inference("model file missing".to_string()))
        }
    }

    #[test]
    fn registry_register_lookup_and_replace() {
        let mut registry = ModelRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("u2netp").is_none());

        registry.register("u2netp", Box::new(FixedMask { size: 4, value: 0.5 }));
        assert!(registry.contains("u2netp"));
        assert_eq!(registry.len(), 1);

        registry.register("u2netp", Box::new(FixedMask { size: 8, value: 0.1 }));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("u2netp").unwrap().input_size(), 8);
    }

    #[test]
    fn registry_surfaces_backend_errors() {
        let mut registry = ModelRegistry::new();
        registry.register("broken", Box::new(Broken));
        let backend = registry.get("broken").unwrap();
        let err = backend.infer(&[0.0; 48]).unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
    }

    #[test]
    fn tensor_is_planar_rgb_scaled_to_unit_range() {
        // Solid red 2x2 image, no resize involved.
        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        let tensor = make_input_tensor(&img, 2);
        assert_eq!(tensor.len(), 3 * 4);
        assert!(tensor[..4].iter().all(|&v| (v - 1.0).abs() < 1e-6)); // R plane
        assert!(tensor[4..].iter().all(|&v| v.abs() < 1e-6)); // G and B planes
    }

    #[test]
    fn tensor_resizes_to_model_resolution() {
        let img = RgbaImage::from_pixel(9, 5, Rgba([0, 128, 255, 255]));
        let tensor = make_input_tensor(&img, 4);
        assert_eq!(tensor.len(), 3 * 16);
        // A uniform image stays uniform through the resize.
        assert!(tensor[..16].iter().all(|&v| v.abs() < 1e-6));
        assert!(tensor[16..32]
            .iter()
            .all(|&v| (v - 128.0 / 255.0).abs() < 1e-3));
        assert!(tensor[32..].iter().all(|&v| (v - 1.0).abs() < 1e-3));
    }
}
