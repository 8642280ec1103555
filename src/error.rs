//! Error types for the bg-matte crate.

/// Errors that can occur while building or compositing a matte.
///
/// Numeric degeneracy (flat masks, all-white images, out-of-range tuning
/// knobs) is deliberately *not* represented here: the pipeline clamps those
/// to documented fallback outputs instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input buffer cannot be processed (e.g. zero-area image).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No inference backend is available for the requested model key.
    #[error("inference model unavailable: {0}")]
    ModelUnavailable(String),

    /// The inference backend returned a mask of the wrong length.
    #[error("mask shape mismatch: expected {expected} values, got {actual}")]
    MaskShape {
        /// Expected mask length (`input_size * input_size`).
        expected: usize,
        /// Length of the buffer the backend actually produced.
        actual: usize,
    },

    /// The inference backend itself failed to produce a mask.
    #[error("inference failed: {0}")]
    Inference(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The output format cannot carry an alpha channel or is unknown.
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image decoding or encoding.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let unsupported = Error::UnsupportedFormat("jpeg".to_string());
        assert!(unsupported.to_string().contains("jpeg"));

        let shape = Error::MaskShape {
            expected: 320 * 320,
            actual: 0,
        };
        let msg = shape.to_string();
        assert!(msg.contains("102400"));
        assert!(msg.contains("got 0"));

        let unavailable = Error::ModelUnavailable("u2netp".to_string());
        assert!(unavailable.to_string().contains("u2netp"));
    }
}
