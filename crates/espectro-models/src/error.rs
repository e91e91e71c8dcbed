//! Error types for the analysis/synthesis models.

use thiserror::Error;

/// Errors reported by the analysis and synthesis models.
///
/// Degenerate numeric situations (empty peak lists, unvoiced frames, zero
/// interpolation denominators) are handled by explicit fallbacks inside the
/// algorithms and never surface here; these variants all indicate caller
/// input that has to be fixed.
#[derive(Debug, Error)]
pub enum ModelError {
    /// FFT size smaller than the analysis window
    #[error("FFT size {n} is smaller than the window size {m}")]
    FftSizeTooSmall {
        /// Requested FFT size.
        n: usize,
        /// Window length.
        m: usize,
    },

    /// FFT size must be a power of two
    #[error("FFT size {0} is not a power of two")]
    FftSizeNotPowerOfTwo(usize),

    /// Window length must be odd where symmetric centering is required
    #[error("window length {0} must be odd for symmetric frame centering")]
    WindowNotOdd(usize),

    /// Hop size must be positive
    #[error("hop size must be greater than 0, got {0}")]
    InvalidHop(usize),

    /// A tunable parameter is out of its valid range
    #[error("invalid parameter '{param}': {reason} (got {value})")]
    InvalidParameter {
        /// Name of the offending parameter.
        param: &'static str,
        /// The rejected value.
        value: f64,
        /// Why the value is rejected.
        reason: &'static str,
    },
}

/// Convenience result alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
