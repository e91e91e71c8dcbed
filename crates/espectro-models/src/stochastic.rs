//! Seam for stochastic residual approximation.
//!
//! The combined sinusoidal/harmonic plus stochastic models are generic
//! over this trait, so any envelope approximation (or a passthrough for
//! testing) can stand in for the stochastic component.

/// Approximates a residual sound by a sequence of spectral envelopes and
/// regenerates a noise signal from them.
pub trait StochasticModel {
    /// Approximate `x`, advancing by `hop` samples and analyzing
    /// `frame_len` samples per row. Returns one envelope row per frame.
    fn analyze(&self, x: &[f64], hop: usize, frame_len: usize) -> Vec<Vec<f64>>;

    /// Generate a sound from envelope rows, `hop` samples per row.
    fn synthesize(&self, env: &[Vec<f64>], hop: usize, frame_len: usize) -> Vec<f64>;
}
