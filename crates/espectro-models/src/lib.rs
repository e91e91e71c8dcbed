//! Espectro Models - Spectral models for sound analysis and synthesis
//!
//! This crate implements the spectral modeling chain: short-time spectra,
//! sinusoidal partial tracking, harmonic selection, and phase-continuous
//! resynthesis, plus their combinations with a residual or stochastic
//! component:
//!
//! - [`dft`] - Single-frame spectrum analysis/synthesis (zero-phase windowing)
//! - [`stft`] - Magnitude/phase spectrogram and inverse overlap-add
//! - [`peaks`] - Spectral peak detection with parabolic interpolation
//! - [`sine`] - Sinusoidal model: partial tracking across frames
//! - [`harmonic`] - Harmonic model: two-way mismatch f0 and harmonic selection
//! - [`synth`] - Spectral-domain sinusoid generation and overlap-add output
//! - [`residual`] - Subtraction of modeled sinusoids from the input
//! - [`stochastic`] - Seam for stochastic residual approximation
//! - [`spr`], [`sps`], [`hpr`], [`hps`] - Combined models and transformations
//!
//! ## Example Workflow
//!
//! ```rust,ignore
//! use espectro_core::window::Window;
//! use espectro_models::sine::{self, SineParams};
//!
//! let window = Window::Hamming.coefficients(2001);
//! let tracks = sine::from_audio(&x, 44100.0, &window, 2048, 128, -80.0,
//!                               &SineParams::default())?;
//! let y = sine::to_audio(&tracks, 512, 128, 44100.0)?;
//! ```

pub mod dft;
pub mod error;
pub mod fft;
mod frames;
pub mod harmonic;
pub mod hpr;
pub mod hps;
pub mod peaks;
pub mod residual;
pub mod sine;
pub mod spr;
pub mod sps;
pub mod stft;
pub mod stochastic;
pub mod synth;

// Re-export main types
pub use error::{ModelError, Result};
pub use fft::Fft;
pub use harmonic::HarmonicParams;
pub use peaks::Peak;
pub use sine::{SineParams, SineTracks};
pub use stft::Spectrogram;
pub use stochastic::StochasticModel;
