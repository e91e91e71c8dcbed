//! Espectro Core - window functions and math primitives.
//!
//! This crate holds the pieces shared by every Espectro analysis/synthesis
//! model:
//!
//! - [`window`] - analysis and synthesis window generation
//! - [`math`] - dB conversion, interpolation, phase unwrapping, RMS error
//!
//! The heavier spectral machinery (DFT, peak tracking, harmonic selection,
//! overlap-add synthesis) lives in `espectro-models`.

pub mod math;
pub mod window;

pub use math::{amplitude_to_db, db_to_amplitude, interp, is_power_of_two, rmse, unwrap_phase};
pub use window::{Window, triangular};
