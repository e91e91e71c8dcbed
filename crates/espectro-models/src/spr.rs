//! Sinusoidal plus residual model.
//!
//! The sinusoidal model captures the stable partials; whatever it misses
//! stays in a time-domain residual signal. Analysis and synthesis both run
//! the subtraction and resynthesis at the fixed
//! [`SUBTRACTION_FFT_SIZE`](crate::residual::SUBTRACTION_FFT_SIZE).

use crate::error::Result;
use crate::residual::{self, SUBTRACTION_FFT_SIZE};
use crate::sine::{self, SineParams, SineTracks};
use crate::synth;

/// Analyze a sound into sinusoidal tracks and a residual signal.
pub fn from_audio(
    x: &[f64],
    fs: f64,
    window: &[f64],
    n: usize,
    hop: usize,
    threshold_db: f64,
    params: &SineParams,
) -> Result<(SineTracks, Vec<f64>)> {
    let tracks = sine::from_audio(x, fs, window, n, hop, threshold_db, params)?;
    let residual = residual::subtract_sinusoids(x, SUBTRACTION_FFT_SIZE, hop, &tracks, fs)?;
    Ok((tracks, residual))
}

/// Resynthesize from tracks and residual.
///
/// Returns the summed reconstruction and the sinusoidal component alone;
/// the sum covers the shorter of the two components.
pub fn to_audio(
    tracks: &SineTracks,
    residual: &[f64],
    hop: usize,
    fs: f64,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let sines = synth::synthesize_sinusoids(tracks, SUBTRACTION_FFT_SIZE, hop, fs)?;
    let len = sines.len().min(residual.len());
    let sum = (0..len).map(|i| sines[i] + residual[i]).collect();
    Ok((sum, sines))
}
