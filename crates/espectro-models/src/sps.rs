//! Sinusoidal plus stochastic model.
//!
//! Like [`spr`](crate::spr), but the residual is handed to a
//! [`StochasticModel`](crate::stochastic::StochasticModel) for envelope
//! approximation instead of being kept as a signal. The stochastic frame
//! length is twice the hop, so consecutive envelope frames overlap by half.

use crate::error::Result;
use crate::residual::{self, SUBTRACTION_FFT_SIZE};
use crate::sine::{self, SineParams, SineTracks};
use crate::stochastic::StochasticModel;
use crate::synth;

/// Analyze a sound into sinusoidal tracks and stochastic envelopes.
pub fn from_audio<S: StochasticModel>(
    x: &[f64],
    fs: f64,
    window: &[f64],
    n: usize,
    hop: usize,
    threshold_db: f64,
    params: &SineParams,
    stochastic: &S,
) -> Result<(SineTracks, Vec<Vec<f64>>)> {
    let tracks = sine::from_audio(x, fs, window, n, hop, threshold_db, params)?;
    let residual = residual::subtract_sinusoids(x, SUBTRACTION_FFT_SIZE, hop, &tracks, fs)?;
    let env = stochastic.analyze(&residual, hop, 2 * hop);
    Ok((tracks, env))
}

/// Resynthesize from tracks and stochastic envelopes.
///
/// Returns the summed reconstruction, the sinusoidal component and the
/// stochastic component; the sum covers the shorter of the two.
pub fn to_audio<S: StochasticModel>(
    tracks: &SineTracks,
    env: &[Vec<f64>],
    hop: usize,
    fs: f64,
    stochastic: &S,
) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>)> {
    let sines = synth::synthesize_sinusoids(tracks, SUBTRACTION_FFT_SIZE, hop, fs)?;
    let noise = stochastic.synthesize(env, hop, 2 * hop);
    let len = sines.len().min(noise.len());
    let sum = (0..len).map(|i| sines[i] + noise[i]).collect();
    Ok((sum, sines, noise))
}
