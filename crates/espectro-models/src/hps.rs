//! Harmonic plus stochastic model.
//!
//! The richest decomposition: harmonics anchored to an f0 estimate plus a
//! stochastic approximation of the residual. Because both components are
//! fully parametric, this model supports the deepest transformations, time
//! scaling and morphing between two sounds.

use espectro_core::math::interp;

use crate::error::{ModelError, Result};
use crate::harmonic::{self, HarmonicParams};
use crate::residual::{self, SUBTRACTION_FFT_SIZE};
use crate::sine::{time_scale_indices, SineTracks};
use crate::stochastic::StochasticModel;
use crate::synth;

/// Analyze a sound into harmonic tracks and stochastic envelopes.
pub fn from_audio<S: StochasticModel>(
    x: &[f64],
    fs: f64,
    window: &[f64],
    n: usize,
    hop: usize,
    threshold_db: f64,
    params: &HarmonicParams,
    stochastic: &S,
) -> Result<(SineTracks, Vec<Vec<f64>>)> {
    let harmonics = harmonic::from_audio(x, fs, window, n, hop, threshold_db, params)?;
    let res = residual::subtract_sinusoids(x, SUBTRACTION_FFT_SIZE, hop, &harmonics, fs)?;
    let env = stochastic.analyze(&res, hop, 2 * hop);
    Ok((harmonics, env))
}

/// Resynthesize from harmonic tracks and stochastic envelopes.
///
/// Returns the summed reconstruction, the harmonic component and the
/// stochastic component; the sum covers the shorter of the two.
pub fn to_audio<S: StochasticModel>(
    harmonics: &SineTracks,
    env: &[Vec<f64>],
    hop: usize,
    fs: f64,
    stochastic: &S,
) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>)> {
    let harmonic_part = synth::synthesize_sinusoids(harmonics, SUBTRACTION_FFT_SIZE, hop, fs)?;
    let noise = stochastic.synthesize(env, hop, 2 * hop);
    let len = harmonic_part.len().min(noise.len());
    let sum = (0..len).map(|i| harmonic_part[i] + noise[i]).collect();
    Ok((sum, harmonic_part, noise))
}

/// Time scaling of a harmonic plus stochastic representation.
///
/// Harmonic rows and envelope rows are remapped together by the same
/// (input time, output time) control pairs, so the two components stay
/// aligned. Phases are dropped.
pub fn scale_time(
    harmonics: &SineTracks,
    env: &[Vec<f64>],
    time_scaling: &[f64],
) -> Result<(SineTracks, Vec<Vec<f64>>)> {
    let frames = harmonics.num_frames().min(env.len());
    let indices = time_scale_indices(frames, time_scaling)?;

    let mut scaled = SineTracks::default();
    let mut scaled_env = Vec::with_capacity(indices.len());
    for src in indices {
        scaled.freq.push(harmonics.freq[src].clone());
        scaled.mag.push(harmonics.mag[src].clone());
        scaled_env.push(env[src].clone());
    }
    Ok((scaled, scaled_env))
}

/// Morph between two harmonic plus stochastic sounds.
///
/// Output follows the first sound's timeline; each of its frames is paired
/// with the proportionally-placed frame of the second sound. The three
/// control arrays are flat (time, factor) pairs with factors in `[0, 1]`
/// (0 is all first sound); frequency, magnitude and envelope factors are
/// independent. A harmonic is morphed only when present in both paired
/// frames, otherwise the output cell is 0.
#[allow(clippy::too_many_arguments)]
pub fn morph(
    harmonics1: &SineTracks,
    env1: &[Vec<f64>],
    harmonics2: &SineTracks,
    env2: &[Vec<f64>],
    freq_intp: &[f64],
    mag_intp: &[f64],
    stoc_intp: &[f64],
) -> Result<(SineTracks, Vec<Vec<f64>>)> {
    let frames1 = harmonics1.num_frames().min(env1.len());
    let frames2 = harmonics2.num_frames().min(env2.len());
    if frames1 == 0 || frames2 == 0 {
        return Ok((SineTracks::default(), Vec::new()));
    }

    let freq_curve = morph_curve("freq_intp", freq_intp, frames1)?;
    let mag_curve = morph_curve("mag_intp", mag_intp, frames1)?;
    let stoc_curve = morph_curve("stoc_intp", stoc_intp, frames1)?;

    let width = harmonics1.num_tracks();
    let mut out = SineTracks::default();
    let mut out_env = Vec::with_capacity(frames1);
    for l in 0..frames1 {
        let l2 = if frames1 > 1 {
            ((l * (frames2 - 1)) as f64 / (frames1 - 1) as f64).round() as usize
        } else {
            0
        };
        let ff = interp(l as f64, &freq_curve.0, &freq_curve.1);
        let fm = interp(l as f64, &mag_curve.0, &mag_curve.1);
        let fs = interp(l as f64, &stoc_curve.0, &stoc_curve.1);

        let mut row_f = vec![0.0; width];
        let mut row_m = vec![0.0; width];
        for k in 0..width {
            let f1 = harmonics1.freq[l][k];
            let f2 = harmonics2.freq[l2].get(k).copied().unwrap_or(0.0);
            if f1 > 0.0 && f2 > 0.0 {
                row_f[k] = (1.0 - ff) * f1 + ff * f2;
                let m2 = harmonics2.mag[l2].get(k).copied().unwrap_or(0.0);
                row_m[k] = (1.0 - fm) * harmonics1.mag[l][k] + fm * m2;
            }
        }
        out.freq.push(row_f);
        out.mag.push(row_m);

        let row_e = env1[l]
            .iter()
            .zip(&env2[l2])
            .map(|(a, b)| (1.0 - fs) * a + fs * b)
            .collect();
        out_env.push(row_e);
    }
    Ok((out, out_env))
}

/// Normalize a (time, factor) control array to the frame axis of the
/// first sound.
fn morph_curve(
    param: &'static str,
    intp: &[f64],
    frames: usize,
) -> Result<(Vec<f64>, Vec<f64>)> {
    if intp.is_empty() || intp.len() % 2 != 0 {
        return Err(ModelError::InvalidParameter {
            param,
            value: intp.len() as f64,
            reason: "expected a non-empty flat list of (time, factor) pairs",
        });
    }
    let last_time = intp[intp.len() - 2];
    if last_time <= 0.0 {
        return Err(ModelError::InvalidParameter {
            param,
            value: last_time,
            reason: "the last control time must be positive",
        });
    }
    let times = intp
        .iter()
        .step_by(2)
        .map(|&v| (frames - 1) as f64 * v / last_time)
        .collect();
    let factors = intp.iter().skip(1).step_by(2).copied().collect();
    Ok((times, factors))
}
