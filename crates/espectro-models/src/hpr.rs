//! Harmonic plus residual model.

use crate::error::Result;
use crate::harmonic::{self, HarmonicParams};
use crate::residual::{self, SUBTRACTION_FFT_SIZE};
use crate::sine::SineTracks;
use crate::synth;

/// Analyze a sound into harmonic tracks and a residual signal.
pub fn from_audio(
    x: &[f64],
    fs: f64,
    window: &[f64],
    n: usize,
    hop: usize,
    threshold_db: f64,
    params: &HarmonicParams,
) -> Result<(SineTracks, Vec<f64>)> {
    let harmonics = harmonic::from_audio(x, fs, window, n, hop, threshold_db, params)?;
    let residual = residual::subtract_sinusoids(x, SUBTRACTION_FFT_SIZE, hop, &harmonics, fs)?;
    Ok((harmonics, residual))
}

/// Resynthesize from harmonic tracks and residual.
///
/// Returns the summed reconstruction and the harmonic component alone;
/// the sum covers the shorter of the two components.
pub fn to_audio(
    harmonics: &SineTracks,
    residual: &[f64],
    hop: usize,
    fs: f64,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let harmonic_part = synth::synthesize_sinusoids(harmonics, SUBTRACTION_FFT_SIZE, hop, fs)?;
    let len = harmonic_part.len().min(residual.len());
    let sum = (0..len).map(|i| harmonic_part[i] + residual[i]).collect();
    Ok((sum, harmonic_part))
}

#[cfg(test)]
mod tests {
    use super::*;
    use espectro_core::math::rmse;
    use espectro_core::window::Window;
    use std::f64::consts::TAU;

    #[test]
    fn harmonic_tone_splits_into_harmonics_and_small_residual() {
        let fs = 44100.0;
        let f0 = 440.0;
        // the mismatch scorer wants a full set of upper harmonics
        let x: Vec<f64> = (0..16384)
            .map(|i| {
                let t = i as f64 / fs;
                (1..=10).map(|k| (TAU * k as f64 * f0 * t).cos() / k as f64).sum::<f64>()
            })
            .collect();
        let window = Window::Blackman.coefficients(1201);
        let hop = 128;
        let params = HarmonicParams {
            n_harmonics: 10,
            min_f0: 300.0,
            max_f0: 600.0,
            ..HarmonicParams::default()
        };

        let (harmonics, residual) = from_audio(&x, fs, &window, 2048, hop, -90.0, &params).unwrap();
        assert_eq!(residual.len(), x.len());

        // the harmonics explain almost all of the energy
        let interior = &residual[2048..14000];
        let res_rms =
            (interior.iter().map(|v| v * v).sum::<f64>() / interior.len() as f64).sqrt();
        assert!(res_rms < 5e-2, "residual rms {res_rms}");

        let (sum, _) = to_audio(&harmonics, &residual, hop, fs).unwrap();
        let margin = 2048;
        let len = sum.len().min(x.len()) - margin;
        let err = rmse(&x[margin..len], &sum[margin..len]);
        assert!(err < 5e-2, "reconstruction rmse {err}");
    }
}
