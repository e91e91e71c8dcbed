//! Residual extraction: subtract synthesized sinusoids from a sound in the
//! spectral domain.
//!
//! Each frame of the input is windowed with a sum-normalized
//! Blackman-Harris window, the spectrum of the frame's sinusoids is
//! generated at the same size, and the difference is inverted and
//! overlap-added. What remains is everything the sinusoidal (or harmonic)
//! tracks did not capture.

use rustfft::num_complex::Complex;

use espectro_core::window::Window;

use crate::error::{ModelError, Result};
use crate::fft::Fft;
use crate::sine::SineTracks;
use crate::synth::{spectrum_for_sinusoids, synthesis_window};
use espectro_core::math::is_power_of_two;

/// FFT size the combined models use for subtraction and resynthesis. Small
/// enough to follow fast residual changes, large enough for the 9-bin
/// sinusoid lobes.
pub const SUBTRACTION_FFT_SIZE: usize = 512;

/// Subtract a track table from a sound, at FFT size `n` and hop `hop`.
///
/// The tracks must carry explicit phases (as analysis produces them) and
/// be aligned with the input: frame `l` of the table describes the frame
/// centered at sample `l * hop`. The returned residual has exactly the
/// input's length.
pub fn subtract_sinusoids(
    x: &[f64],
    n: usize,
    hop: usize,
    tracks: &SineTracks,
    fs: f64,
) -> Result<Vec<f64>> {
    if !is_power_of_two(n) {
        return Err(ModelError::FftSizeNotPowerOfTwo(n));
    }
    if hop == 0 {
        return Err(ModelError::InvalidHop(hop));
    }
    if 2 * hop > n {
        return Err(ModelError::InvalidParameter {
            param: "hop",
            value: hop as f64,
            reason: "hop must not exceed half the subtraction FFT size",
        });
    }

    let half = n / 2;
    let mut padded = vec![0.0; half];
    padded.extend_from_slice(x);
    padded.extend(std::iter::repeat(0.0).take(half));

    let mut w = Window::BlackmanHarris.coefficients(n);
    let wsum: f64 = w.iter().sum();
    for v in w.iter_mut() {
        *v /= wsum;
    }
    let sw = synthesis_window(n, hop);
    let fft = Fft::new(n);
    let empty = vec![0.0; tracks.num_tracks()];

    let mut xr = vec![0.0; padded.len()];
    let mut pin = 0;
    for l in 0..tracks.num_frames() {
        if pin + n > padded.len() {
            break;
        }
        // window and rotate so the frame center lands at index 0
        let mut shifted = vec![0.0; n];
        for i in 0..n {
            shifted[i] = padded[pin + (i + half) % n] * w[(i + half) % n];
        }
        let spectrum = fft.forward(&shifted);

        let phases = tracks.phase.get(l).unwrap_or(&empty);
        let sines = spectrum_for_sinusoids(&tracks.freq[l], &tracks.mag[l], phases, n, fs);
        let diff: Vec<Complex<f64>> = spectrum
            .iter()
            .zip(&sines)
            .map(|(a, b)| a - b)
            .collect();

        let inv = fft.inverse(&diff);
        for i in 0..n {
            xr[pin + i] += inv[(i + half) % n] * sw[i];
        }
        pin += hop;
    }

    xr.drain(..half);
    xr.truncate(x.len());
    Ok(xr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use espectro_core::math::rmse;
    use std::f64::consts::TAU;

    #[test]
    fn residual_has_the_input_length() {
        let x = vec![0.0; 4097];
        let tracks = SineTracks {
            freq: vec![vec![0.0]; 33],
            mag: vec![vec![0.0]; 33],
            phase: vec![vec![0.0]; 33],
        };
        let xr = subtract_sinusoids(&x, 512, 128, &tracks, 44100.0).unwrap();
        assert_eq!(xr.len(), 4097);
    }

    #[test]
    fn subtracting_nothing_returns_the_input_interior() {
        let fs = 44100.0;
        let x: Vec<f64> = (0..4096).map(|i| (TAU * 700.0 * i as f64 / fs).sin()).collect();
        let frames = x.len().div_ceil(128);
        let tracks = SineTracks {
            freq: vec![vec![0.0]; frames],
            mag: vec![vec![0.0]; frames],
            phase: vec![vec![0.0]; frames],
        };
        let xr = subtract_sinusoids(&x, 512, 128, &tracks, fs).unwrap();
        // overlap is incomplete within half a window of each end
        let err = rmse(&x[512..3584], &xr[512..3584]);
        assert!(err < 1e-10, "identity rmse {err}");
    }

    #[test]
    fn exact_tracks_cancel_a_steady_sinusoid() {
        let fs = 44100.0;
        let f = 1000.0;
        let hop = 128;
        let x: Vec<f64> = (0..8192).map(|i| (TAU * f * i as f64 / fs).cos()).collect();

        // one track holding the exact frequency, half-amplitude magnitude
        // and the phase at each frame center
        let frames = x.len().div_ceil(hop);
        let mag = 20.0 * 0.5_f64.log10();
        let mut tracks = SineTracks::default();
        for l in 0..frames {
            let phase = (TAU * f * (l * hop) as f64 / fs).rem_euclid(TAU);
            tracks.freq.push(vec![f]);
            tracks.mag.push(vec![mag]);
            tracks.phase.push(vec![phase]);
        }

        let xr = subtract_sinusoids(&x, 512, hop, &tracks, fs).unwrap();
        let interior = &xr[512..7680];
        let peak = interior.iter().fold(0.0_f64, |a, &v| a.max(v.abs()));
        // limited by the symmetric-window vs periodic-lobe mismatch
        assert!(peak < 5e-3, "residual peak {peak}");
    }

    #[test]
    fn non_power_of_two_size_is_rejected() {
        let tracks = SineTracks::default();
        assert!(matches!(
            subtract_sinusoids(&[0.0; 100], 500, 128, &tracks, 44100.0),
            Err(ModelError::FftSizeNotPowerOfTwo(500))
        ));
    }
}
