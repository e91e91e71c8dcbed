//! Frame synthesizer and overlap-add engine.
//!
//! Each trajectory frame is rendered directly in the spectral domain: every
//! non-zero partial injects a sampled Blackman-Harris main lobe (9 bins) at
//! the bin nearest its frequency, one inverse FFT per frame produces the
//! time frame, and a triangular-over-Blackman-Harris synthesis window makes
//! the overlap-add at hop H unity gain. This is O(partials + Ns log Ns) per
//! frame instead of O(partials * Ns) for time-domain oscillators.

use std::f64::consts::{PI, TAU};

use espectro_core::math::{db_to_amplitude, is_power_of_two};
use espectro_core::window::{Window, triangular};
use rand::Rng;
use rustfft::num_complex::Complex;

use crate::error::{ModelError, Result};
use crate::fft::Fft;
use crate::sine::SineTracks;

/// Size of the reference Blackman-Harris window the main lobe is sampled
/// from.
const BH_SIZE: usize = 512;

/// Blackman-Harris 92 dB coefficients.
const BH_CONSTS: [f64; 4] = [0.35875, 0.48829, 0.14128, 0.01168];

/// Dirichlet kernel sin(N x / 2) / sin(x / 2), with the 0/0 limit N.
fn dirichlet(x: f64, n: usize) -> f64 {
    if x.abs() < f64::EPSILON {
        n as f64
    } else {
        (n as f64 * x / 2.0).sin() / (x / 2.0).sin()
    }
}

/// Sample the main lobe of a periodic Blackman-Harris window at the given
/// bin offsets (in bins of the reference size), normalized to 1 at offset 0.
pub fn blackman_harris_lobe(offsets: &[f64]) -> Vec<f64> {
    let n = BH_SIZE;
    let df = TAU / n as f64;
    offsets
        .iter()
        .map(|&x| {
            let f = x * df;
            let mut y = 0.0;
            for (m, &c) in BH_CONSTS.iter().enumerate() {
                let shift = df * m as f64;
                y += c / 2.0 * (dirichlet(f - shift, n) + dirichlet(f + shift, n));
            }
            y / n as f64 / BH_CONSTS[0]
        })
        .collect()
}

/// Generate the spectrum of a set of sinusoids.
///
/// For each partial with non-zero frequency below Nyquist, spreads its
/// magnitude over 9 bins with the Blackman-Harris main lobe shape. Lobe bins
/// falling below DC or above Nyquist fold back conjugated; the negative half
/// of the spectrum is filled by hermitian symmetry at the end.
pub fn spectrum_for_sinusoids(
    freq: &[f64],
    mag_db: &[f64],
    phase: &[f64],
    n: usize,
    fs: f64,
) -> Vec<Complex<f64>> {
    let mut spectrum = vec![Complex::new(0.0, 0.0); n];
    let half = (n / 2) as isize;

    for i in 0..freq.len() {
        let loc = n as f64 * freq[i] / fs;
        if loc == 0.0 || loc > (half - 1) as f64 {
            continue;
        }
        let center = loc.round();
        let remainder = center - loc;
        let offsets: Vec<f64> = (-4..=4).map(|k| remainder + k as f64).collect();
        let lobe = blackman_harris_lobe(&offsets);
        let amp = db_to_amplitude(mag_db[i]);
        let pos = Complex::from_polar(1.0, phase[i]);
        let neg = pos.conj();

        for (m, &l) in lobe.iter().enumerate() {
            let b = center as isize - 4 + m as isize;
            let fold = b.unsigned_abs();
            if fold >= n {
                // lobe tail past the buffer, only reachable for tiny sizes
                continue;
            }
            let contribution = l * amp;
            if b < 0 || b > half {
                spectrum[fold] += contribution * neg;
            } else if b == 0 || b == half {
                spectrum[fold] += contribution * (pos + neg);
            } else {
                spectrum[fold] += contribution * pos;
            }
        }
    }

    // hermitian fill of the negative frequencies; overwrites anything the
    // folding wrote above Nyquist
    for i in 1..n / 2 {
        spectrum[n / 2 + i] = spectrum[n / 2 - i].conj();
    }
    spectrum
}

/// Synthesis window: triangular over 2H samples, divided by the normalized
/// Blackman-Harris window, centered in an Ns buffer.
pub(crate) fn synthesis_window(ns: usize, h: usize) -> Vec<f64> {
    let half = ns / 2;
    let mut sw = vec![0.0; ns];
    let tri = triangular(2 * h);
    let mut bh = Window::BlackmanHarris.coefficients(ns);
    let bh_sum: f64 = bh.iter().sum();
    for b in bh.iter_mut() {
        *b /= bh_sum;
    }
    for i in 0..2 * h {
        sw[half - h + i] = tri[i] / bh[half - h + i];
    }
    sw
}

/// Reconstruct a time-domain signal from sinusoidal trajectories by
/// spectral synthesis and overlap-add.
///
/// If the track table carries phases they are used verbatim; otherwise each
/// slot starts at a random phase and advances by
/// `pi * (f_prev + f_now) / fs * H` per frame.
///
/// The overlap-add buffer is `H * (num_frames + 3)` samples long; `Ns/2` is
/// trimmed from each end to line up with the analysis frame centers, so the
/// result has `H * (num_frames + 3) - Ns` samples.
pub fn synthesize_sinusoids(tracks: &SineTracks, ns: usize, h: usize, fs: f64) -> Result<Vec<f64>> {
    if !is_power_of_two(ns) {
        return Err(ModelError::FftSizeNotPowerOfTwo(ns));
    }
    if h == 0 {
        return Err(ModelError::InvalidHop(h));
    }
    let half = ns / 2;
    if 2 * h > ns {
        return Err(ModelError::InvalidParameter {
            param: "hop",
            value: h as f64,
            reason: "hop must not exceed half the synthesis FFT size",
        });
    }

    let frames = tracks.num_frames();
    if frames == 0 {
        return Ok(Vec::new());
    }

    let fft = Fft::new(ns);
    let sw = synthesis_window(ns, h);
    let mut output = vec![0.0; h * (frames + 3)];

    let has_phases = !tracks.phase.is_empty();
    let width = tracks.freq[0].len();
    let mut rng = rand::rng();
    let mut phases: Vec<f64> = (0..width).map(|_| rng.random_range(0.0..TAU)).collect();
    let mut last_freq = tracks.freq[0].clone();

    let mut pout = 0;
    for l in 0..frames {
        if has_phases {
            phases.copy_from_slice(&tracks.phase[l]);
        } else {
            for k in 0..width {
                phases[k] += PI * (last_freq[k] + tracks.freq[l][k]) / fs * h as f64;
            }
        }
        let spectrum = spectrum_for_sinusoids(&tracks.freq[l], &tracks.mag[l], &phases, ns, fs);
        last_freq.copy_from_slice(&tracks.freq[l]);
        for p in phases.iter_mut() {
            *p = p.rem_euclid(TAU);
        }

        let frame = fft.inverse(&spectrum);
        // fftshift: the synthesized frame is zero-phase packed
        for i in 0..ns {
            output[pout + i] += sw[i] * frame[(i + half) % ns];
        }
        pout += h;
    }

    // trim half a synthesis frame from each end
    output.drain(..half);
    output.truncate(output.len() - half);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lobe_is_normalized_and_symmetric() {
        let offsets: Vec<f64> = (-4..=4).map(|k| k as f64).collect();
        let lobe = blackman_harris_lobe(&offsets);
        assert_eq!(lobe.len(), 9);
        assert!((lobe[4] - 1.0).abs() < 1e-12, "center {}", lobe[4]);
        for i in 0..4 {
            assert!((lobe[i] - lobe[8 - i]).abs() < 1e-12);
        }
        // main lobe decays away from the center
        assert!(lobe[4] > lobe[3] && lobe[3] > lobe[2]);
    }

    #[test]
    fn zero_frequency_partials_contribute_nothing() {
        let spectrum = spectrum_for_sinusoids(&[0.0, 0.0], &[-10.0, -20.0], &[0.0, 0.0], 512, 44100.0);
        assert!(spectrum.iter().all(|c| c.norm() == 0.0));
    }

    #[test]
    fn tiny_fft_sizes_truncate_the_lobe_instead_of_panicking() {
        // ns = 4: the 9-bin lobe around bin 1 reaches past the buffer
        let fs = 44100.0;
        let spectrum = spectrum_for_sinusoids(&[fs / 4.0], &[-6.0], &[0.0], 4, fs);
        assert_eq!(spectrum.len(), 4);
        assert!(spectrum.iter().all(|c| c.re.is_finite() && c.im.is_finite()));
    }

    #[test]
    fn spectrum_is_hermitian() {
        let spectrum =
            spectrum_for_sinusoids(&[1000.0], &[-6.0], &[0.7], 512, 44100.0);
        for i in 1..256 {
            let a = spectrum[i];
            let b = spectrum[512 - i];
            assert!((a.re - b.re).abs() < 1e-12 && (a.im + b.im).abs() < 1e-12);
        }
    }

    #[test]
    fn synthesis_output_length() {
        let frames = 20;
        let tracks = SineTracks {
            freq: vec![vec![440.0]; frames],
            mag: vec![vec![-6.0]; frames],
            phase: Vec::new(),
        };
        let y = synthesize_sinusoids(&tracks, 512, 128, 44100.0).unwrap();
        assert_eq!(y.len(), 128 * (frames + 3) - 512);
    }

    #[test]
    fn stationary_sinusoid_resynthesizes_near_unit_amplitude() {
        let fs = 44100.0;
        let frames = 40;
        // analysis stores the half-amplitude line of a cosine: a unit
        // cosine tracks at -6.02 dB and synthesizes back to amplitude 1
        let tracks = SineTracks {
            freq: vec![vec![1000.0]; frames],
            mag: vec![vec![20.0 * 0.5_f64.log10()]; frames],
            phase: Vec::new(),
        };
        let y = synthesize_sinusoids(&tracks, 512, 128, fs).unwrap();
        // skip the attack/decay ramps of the first/last frames
        let steady = &y[1024..y.len() - 1024];
        let peak = steady.iter().fold(0.0_f64, |a, &b| a.max(b.abs()));
        assert!((peak - 1.0).abs() < 0.05, "steady-state peak {peak}");
    }

    #[test]
    fn rejects_bad_sizes() {
        let tracks = SineTracks {
            freq: vec![vec![440.0]],
            mag: vec![vec![-6.0]],
            phase: Vec::new(),
        };
        assert!(matches!(
            synthesize_sinusoids(&tracks, 500, 128, 44100.0),
            Err(ModelError::FftSizeNotPowerOfTwo(500))
        ));
        assert!(matches!(
            synthesize_sinusoids(&tracks, 512, 0, 44100.0),
            Err(ModelError::InvalidHop(0))
        ));
        assert!(matches!(
            synthesize_sinusoids(&tracks, 512, 300, 44100.0),
            Err(ModelError::InvalidParameter { param: "hop", .. })
        ));
    }
}
