//! Spectrum Transform: analysis and synthesis of one spectral frame.
//!
//! The forward transform windows a frame, packs it zero-phase (second half
//! of the windowed frame first, first half last) so a symmetric frame has
//! zero phase at DC, and returns magnitude in dB plus unwrapped phase over
//! the positive bins. The inverse rebuilds the hermitian spectrum and undoes
//! the packing.
//!
//! The round trip is deliberately lossy: because the window is normalized to
//! unit sum on the way in, `synthesize(analyze(frame))` recovers
//! `window * frame / sum(window)`, not `frame` itself.

use espectro_core::math::{amplitude_to_db, db_to_amplitude, is_power_of_two, unwrap_phase};
use rustfft::num_complex::Complex;

use crate::error::{ModelError, Result};
use crate::fft::Fft;

/// Real/imaginary components below this are considered numeric noise and
/// zeroed before the phase is computed.
const PHASE_TOL: f64 = 1e-14;

/// Reusable spectral transform for a fixed FFT size.
///
/// The analysis loops of the models run one of these per frame; building it
/// once keeps the FFT plan alive across frames.
pub struct Dft {
    fft: Fft,
}

impl Dft {
    /// Create a transform for FFT size `n`.
    ///
    /// Fails if `n` is not a power of two.
    pub fn new(n: usize) -> Result<Self> {
        if !is_power_of_two(n) {
            return Err(ModelError::FftSizeNotPowerOfTwo(n));
        }
        Ok(Self { fft: Fft::new(n) })
    }

    /// FFT size.
    pub fn size(&self) -> usize {
        self.fft.size()
    }

    /// Number of positive-frequency bins (`n/2 + 1`).
    pub fn bins(&self) -> usize {
        self.fft.size() / 2 + 1
    }

    /// Analyze one frame: returns (magnitude dB, unwrapped phase), each of
    /// `n/2 + 1` bins.
    ///
    /// `frame` and `window` must have the same length M, with M <= n. The
    /// window is normalized to unit sum internally.
    pub fn analyze(&self, frame: &[f64], window: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        let n = self.fft.size();
        let m = window.len();
        if m > n {
            return Err(ModelError::FftSizeTooSmall { n, m });
        }
        if frame.len() != m {
            return Err(ModelError::InvalidParameter {
                param: "frame",
                value: frame.len() as f64,
                reason: "frame length must equal window length",
            });
        }
        let wsum: f64 = window.iter().sum();
        if wsum == 0.0 {
            return Err(ModelError::InvalidParameter {
                param: "window",
                value: 0.0,
                reason: "window coefficients must not sum to zero",
            });
        }

        let h_m1 = (m + 1) / 2;
        let h_m2 = m / 2;
        let windowed: Vec<f64> = frame
            .iter()
            .zip(window)
            .map(|(x, w)| x * w / wsum)
            .collect();

        // zero-phase packing: center of the frame goes to buffer index 0
        let mut buffer = vec![0.0; n];
        buffer[..h_m1].copy_from_slice(&windowed[h_m2..]);
        buffer[n - h_m2..].copy_from_slice(&windowed[..h_m2]);

        let spectrum = self.fft.forward(&buffer);
        let bins = self.bins();

        let mag_db: Vec<f64> = spectrum[..bins]
            .iter()
            .map(|c| amplitude_to_db(c.norm()))
            .collect();

        let mut phase: Vec<f64> = spectrum[..bins]
            .iter()
            .map(|c| {
                let re = if c.re.abs() < PHASE_TOL { 0.0 } else { c.re };
                let im = if c.im.abs() < PHASE_TOL { 0.0 } else { c.im };
                im.atan2(re)
            })
            .collect();
        unwrap_phase(&mut phase);

        Ok((mag_db, phase))
    }

    /// Synthesize an `m`-sample frame from magnitude (dB) and phase over the
    /// positive bins.
    ///
    /// The result is the windowed frame the magnitudes describe (see the
    /// module docs on lossiness); callers that analyzed with a unit-sum
    /// window get that windowed frame back exactly.
    pub fn synthesize(&self, mag_db: &[f64], phase: &[f64], m: usize) -> Result<Vec<f64>> {
        let n = self.fft.size();
        let bins = self.bins();
        if mag_db.len() != bins || phase.len() != bins {
            return Err(ModelError::InvalidParameter {
                param: "mag_db",
                value: mag_db.len() as f64,
                reason: "spectrum must have n/2 + 1 bins",
            });
        }
        if m > n {
            return Err(ModelError::FftSizeTooSmall { n, m });
        }

        let mut spectrum = vec![Complex::new(0.0, 0.0); n];
        for i in 0..bins {
            spectrum[i] = Complex::from_polar(db_to_amplitude(mag_db[i]), phase[i]);
        }
        // hermitian mirror for the negative frequencies
        for i in 1..bins - 1 {
            spectrum[n - i] = spectrum[i].conj();
        }

        let buffer = self.fft.inverse(&spectrum);

        // undo the zero-phase packing
        let h_m1 = (m + 1) / 2;
        let h_m2 = m / 2;
        let mut frame = vec![0.0; m];
        frame[..h_m2].copy_from_slice(&buffer[n - h_m2..]);
        frame[h_m2..].copy_from_slice(&buffer[..h_m1]);
        Ok(frame)
    }
}

/// One-shot frame analysis. See [`Dft::analyze`].
pub fn analyze(frame: &[f64], window: &[f64], n: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    Dft::new(n)?.analyze(frame, window)
}

/// One-shot frame synthesis; the FFT size is implied by the bin count.
/// See [`Dft::synthesize`].
pub fn synthesize(mag_db: &[f64], phase: &[f64], m: usize) -> Result<Vec<f64>> {
    if mag_db.is_empty() {
        return Err(ModelError::InvalidParameter {
            param: "mag_db",
            value: 0.0,
            reason: "spectrum must not be empty",
        });
    }
    Dft::new(2 * (mag_db.len() - 1))?.synthesize(mag_db, phase, m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use espectro_core::window::Window;
    use std::f64::consts::PI;

    #[test]
    fn rejects_non_power_of_two_fft_size() {
        assert!(matches!(
            Dft::new(1000),
            Err(ModelError::FftSizeNotPowerOfTwo(1000))
        ));
    }

    #[test]
    fn rejects_window_longer_than_fft() {
        let dft = Dft::new(512).unwrap();
        let frame = vec![0.0; 1001];
        let window = vec![1.0; 1001];
        assert!(matches!(
            dft.analyze(&frame, &window),
            Err(ModelError::FftSizeTooSmall { n: 512, m: 1001 })
        ));
    }

    #[test]
    fn sinusoid_peaks_at_its_bin_and_round_trips() {
        // cosine over exactly 4 cycles of a 1024-sample frame
        let m = 1024;
        let frame: Vec<f64> = (0..m)
            .map(|i| (4.0 * 2.0 * PI * i as f64 / m as f64).cos())
            .collect();
        let window = Window::Hamming.coefficients(m);
        let dft = Dft::new(1024).unwrap();

        let (mag, phase) = dft.analyze(&frame, &window).unwrap();

        let argmax = mag
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(argmax, 4);
        // unit-amplitude cosine splits into two half-amplitude lines
        assert!((mag[4] - (-6.0)).abs() < 0.1, "peak {} dB", mag[4]);

        // round trip recovers the windowed frame (times the normalization)
        let wsum: f64 = window.iter().sum();
        let recon = dft.synthesize(&mag, &phase, m).unwrap();
        for i in 0..m {
            let expected = frame[i] * window[i] / wsum;
            assert!(
                (recon[i] - expected).abs() < 1e-10,
                "sample {i}: {} vs {expected}",
                recon[i]
            );
        }
    }

    #[test]
    fn silence_stays_finite() {
        let dft = Dft::new(256).unwrap();
        let frame = vec![0.0; 255];
        let window = Window::Hanning.coefficients(255);
        let (mag, phase) = dft.analyze(&frame, &window).unwrap();
        assert!(mag.iter().all(|v| v.is_finite()));
        assert!(phase.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn one_shot_helpers_match_struct() {
        let m = 255;
        let frame: Vec<f64> = (0..m).map(|i| (i as f64 * 0.1).sin()).collect();
        let window = Window::Blackman.coefficients(m);
        let (mag_a, phase_a) = analyze(&frame, &window, 512).unwrap();
        let dft = Dft::new(512).unwrap();
        let (mag_b, phase_b) = dft.analyze(&frame, &window).unwrap();
        assert_eq!(mag_a, mag_b);
        assert_eq!(phase_a, phase_b);
    }
}
