//! Short-time Fourier transform: spectrogram analysis and inverse
//! overlap-add synthesis.

use crate::dft::Dft;
use crate::error::{ModelError, Result};
use crate::frames::Framer;

/// Magnitude/phase spectrogram, one row per frame.
#[derive(Debug, Clone, Default)]
pub struct Spectrogram {
    /// Magnitude spectra in dB, `[frame][bin]`.
    pub mag: Vec<Vec<f64>>,
    /// Unwrapped phase spectra in radians, `[frame][bin]`.
    pub phase: Vec<Vec<f64>>,
}

impl Spectrogram {
    /// Number of frames (rows).
    pub fn num_frames(&self) -> usize {
        self.mag.len()
    }

    /// Number of spectrum bins per frame (N/2 + 1).
    pub fn num_bins(&self) -> usize {
        self.mag.first().map_or(0, Vec::len)
    }
}

/// Compute the magnitude/phase spectrogram of a sound.
///
/// Frames of `window.len()` samples advance by `hop`; each is transformed
/// at FFT size `n`. The signal is half-window padded on both sides, so the
/// first frame is centered at sample 0.
pub fn from_audio(x: &[f64], window: &[f64], n: usize, hop: usize) -> Result<Spectrogram> {
    if hop == 0 {
        return Err(ModelError::InvalidHop(hop));
    }
    let dft = Dft::new(n)?;
    let framer = Framer::new(x, window.len(), hop);

    let mut spec = Spectrogram::default();
    for l in 0..framer.num_frames_inclusive() {
        let (mx, px) = dft.analyze(framer.frame(l), window)?;
        spec.mag.push(mx);
        spec.phase.push(px);
    }
    Ok(spec)
}

/// Resynthesize a sound from a spectrogram by overlap-add.
///
/// `window_len` must match the analysis window length M and `hop` the
/// analysis hop H. Each inverse frame is scaled by H before adding, which
/// undoes the analysis window normalization for windows whose shifted sum
/// is constant. The output has `num_frames * hop` samples.
pub fn to_audio(spec: &Spectrogram, window_len: usize, hop: usize) -> Result<Vec<f64>> {
    if hop == 0 {
        return Err(ModelError::InvalidHop(hop));
    }
    let frames = spec.num_frames();
    if frames == 0 {
        return Ok(Vec::new());
    }

    let n = 2 * (spec.num_bins().saturating_sub(1));
    let dft = Dft::new(n)?;

    let h_m1 = (window_len + 1) / 2;
    let h_m2 = window_len / 2;
    let mut y = vec![0.0; frames * hop + h_m1 + h_m2];
    let mut pin = h_m1;
    for (mx, px) in spec.mag.iter().zip(&spec.phase) {
        let frame = dft.synthesize(mx, px, window_len)?;
        for (dst, &v) in y[pin - h_m1..pin + h_m2].iter_mut().zip(&frame) {
            *dst += hop as f64 * v;
        }
        pin += hop;
    }
    // drop the half-window padding the analysis introduced
    y.drain(..h_m2);
    y.truncate(frames * hop);
    Ok(y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use espectro_core::math::rmse;
    use espectro_core::window::Window;

    #[test]
    fn spectrogram_shape_matches_signal_and_hop() {
        let x = vec![0.0; 10000];
        let window = Window::Hamming.coefficients(1001);
        let spec = from_audio(&x, &window, 1024, 256).unwrap();
        assert_eq!(spec.num_bins(), 513);
        assert_eq!(spec.num_frames(), (10000 - 2) / 256 + 1);
    }

    #[test]
    fn zero_hop_is_rejected() {
        let window = Window::Hamming.coefficients(101);
        assert!(matches!(
            from_audio(&[0.0; 1000], &window, 512, 0),
            Err(ModelError::InvalidHop(0))
        ));
    }

    #[test]
    fn synthesis_length_is_frames_times_hop() {
        let x = vec![0.0; 5000];
        let window = Window::Hanning.coefficients(511);
        let spec = from_audio(&x, &window, 1024, 128).unwrap();
        let y = to_audio(&spec, 511, 128).unwrap();
        assert_eq!(y.len(), spec.num_frames() * 128);
    }

    #[test]
    fn analysis_synthesis_approximates_the_input() {
        let fs = 8000.0;
        let x: Vec<f64> = (0..4000)
            .map(|i| (std::f64::consts::TAU * 440.0 * i as f64 / fs).sin())
            .collect();
        let window = Window::Hanning.coefficients(511);
        let hop = 102; // 510/5: the shifted window sum is exactly constant
        let spec = from_audio(&x, &window, 1024, hop).unwrap();
        let y = to_audio(&spec, 511, hop).unwrap();

        // compare away from the edges, where overlap is incomplete
        let margin = 600;
        let len = x.len().min(y.len()) - margin;
        let err = rmse(&x[margin..len], &y[margin..len]);
        assert!(err < 1e-9, "reconstruction rmse {err}");
    }
}
