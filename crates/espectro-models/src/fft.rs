//! FFT wrapper over rustfft.
//!
//! The models work on full complex buffers (the frame synthesizer fills the
//! negative-frequency half explicitly), so unlike a typical real-FFT facade
//! this wrapper keeps all N bins.

use rustfft::num_complex::Complex;
use rustfft::{Fft as RustFft, FftPlanner};
use std::sync::Arc;

/// Forward/inverse FFT pair for a fixed size.
pub struct Fft {
    fft: Arc<dyn RustFft<f64>>,
    ifft: Arc<dyn RustFft<f64>>,
    size: usize,
}

impl Fft {
    /// Create a new FFT processor for the given size.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let ifft = planner.plan_fft_inverse(size);
        Self { fft, ifft, size }
    }

    /// FFT size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Forward FFT of a real buffer. Returns all `size` complex bins.
    pub fn forward(&self, input: &[f64]) -> Vec<Complex<f64>> {
        let mut buffer: Vec<Complex<f64>> =
            input.iter().map(|&x| Complex::new(x, 0.0)).collect();
        buffer.resize(self.size, Complex::new(0.0, 0.0));
        self.fft.process(&mut buffer);
        buffer
    }

    /// Inverse FFT, normalized by 1/size. Returns the real part.
    pub fn inverse(&self, spectrum: &[Complex<f64>]) -> Vec<f64> {
        let mut buffer = spectrum.to_vec();
        buffer.resize(self.size, Complex::new(0.0, 0.0));
        self.ifft.process(&mut buffer);
        let scale = 1.0 / self.size as f64;
        buffer.iter().map(|c| c.re * scale).collect()
    }
}
