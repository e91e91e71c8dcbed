//! Analysis and synthesis window generation.
//!
//! All windows are symmetric: a window of odd length M peaks exactly at the
//! center sample, which is what the frame-centering convention of the
//! analysis models assumes. The models normalize windows to unit sum before
//! use, so only the shape matters.

use std::f64::consts::PI;

/// Analysis window kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Rectangular (no windowing)
    Rectangular,
    /// Hanning window (raised cosine)
    Hanning,
    /// Hamming window
    Hamming,
    /// Blackman window
    Blackman,
    /// Blackman-Harris window (best sidelobe suppression)
    BlackmanHarris,
}

impl Window {
    /// Generate window coefficients of the given length.
    pub fn coefficients(&self, size: usize) -> Vec<f64> {
        if size <= 1 {
            return vec![1.0; size];
        }
        let denom = (size - 1) as f64;
        (0..size)
            .map(|i| {
                let x = 2.0 * PI * i as f64 / denom;
                match self {
                    Window::Rectangular => 1.0,
                    Window::Hanning => 0.5 - 0.5 * x.cos(),
                    Window::Hamming => 0.54 - 0.46 * x.cos(),
                    Window::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
                    Window::BlackmanHarris => {
                        0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos()
                            - 0.01168 * (3.0 * x).cos()
                    }
                }
            })
            .collect()
    }

    /// Apply this window to a buffer in place.
    pub fn apply(&self, buffer: &mut [f64]) {
        let coeffs = self.coefficients(buffer.len());
        for (sample, coeff) in buffer.iter_mut().zip(coeffs) {
            *sample *= coeff;
        }
    }

    /// Parse a window name as used by the CLI ("hamming", "blackmanharris", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "rectangular" | "rect" | "none" => Some(Window::Rectangular),
            "hanning" | "hann" => Some(Window::Hanning),
            "hamming" => Some(Window::Hamming),
            "blackman" => Some(Window::Blackman),
            "blackmanharris" | "blackman-harris" => Some(Window::BlackmanHarris),
            _ => None,
        }
    }
}

/// Triangular window.
///
/// For even length 2H, successive copies offset by H sum to exactly one,
/// which keeps the overlap-add resynthesis unity-gain.
pub fn triangular(size: usize) -> Vec<f64> {
    let m = size as f64;
    (0..size)
        .map(|i| {
            let n = i.min(size - 1 - i) as f64;
            if size % 2 == 0 {
                (2.0 * n + 1.0) / m
            } else {
                2.0 * (n + 1.0) / (m + 1.0)
            }
        })
        .collect()
}
