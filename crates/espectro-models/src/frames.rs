//! Analysis frame extraction.
//!
//! The signal is zero-padded by half a window on each side so the first
//! frame is centered at sample 0 and the last sample still gets analyzed.
//! For window length M the halves are `h_m1 = (M+1)/2` and `h_m2 = M/2`;
//! frame `l` covers `padded[pin - h_m1 .. pin + h_m2]` with
//! `pin = h_m1 + l*H`.

pub(crate) struct Framer {
    padded: Vec<f64>,
    h_m1: usize,
    h_m2: usize,
    hop: usize,
}

impl Framer {
    pub(crate) fn new(signal: &[f64], window_len: usize, hop: usize) -> Self {
        let h_m1 = (window_len + 1) / 2;
        let h_m2 = window_len / 2;
        let mut padded = vec![0.0; h_m2];
        padded.extend_from_slice(signal);
        padded.extend(std::iter::repeat(0.0).take(h_m2));
        Self {
            padded,
            h_m1,
            h_m2,
            hop,
        }
    }

    /// Number of frames the pointer sweep produces.
    pub(crate) fn num_frames(&self) -> usize {
        let span = self.padded.len().saturating_sub(2 * self.h_m1);
        if span == 0 {
            0
        } else {
            (span + self.hop - 1) / self.hop
        }
    }

    /// Number of frames when the sweep also takes a frame at the end
    /// pointer itself. The spectrogram uses this variant.
    pub(crate) fn num_frames_inclusive(&self) -> usize {
        if self.padded.len() < 2 * self.h_m1 {
            0
        } else {
            (self.padded.len() - 2 * self.h_m1) / self.hop + 1
        }
    }

    /// The `l`-th analysis frame (length M).
    pub(crate) fn frame(&self, l: usize) -> &[f64] {
        let pin = self.h_m1 + l * self.hop;
        &self.padded[pin - self.h_m1..pin + self.h_m2]
    }
}
