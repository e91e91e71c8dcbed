//! Shared helpers for the model commands.

use anyhow::{bail, Result};
use espectro_core::window::Window;
use std::path::{Path, PathBuf};

/// Build analysis window coefficients from a name given on the command line.
pub fn make_window(name: &str, size: usize) -> Result<Vec<f64>> {
    let Some(kind) = Window::from_name(name) else {
        bail!("unknown window '{name}' (expected rectangular, hanning, hamming, blackman or blackmanharris)");
    };
    Ok(kind.coefficients(size))
}

/// Derive an output path next to `input`: `tone.wav` -> `tone_<tag>.wav`.
pub fn tagged_output(input: &Path, tag: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "output".into(), |s| s.to_string_lossy().into_owned());
    input.with_file_name(format!("{stem}_{tag}.wav"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_output_keeps_the_directory() {
        let out = tagged_output(Path::new("/tmp/sounds/oboe.wav"), "sines");
        assert_eq!(out, Path::new("/tmp/sounds/oboe_sines.wav"));
    }

    #[test]
    fn unknown_window_is_an_error() {
        assert!(make_window("kaiser", 101).is_err());
        assert!(make_window("hamming", 101).is_ok());
    }
}
