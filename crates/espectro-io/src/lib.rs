//! WAV file I/O for the Espectro spectral modeling library.
//!
//! The models work on mono `f64` signals; this crate loads WAV files into
//! that shape ([`read_wav`], mixing multi-channel files down) and writes
//! results back ([`write_wav`]).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use espectro_io::{read_wav, write_wav, WavSpec};
//!
//! let (samples, spec) = read_wav("input.wav")?;
//! // ... analyze / resynthesize ...
//! write_wav("output.wav", &samples, spec)?;
//! ```

mod wav;

pub use wav::{read_wav, read_wav_info, write_wav, WavFormat, WavInfo, WavSpec};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// The file holds no audio samples.
    #[error("Empty audio file: {0}")]
    EmptyFile(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
