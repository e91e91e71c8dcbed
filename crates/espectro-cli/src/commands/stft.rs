//! Spectrogram analysis / resynthesis command.

use anyhow::Context;
use clap::Args;
use espectro_io::{read_wav, write_wav};
use espectro_models::stft;
use std::path::PathBuf;

use super::common::{make_window, tagged_output};

#[derive(Args)]
pub struct StftArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Window function
    #[arg(long, default_value = "hamming")]
    window: String,

    /// Window size in samples
    #[arg(long, default_value = "1001")]
    window_size: usize,

    /// FFT size
    #[arg(long, default_value = "1024")]
    fft_size: usize,

    /// Hop size in samples
    #[arg(long, default_value = "256")]
    hop: usize,

    /// Output WAV file (defaults to <input>_stft.wav)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: StftArgs) -> anyhow::Result<()> {
    let (samples, spec) = read_wav(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let window = make_window(&args.window, args.window_size)?;

    let spectrogram = stft::from_audio(&samples, &window, args.fft_size, args.hop)?;
    println!(
        "  {} frames x {} bins",
        spectrogram.num_frames(),
        spectrogram.num_bins()
    );

    let y = stft::to_audio(&spectrogram, args.window_size, args.hop)?;
    let out = args
        .output
        .unwrap_or_else(|| tagged_output(&args.input, "stft"));
    write_wav(&out, &y, spec).with_context(|| format!("writing {}", out.display()))?;
    println!("  wrote {}", out.display());
    Ok(())
}
