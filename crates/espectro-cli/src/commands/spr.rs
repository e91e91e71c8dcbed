//! Sinusoidal plus residual command.

use anyhow::Context;
use clap::Args;
use espectro_io::{read_wav, write_wav};
use espectro_models::sine::SineParams;
use espectro_models::spr;
use std::path::PathBuf;

use super::common::{make_window, tagged_output};

#[derive(Args)]
pub struct SprArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Window function
    #[arg(long, default_value = "hamming")]
    window: String,

    /// Window size in samples (odd)
    #[arg(long, default_value = "2001")]
    window_size: usize,

    /// FFT size
    #[arg(long, default_value = "2048")]
    fft_size: usize,

    /// Hop size in samples
    #[arg(long, default_value = "128")]
    hop: usize,

    /// Peak magnitude threshold in dB
    #[arg(short, long, default_value = "-80")]
    threshold: f64,
}

pub fn run(args: SprArgs) -> anyhow::Result<()> {
    let (samples, spec) = read_wav(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let window = make_window(&args.window, args.window_size)?;
    let fs = f64::from(spec.sample_rate);

    let (tracks, residual) = spr::from_audio(
        &samples,
        fs,
        &window,
        args.fft_size,
        args.hop,
        args.threshold,
        &SineParams::default(),
    )?;
    let (sum, sines) = spr::to_audio(&tracks, &residual, args.hop, fs)?;

    for (tag, signal) in [
        ("reconstruction", &sum),
        ("sines", &sines),
        ("residual", &residual),
    ] {
        let out = tagged_output(&args.input, tag);
        write_wav(&out, signal, spec).with_context(|| format!("writing {}", out.display()))?;
        println!("  wrote {}", out.display());
    }
    Ok(())
}
