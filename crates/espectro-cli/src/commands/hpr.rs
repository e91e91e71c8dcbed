//! Harmonic plus residual command.

use anyhow::Context;
use clap::Args;
use espectro_io::{read_wav, write_wav};
use espectro_models::harmonic::HarmonicParams;
use espectro_models::hpr;
use std::path::PathBuf;

use super::common::{make_window, tagged_output};

#[derive(Args)]
pub struct HprArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Window function
    #[arg(long, default_value = "blackman")]
    window: String,

    /// Window size in samples (odd)
    #[arg(long, default_value = "1201")]
    window_size: usize,

    /// FFT size
    #[arg(long, default_value = "2048")]
    fft_size: usize,

    /// Hop size in samples
    #[arg(long, default_value = "128")]
    hop: usize,

    /// Peak magnitude threshold in dB
    #[arg(short, long, default_value = "-90")]
    threshold: f64,

    /// Lower bound of the f0 search in Hz
    #[arg(long, default_value = "130")]
    min_f0: f64,

    /// Upper bound of the f0 search in Hz
    #[arg(long, default_value = "3000")]
    max_f0: f64,
}

pub fn run(args: HprArgs) -> anyhow::Result<()> {
    let (samples, spec) = read_wav(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let window = make_window(&args.window, args.window_size)?;
    let fs = f64::from(spec.sample_rate);
    let params = HarmonicParams {
        min_f0: args.min_f0,
        max_f0: args.max_f0,
        ..HarmonicParams::default()
    };

    let (harmonics, residual) = hpr::from_audio(
        &samples,
        fs,
        &window,
        args.fft_size,
        args.hop,
        args.threshold,
        &params,
    )?;
    let (sum, harmonic_part) = hpr::to_audio(&harmonics, &residual, args.hop, fs)?;

    for (tag, signal) in [
        ("reconstruction", &sum),
        ("harmonic", &harmonic_part),
        ("residual", &residual),
    ] {
        let out = tagged_output(&args.input, tag);
        write_wav(&out, signal, spec).with_context(|| format!("writing {}", out.display()))?;
        println!("  wrote {}", out.display());
    }
    Ok(())
}
