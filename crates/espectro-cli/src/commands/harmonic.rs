//! Harmonic model command.

use anyhow::Context;
use clap::Args;
use espectro_io::{read_wav, write_wav};
use espectro_models::harmonic::{self, HarmonicParams};
use espectro_models::synth;
use std::path::PathBuf;

use super::common::{make_window, tagged_output};

#[derive(Args)]
pub struct HarmonicArgs {
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

    /// Number of harmonics
    #[arg(long, default_value = "100")]
    n_harmonics: usize,

    /// Lower bound of the f0 search in Hz
    #[arg(long, default_value = "130")]
    min_f0: f64,

    /// Upper bound of the f0 search in Hz
    #[arg(long, default_value = "3000")]
    max_f0: f64,

    /// Maximum two-way mismatch error for a voiced frame
    #[arg(long, default_value = "7")]
    f0_error: f64,

    /// Output WAV file (defaults to <input>_harmonic.wav)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: HarmonicArgs) -> anyhow::Result<()> {
    let (samples, spec) = read_wav(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let window = make_window(&args.window, args.window_size)?;
    let fs = f64::from(spec.sample_rate);
    let params = HarmonicParams {
        n_harmonics: args.n_harmonics,
        min_f0: args.min_f0,
        max_f0: args.max_f0,
        f0_error_max: args.f0_error,
        ..HarmonicParams::default()
    };

    let tracks = harmonic::from_audio(
        &samples,
        fs,
        &window,
        args.fft_size,
        args.hop,
        args.threshold,
        &params,
    )?;
    let voiced = tracks
        .freq
        .iter()
        .filter(|row| row.first().is_some_and(|&f| f > 0.0))
        .count();
    println!("  {} frames ({voiced} voiced)", tracks.num_frames());

    let y = synth::synthesize_sinusoids(&tracks, 512, args.hop, fs)?;
    let out = args
        .output
        .unwrap_or_else(|| tagged_output(&args.input, "harmonic"));
    write_wav(&out, &y, spec).with_context(|| format!("writing {}", out.display()))?;
    println!("  wrote {}", out.display());
    Ok(())
}
