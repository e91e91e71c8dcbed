//! Sinusoidal model command.

use anyhow::Context;
use clap::Args;
use espectro_io::{read_wav, write_wav};
use espectro_models::sine::{self, SineParams};
use std::path::PathBuf;

use super::common::{make_window, tagged_output};

#[derive(Args)]
pub struct SineArgs {
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

    /// Maximum simultaneous tracks
    #[arg(long, default_value = "100")]
    max_sines: usize,

    /// Minimum track duration in seconds
    #[arg(long, default_value = "0.01")]
    min_sine_dur: f64,

    /// Output WAV file (defaults to <input>_sine.wav)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: SineArgs) -> anyhow::Result<()> {
    let (samples, spec) = read_wav(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let window = make_window(&args.window, args.window_size)?;
    let fs = f64::from(spec.sample_rate);
    let params = SineParams {
        max_sines: args.max_sines,
        min_sine_dur: args.min_sine_dur,
        ..SineParams::default()
    };

    let tracks = sine::from_audio(
        &samples,
        fs,
        &window,
        args.fft_size,
        args.hop,
        args.threshold,
        &params,
    )?;
    println!(
        "  {} frames, {} track slots",
        tracks.num_frames(),
        tracks.num_tracks()
    );

    let y = sine::to_audio(&tracks, 512, args.hop, fs)?;
    let out = args
        .output
        .unwrap_or_else(|| tagged_output(&args.input, "sine"));
    write_wav(&out, &y, spec).with_context(|| format!("writing {}", out.display()))?;
    println!("  wrote {}", out.display());
    Ok(())
}
