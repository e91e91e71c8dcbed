//! Espectro CLI - command-line interface for the spectral modeling library.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "espectro")]
#[command(author, version, about = "Spectral modeling analysis/synthesis CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Spectrogram analysis and overlap-add resynthesis
    Stft(commands::stft::StftArgs),

    /// Sinusoidal model: track partials and resynthesize
    Sine(commands::sine::SineArgs),

    /// Harmonic model: f0-anchored analysis and resynthesis
    Harmonic(commands::harmonic::HarmonicArgs),

    /// Sinusoidal plus residual decomposition
    Spr(commands::spr::SprArgs),

    /// Harmonic plus residual decomposition
    Hpr(commands::hpr::HprArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    tracing::debug!("espectro CLI starting");

    match cli.command {
        Commands::Stft(args) => commands::stft::run(args),
        Commands::Sine(args) => commands::sine::run(args),
        Commands::Harmonic(args) => commands::harmonic::run(args),
        Commands::Spr(args) => commands::spr::run(args),
        Commands::Hpr(args) => commands::hpr::run(args),
    }
}
