//! CLI command implementations.

pub mod common;
pub mod harmonic;
pub mod hpr;
pub mod sine;
pub mod spr;
pub mod stft;
