//! Command line interface.

use crate::random;
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use std::path::PathBuf;

/// Log levels selectable from the command line.
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Errors and warnings.
    Warn,
    /// Normal progress output.
    Info,
    /// Verbose diagnostics.
    Debug,
    /// Everything.
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Command line arguments.
#[derive(Parser)]
#[command(name = "darkroom")]
#[command(about = "Capture photons onto a film file, then develop a focus-swept frame sequence")]
pub struct Args {
    /// Set the logging level
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub debug_level: LogLevel,

    /// Output directory for the film and the developed frames
    #[arg(short, long, default_value = "out", help = "Output directory")]
    pub output: PathBuf,

    /// Render passes; each pass runs every light source once
    #[arg(long, default_value = "1000", help = "Render passes")]
    pub passes: u32,

    /// Photons per unit of light intensity per pass
    #[arg(long, default_value = "100000", help = "Photons per light intensity per pass")]
    pub multiplier: f32,

    /// Maximum bounces per photon
    #[arg(long, default_value = "10", help = "Maximum bounces per photon")]
    pub bounces: u32,

    /// Worker threads; 0 uses one per hardware core
    #[arg(short, long, default_value = "0", help = "Worker threads (0 = one per core)")]
    pub threads: usize,

    /// Frames to develop; the focal distance animates across them
    #[arg(long, default_value = "256", help = "Frames to develop")]
    pub frames: u32,

    /// Frame width in pixels
    #[arg(long, default_value = "256", help = "Frame width in pixels")]
    pub width: u32,

    /// Frame height in pixels
    #[arg(long, default_value = "256", help = "Frame height in pixels")]
    pub height: u32,

    /// Master random seed; a fixed seed and thread count reproduce a film
    #[arg(long, default_value_t = random::DEFAULT_SEED, help = "Master random seed")]
    pub seed: u64,

    /// Render the film and stop
    #[arg(long, help = "Render the film and skip develop")]
    pub render_only: bool,

    /// Develop an existing film without re-rendering
    #[arg(long, help = "Develop an existing film and skip render")]
    pub develop_only: bool,
}
