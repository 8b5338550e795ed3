//! Darkroom photon renderer
//!
//! Two phases share a tagged binary film file: `render` traces photons from
//! the light sources and records every photon that crosses the virtual lens,
//! `develop` projects the recorded photons through a thin-lens model into an
//! animated sequence of frames, one per focal distance.

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cli;
pub mod color;
pub mod develop;
pub mod film;
pub mod fixed;
pub mod lens;
pub mod lights;
pub mod logger;
pub mod materials;
pub mod output;
pub mod photon;
pub mod random;
pub mod shapes;
pub mod stream;
pub mod tracer;

/// Intersection tolerance shared by every surface test (2^-22).
pub const EPSILON: f32 = 2.384_185_791_015_625e-7;
