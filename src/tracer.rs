//! Render driver: pass-striped photon transport onto the film.
//!
//! Worker threads claim whole passes from an atomic counter. Each pass runs
//! every light source; every emitted photon bounces through the scene until
//! it escapes, is absorbed, is captured by the lens, or runs out of
//! bounces. Workers own their state and only meet at the file lock.

use crate::film::{Film, FilmConfig};
use crate::lights::Light;
use crate::photon::{Commit, PhotonState};
use crate::random;
use crate::shapes::Surface;
use crate::stream::DataStream;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Knobs of the render phase.
#[derive(Debug, Clone, Copy)]
pub struct RenderParams {
    /// Full illuminations of the scene.
    pub passes: u32,
    /// Photons per unit of light intensity per pass.
    pub multiplier: f32,
    /// Maximum bounces per photon.
    pub bounces: u32,
    /// Hit records buffered per worker between flushes.
    pub buffer_capacity: usize,
    /// Worker threads; 0 means one per hardware core.
    pub threads: usize,
    /// Master seed all worker streams are split from.
    pub seed: u64,
    /// Lens aperture diameter recorded in the film's config block.
    pub lens_radius: f32,
}

impl Default for RenderParams {
    fn default() -> Self {
        RenderParams {
            passes: 1000,
            multiplier: 1e5,
            bounces: 10,
            buffer_capacity: 1 << 16,
            threads: 0,
            seed: random::DEFAULT_SEED,
            lens_radius: 2.0,
        }
    }
}

/// What the render phase reports when it finishes.
#[derive(Debug, Clone, Copy)]
pub struct RenderStats {
    /// Hit records written to the film.
    pub exposures: u64,
    /// Completed photon bounces across all workers.
    pub traces: u64,
    /// Wall-clock render time.
    pub seconds: f64,
}

/// Trace one bounce: offer the ray to every surface, then apply the
/// nearest intersection's finalizer. Returns false when the photon is done.
pub fn trace(scene: &[Surface], state: &mut PhotonState) -> io::Result<bool> {
    state.reset();
    for (index, surface) in scene.iter().enumerate() {
        surface.hit_exterior(state, index);
    }

    match state.hit.take() {
        None => Ok(false),
        Some(Commit::Surface { index }) => {
            state.position += state.direction * state.hit_dist;
            match &scene[index] {
                Surface::Plane(plane) => {
                    state.hit_normal = plane.normal;
                    Ok(plane.material.interact(state))
                }
                Surface::Sphere(sphere) => {
                    state.hit_normal = sphere.normal_at(state.position);
                    Ok(sphere.material.interact(state))
                }
                Surface::Lens(_) => unreachable!("a lens commits captures, not surfaces"),
            }
        }
        Some(Commit::Capture { index, point }) => {
            state.position = point;
            match &scene[index] {
                Surface::Lens(lens) => lens.capture(state)?,
                _ => unreachable!("capture committed by a non-lens surface"),
            }
            Ok(false)
        }
    }
}

fn run_worker(
    scene: &[Surface],
    lights: &[Light],
    params: &RenderParams,
    pass: &AtomicU32,
    state: &mut PhotonState,
    progress: &ProgressBar,
) -> io::Result<()> {
    while pass.fetch_add(1, Ordering::Relaxed) < params.passes {
        for light in lights {
            for _ in 0..light.traces(params.multiplier) {
                light.emit(state);
                for _ in 0..params.bounces {
                    if !trace(scene, state)? {
                        break;
                    }
                    state.hits += 1;
                }
            }
        }
        progress.inc(1);
    }
    Ok(())
}

/// Render the scene into the film file at `path`.
pub fn render(
    scene: &[Surface],
    lights: &[Light],
    params: &RenderParams,
    path: &Path,
) -> io::Result<RenderStats> {
    let threads = if params.threads == 0 {
        num_cpus::get().max(1)
    } else {
        params.threads
    };

    let stream = Arc::new(DataStream::create(path)?);

    // One state per worker, each split onto its own random subsequence.
    // The split order is fixed, so a seed reproduces the film exactly.
    let mut seed = random::master(params.seed);
    let mut states: Vec<PhotonState> = (0..threads)
        .map(|_| {
            let rng = random::split_stream(&mut seed);
            let mut film = Film::new(Arc::clone(&stream), params.buffer_capacity);
            film.config = FilmConfig {
                lens_radius: params.lens_radius,
            };
            PhotonState::new(film, rng)
        })
        .collect();

    states[0].film.write_config()?;

    info!(
        "Tracing {} passes of {} lights on {} worker threads...",
        params.passes,
        lights.len(),
        threads
    );
    let progress = ProgressBar::new(u64::from(params.passes));
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40} {pos}/{len} ETA: {eta}")
            .unwrap(),
    );
    let start = Instant::now();

    let pass = AtomicU32::new(0);
    let pass = &pass;
    let progress_ref = &progress;
    crossbeam::thread::scope(|scope| {
        for state in &mut states {
            scope.spawn(move |_| {
                if let Err(error) = run_worker(scene, lights, params, pass, state, progress_ref) {
                    warn!("render worker stopped early: {error}");
                }
            });
        }
    })
    .expect("render worker panicked");

    progress.finish();
    let seconds = start.elapsed().as_secs_f64();

    // Flush every worker's partial tail block and collect statistics.
    let mut exposures = 0;
    let mut traces = 0;
    for state in &mut states {
        state.film.flush()?;
        exposures += state.film.exposures;
        traces += state.hits;
    }
    stream.close()?;

    info!("{exposures} exposures in {seconds:.2} seconds.");
    info!(
        "{:.2}M scene traces @ {:.2}M traces/sec.",
        traces as f64 / 1e6,
        traces as f64 / seconds.max(f64::EPSILON) / 1e6
    );

    Ok(RenderStats {
        exposures,
        traces,
        seconds,
    })
}
