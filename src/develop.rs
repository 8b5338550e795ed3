//! Develop driver: project the film through a thin lens into frames.
//!
//! A first pass scans the film once to derive the exposure normalization,
//! then workers claim frame indices and replay every hit record through
//! the inverse lens model. Each worker opens its own read-only handle, so
//! frames need no cross-worker coordination and every frame is
//! deterministic for a given film.

use crate::color;
use crate::film::Film;
use crate::output;
use crate::stream::DataStream;
use glam::{Vec2, Vec3A};
use image::{ImageBuffer, Rgb};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Knobs of the develop phase.
#[derive(Debug, Clone, Copy)]
pub struct DevelopParams {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames to produce; frame index animates the focal distance.
    pub frames: u32,
    /// F-number of the developing aperture.
    pub f_number: f32,
    /// Focal length of the thin lens.
    pub focal_length: f32,
    /// Magnification of the projected image.
    pub zoom: f32,
    /// Hit records read per block buffer.
    pub buffer_capacity: usize,
}

impl Default for DevelopParams {
    fn default() -> Self {
        DevelopParams {
            width: 256,
            height: 256,
            frames: 256,
            f_number: 0.8,
            focal_length: 1.0,
            zoom: 1.0,
            buffer_capacity: 1 << 20,
        }
    }
}

fn open_film(path: &Path, capacity: usize) -> io::Result<Film> {
    let stream = Arc::new(DataStream::open(path, true)?);
    Ok(Film::new(stream, capacity))
}

/// Scan the whole film once and count its hit records.
fn count_photons(path: &Path, capacity: usize) -> io::Result<u64> {
    let mut film = open_film(path, capacity)?;
    let mut photons: u64 = 0;
    film.read_hits(|hits| photons += hits.len() as u64);
    Ok(photons)
}

fn develop_frame(
    film: &mut Film,
    frame: u32,
    exposure: Option<f32>,
    params: &DevelopParams,
    out_dir: &Path,
) -> io::Result<()> {
    film.rewind()?;
    film.read_config()?;
    let lens_radius = film.config.lens_radius;

    let mut image: ImageBuffer<Rgb<f32>, Vec<f32>> = ImageBuffer::new(params.width, params.height);
    let half = Vec2::new(params.width as f32, params.height as f32) / 2.0;

    // The focal plane sweeps through the scene as the animation advances.
    let focal_distance = 2.0 + frame as f32 / 32.0;
    let f_limit = Vec2::new(1.0, params.f_number).normalize().y;
    let h_scale = half * lens_radius * params.focal_length * params.zoom * 2f32.sqrt() / -2.0;

    film.read_hits(|hits| {
        for hit in hits {
            // Back to worldspace units on the lens plane.
            let pos = Vec3A::new(hit.pos[0].decode(), hit.pos[1].decode(), 0.0) * lens_radius;

            // The photon direction was unit length at capture, so the
            // axial component comes back from the stored U/V pair.
            let mut dir = Vec3A::new(hit.dir[0].decode(), hit.dir[1].decode(), 0.0);
            dir.z = (1.0 - dir.x * dir.x - dir.y * dir.y).max(0.0).sqrt();

            // Deflection of the lens surface at the photon's entry point.
            let deflection = Vec3A::new(pos.x, pos.y, params.focal_length).normalize();

            // The aperture vignettes photons too oblique to the surface.
            if dir.dot(deflection) < f_limit {
                continue;
            }

            // Fold the lens surface normal into the ray direction.
            dir.z = 1.0 - dir.z;
            let proj = (dir - deflection).normalize();

            // Thin-lens equation for the image plane distance.
            let image_distance =
                1.0 / (1.0 / params.focal_length - 1.0 / focal_distance);
            let image_pos = pos + proj * image_distance / -proj.z;

            let pixel = Vec2::new(image_pos.x, image_pos.y) * h_scale + half;
            if !pixel.x.is_finite() || !pixel.y.is_finite() || pixel.x < 0.0 || pixel.y < 0.0 {
                continue;
            }
            let (x, y) = (pixel.x as u32, pixel.y as u32);
            if x >= params.width || y >= params.height {
                continue;
            }

            let color = color::load(hit.clr);
            let accumulated = image.get_pixel_mut(x, y);
            accumulated[0] += color.x;
            accumulated[1] += color.y;
            accumulated[2] += color.z;
        }
    });

    if let Some(exposure) = exposure {
        for pixel in image.pixels_mut() {
            pixel[0] *= exposure;
            pixel[1] *= exposure;
            pixel[2] *= exposure;
        }
    }

    output::save_image_as_tga(&image, &out_dir.join(format!("out{frame:04}.tga")))
}

/// Develop every frame of the film at `film_path` into `out_dir`.
pub fn develop(film_path: &Path, out_dir: &Path, params: &DevelopParams) -> io::Result<()> {
    // First pass: one scan of the film to derive the exposure scale that
    // targets an average pixel energy of 2. An empty film skips the
    // normalization entirely and develops black frames.
    let photons = count_photons(film_path, params.buffer_capacity)?;
    let exposure = if photons == 0 {
        info!("The film is empty; developing unexposed frames.");
        None
    } else {
        Some(2.0 / (photons as f32 / (params.width * params.height) as f32))
    };

    info!(
        "Developing {} frames from {} captured photons...",
        params.frames, photons
    );
    let progress = ProgressBar::new(u64::from(params.frames));
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40} {pos}/{len} ETA: {eta}")
            .unwrap(),
    );

    (0..params.frames).into_par_iter().for_each_init(
        || open_film(film_path, params.buffer_capacity),
        |film, frame| {
            match film {
                Ok(film) => {
                    if let Err(error) = develop_frame(film, frame, exposure, params, out_dir) {
                        warn!("frame {frame} was lost: {error}");
                    }
                }
                // The worker could not open its film handle; every frame
                // it claims is lost while other workers proceed.
                Err(error) => warn!("develop worker has no film: {error}"),
            }
            progress.inc(1);
        },
    );
    progress.finish();

    Ok(())
}
