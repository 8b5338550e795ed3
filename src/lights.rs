//! Light sources.
//!
//! A light emits photons by setting the state's position, direction, and
//! color. How many photons it emits per pass scales with its intensity.

use crate::color::{self, Color};
use crate::photon::PhotonState;
use crate::random;
use glam::Vec3A;

/// The light palette.
#[derive(Debug, Clone, Copy)]
pub enum Light {
    /// A fixed ray of photons. Mostly useful for calibration.
    PointBeam {
        /// Emission origin.
        position: Vec3A,
        /// Emission direction (unit length).
        direction: Vec3A,
        /// Relative photon output.
        intensity: f32,
        /// Emitter color.
        color: Color,
    },
    /// An omni-directional point source.
    PointLight {
        /// Emission origin.
        position: Vec3A,
        /// Relative photon output.
        intensity: f32,
        /// Emitter color.
        color: Color,
    },
    /// An omni-directional spherical source; photons leave the surface
    /// biased outward.
    OmniSphere {
        /// Sphere center.
        position: Vec3A,
        /// Sphere radius.
        radius: f32,
        /// Relative photon output.
        intensity: f32,
        /// Emitter color.
        color: Color,
    },
}

impl Light {
    /// Photons to emit per pass at the given multiplier.
    pub fn traces(&self, multiplier: f32) -> u64 {
        let intensity = match *self {
            Light::PointBeam { intensity, .. }
            | Light::PointLight { intensity, .. }
            | Light::OmniSphere { intensity, .. } => intensity,
        };
        (intensity * multiplier) as u64
    }

    /// Emit one photon into the state.
    pub fn emit(&self, state: &mut PhotonState) {
        match *self {
            Light::PointBeam {
                position,
                direction,
                color,
                ..
            } => {
                state.position = position;
                state.direction = direction;
                color::emit(&mut state.color, color);
            }
            Light::PointLight {
                position, color, ..
            } => {
                state.position = position;
                state.direction = random::unit_vector(&mut state.rng);
                color::emit(&mut state.color, color);
            }
            Light::OmniSphere {
                position,
                radius,
                color,
                ..
            } => {
                let outward = random::unit_vector(&mut state.rng);
                state.position = position + outward * radius;
                state.direction =
                    (outward + random::unit_vector(&mut state.rng)).normalize();
                color::emit(&mut state.color, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::film::Film;
    use crate::stream::DataStream;
    use std::sync::Arc;

    fn state(name: &str) -> (PhotonState, std::path::PathBuf) {
        let path =
            std::env::temp_dir().join(format!("darkroom_lights_{}_{}.dat", std::process::id(), name));
        let stream = Arc::new(DataStream::create(&path).unwrap());
        let film = Film::new(stream, 16);
        (PhotonState::new(film, random::master(11)), path)
    }

    #[test]
    fn trace_counts_scale_with_intensity() {
        let beam = Light::PointBeam {
            position: Vec3A::ZERO,
            direction: Vec3A::Z,
            intensity: 1.0,
            color: Color::ONE,
        };
        assert_eq!(beam.traces(1.0), 1);
        assert_eq!(beam.traces(100_000.0), 100_000);
        let half = Light::PointLight {
            position: Vec3A::ZERO,
            intensity: 0.5,
            color: Color::ONE,
        };
        assert_eq!(half.traces(3.0), 1);
    }

    #[test]
    fn beam_emits_its_exact_ray() {
        let (mut state, path) = state("beam");
        let beam = Light::PointBeam {
            position: Vec3A::new(0.0, 0.0, 1.0),
            direction: -Vec3A::Z,
            intensity: 1.0,
            color: Color::new(0.0, 1.0, 0.0),
        };
        beam.emit(&mut state);
        assert_eq!(state.position, Vec3A::new(0.0, 0.0, 1.0));
        assert_eq!(state.direction, -Vec3A::Z);
        assert_eq!(state.color, Color::new(0.0, 1.0, 0.0));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn omni_sphere_emits_from_its_surface_pointing_outward() {
        let (mut state, path) = state("omni");
        let light = Light::OmniSphere {
            position: Vec3A::new(0.0, 0.0, 5.0),
            radius: 1.0,
            intensity: 1.0,
            color: Color::ONE,
        };
        for _ in 0..100 {
            light.emit(&mut state);
            let offset = state.position - Vec3A::new(0.0, 0.0, 5.0);
            assert!((offset.length() - 1.0).abs() < 1e-5);
            assert!((state.direction.length() - 1.0).abs() < 1e-5);
            // The outward bias keeps emission in the surface hemisphere.
            assert!(state.direction.dot(offset) > 0.0);
        }
        std::fs::remove_file(&path).ok();
    }
}
