//! Surface materials.
//!
//! A material decides whether the photon continues after an interaction and
//! where it goes next. The surface normal is already in
//! [`PhotonState::hit_normal`] when a material runs.

use crate::color::{self, Color};
use crate::photon::PhotonState;
use crate::random;

/// The material palette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Lambertian surface: absorb or scatter cosine-weighted.
    Diffuse {
        /// Surface reflectance.
        color: Color,
    },
    /// Perfect mirror. Never absorbs.
    Mirror,
    /// Specular/diffuse mixture.
    ShinyOpaque {
        /// Reflectance of the diffuse component.
        color: Color,
        /// Probability in [0, 1] of a specular reflection.
        specular: f32,
    },
}

impl Material {
    /// Interact with the photon. Returns false to terminate the trace.
    pub fn interact(&self, state: &mut PhotonState) -> bool {
        match *self {
            Material::Diffuse { color } => diffuse(state, color),
            Material::Mirror => {
                reflect(state);
                true
            }
            Material::ShinyOpaque { color, specular } => {
                if state.pool_rng() <= specular {
                    reflect(state);
                    true
                } else {
                    diffuse(state, color)
                }
            }
        }
    }
}

fn diffuse(state: &mut PhotonState, color: Color) -> bool {
    if color::absorb(&mut state.color, color) {
        return false;
    }
    state.direction = (state.hit_normal + random::unit_vector(&mut state.rng)).normalize();
    true
}

fn reflect(state: &mut PhotonState) {
    state.direction -= state.hit_normal * (state.direction.dot(state.hit_normal) * 2.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::film::Film;
    use crate::stream::DataStream;
    use glam::Vec3A;
    use std::sync::Arc;

    fn state(name: &str) -> (PhotonState, std::path::PathBuf) {
        let path = std::env::temp_dir()
            .join(format!("darkroom_material_{}_{}.dat", std::process::id(), name));
        let stream = Arc::new(DataStream::create(&path).unwrap());
        let film = Film::new(stream, 16);
        (PhotonState::new(film, random::master(9)), path)
    }

    #[test]
    fn mirror_reflects_about_the_normal() {
        let (mut state, path) = state("mirror");
        state.direction = Vec3A::new(1.0, -1.0, 0.0).normalize();
        state.hit_normal = Vec3A::Y;
        assert!(Material::Mirror.interact(&mut state));
        let expected = Vec3A::new(1.0, 1.0, 0.0).normalize();
        assert!((state.direction - expected).length() < 1e-6);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn diffuse_scatters_into_the_normal_hemisphere() {
        let (mut state, path) = state("diffuse");
        let material = Material::Diffuse {
            color: Color::splat(0.9),
        };
        for _ in 0..100 {
            state.color = Color::ONE;
            state.direction = -Vec3A::Z;
            state.hit_normal = Vec3A::Z;
            assert!(material.interact(&mut state));
            assert!((state.direction.length() - 1.0).abs() < 1e-5);
            assert!(state.direction.dot(Vec3A::Z) > 0.0);
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn diffuse_absorbs_a_dim_photon() {
        let (mut state, path) = state("absorb");
        state.color = Color::splat(0.002);
        state.hit_normal = Vec3A::Z;
        let material = Material::Diffuse {
            color: Color::splat(0.1),
        };
        assert!(!material.interact(&mut state));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn fully_specular_mixture_behaves_like_a_mirror() {
        let (mut state, path) = state("shiny");
        let material = Material::ShinyOpaque {
            color: Color::splat(0.5),
            specular: 1.0,
        };
        state.color = Color::ONE;
        state.direction = Vec3A::new(0.0, -1.0, 0.0);
        state.hit_normal = Vec3A::Y;
        assert!(material.interact(&mut state));
        assert!((state.direction - Vec3A::Y).length() < 1e-6);
        // The diffuse channel was never consulted, so the color is intact.
        assert_eq!(state.color, Color::ONE);
        std::fs::remove_file(&path).ok();
    }
}
