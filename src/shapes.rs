//! Analytic scene surfaces.
//!
//! Surfaces inspect the current ray and, when they find an intersection
//! nearer than the best candidate so far, install their finalizer in the
//! photon state. The tracer applies the single surviving finalizer once
//! every surface has seen the ray.

use crate::lens::Lens;
use crate::materials::Material;
use crate::photon::{Commit, PhotonState};
use crate::EPSILON;
use glam::Vec3A;

/// An infinite one-sided plane.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// Any point on the plane.
    pub point: Vec3A,
    /// Unit outward normal.
    pub normal: Vec3A,
    /// Surface material.
    pub material: Material,
}

/// A sphere intersected from the outside only.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    /// Center in world space.
    pub center: Vec3A,
    /// Radius in world units.
    pub radius: f32,
    /// Surface material.
    pub material: Material,
}

/// One member of the scene list.
#[derive(Debug, Clone, Copy)]
pub enum Surface {
    /// A bounded room wall, floor, or ceiling.
    Plane(Plane),
    /// A solid sphere.
    Sphere(Sphere),
    /// The capturing lens.
    Lens(Lens),
}

impl Plane {
    /// A plane through `point` with unit `normal`.
    pub fn new(point: Vec3A, normal: Vec3A, material: Material) -> Self {
        Plane {
            point,
            normal,
            material,
        }
    }

    fn hit_exterior(&self, state: &mut PhotonState, index: usize) {
        let denom = self.normal.dot(state.direction);
        // Rays parallel to the plane or hitting its back face miss.
        if denom > -EPSILON {
            return;
        }
        let distance = self.normal.dot(self.point - state.position) / denom;
        if distance >= state.hit_dist || distance < EPSILON {
            return;
        }
        state.commit(distance, Commit::Surface { index });
    }
}

impl Sphere {
    /// A sphere at `center` with `radius`.
    pub fn new(center: Vec3A, radius: f32, material: Material) -> Self {
        Sphere {
            center,
            radius,
            material,
        }
    }

    fn hit_exterior(&self, state: &mut PhotonState, index: usize) {
        let delta = self.center - state.position;
        let adjacent = delta.dot(state.direction);
        if adjacent < EPSILON {
            return;
        }
        let radius_sq = self.radius * self.radius;
        let opposite_sq = delta.length_squared() - adjacent * adjacent;
        if opposite_sq >= radius_sq {
            return;
        }
        let distance = adjacent - (radius_sq - opposite_sq).sqrt();
        if distance >= state.hit_dist {
            return;
        }
        state.commit(distance, Commit::Surface { index });
    }

    /// Outward unit normal at a point on the surface.
    pub fn normal_at(&self, position: Vec3A) -> Vec3A {
        (position - self.center) / self.radius
    }
}

impl Surface {
    /// Offer the current ray to this surface.
    pub fn hit_exterior(&self, state: &mut PhotonState, index: usize) {
        match self {
            Surface::Plane(plane) => plane.hit_exterior(state, index),
            Surface::Sphere(sphere) => sphere.hit_exterior(state, index),
            Surface::Lens(lens) => lens.hit_exterior(state, index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::film::Film;
    use crate::random;
    use crate::stream::DataStream;
    use std::sync::Arc;

    fn state(name: &str) -> (PhotonState, std::path::PathBuf) {
        let path =
            std::env::temp_dir().join(format!("darkroom_shapes_{}_{}.dat", std::process::id(), name));
        let stream = Arc::new(DataStream::create(&path).unwrap());
        let film = Film::new(stream, 16);
        (PhotonState::new(film, random::master(3)), path)
    }

    fn white() -> Material {
        Material::Diffuse {
            color: Color::splat(0.9),
        }
    }

    #[test]
    fn sphere_reports_the_near_surface() {
        let (mut state, path) = state("sphere");
        state.position = Vec3A::ZERO;
        state.direction = Vec3A::Z;
        state.reset();

        let sphere = Sphere::new(Vec3A::new(0.0, 0.0, 5.0), 1.0, white());
        sphere.hit_exterior(&mut state, 0);
        assert_eq!(state.hit, Some(Commit::Surface { index: 0 }));
        assert!((state.hit_dist - 4.0).abs() < 1e-5);

        let surface = state.position + state.direction * state.hit_dist;
        assert!((sphere.normal_at(surface) - -Vec3A::Z).length() < 1e-5);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn sphere_ignores_rays_pointing_away() {
        let (mut state, path) = state("away");
        state.position = Vec3A::ZERO;
        state.direction = -Vec3A::Z;
        state.reset();
        Sphere::new(Vec3A::new(0.0, 0.0, 5.0), 1.0, white()).hit_exterior(&mut state, 0);
        assert!(state.hit.is_none());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn plane_rejects_back_faces_and_parallel_rays() {
        let (mut state, path) = state("plane");
        let plane = Plane::new(Vec3A::new(0.0, 0.0, -6.0), Vec3A::Z, white());

        state.position = Vec3A::ZERO;
        state.direction = -Vec3A::Z;
        state.reset();
        plane.hit_exterior(&mut state, 1);
        assert_eq!(state.hit, Some(Commit::Surface { index: 1 }));
        assert!((state.hit_dist - 6.0).abs() < 1e-5);

        // Approaching from behind the plane misses.
        state.position = Vec3A::new(0.0, 0.0, -8.0);
        state.direction = Vec3A::Z;
        state.reset();
        plane.hit_exterior(&mut state, 1);
        assert!(state.hit.is_none());

        // So does travel parallel to it.
        state.position = Vec3A::ZERO;
        state.direction = Vec3A::X;
        state.reset();
        plane.hit_exterior(&mut state, 1);
        assert!(state.hit.is_none());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn nearest_intersection_wins_either_iteration_order() {
        let near = Surface::Sphere(Sphere::new(Vec3A::new(0.0, 0.0, 3.0), 1.0, white()));
        let far = Surface::Sphere(Sphere::new(Vec3A::new(0.0, 0.0, 9.0), 1.0, white()));

        for scene in [[near, far], [far, near]] {
            let (mut state, path) = state("order");
            state.position = Vec3A::ZERO;
            state.direction = Vec3A::Z;
            state.reset();
            for (index, surface) in scene.iter().enumerate() {
                surface.hit_exterior(&mut state, index);
            }
            assert!((state.hit_dist - 2.0).abs() < 1e-5);
            let Some(Commit::Surface { index }) = state.hit else {
                panic!("no commit installed");
            };
            assert!(matches!(scene[index], Surface::Sphere(s) if s.center.z == 3.0));
            std::fs::remove_file(&path).ok();
        }
    }
}
