//! The virtual lens: forward capture onto the film.
//!
//! During render the lens sits in the scene like any other surface, but its
//! finalizer does not reflect: it encodes the photon's filmspace position
//! and direction into a hit record and terminates the trace.

use crate::film::HitRecord;
use crate::photon::{Commit, PhotonState};
use crate::EPSILON;
use glam::{Vec2, Vec3A};
use std::io;

/// The capturing lens.
#[derive(Debug, Clone, Copy)]
pub struct Lens {
    /// Worldspace center of the lens.
    pub position: Vec3A,
    /// Unit forward direction.
    pub direction: Vec3A,
    // Cosine of the widest capturable angle. Negative for any finite
    // f-number: captured rays travel toward the lens, so their projection
    // on the lens direction is negative.
    f_lim: f32,
    radius_sq: f32,
    u: Vec3A,
    v: Vec3A,
    ua: Vec3A,
    va: Vec3A,
}

impl Lens {
    /// A lens at `position` looking along `direction`.
    ///
    /// `aperture` is the lens diameter and `f_number` bounds how oblique a
    /// photon may arrive and still be captured.
    pub fn new(position: Vec3A, direction: Vec3A, up: Vec3A, aperture: f32, f_number: f32) -> Self {
        let direction = direction.normalize();
        let u = direction.cross(up).normalize();
        let v = direction.cross(u);
        Lens {
            position,
            direction,
            f_lim: Vec2::new(1.0, -f_number).normalize().y,
            radius_sq: aperture * aperture / 4.0,
            u,
            v,
            ua: u / aperture / 2.0,
            va: v / aperture / 2.0,
        }
    }

    /// Offer the current ray to the lens.
    pub fn hit_exterior(&self, state: &mut PhotonState, index: usize) {
        let proj = self.direction.dot(state.direction);
        // Beyond the f-limit the aperture masks the photon.
        if proj > self.f_lim {
            return;
        }

        let distance = self.direction.dot(self.position - state.position) / proj;
        if distance >= state.hit_dist || distance < EPSILON {
            return;
        }

        let point = state.position + state.direction * distance;
        if (point - self.position).length_squared() >= self.radius_sq {
            return;
        }

        state.commit(distance, Commit::Capture { index, point });
    }

    /// Finalize a committed capture: expose the film at the photon's
    /// filmspace position and direction.
    pub fn capture(&self, state: &mut PhotonState) -> io::Result<()> {
        state.film.expose(HitRecord::new(
            self.ua.dot(state.position),
            self.va.dot(state.position),
            self.u.dot(state.direction),
            self.v.dot(state.direction),
            state.color,
        ))
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
            std::env::temp_dir().join(format!("darkroom_lens_{}_{}.dat", std::process::id(), name));
        let stream = Arc::new(DataStream::create(&path).unwrap());
        let film = Film::new(stream, 16);
        (PhotonState::new(film, random::master(5)), path)
    }

    fn test_lens() -> Lens {
        Lens::new(Vec3A::ZERO, Vec3A::Z, Vec3A::Y, 2.0, 0.8)
    }

    #[test]
    fn head_on_photon_commits_a_centered_capture() {
        let (mut state, path) = state("center");
        state.position = Vec3A::new(0.0, 0.0, 1.0);
        state.direction = -Vec3A::Z;
        state.color = Color::ONE;
        state.reset();

        test_lens().hit_exterior(&mut state, 0);
        let Some(Commit::Capture { point, .. }) = state.hit else {
            panic!("photon was not captured");
        };
        assert!(point.length() < 1e-6);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn aperture_radius_is_an_exclusive_boundary() {
        let lens = test_lens();

        // Exactly on the aperture radius: rejected.
        let (mut state, path) = state("edge");
        state.position = Vec3A::new(1.0, 0.0, 1.0);
        state.direction = -Vec3A::Z;
        state.reset();
        lens.hit_exterior(&mut state, 0);
        assert!(state.hit.is_none());

        // Strictly inside: accepted, with filmspace magnitude below 0.5.
        state.position = Vec3A::new(0.999, 0.0, 1.0);
        state.reset();
        lens.hit_exterior(&mut state, 0);
        let Some(Commit::Capture { point, .. }) = state.hit else {
            panic!("interior photon was not captured");
        };
        assert!(lens.ua.dot(point).abs() < 0.5);
        assert!(lens.va.dot(point).abs() < 0.5);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn oblique_photons_beyond_the_f_limit_are_ignored() {
        let lens = test_lens();
        let (mut state, path) = state("oblique");

        // 60 degrees off axis is outside an f/0.8 cone (about 51 degrees).
        state.position = Vec3A::new(0.0, 0.0, 1.0);
        state.direction = Vec3A::new(3f32.sqrt(), 0.0, -1.0).normalize();
        state.reset();
        lens.hit_exterior(&mut state, 0);
        assert!(state.hit.is_none());

        // A photon leaving through the back of the lens is ignored too.
        state.direction = Vec3A::Z;
        state.reset();
        lens.hit_exterior(&mut state, 0);
        assert!(state.hit.is_none());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn capture_encodes_filmspace_and_terminates() {
        let (mut state, path) = state("encode");
        let lens = test_lens();
        state.position = Vec3A::new(0.25, -0.25, 0.0);
        state.direction = -Vec3A::Z;
        state.color = Color::ONE;
        lens.capture(&mut state).unwrap();
        state.film.flush().unwrap();

        let mut records = Vec::new();
        state.film.rewind().unwrap();
        state.film.read_hits(|block| records.extend_from_slice(block));
        assert_eq!(records.len(), 1);
        let record = records[0];
        // u runs along direction x up = -X and filmspace scales by 1/(2A),
        // so +0.25 in x maps to -0.0625 in u.
        assert!((record.pos[0].decode() - -0.0625).abs() < 1e-3);
        assert!((record.pos[1].decode() - 0.0625).abs() < 1e-3);
        assert!(record.dir[0].decode().abs() < 1e-3);
        assert!(record.dir[1].decode().abs() < 1e-3);
        assert_eq!(record.clr, [255, 255, 255, 0]);
        std::fs::remove_file(&path).ok();
    }
}
