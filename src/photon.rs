//! Per-worker photon trace state.

use crate::color::Color;
use crate::film::Film;
use crate::random;
use glam::Vec3A;
use rand::RngCore;
use rand_xoshiro::Xoroshiro128Plus;

/// The nearest-hit finalizer installed while surfaces inspect the ray.
///
/// A tagged variant instead of a closure: surfaces are few and known, so
/// the driver can dispatch the winning intersection without allocating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Commit {
    /// Material interaction with the scene surface at `index`.
    Surface {
        /// Index of the intersected surface in the scene list.
        index: usize,
    },
    /// Lens capture at a precomputed point on the lens plane.
    Capture {
        /// Index of the lens in the scene list.
        index: usize,
        /// Worldspace intersection point on the lens plane.
        point: Vec3A,
    },
}

/// Everything one worker mutates while tracing a photon.
pub struct PhotonState {
    /// This worker's film buffer over the shared stream.
    pub film: Film,
    /// This worker's private random stream.
    pub rng: Xoroshiro128Plus,

    /// Current photon position.
    pub position: Vec3A,
    /// Current photon direction (unit length).
    pub direction: Vec3A,
    /// Current photon emissive color.
    pub color: Color,

    /// Distance to the nearest intersection candidate so far.
    pub hit_dist: f32,
    /// Surface normal filled in when the winning commit is applied.
    pub hit_normal: Vec3A,
    /// The winning intersection's finalizer, if any surface was hit.
    pub hit: Option<Commit>,
    /// Scene traversal statistic: completed bounces.
    pub hits: u64,

    pool: [f32; 4],
    pool_index: usize,
}

impl PhotonState {
    /// A fresh state over its own film and random stream.
    pub fn new(film: Film, rng: Xoroshiro128Plus) -> Self {
        PhotonState {
            film,
            rng,
            position: Vec3A::ZERO,
            direction: Vec3A::ZERO,
            color: Color::ZERO,
            hit_dist: f32::INFINITY,
            hit_normal: Vec3A::ZERO,
            hit: None,
            hits: 0,
            pool: [0.0; 4],
            pool_index: 0,
        }
    }

    /// Clear the intersection slot for the next bounce.
    pub fn reset(&mut self) {
        self.hit_dist = f32::INFINITY;
        self.hit = None;
    }

    /// Install a nearer intersection's finalizer.
    pub fn commit(&mut self, distance: f32, commit: Commit) {
        self.hit_dist = distance;
        self.hit = Some(commit);
    }

    /// A random float in [0, 1) from the state's pool.
    ///
    /// The pool vends four floats per 64-bit draw and refills on every
    /// fourth call.
    pub fn pool_rng(&mut self) -> f32 {
        let index = self.pool_index & 3;
        self.pool_index += 1;
        if index == 0 {
            self.pool = random::unit_quad_unsigned(self.rng.next_u64());
        }
        self.pool[index]
    }
}
