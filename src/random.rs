//! Random sampling on explicit xoroshiro128+ streams.
//!
//! Every worker owns a [`Xoroshiro128Plus`] generator. Streams are split
//! from one master generator with `long_jump` (equivalent to 2^96 calls),
//! so workers draw from non-overlapping subsequences and a fixed seed plus
//! a fixed worker order reproduces a render bit for bit.
//!
//! The float helpers splice raw mantissa bits into IEEE-754 floats rather
//! than dividing; each component keeps 16-20 of the 23 mantissa bits, which
//! is plenty for sampling directions.

use glam::Vec3A;
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoroshiro128Plus;

/// Seed used when the command line does not supply one.
pub const DEFAULT_SEED: u64 = 0x1234_5678_90AB_CDEF;

/// Create the master generator all worker streams are split from.
pub fn master(seed: u64) -> Xoroshiro128Plus {
    Xoroshiro128Plus::seed_from_u64(seed)
}

/// Split the next worker stream off the master generator.
pub fn split_stream(master: &mut Xoroshiro128Plus) -> Xoroshiro128Plus {
    master.long_jump();
    master.clone()
}

fn unsigned_component(bits: u64, mask: u32) -> f32 {
    // Mantissa bits under an exponent of 0 give [1, 2); shift down to [0, 1).
    f32::from_bits(bits as u32 & mask | 0x3F80_0000) - 1.0
}

fn signed_component(mantissa: u64, sign: u64) -> f32 {
    let magnitude = unsigned_component(mantissa, 0x007F_FFF8);
    f32::from_bits(magnitude.to_bits() | sign as u32 & 0x8000_0000)
}

/// Four floats in [0, 1) from one 64-bit draw (16 mantissa bits each).
pub fn unit_quad_unsigned(bits: u64) -> [f32; 4] {
    [
        unsigned_component(bits << 7, 0x007F_FF80),
        unsigned_component(bits >> 9, 0x007F_FF80),
        unsigned_component(bits >> 25, 0x007F_FF80),
        unsigned_component(bits >> 41, 0x007F_FF80),
    ]
}

/// A point in the signed unit cube (-1, +1)^3 from one 64-bit draw.
pub fn unit_cube_signed(bits: u64) -> Vec3A {
    Vec3A::new(
        signed_component(bits << 2, bits >> 32),
        signed_component(bits >> 18, bits >> 31),
        signed_component(bits >> 38, bits >> 30),
    )
}

/// A point uniformly distributed inside the unit sphere.
pub fn in_sphere(rng: &mut Xoroshiro128Plus) -> Vec3A {
    loop {
        let point = unit_cube_signed(rng.next_u64());
        if point.length_squared() < 1.0 {
            return point;
        }
    }
}

/// A unit vector uniformly distributed over all directions.
pub fn unit_vector(rng: &mut Xoroshiro128Plus) -> Vec3A {
    in_sphere(rng).normalize()
}
