//! Tri-stimulus linear color policy.
//!
//! Three color roles share one representation: the emitter color a light
//! radiates, the emissive color a photon carries, and the material color a
//! surface reflects. Storage compresses the emissive color to RGBA8.

use glam::Vec3A;

/// Linear RGB color on the SIMD vector type (w unused).
pub type Color = Vec3A;

/// Photons dimmer than this RGB sum terminate on their next absorption.
pub const LUMA_CUTOFF: f32 = 1e-3;

/// Start a photon with the emitter's color.
pub fn emit(color: &mut Color, emitter: Color) {
    *color = emitter;
}

/// Diminish the emissive color by a material interaction.
///
/// Returns true when the photon has been absorbed: the dimmed RGB sum fell
/// below [`LUMA_CUTOFF`], which truncates the geometric series of surviving
/// reflectance with negligible bias.
pub fn absorb(color: &mut Color, material: Color) -> bool {
    *color *= material;
    color.element_sum() < LUMA_CUTOFF
}

/// Compress an emissive color to storage form (RGBA8, alpha 0).
pub fn store(color: Color) -> [u8; 4] {
    let scaled = (color * 255.0).clamp(Vec3A::ZERO, Vec3A::splat(255.0));
    [scaled.x as u8, scaled.y as u8, scaled.z as u8, 0]
}

/// Restore a stored color to linear RGB.
pub fn load(storage: [u8; 4]) -> Color {
    Vec3A::new(
        f32::from(storage[0]),
        f32::from(storage[1]),
        f32::from(storage[2]),
    ) / 255.0
}
