//! Symmetric 16-bit fixed-point codec.
//!
//! Filmspace positions and directions are stored as signed 16-bit samples
//! covering [-1, +1] with 1/32768 resolution. Out-of-range values saturate.

/// One fixed-point sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fixed16(i16);

impl Fixed16 {
    /// Encode a float, truncating toward zero.
    ///
    /// Truncation (not rounding) matches the storage convention of existing
    /// film files, so they keep decoding to the same values.
    pub fn encode(value: f32) -> Self {
        Fixed16(((value * 32768.0) as i32).clamp(-32768, 32767) as i16)
    }

    /// Decode back to a float in [-1, +1).
    pub fn decode(self) -> f32 {
        f32::from(self.0) / 32768.0
    }

    /// The underlying signed sample.
    pub fn raw(self) -> i16 {
        self.0
    }

    /// Little-endian wire form.
    pub fn to_le_bytes(self) -> [u8; 2] {
        self.0.to_le_bytes()
    }

    /// Rebuild from the little-endian wire form.
    pub fn from_le_bytes(bytes: [u8; 2]) -> Self {
        Fixed16(i16::from_le_bytes(bytes))
    }
}
