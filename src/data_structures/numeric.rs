//! Numeric formats found in Real3D memory.

/// Converts a 13.19 fixed-point word to `f32`.
///
/// The integer part is taken with an arithmetic shift so the sign survives,
/// then the 19-bit fraction is added on top. For negative inputs this yields
/// the usual two's-complement value, e.g. `0xFFF80000` is `-1.0` and
/// `0xFFFC0000` is `-0.5`.
pub fn fixed_13_19(raw: u32) -> f32 {
    let signed = raw as i32;
    (signed >> 19) as f32 + (signed & 0x7FFFF) as f32 / 524288.0
}

/// Reinterprets a word's bits as an IEEE-754 single.
pub fn float_bits(raw: u32) -> f32 {
    f32::from_bits(raw)
}
