//! Conversion between Q-format register words and real values.
//!
//! The calibration registers hold fixed-point numbers: offsets are signed Q5.11
//! (picofarads) and gains are unsigned Q2.14. These functions are plain numeric
//! transforms. They do not range-check; encoding a value that does not fit in 16
//! bits saturates, so callers must validate the domain first.
//!
//! Encoding truncates toward zero. Decoding is exact, so decoding then encoding
//! returns the original word.

/// Scale factor for `fractional_bits`, `2^fractional_bits`.
///
/// Exact for every `u8`, since powers of two up to 2^255 are representable.
fn scale(fractional_bits: u8) -> f64 {
    (0..fractional_bits).fold(1.0, |acc, _| acc * 2.0)
}

/// Interpret a two's-complement word with `fractional_bits` fractional bits.
pub fn decode_signed(raw: i16, fractional_bits: u8) -> f64 {
    f64::from(raw) / scale(fractional_bits)
}

/// Encode `value` as a two's-complement word, truncating toward zero.
pub fn encode_signed(value: f64, fractional_bits: u8) -> i16 {
    (value * scale(fractional_bits)) as i16
}

/// Interpret an unsigned word with `fractional_bits` fractional bits.
pub fn decode_unsigned(raw: u16, fractional_bits: u8) -> f64 {
    f64::from(raw) / scale(fractional_bits)
}

/// Encode `value` as an unsigned word, truncating toward zero.
pub fn encode_unsigned(value: f64, fractional_bits: u8) -> u16 {
    (value * scale(fractional_bits)) as u16
}
