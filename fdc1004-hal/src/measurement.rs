//! Measurement results and their conversion to capacitance.

use crate::constants::{CAPDAC_STEP_PF, MEASUREMENT_FRACTIONAL_BITS};

/// Capacitance in pF of a measurement word, without the CAPDAC contribution.
///
/// `raw` is the 24-bit two's-complement result left-aligned in 32 bits, as returned
/// by [`FDC1004::read_raw_measurement`]; the low 8 bits are ignored.
///
/// [`FDC1004::read_raw_measurement`]: crate::FDC1004::read_raw_measurement
pub fn raw_to_picofarads(raw: i32) -> f64 {
    // Arithmetic shift sign-extends the 24-bit value.
    f64::from(raw >> 8) / f64::from(1u32 << MEASUREMENT_FRACTIONAL_BITS)
}

/// Capacitance in pF of a measurement word taken with the given CAPDAC setting.
pub fn capacitance_pf(raw: i32, capdac: u8) -> f64 {
    raw_to_picofarads(raw) + f64::from(capdac) * CAPDAC_STEP_PF
}

/// One channel's measurement result together with the CAPDAC setting it was
/// taken with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MeasurementSample {
    /// Left-aligned 24-bit result, low 8 bits zero.
    pub raw: i32,
    /// CAPDAC setting of the channel when the sample was read.
    pub capdac: u8,
}

impl MeasurementSample {
    /// Length of the packed form.
    pub const PACKED_LEN: usize = 4;

    /// Capacitance in picofarads, including the CAPDAC contribution.
    pub fn capacitance_pf(&self) -> f64 {
        capacitance_pf(self.raw, self.capdac)
    }

    /// The three significant measurement bytes, most significant first, then CAPDAC.
    pub fn to_bytes(&self) -> [u8; Self::PACKED_LEN] {
        let [b3, b2, b1, _] = self.raw.to_be_bytes();
        [b3, b2, b1, self.capdac]
    }

    /// Inverse of [`MeasurementSample::to_bytes`].
    pub fn from_bytes(bytes: &[u8; Self::PACKED_LEN]) -> Self {
        Self {
            raw: i32::from_be_bytes([bytes[0], bytes[1], bytes[2], 0]),
            capdac: bytes[3],
        }
    }
}
