//! Fixed values from the FDC1004 datasheet.

/// 7-bit I2C address of the FDC1004. It is not configurable.
pub const I2C_ADDRESS: u8 = 0x50;

/// Value of the manufacturer ID register (0xFE), "TI" in ASCII.
pub const MANUFACTURER_ID: u16 = 0x5449;

/// Value of the device ID register (0xFF).
pub const DEVICE_ID: u16 = 0x1004;

/// Capacitance added to a measurement by each unit of the CAPDAC setting, in pF.
pub const CAPDAC_STEP_PF: f64 = 3.125;

/// Largest value accepted by the 5-bit CAPDAC field.
pub const CAPDAC_MAX: u8 = 31;

/// Fractional bits of the offset calibration registers (Q5.11).
pub const OFFSET_FRACTIONAL_BITS: u8 = 11;

/// Fractional bits of the gain calibration registers (Q2.14).
pub const GAIN_FRACTIONAL_BITS: u8 = 14;

/// Fractional bits of a sign-extended 24-bit measurement, giving picofarads.
pub const MEASUREMENT_FRACTIONAL_BITS: u8 = 19;

/// Number of FDC_CONF reads made while waiting for a software reset to complete.
///
/// The chip clears the reset bit by itself once the reset has finished. This bounds
/// the wait so an unresponsive chip produces [`Error::Timeout`] instead of a hang.
///
/// [`Error::Timeout`]: crate::Error::Timeout
pub const RESET_POLL_LIMIT: u16 = 100;
