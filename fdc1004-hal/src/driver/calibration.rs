//! Offset and gain calibration registers.
use embedded_hal::i2c::I2c;

use super::FDC1004;
use crate::constants::{GAIN_FRACTIONAL_BITS, OFFSET_FRACTIONAL_BITS};
use crate::error::{ConfigError, Error};
use crate::fixed_point;
use crate::{Channel, Register};

/// Offset calibration range in picofarads, lower bound inclusive, upper exclusive.
const OFFSET_RANGE_PF: core::ops::Range<f64> = -16.0..16.0;

/// Gain calibration range, lower bound inclusive, upper exclusive.
const GAIN_RANGE: core::ops::Range<f64> = 0.0..4.0;

/// Per-channel calibration.
///
/// The chip applies these to a measurement before it is stored: the offset is
/// added, then the result is multiplied by the gain.
impl<I2C: I2c> FDC1004<I2C> {
    /// Set the offset calibration of `channel`, in picofarads.
    ///
    /// The value is stored as Q5.11, truncating toward zero, so the smallest step
    /// is 1/2048 pF.
    ///
    /// # Errors
    ///
    /// [`ConfigError::OffsetOutOfRange`] unless `-16.0 <= offset_pf < 16.0`. NaN is
    /// rejected. The register is not written in that case.
    pub fn write_offset_calibration(
        &mut self,
        channel: Channel,
        offset_pf: f64,
    ) -> Result<(), Error<I2C::Error>> {
        if !OFFSET_RANGE_PF.contains(&offset_pf) {
            return Err(ConfigError::OffsetOutOfRange.into());
        }
        let raw = fixed_point::encode_signed(offset_pf, OFFSET_FRACTIONAL_BITS);
        self.write_raw_offset_calibration(channel, raw)
    }

    /// Read the offset calibration of `channel`, in picofarads.
    pub fn read_offset_calibration(&mut self, channel: Channel) -> Result<f64, Error<I2C::Error>> {
        let raw = self.read_raw_offset_calibration(channel)?;
        Ok(fixed_point::decode_signed(raw, OFFSET_FRACTIONAL_BITS))
    }

    /// Write the raw Q5.11 offset calibration word of `channel`.
    pub fn write_raw_offset_calibration(
        &mut self,
        channel: Channel,
        raw: i16,
    ) -> Result<(), Error<I2C::Error>> {
        self.write_register(Register::OffsetCalibration(channel), raw as u16)
    }

    /// Read the raw Q5.11 offset calibration word of `channel`.
    pub fn read_raw_offset_calibration(
        &mut self,
        channel: Channel,
    ) -> Result<i16, Error<I2C::Error>> {
        self.read_register(Register::OffsetCalibration(channel))
            .map(|raw| raw as i16)
    }

    /// Set the gain calibration factor of `channel`.
    ///
    /// The value is stored as Q2.14, truncating toward zero. The power-on value is
    /// 1.0.
    ///
    /// # Errors
    ///
    /// [`ConfigError::GainOutOfRange`] unless `0.0 <= gain < 4.0`. NaN is rejected.
    /// The register is not written in that case.
    pub fn write_gain_calibration(
        &mut self,
        channel: Channel,
        gain: f64,
    ) -> Result<(), Error<I2C::Error>> {
        if !GAIN_RANGE.contains(&gain) {
            return Err(ConfigError::GainOutOfRange.into());
        }
        let raw = fixed_point::encode_unsigned(gain, GAIN_FRACTIONAL_BITS);
        self.write_raw_gain_calibration(channel, raw)
    }

    /// Read the gain calibration factor of `channel`.
    pub fn read_gain_calibration(&mut self, channel: Channel) -> Result<f64, Error<I2C::Error>> {
        let raw = self.read_raw_gain_calibration(channel)?;
        Ok(fixed_point::decode_unsigned(raw, GAIN_FRACTIONAL_BITS))
    }

    /// Write the raw Q2.14 gain calibration word of `channel`.
    pub fn write_raw_gain_calibration(
        &mut self,
        channel: Channel,
        raw: u16,
    ) -> Result<(), Error<I2C::Error>> {
        self.write_register(Register::GainCalibration(channel), raw)
    }

    /// Read the raw Q2.14 gain calibration word of `channel`.
    pub fn read_raw_gain_calibration(
        &mut self,
        channel: Channel,
    ) -> Result<u16, Error<I2C::Error>> {
        self.read_register(Register::GainCalibration(channel))
    }
}
