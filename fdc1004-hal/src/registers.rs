//! FDC1004 register map and the layout of the configuration registers.
//!
//! Every register is 16 bits wide and transferred most significant byte first.

use bit_field::BitField;

use crate::channel::{Channel, MeasurementInput};
use crate::error::ConfigError;

/// Registers of the FDC1004.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// MEASn_MSB, upper 16 bits of a measurement result (0x00, 0x02, 0x04, 0x06).
    MeasurementMsb(Channel),
    /// MEASn_LSB, lower 8 bits of a measurement result in bits 15:8
    /// (0x01, 0x03, 0x05, 0x07).
    MeasurementLsb(Channel),
    /// CONF_MEASn, input and CAPDAC configuration (0x08 to 0x0B).
    MeasurementConfig(Channel),
    /// FDC_CONF, shared reset, rate, repeat, initiate and done bits (0x0C).
    FdcConfig,
    /// OFFSET_CAL_CINn, Q5.11 offset calibration (0x0D to 0x10).
    OffsetCalibration(Channel),
    /// GAIN_CAL_CINn, Q2.14 gain calibration (0x11 to 0x14).
    GainCalibration(Channel),
    /// Manufacturer ID (0xFE).
    ManufacturerId,
    /// Device ID (0xFF).
    DeviceId,
}

impl Register {
    /// Register pointer value.
    pub const fn addr(self) -> u8 {
        match self {
            Self::MeasurementMsb(ch) => 2 * ch.index(),
            Self::MeasurementLsb(ch) => 2 * ch.index() + 1,
            Self::MeasurementConfig(ch) => 0x08 + ch.index(),
            Self::FdcConfig => 0x0C,
            Self::OffsetCalibration(ch) => 0x0D + ch.index(),
            Self::GainCalibration(ch) => 0x11 + ch.index(),
            Self::ManufacturerId => 0xFE,
            Self::DeviceId => 0xFF,
        }
    }
}

/// Output data rate of the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleRate {
    /// 100 samples per second, code 0b01.
    Hz100,
    /// 200 samples per second, code 0b10.
    Hz200,
    /// 400 samples per second, code 0b11.
    Hz400,
}

impl SampleRate {
    /// Value of the RATE field. Code 0 is reserved.
    pub const fn code(self) -> u8 {
        match self {
            Self::Hz100 => 0b01,
            Self::Hz200 => 0b10,
            Self::Hz400 => 0b11,
        }
    }

    /// Samples per second.
    pub const fn hertz(self) -> u16 {
        match self {
            Self::Hz100 => 100,
            Self::Hz200 => 200,
            Self::Hz400 => 400,
        }
    }
}

impl TryFrom<u8> for SampleRate {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b01 => Ok(Self::Hz100),
            0b10 => Ok(Self::Hz200),
            0b11 => Ok(Self::Hz400),
            n => Err(ConfigError::InvalidSampleRate(n)),
        }
    }
}

/// Contents of a CONF_MEASn register.
///
/// | bits | field |
/// |---|---|
/// | 15:13 | CHA, positive input |
/// | 12:10 | CHB, negative input |
/// | 9:5 | CAPDAC |
/// | 4:0 | reserved |
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MeasurementConfig(u16);

impl MeasurementConfig {
    /// Wrap a raw register value.
    pub const fn from_register(raw: u16) -> Self {
        Self(raw)
    }

    /// Raw register value.
    pub const fn register(self) -> u16 {
        self.0
    }

    /// Raw CHA field.
    pub fn positive_code(self) -> u8 {
        self.0.get_bits(13..16) as u8
    }

    /// Raw CHB field.
    pub fn negative_code(self) -> u8 {
        self.0.get_bits(10..13) as u8
    }

    /// Positive input, if the CHA field holds a defined code.
    pub fn positive(self) -> Result<MeasurementInput, ConfigError> {
        MeasurementInput::try_from(self.positive_code())
    }

    /// Negative input, if the CHB field holds a defined code.
    pub fn negative(self) -> Result<MeasurementInput, ConfigError> {
        MeasurementInput::try_from(self.negative_code())
    }

    /// CAPDAC setting, 0..=31.
    pub fn capdac(self) -> u8 {
        self.0.get_bits(5..10) as u8
    }

    /// Replace bits 15:4 with the given inputs and CAPDAC, leaving bits 3:0 alone.
    ///
    /// Inputs must already have been validated.
    pub(crate) fn with_inputs(
        mut self,
        positive: MeasurementInput,
        negative: MeasurementInput,
        capdac: u8,
    ) -> Self {
        self.0
            .set_bits(4..16, 0)
            .set_bits(13..16, positive.code().into())
            .set_bits(10..13, negative.code().into())
            .set_bits(5..10, capdac.into());
        self
    }
}

/// Contents of the FDC_CONF register.
///
/// | bits | field |
/// |---|---|
/// | 15 | RST, software reset; reads 1 until the reset completes |
/// | 11:10 | RATE |
/// | 8 | REPEAT |
/// | 7:4 | MEAS_1 to MEAS_4 initiate bits, channel `n` at bit `7 - n` |
/// | 3:0 | DONE_1 to DONE_4, channel `n` at bit `3 - n` |
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FdcConfig(u16);

impl FdcConfig {
    const RESET_BIT: usize = 15;
    const RATE_BITS: core::ops::Range<usize> = 10..12;
    const REPEAT_BIT: usize = 8;
    const INITIATE_BITS: core::ops::Range<usize> = 4..8;
    const DONE_BITS: core::ops::Range<usize> = 0..4;

    /// Done mask with all four channels complete.
    pub const ALL_DONE: u8 = 0b1111;

    /// Wrap a raw register value.
    pub const fn from_register(raw: u16) -> Self {
        Self(raw)
    }

    /// Raw register value.
    pub const fn register(self) -> u16 {
        self.0
    }

    fn initiate_bit(channel: Channel) -> usize {
        7 - channel.index() as usize
    }

    fn done_bit(channel: Channel) -> usize {
        3 - channel.index() as usize
    }

    /// True while a software reset is in progress.
    pub fn reset_pending(self) -> bool {
        self.0.get_bit(Self::RESET_BIT)
    }

    pub(crate) fn set_reset(&mut self) -> &mut Self {
        self.0.set_bit(Self::RESET_BIT, true);
        self
    }

    /// Raw RATE field.
    pub fn sample_rate_code(self) -> u8 {
        self.0.get_bits(Self::RATE_BITS) as u8
    }

    pub(crate) fn set_sample_rate(&mut self, rate: SampleRate) -> &mut Self {
        self.0.set_bits(Self::RATE_BITS, rate.code().into());
        self
    }

    /// True if repeated measurements are enabled.
    pub fn repeat(self) -> bool {
        self.0.get_bit(Self::REPEAT_BIT)
    }

    pub(crate) fn set_repeat(&mut self, repeat: bool) -> &mut Self {
        self.0.set_bit(Self::REPEAT_BIT, repeat);
        self
    }

    /// True if a measurement has been initiated on `channel`.
    pub fn initiated(self, channel: Channel) -> bool {
        self.0.get_bit(Self::initiate_bit(channel))
    }

    pub(crate) fn set_initiate(&mut self, channel: Channel, initiate: bool) -> &mut Self {
        self.0.set_bit(Self::initiate_bit(channel), initiate);
        self
    }

    pub(crate) fn clear_all_initiate(&mut self) -> &mut Self {
        self.0.set_bits(Self::INITIATE_BITS, 0);
        self
    }

    /// True if `channel` has a completed measurement waiting to be read.
    pub fn done(self, channel: Channel) -> bool {
        self.0.get_bit(Self::done_bit(channel))
    }

    /// The four done bits, channel 0 in bit 3 down to channel 3 in bit 0.
    pub fn done_mask(self) -> u8 {
        self.0.get_bits(Self::DONE_BITS) as u8
    }
}
