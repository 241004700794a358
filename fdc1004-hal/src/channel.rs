//! Measurement channels and their input configuration.

use crate::constants::{CAPDAC_MAX, GAIN_FRACTIONAL_BITS, OFFSET_FRACTIONAL_BITS};
use crate::error::ConfigError;
use crate::fixed_point;

/// One of the four measurement channels of the FDC1004.
///
/// The datasheet numbers these MEAS1 to MEAS4; they are numbered 0 to 3 on the
/// serial protocol and by [`Channel::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// MEAS1, channel 0.
    Meas1,
    /// MEAS2, channel 1.
    Meas2,
    /// MEAS3, channel 2.
    Meas3,
    /// MEAS4, channel 3.
    Meas4,
}

impl Channel {
    /// All channels in order.
    pub const ALL: [Channel; 4] = [Self::Meas1, Self::Meas2, Self::Meas3, Self::Meas4];

    /// Zero-based channel number.
    pub const fn index(self) -> u8 {
        match self {
            Self::Meas1 => 0,
            Self::Meas2 => 1,
            Self::Meas3 => 2,
            Self::Meas4 => 3,
        }
    }

    /// Bit of this channel in a 4-bit channel mask.
    ///
    /// Masks follow the chip's done and initiate fields: channel 0 is bit 3 and
    /// channel 3 is bit 0.
    pub const fn mask_bit(self) -> u8 {
        0b1000 >> self.index()
    }
}

impl TryFrom<u8> for Channel {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Meas1),
            1 => Ok(Self::Meas2),
            2 => Ok(Self::Meas3),
            3 => Ok(Self::Meas4),
            n => Err(ConfigError::InvalidChannel(n)),
        }
    }
}

impl From<Channel> for u8 {
    fn from(value: Channel) -> Self {
        value.index()
    }
}

/// What a measurement channel's positive (CHA) or negative (CHB) terminal is
/// connected to.
///
/// The ordering of the variants is the ordering of their register codes, which is
/// what [`FDC1004::configure_input`] checks: the negative input must come strictly
/// after the positive input.
///
/// [`FDC1004::configure_input`]: crate::FDC1004::configure_input
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeasurementInput {
    /// CIN1 pin, code 0b000.
    In1,
    /// CIN2 pin, code 0b001.
    In2,
    /// CIN3 pin, code 0b010.
    In3,
    /// CIN4 pin, code 0b011.
    In4,
    /// The internal CAPDAC, code 0b100. Only valid as a negative input.
    Capdac,
    /// Nothing connected, code 0b111. Only valid as a negative input.
    Disabled,
}

impl MeasurementInput {
    /// Register code for this input.
    pub const fn code(self) -> u8 {
        match self {
            Self::In1 => 0b000,
            Self::In2 => 0b001,
            Self::In3 => 0b010,
            Self::In4 => 0b011,
            Self::Capdac => 0b100,
            Self::Disabled => 0b111,
        }
    }

    /// True for the four physical CIN pins.
    pub const fn is_pin(self) -> bool {
        matches!(self, Self::In1 | Self::In2 | Self::In3 | Self::In4)
    }
}

impl TryFrom<u8> for MeasurementInput {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0b000 => Ok(Self::In1),
            0b001 => Ok(Self::In2),
            0b010 => Ok(Self::In3),
            0b011 => Ok(Self::In4),
            0b100 => Ok(Self::Capdac),
            0b111 => Ok(Self::Disabled),
            n => Err(ConfigError::InvalidInput(n)),
        }
    }
}

/// Check an input pair and CAPDAC setting before anything is written.
pub(crate) fn validate_inputs(
    positive: MeasurementInput,
    negative: MeasurementInput,
    capdac: u8,
) -> Result<(), ConfigError> {
    if !positive.is_pin() {
        return Err(ConfigError::InvalidPositiveInput);
    }
    if negative <= positive {
        return Err(ConfigError::InputOrder);
    }
    if capdac > CAPDAC_MAX {
        return Err(ConfigError::CapdacOutOfRange(capdac));
    }
    Ok(())
}

/// Complete settings of one measurement channel, as carried by the serial protocol.
///
/// Calibration values are kept as the raw register words so that the settings
/// read back from the chip are exactly those written to it. Use
/// [`ChannelSettings::offset_pf`] and [`ChannelSettings::gain`] for engineering units.
///
/// # Wire format
///
/// | byte | content |
/// |---|---|
/// | 0 | channel in bits 6:5, CAPDAC in bits 4:0 |
/// | 1 | positive input code in bits 7:4, negative input code in bits 3:0 |
/// | 2, 3 | offset calibration, big-endian Q5.11 |
/// | 4, 5 | gain calibration, big-endian Q2.14 |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelSettings {
    /// Channel these settings belong to.
    pub channel: Channel,
    /// Input connected to CHA.
    pub positive: MeasurementInput,
    /// Input connected to CHB.
    pub negative: MeasurementInput,
    /// CAPDAC setting, 0..=31.
    pub capdac: u8,
    /// Raw offset calibration word (Q5.11, pF).
    pub offset: i16,
    /// Raw gain calibration word (Q2.14).
    pub gain: u16,
}

impl ChannelSettings {
    /// Length of the packed form.
    pub const PACKED_LEN: usize = 6;

    /// Offset calibration in picofarads.
    pub fn offset_pf(&self) -> f64 {
        fixed_point::decode_signed(self.offset, OFFSET_FRACTIONAL_BITS)
    }

    /// Gain calibration factor.
    pub fn gain(&self) -> f64 {
        fixed_point::decode_unsigned(self.gain, GAIN_FRACTIONAL_BITS)
    }

    /// Check input ordering and CAPDAC range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_inputs(self.positive, self.negative, self.capdac)
    }

    /// Pack into the 6-byte wire format.
    pub fn to_bytes(&self) -> [u8; Self::PACKED_LEN] {
        let [offset_hi, offset_lo] = self.offset.to_be_bytes();
        let [gain_hi, gain_lo] = self.gain.to_be_bytes();
        [
            (self.channel.index() << 5) | (self.capdac & 0x1F),
            (self.positive.code() << 4) | self.negative.code(),
            offset_hi,
            offset_lo,
            gain_hi,
            gain_lo,
        ]
    }

    /// Unpack from the 6-byte wire format.
    ///
    /// Fails only if an input nibble is not a defined input code. Input ordering is
    /// not checked here; see [`ChannelSettings::validate`].
    pub fn from_bytes(bytes: &[u8; Self::PACKED_LEN]) -> Result<Self, ConfigError> {
        Ok(Self {
            channel: Channel::try_from((bytes[0] >> 5) & 0x03)?,
            capdac: bytes[0] & 0x1F,
            positive: MeasurementInput::try_from(bytes[1] >> 4)?,
            negative: MeasurementInput::try_from(bytes[1] & 0x0F)?,
            offset: i16::from_be_bytes([bytes[2], bytes[3]]),
            gain: u16::from_be_bytes([bytes[4], bytes[5]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MeasurementInput::*;

    const ALL_INPUTS: [MeasurementInput; 6] = [In1, In2, In3, In4, Capdac, Disabled];

    #[test]
    fn channel_numbers() {
        for n in 0..4u8 {
            assert_eq!(Channel::try_from(n).map(Channel::index), Ok(n));
        }
        assert_eq!(Channel::try_from(4), Err(ConfigError::InvalidChannel(4)));
        assert_eq!(Channel::try_from(255), Err(ConfigError::InvalidChannel(255)));
    }

    #[test]
    fn mask_bits_follow_chip_order() {
        let bits = Channel::ALL.map(Channel::mask_bit);
        assert_eq!(bits, [0b1000, 0b0100, 0b0010, 0b0001]);
    }

    #[test]
    fn input_codes_follow_variant_order() {
        for pair in ALL_INPUTS.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].code() < pair[1].code());
        }
        for input in ALL_INPUTS {
            assert_eq!(MeasurementInput::try_from(input.code()), Ok(input));
        }
        assert_eq!(MeasurementInput::try_from(5), Err(ConfigError::InvalidInput(5)));
        assert_eq!(MeasurementInput::try_from(6), Err(ConfigError::InvalidInput(6)));
    }

    #[test]
    fn validation_rejects_every_unordered_pair() {
        for positive in ALL_INPUTS {
            for negative in ALL_INPUTS {
                let result = validate_inputs(positive, negative, 0);
                if !positive.is_pin() {
                    assert_eq!(result, Err(ConfigError::InvalidPositiveInput));
                } else if negative <= positive {
                    assert_eq!(result, Err(ConfigError::InputOrder));
                } else {
                    assert_eq!(result, Ok(()));
                }
            }
        }
    }

    #[test]
    fn validation_checks_capdac() {
        assert_eq!(validate_inputs(In1, Capdac, 5), Ok(()));
        assert_eq!(validate_inputs(In1, Capdac, 31), Ok(()));
        assert_eq!(
            validate_inputs(In1, Capdac, 32),
            Err(ConfigError::CapdacOutOfRange(32))
        );
    }

    #[test]
    fn pack_channel_two_settings() {
        let settings = ChannelSettings {
            channel: Channel::Meas3,
            positive: In3,
            negative: Capdac,
            capdac: 10,
            offset: 0x0800,
            gain: 0x4000,
        };
        let bytes = settings.to_bytes();
        assert_eq!(bytes, [0x4A, 0x24, 0x08, 0x00, 0x40, 0x00]);
        assert_eq!(ChannelSettings::from_bytes(&bytes), Ok(settings));
        assert_eq!(settings.offset_pf(), 1.0);
        assert_eq!(settings.gain(), 1.0);
    }

    #[test]
    fn unpack_negative_offset() {
        let settings =
            ChannelSettings::from_bytes(&[0x1F, 0x07, 0xF8, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(settings.channel, Channel::Meas1);
        assert_eq!(settings.capdac, 31);
        assert_eq!(settings.negative, Disabled);
        assert_eq!(settings.offset_pf(), -1.0);
    }

    #[test]
    fn unpack_rejects_reserved_input_code() {
        assert_eq!(
            ChannelSettings::from_bytes(&[0x00, 0x05, 0, 0, 0, 0]),
            Err(ConfigError::InvalidInput(5))
        );
    }
}
