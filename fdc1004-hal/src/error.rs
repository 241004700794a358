use core::fmt;

/// Wrapper for problems when communicating with the FDC1004.
///
/// `E` is the error type of the underlying I2C bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// An I2C transaction with the FDC1004 did not complete.
    ///
    /// If this happened in the middle of a read-modify-write, the register holds
    /// whatever the last successful write left there. Nothing is rolled back.
    Comm(E),
    /// A value was rejected before anything was written to the chip.
    Config(ConfigError),
    /// No FDC1004 answered, or the ID registers held unexpected values.
    DeviceNotFound,
    /// The chip did not clear its reset bit within [`RESET_POLL_LIMIT`] reads.
    ///
    /// [`RESET_POLL_LIMIT`]: crate::constants::RESET_POLL_LIMIT
    Timeout,
}

/// Invalid input to a configuration operation.
///
/// These are detected on the host side, so no register has been touched when one
/// is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Measurement channel number not in the range 0..=3.
    InvalidChannel(u8),
    /// Sample rate code not one of 1 (100 Hz), 2 (200 Hz) or 3 (400 Hz).
    InvalidSampleRate(u8),
    /// Input code not one of the values defined for the CHA/CHB fields.
    InvalidInput(u8),
    /// The positive input must be one of CIN1 to CIN4.
    InvalidPositiveInput,
    /// The negative input must come after the positive input.
    InputOrder,
    /// CAPDAC setting not in the range 0..=31.
    CapdacOutOfRange(u8),
    /// Offset calibration outside -16 pF (inclusive) to 16 pF (exclusive).
    OffsetOutOfRange,
    /// Gain calibration outside 0 (inclusive) to 4 (exclusive).
    GainOutOfRange,
    /// Channel mask for repeated measurements has bits set above channel 3.
    InvalidChannelMask(u8),
}

impl<E> From<ConfigError> for Error<E> {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidChannel(n) => write!(f, "no measurement channel {n}"),
            ConfigError::InvalidSampleRate(n) => write!(f, "invalid sample rate code {n}"),
            ConfigError::InvalidInput(n) => write!(f, "invalid input code {n}"),
            ConfigError::InvalidPositiveInput => {
                write!(f, "positive input must be one of CIN1 to CIN4")
            }
            ConfigError::InputOrder => write!(f, "negative input must follow positive input"),
            ConfigError::CapdacOutOfRange(n) => write!(f, "CAPDAC value {n} above 31"),
            ConfigError::OffsetOutOfRange => write!(f, "offset must be in -16..16 pF"),
            ConfigError::GainOutOfRange => write!(f, "gain must be in 0..4"),
            ConfigError::InvalidChannelMask(m) => write!(f, "invalid channel mask {m:#04X}"),
        }
    }
}

impl core::error::Error for ConfigError {}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Comm(e) => write!(f, "I2C transfer failed: {e:?}"),
            Error::Config(e) => write!(f, "invalid configuration: {e}"),
            Error::DeviceNotFound => write!(f, "FDC1004 not found on the bus"),
            Error::Timeout => write!(f, "FDC1004 did not finish resetting"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}
