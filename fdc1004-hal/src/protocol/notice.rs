//! Text notices reporting the outcome of multi-byte commands.
//!
//! A notice is three lines: `Success: ` or `Failure: `, a detail line, and the
//! end-of-transmission marker `$$$`. Every line ends in CR LF.

use embedded_io::Write;

/// Text sent in reply to [`Request::Identify`](super::Request::Identify).
pub const BANNER: &str = "CapSense$$$\r\n";

/// First line of a success notice.
pub const SUCCESS: &str = "Success: \r\n";

/// First line of a failure notice.
pub const FAILURE: &str = "Failure: \r\n";

/// Last line of every notice.
pub const END_OF_TRANSMISSION: &str = "$$$\r\n";

/// Outcome of a multi-byte command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notice {
    /// The sample rate was written.
    SampleRateSet,
    /// The channel settings were written.
    ChannelSettingsSet,
    /// The sample rate digit is not a valid rate code.
    InvalidSampleRate,
    /// The chip rejected or did not acknowledge the sample rate write.
    SampleRateFailed,
    /// The settings were invalid or could not be written.
    ChannelSettingsFailed,
    /// The latch byte came early, or a different byte came in its place.
    TooFewBytes,
    /// The command was not completed within the timeout.
    Timeout,
}

impl Notice {
    /// True for the notices reporting a completed command.
    pub fn is_success(self) -> bool {
        matches!(self, Self::SampleRateSet | Self::ChannelSettingsSet)
    }

    /// Detail line, without line ending.
    pub fn detail(self) -> &'static str {
        match self {
            Self::SampleRateSet => "Sample rate set",
            Self::ChannelSettingsSet => "Channel settings set",
            Self::InvalidSampleRate => "Invalid sample rate",
            Self::SampleRateFailed => "Could not set sample rate",
            Self::ChannelSettingsFailed => "Could not set channel settings",
            Self::TooFewBytes => "Too few chars",
            Self::Timeout => "Timeout processing multi byte message - send all bytes at once",
        }
    }

    /// Write the three lines of the notice.
    pub fn write_to<W: Write>(self, out: &mut W) -> Result<(), W::Error> {
        let status = if self.is_success() { SUCCESS } else { FAILURE };
        out.write_all(status.as_bytes())?;
        out.write_all(self.detail().as_bytes())?;
        out.write_all(b"\r\n")?;
        out.write_all(END_OF_TRANSMISSION.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_notice_text() {
        let mut out: Vec<u8> = Vec::new();
        Notice::TooFewBytes.write_to(&mut out).unwrap();
        assert_eq!(out, b"Failure: \r\nToo few chars\r\n$$$\r\n");
    }

    #[test]
    fn success_notice_text() {
        let mut out: Vec<u8> = Vec::new();
        Notice::SampleRateSet.write_to(&mut out).unwrap();
        assert_eq!(out, b"Success: \r\nSample rate set\r\n$$$\r\n");
    }
}
