use core::fmt::Debug;

use embedded_hal::i2c::I2c;
use embedded_io::Write;

use super::notice::{BANNER, Notice};
use super::packet::Packet;
use super::{ProtocolConfig, Request};
use crate::{ChannelSettings, Error, FDC1004, SampleRate};

/// Multi-byte command being received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MultiByteCommand {
    /// `p`, digit, `P`.
    SampleRate,
    /// `x`, six packed bytes, `X`.
    ChannelSettings,
}

/// Where the session is in the command stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Waiting for the first byte of a command.
    Idle,
    /// Part way through a multi-byte command.
    AwaitingMultiByte {
        /// Command being received.
        command: MultiByteCommand,
        /// Bytes received so far, counting the command byte.
        received: u8,
        /// Clock reading when the command byte arrived.
        started_at: u32,
    },
}

/// State of the serial command parser.
///
/// Bytes go in one at a time through [`Session::handle_byte`]. Immediate commands
/// are answered at once; the two multi-byte commands are collected until their
/// latch byte arrives, then applied to the chip and answered with a text
/// [`Notice`]. A multi-byte command that is not finished within
/// [`ProtocolConfig::timeout_ticks`] is dropped with a failure notice.
///
/// Clock readings are plain tick counts and may wrap.
#[derive(Debug, Clone)]
pub struct Session {
    config: ProtocolConfig,
    state: State,
    scratch: [u8; ChannelSettings::PACKED_LEN],
}

impl Default for Session {
    fn default() -> Self {
        Self::new(ProtocolConfig::default())
    }
}

impl Session {
    /// An idle session.
    pub fn new(config: ProtocolConfig) -> Self {
        Self {
            config,
            state: State::Idle,
            scratch: [0; ChannelSettings::PACKED_LEN],
        }
    }

    /// Current parser state.
    pub fn state(&self) -> State {
        self.state
    }

    /// The configuration the session was created with.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Process one byte received at clock reading `now`.
    ///
    /// If a multi-byte command has timed out, its timeout notice is written first
    /// and `byte` is then handled as the start of a new command.
    ///
    /// Only errors writing to `out` are returned. Bus errors are reported to the
    /// host in the reply itself.
    pub fn handle_byte<I2C: I2c, W: Write>(
        &mut self,
        byte: u8,
        now: u32,
        fdc: &mut FDC1004<I2C>,
        out: &mut W,
    ) -> Result<(), W::Error> {
        self.check_timeout(now, out)?;
        match self.state {
            State::Idle => self.dispatch(byte, now, fdc, out),
            State::AwaitingMultiByte {
                command: MultiByteCommand::SampleRate,
                received,
                ..
            } => self.sample_rate_byte(byte, received, fdc, out),
            State::AwaitingMultiByte {
                command: MultiByteCommand::ChannelSettings,
                received,
                ..
            } => self.channel_settings_byte(byte, received, fdc, out),
        }
    }

    /// Drop an unfinished multi-byte command if its time is up.
    ///
    /// The command has timed out once at least `timeout_ticks` ticks have passed
    /// since its first byte. Returns true if a command was dropped, in which case
    /// exactly one failure notice has been written.
    pub fn check_timeout<W: Write>(&mut self, now: u32, out: &mut W) -> Result<bool, W::Error> {
        let State::AwaitingMultiByte {
            command,
            started_at,
            ..
        } = self.state
        else {
            return Ok(false);
        };
        if now.wrapping_sub(started_at) < self.config.timeout_ticks {
            return Ok(false);
        }
        log::warn!("{:?} command timed out", command);
        self.finish(Notice::Timeout, out)?;
        Ok(true)
    }

    fn dispatch<I2C: I2c, W: Write>(
        &mut self,
        byte: u8,
        now: u32,
        fdc: &mut FDC1004<I2C>,
        out: &mut W,
    ) -> Result<(), W::Error> {
        let Some(request) = self.config.commands.decode(byte) else {
            log::debug!("ignoring byte {:#04X}", byte);
            return Ok(());
        };
        log::debug!("request {:?}", request);
        let reply = match request {
            Request::Identify => return out.write_all(BANNER.as_bytes()),
            Request::ManufacturerId => {
                Packet::ManufacturerId(checked("manufacturer ID", fdc.read_manufacturer_id()))
            }
            Request::DeviceId => Packet::DeviceId(checked("device ID", fdc.read_device_id())),
            Request::SampleRate => {
                Packet::SampleRate(checked("sample rate", fdc.read_sample_rate()))
            }
            Request::SensorCheck => {
                let present = checked("presence", fdc.is_device_present());
                Packet::SensorCheck(present.unwrap_or(false))
            }
            Request::ReadChannel(channel) => Packet::ChannelSettings(checked(
                "channel settings",
                fdc.read_channel_settings(channel),
            )),
            Request::StartMeasurement(channel) => {
                checked("start measurement", fdc.start_measurement(channel));
                return Ok(());
            }
            Request::SetSampleRate => {
                self.begin(MultiByteCommand::SampleRate, now);
                return Ok(());
            }
            Request::SetChannelSettings => {
                self.begin(MultiByteCommand::ChannelSettings, now);
                return Ok(());
            }
        };
        out.write_all(reply.encode().as_bytes())
    }

    fn begin(&mut self, command: MultiByteCommand, now: u32) {
        self.state = State::AwaitingMultiByte {
            command,
            received: 1,
            started_at: now,
        };
    }

    fn advance(&mut self) {
        if let State::AwaitingMultiByte { received, .. } = &mut self.state {
            *received += 1;
        }
    }

    fn finish<W: Write>(&mut self, notice: Notice, out: &mut W) -> Result<(), W::Error> {
        self.state = State::Idle;
        notice.write_to(out)
    }

    fn sample_rate_byte<I2C: I2c, W: Write>(
        &mut self,
        byte: u8,
        received: u8,
        fdc: &mut FDC1004<I2C>,
        out: &mut W,
    ) -> Result<(), W::Error> {
        let latch = self.config.commands.sample_rate_latch;
        if received == 1 {
            if byte == latch {
                return self.finish(Notice::TooFewBytes, out);
            }
            self.scratch[0] = digit_value(byte);
            self.advance();
            return Ok(());
        }
        if byte != latch {
            return self.finish(Notice::TooFewBytes, out);
        }
        let notice = match SampleRate::try_from(self.scratch[0]) {
            Err(_) => Notice::InvalidSampleRate,
            Ok(rate) => match checked("set sample rate", fdc.set_sample_rate(rate)) {
                Some(()) => Notice::SampleRateSet,
                None => Notice::SampleRateFailed,
            },
        };
        self.finish(notice, out)
    }

    fn channel_settings_byte<I2C: I2c, W: Write>(
        &mut self,
        byte: u8,
        received: u8,
        fdc: &mut FDC1004<I2C>,
        out: &mut W,
    ) -> Result<(), W::Error> {
        let index = usize::from(received) - 1;
        if index < ChannelSettings::PACKED_LEN {
            self.scratch[index] = byte;
            self.advance();
            return Ok(());
        }
        if byte != self.config.commands.channel_settings_latch {
            return self.finish(Notice::TooFewBytes, out);
        }
        let applied = ChannelSettings::from_bytes(&self.scratch)
            .map_err(Error::Config)
            .and_then(|settings| fdc.configure_channel(&settings));
        let notice = match checked("configure channel", applied) {
            Some(()) => Notice::ChannelSettingsSet,
            None => Notice::ChannelSettingsFailed,
        };
        self.finish(notice, out)
    }
}

/// Value of an ASCII digit; anything else counts as zero.
fn digit_value(byte: u8) -> u8 {
    if byte.is_ascii_digit() { byte - b'0' } else { 0 }
}

/// Log a failed chip operation and discard the error.
fn checked<T, E: Debug>(what: &str, result: Result<T, Error<E>>) -> Option<T> {
    result
        .map_err(|e| log::warn!("{} failed: {:?}", what, e))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits() {
        assert_eq!(digit_value(b'0'), 0);
        assert_eq!(digit_value(b'3'), 3);
        assert_eq!(digit_value(b'9'), 9);
        assert_eq!(digit_value(b'a'), 0);
        assert_eq!(digit_value(b'P'), 0);
    }
}
