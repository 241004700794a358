//! The device-side control loop.

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use embedded_io::{Read, ReadReady, Write};

use crate::protocol::notice::BANNER;
use crate::protocol::{Packet, ProtocolConfig, Session};
use crate::{Channel, Error, FDC1004, FdcConfig, MeasurementSample, SampleRate};

/// Number of presence probes made by [`Monitor::start`].
pub const STARTUP_PROBES: usize = 5;

/// A free-running tick counter.
///
/// Only differences between readings are used, taken with wrapping subtraction
/// on `u32`. Readings must therefore count through the full `u32` range and wrap
/// at `u32::MAX`. A narrower hardware counter has to be extended to 32 bits
/// first; returned as-is, every rollover of the narrow counter looks like a huge
/// step and expires any pending multi-byte command.
pub trait Clock {
    /// Current reading.
    fn ticks(&self) -> u32;
}

/// Chip settings applied by [`Monitor::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StartupConfig {
    /// Sample rate set after the calibration reset.
    pub sample_rate: SampleRate,
    /// Channels to put in repeat mode once every channel has been stopped, as a
    /// mask in [`Channel::mask_bit`] order. Zero leaves repeat mode off, so
    /// measurements run only when the host starts them.
    pub repeat_channels: u8,
}

impl StartupConfig {
    /// Every channel converting continuously at `sample_rate`, for streaming and
    /// rate measurement.
    pub const fn continuous(sample_rate: SampleRate) -> Self {
        Self {
            sample_rate,
            repeat_channels: FdcConfig::ALL_DONE,
        }
    }
}

impl Default for StartupConfig {
    /// 100 Hz, no repeat.
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::Hz100,
            repeat_channels: 0,
        }
    }
}

/// What [`Monitor::start`] found on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipStatus<E> {
    /// The chip answered and its ID registers match an FDC1004.
    Ready,
    /// Nothing answered the presence probes.
    Absent,
    /// Something answered, but reading or checking its ID registers failed.
    ///
    /// [`Error::DeviceNotFound`] means the IDs were read and did not match.
    Unidentified(Error<E>),
}

impl<E> ChipStatus<E> {
    /// True if the chip was found and identified.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Runs the serial protocol against an FDC1004.
///
/// Owns the driver, the serial port, a clock and the protocol [`Session`]. Call
/// [`Monitor::start`] once, then [`Monitor::poll`] in a loop.
#[derive(Debug)]
pub struct Monitor<I2C, S, C> {
    fdc: FDC1004<I2C>,
    serial: S,
    clock: C,
    session: Session,
    startup: StartupConfig,
}

impl<I2C, S, C> Monitor<I2C, S, C>
where
    I2C: I2c,
    S: Read + ReadReady + Write,
    C: Clock,
{
    /// Assemble a monitor with an idle session.
    pub fn new(fdc: FDC1004<I2C>, serial: S, clock: C, config: ProtocolConfig) -> Self {
        Self {
            fdc,
            serial,
            clock,
            session: Session::new(config),
            startup: StartupConfig::default(),
        }
    }

    /// Replace the settings applied by [`Monitor::start`].
    pub fn with_startup(mut self, startup: StartupConfig) -> Self {
        self.startup = startup;
        self
    }

    /// Take the parts back.
    pub fn release(self) -> (FDC1004<I2C>, S, C) {
        (self.fdc, self.serial, self.clock)
    }

    /// The protocol session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The driver.
    pub fn driver(&mut self) -> &mut FDC1004<I2C> {
        &mut self.fdc
    }

    /// Put the chip in a known state and announce the device on the serial port.
    ///
    /// - Probe for the chip up to [`STARTUP_PROBES`] times.
    /// - Check its ID registers, driving `led` high only if they match.
    /// - Clear every channel's offset to 0 pF and gain to 1.
    /// - Read out any stale measurement results.
    /// - Clear every initiate bit.
    /// - Set the sample rate and, if configured, start repeat mode
    ///   ([`StartupConfig`]).
    /// - Write the banner.
    ///
    /// Chip errors are logged and do not stop the sequence. The returned status
    /// says whether the chip answered and identified itself; only serial port
    /// errors are returned as `Err`.
    pub fn start<P: OutputPin>(&mut self, led: &mut P) -> Result<ChipStatus<I2C::Error>, S::Error> {
        let status = self.identify();
        match &status {
            ChipStatus::Ready => {
                log::info!("FDC1004 found");
                if let Err(e) = led.set_high() {
                    log::warn!("LED: {:?}", e);
                }
            }
            ChipStatus::Absent => {
                log::warn!("FDC1004 did not answer {} probes", STARTUP_PROBES);
            }
            ChipStatus::Unidentified(e) => log::warn!("FDC1004 not identified: {:?}", e),
        }

        if let Err(e) = self.prepare_chip() {
            log::warn!("startup: {:?}", e);
        }

        self.serial.write_all(BANNER.as_bytes())?;
        Ok(status)
    }

    fn identify(&mut self) -> ChipStatus<I2C::Error> {
        for _ in 0..STARTUP_PROBES {
            if let Ok(true) = self.fdc.is_device_present() {
                return match self.fdc.check_identity() {
                    Ok(()) => ChipStatus::Ready,
                    Err(e) => ChipStatus::Unidentified(e),
                };
            }
        }
        ChipStatus::Absent
    }

    fn prepare_chip(&mut self) -> Result<(), Error<I2C::Error>> {
        for channel in Channel::ALL {
            self.fdc.write_offset_calibration(channel, 0.0)?;
            self.fdc.write_gain_calibration(channel, 1.0)?;
        }
        for channel in Channel::ALL {
            self.fdc.read_raw_measurement(channel)?;
        }
        for channel in Channel::ALL {
            self.fdc.stop_measurement(channel)?;
        }
        self.fdc.set_sample_rate(self.startup.sample_rate)?;
        if self.startup.repeat_channels != 0 {
            self.fdc.enable_repeated_measurement(self.startup.repeat_channels)?;
        }
        Ok(())
    }

    /// One pass of the control loop.
    ///
    /// In order:
    ///
    /// 1. feed at most one received byte to the session,
    /// 2. drop a timed-out multi-byte command,
    /// 3. send a measurement data packet if all four channels are done.
    ///
    /// Only serial port errors are returned.
    pub fn poll(&mut self) -> Result<(), S::Error> {
        if self.serial.read_ready()? {
            let mut byte = [0u8; 1];
            if self.serial.read(&mut byte)? == 1 {
                let now = self.clock.ticks();
                self.session
                    .handle_byte(byte[0], now, &mut self.fdc, &mut self.serial)?;
            }
        }

        let now = self.clock.ticks();
        self.session.check_timeout(now, &mut self.serial)?;

        match self.fdc.has_new_data() {
            Ok(FdcConfig::ALL_DONE) => self.send_measurements()?,
            Ok(_) => {}
            Err(e) => log::warn!("done bits: {:?}", e),
        }
        Ok(())
    }

    fn send_measurements(&mut self) -> Result<(), S::Error> {
        let mut samples = [MeasurementSample::default(); 4];
        for (sample, channel) in samples.iter_mut().zip(Channel::ALL) {
            match self.fdc.read_sample(channel) {
                Ok(s) => *sample = s,
                Err(e) => {
                    log::warn!("reading {:?}: {:?}", channel, e);
                    return Ok(());
                }
            }
        }
        self.serial
            .write_all(Packet::MeasurementData(samples).encode().as_bytes())
    }
}
