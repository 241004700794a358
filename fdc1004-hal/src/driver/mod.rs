use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use crate::constants::{DEVICE_ID, I2C_ADDRESS, MANUFACTURER_ID, RESET_POLL_LIMIT};
use crate::error::Error;
use crate::registers::{FdcConfig, MeasurementConfig, Register};

mod calibration;
mod measurement;

/// Driver for the FDC1004.
///
/// # Quick start
///
/// Create the driver with [`FDC1004::new`], passing anything that implements the
/// blocking [`embedded_hal::i2c::I2c`] trait. Check the chip is there with
/// [`FDC1004::check_identity`], then configure a channel and start a measurement:
///
/// ```no_run
/// # fn demo<I2C: embedded_hal::i2c::I2c>(i2c: I2C) -> Result<(), fdc1004_hal::Error<I2C::Error>> {
/// use fdc1004_hal::{Channel, FDC1004, MeasurementInput, SampleRate};
///
/// let mut fdc = FDC1004::new(i2c);
/// fdc.check_identity()?;
/// fdc.set_sample_rate(SampleRate::Hz100)?;
/// fdc.configure_input(Channel::Meas1, MeasurementInput::In1, MeasurementInput::Capdac, 0)?;
/// fdc.start_measurement(Channel::Meas1)?;
/// while !fdc.is_measurement_done(Channel::Meas1)? {}
/// let picofarads = fdc.read_measurement(Channel::Meas1)?;
/// # let _ = picofarads;
/// # Ok(())
/// # }
/// ```
///
/// # Register access
///
/// Several operations share the FDC_CONF register. Every change to it is a
/// read-modify-write that touches only the bits of the operation, so the driver is
/// the single owner of that register. If the bus fails between the read and the
/// write, the register keeps its previous contents; nothing is retried.
#[derive(Debug)]
pub struct FDC1004<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> FDC1004<I2C> {
    /// Wrap the I2C bus. No bus traffic happens until the first operation.
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Give back the I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Register access
    ////////////////////////////////////////////////////////////////////////////////

    /// Read one 16-bit register.
    pub(crate) fn read_register(&mut self, register: Register) -> Result<u16, Error<I2C::Error>> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(I2C_ADDRESS, &[register.addr()], &mut buf)
            .map_err(Error::Comm)?;
        let value = u16::from_be_bytes(buf);
        log::trace!("read {:?} = {:#06X}", register, value);
        Ok(value)
    }

    /// Write one 16-bit register.
    pub(crate) fn write_register(
        &mut self,
        register: Register,
        value: u16,
    ) -> Result<(), Error<I2C::Error>> {
        log::trace!("write {:?} = {:#06X}", register, value);
        let [high, low] = value.to_be_bytes();
        self.i2c
            .write(I2C_ADDRESS, &[register.addr(), high, low])
            .map_err(Error::Comm)
    }

    /// Read FDC_CONF.
    pub fn read_fdc_config(&mut self) -> Result<FdcConfig, Error<I2C::Error>> {
        self.read_register(Register::FdcConfig)
            .map(FdcConfig::from_register)
    }

    /// Read-modify-write FDC_CONF, returning the value written.
    pub(crate) fn modify_fdc_config(
        &mut self,
        change: impl FnOnce(&mut FdcConfig),
    ) -> Result<FdcConfig, Error<I2C::Error>> {
        let mut conf = self.read_fdc_config()?;
        change(&mut conf);
        self.write_register(Register::FdcConfig, conf.register())?;
        Ok(conf)
    }

    /// Read-modify-write a CONF_MEASn register.
    pub(crate) fn modify_measurement_config(
        &mut self,
        register: Register,
        change: impl FnOnce(MeasurementConfig) -> MeasurementConfig,
    ) -> Result<(), Error<I2C::Error>> {
        let conf = MeasurementConfig::from_register(self.read_register(register)?);
        self.write_register(register, change(conf).register())
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Identification and reset
    ////////////////////////////////////////////////////////////////////////////////

    /// Read the manufacturer ID register. A genuine part returns 0x5449.
    pub fn read_manufacturer_id(&mut self) -> Result<u16, Error<I2C::Error>> {
        self.read_register(Register::ManufacturerId)
    }

    /// Read the device ID register. A genuine part returns 0x1004.
    pub fn read_device_id(&mut self) -> Result<u16, Error<I2C::Error>> {
        self.read_register(Register::DeviceId)
    }

    /// Check whether anything acknowledges the FDC1004 address.
    ///
    /// This is an address-only write with no data bytes. A missing acknowledgement
    /// gives `Ok(false)`; any other bus error is returned as [`Error::Comm`].
    pub fn is_device_present(&mut self) -> Result<bool, Error<I2C::Error>> {
        match self.i2c.write(I2C_ADDRESS, &[]) {
            Ok(()) => Ok(true),
            Err(e) if matches!(e.kind(), ErrorKind::NoAcknowledge(_)) => Ok(false),
            Err(e) => Err(Error::Comm(e)),
        }
    }

    /// Confirm the device on the bus is an FDC1004 by its ID registers.
    ///
    /// # Errors
    ///
    /// [`Error::DeviceNotFound`] if either ID register holds an unexpected value.
    pub fn check_identity(&mut self) -> Result<(), Error<I2C::Error>> {
        let manufacturer = self.read_manufacturer_id()?;
        let device = self.read_device_id()?;
        if manufacturer == MANUFACTURER_ID && device == DEVICE_ID {
            Ok(())
        } else {
            log::warn!(
                "unexpected IDs: manufacturer {:#06X}, device {:#06X}",
                manufacturer,
                device
            );
            Err(Error::DeviceNotFound)
        }
    }

    /// Software reset.
    ///
    /// Sets the RST bit and then polls FDC_CONF until the chip clears it, which
    /// returns every register to its power-on value.
    ///
    /// # Errors
    ///
    /// [`Error::Timeout`] if the bit is still set after
    /// [`RESET_POLL_LIMIT`](crate::constants::RESET_POLL_LIMIT) reads.
    pub fn reset(&mut self) -> Result<(), Error<I2C::Error>> {
        self.modify_fdc_config(|conf| {
            conf.set_reset();
        })?;
        for _ in 0..RESET_POLL_LIMIT {
            if !self.read_fdc_config()?.reset_pending() {
                log::debug!("reset complete");
                return Ok(());
            }
        }
        Err(Error::Timeout)
    }
}
