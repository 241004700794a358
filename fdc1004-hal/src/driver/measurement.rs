//! Channel configuration, sample rate and measurement control.
use embedded_hal::i2c::I2c;

use super::FDC1004;
use crate::channel::validate_inputs;
use crate::error::{ConfigError, Error};
use crate::measurement::{MeasurementSample, capacitance_pf};
use crate::registers::{MeasurementConfig, SampleRate};
use crate::{Channel, ChannelSettings, MeasurementInput, Register};

/// Channel configuration.
impl<I2C: I2c> FDC1004<I2C> {
    /// Connect the inputs of a measurement channel and set its CAPDAC.
    ///
    /// Only bits 15:4 of the CONF_MEASn register change.
    ///
    /// # Errors
    ///
    /// A [`ConfigError`] and no bus traffic if:
    ///
    /// - `positive` is not one of the CIN pins,
    /// - `negative` does not come after `positive` in code order,
    /// - `capdac` is above 31.
    pub fn configure_input(
        &mut self,
        channel: Channel,
        positive: MeasurementInput,
        negative: MeasurementInput,
        capdac: u8,
    ) -> Result<(), Error<I2C::Error>> {
        validate_inputs(positive, negative, capdac)?;
        log::debug!(
            "configure {:?}: {:?} - {:?}, CAPDAC {}",
            channel,
            positive,
            negative,
            capdac
        );
        self.modify_measurement_config(Register::MeasurementConfig(channel), |conf| {
            conf.with_inputs(positive, negative, capdac)
        })
    }

    /// Read the CONF_MEASn register of `channel`.
    pub fn read_measurement_config(
        &mut self,
        channel: Channel,
    ) -> Result<MeasurementConfig, Error<I2C::Error>> {
        self.read_register(Register::MeasurementConfig(channel))
            .map(MeasurementConfig::from_register)
    }

    /// Read the CAPDAC setting of `channel`.
    pub fn read_capdac(&mut self, channel: Channel) -> Result<u8, Error<I2C::Error>> {
        self.read_measurement_config(channel).map(|conf| conf.capdac())
    }

    /// Read the full configuration of `channel`: inputs, CAPDAC and calibration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidInput`] if the register holds a reserved input code.
    pub fn read_channel_settings(
        &mut self,
        channel: Channel,
    ) -> Result<ChannelSettings, Error<I2C::Error>> {
        let conf = self.read_measurement_config(channel)?;
        Ok(ChannelSettings {
            channel,
            positive: conf.positive()?,
            negative: conf.negative()?,
            capdac: conf.capdac(),
            offset: self.read_raw_offset_calibration(channel)?,
            gain: self.read_raw_gain_calibration(channel)?,
        })
    }

    /// Apply `settings` to its channel: inputs and CAPDAC first, then the raw
    /// offset and gain words.
    ///
    /// Settings are validated before anything is written. A bus failure part way
    /// through leaves the earlier writes in place.
    pub fn configure_channel(
        &mut self,
        settings: &ChannelSettings,
    ) -> Result<(), Error<I2C::Error>> {
        settings.validate()?;
        let channel = settings.channel;
        self.configure_input(channel, settings.positive, settings.negative, settings.capdac)?;
        self.write_raw_offset_calibration(channel, settings.offset)?;
        self.write_raw_gain_calibration(channel, settings.gain)
    }
}

/// Sample rate and measurement triggering.
impl<I2C: I2c> FDC1004<I2C> {
    /// Set the output data rate shared by all channels.
    pub fn set_sample_rate(&mut self, rate: SampleRate) -> Result<(), Error<I2C::Error>> {
        self.modify_fdc_config(|conf| {
            conf.set_sample_rate(rate);
        })?;
        Ok(())
    }

    /// Read the output data rate.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidSampleRate`] if the RATE field holds the reserved code 0.
    pub fn read_sample_rate(&mut self) -> Result<SampleRate, Error<I2C::Error>> {
        let code = self.read_fdc_config()?.sample_rate_code();
        Ok(SampleRate::try_from(code)?)
    }

    /// Trigger a measurement on `channel`.
    pub fn start_measurement(&mut self, channel: Channel) -> Result<(), Error<I2C::Error>> {
        self.modify_fdc_config(|conf| {
            conf.set_initiate(channel, true);
        })?;
        Ok(())
    }

    /// Clear the initiate bit of `channel`.
    pub fn stop_measurement(&mut self, channel: Channel) -> Result<(), Error<I2C::Error>> {
        self.modify_fdc_config(|conf| {
            conf.set_initiate(channel, false);
        })?;
        Ok(())
    }

    /// True if `channel` has a completed measurement.
    pub fn is_measurement_done(&mut self, channel: Channel) -> Result<bool, Error<I2C::Error>> {
        self.read_fdc_config().map(|conf| conf.done(channel))
    }

    /// The four done bits of FDC_CONF, channel 0 in bit 3 down to channel 3 in bit 0.
    ///
    /// The mask can be passed straight to [`FDC1004::enable_repeated_measurement`].
    ///
    /// [`FdcConfig::ALL_DONE`](crate::FdcConfig::ALL_DONE) means every channel has
    /// a result waiting.
    pub fn has_new_data(&mut self) -> Result<u8, Error<I2C::Error>> {
        self.read_fdc_config().map(|conf| conf.done_mask())
    }

    /// Start repeated measurements on the channels in `channel_mask`.
    ///
    /// The mask uses the same bit order as [`FDC1004::has_new_data`]: channel 0 in
    /// bit 3 down to channel 3 in bit 0 (see [`Channel::mask_bit`]). All four
    /// initiate bits are cleared first, then one more write sets the repeat bit
    /// together with the selected initiate bits.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidChannelMask`] if any bit above bit 3 is set.
    pub fn enable_repeated_measurement(
        &mut self,
        channel_mask: u8,
    ) -> Result<(), Error<I2C::Error>> {
        if channel_mask > 0x0F {
            return Err(ConfigError::InvalidChannelMask(channel_mask).into());
        }
        self.modify_fdc_config(|conf| {
            conf.clear_all_initiate();
        })?;
        self.modify_fdc_config(|conf| {
            conf.set_repeat(true);
            for channel in Channel::ALL {
                if channel_mask & channel.mask_bit() != 0 {
                    conf.set_initiate(channel, true);
                }
            }
        })?;
        Ok(())
    }

    /// Clear the repeat bit. Initiate bits are left alone.
    pub fn disable_repeated_measurement(&mut self) -> Result<(), Error<I2C::Error>> {
        self.modify_fdc_config(|conf| {
            conf.set_repeat(false);
        })?;
        Ok(())
    }
}

/// Reading results.
impl<I2C: I2c> FDC1004<I2C> {
    /// Read the measurement result of `channel`.
    ///
    /// The 24-bit two's-complement result is returned left-aligned, so the low 8
    /// bits are always zero and the sign is that of the measurement.
    pub fn read_raw_measurement(&mut self, channel: Channel) -> Result<i32, Error<I2C::Error>> {
        let msb = self.read_register(Register::MeasurementMsb(channel))?;
        let lsb = self.read_register(Register::MeasurementLsb(channel))?;
        Ok(((u32::from(msb) << 16) | u32::from(lsb & 0xFF00)) as i32)
    }

    /// Read the measurement of `channel` in picofarads, including its CAPDAC setting.
    pub fn read_measurement(&mut self, channel: Channel) -> Result<f64, Error<I2C::Error>> {
        let sample = self.read_sample(channel)?;
        Ok(capacitance_pf(sample.raw, sample.capdac))
    }

    /// Read the raw result of `channel` together with its current CAPDAC setting.
    pub fn read_sample(
        &mut self,
        channel: Channel,
    ) -> Result<MeasurementSample, Error<I2C::Error>> {
        let raw = self.read_raw_measurement(channel)?;
        let capdac = self.read_capdac(channel)?;
        Ok(MeasurementSample { raw, capdac })
    }
}
