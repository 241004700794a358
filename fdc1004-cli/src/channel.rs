use anyhow::{Result, bail};
use clap::{Parser, ValueEnum, value_parser};
use fdc1004_hal::constants::{GAIN_FRACTIONAL_BITS, OFFSET_FRACTIONAL_BITS};
use fdc1004_hal::fixed_point;
use fdc1004_hal::protocol::{Packet, PacketKind, Request};
use fdc1004_hal::{Channel, ChannelSettings, MeasurementInput};

use crate::link::Link;

/// Measurement channel number as typed on the command line, 1 to 4.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChannelArg(pub(crate) Channel);

impl std::str::FromStr for ChannelArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s.parse().map_err(|_| format!("not a channel number: {s}"))?;
        n.checked_sub(1)
            .and_then(|index| Channel::try_from(index).ok())
            .map(ChannelArg)
            .ok_or_else(|| format!("channel must be 1 to 4, got {n}"))
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum Input {
    In1,
    In2,
    In3,
    In4,
    /// The internal CAPDAC (negative input only)
    Capdac,
    /// Not connected (negative input only)
    Disabled,
}

impl From<Input> for MeasurementInput {
    fn from(value: Input) -> Self {
        match value {
            Input::In1 => MeasurementInput::In1,
            Input::In2 => MeasurementInput::In2,
            Input::In3 => MeasurementInput::In3,
            Input::In4 => MeasurementInput::In4,
            Input::Capdac => MeasurementInput::Capdac,
            Input::Disabled => MeasurementInput::Disabled,
        }
    }
}

/// Write the inputs, CAPDAC and calibration of one channel.
///
/// The negative input must be a higher-numbered pin than the positive one, or
/// the CAPDAC, or disabled. The board rejects anything else.
#[derive(Debug, Parser)]
pub(crate) struct ConfigureArgs {
    /// Channel number, 1 to 4.
    channel: ChannelArg,
    /// Input connected to the positive side.
    #[arg(long, default_value = "in1")]
    positive: Input,
    /// Input connected to the negative side.
    #[arg(long, default_value = "capdac")]
    negative: Input,
    /// CAPDAC setting; each step is 3.125 pF.
    #[arg(long, default_value_t = 0, value_parser = value_parser!(u8).range(0..=31))]
    capdac: u8,
    /// Offset calibration in pF, -16 to 16.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    offset: f64,
    /// Gain calibration factor, 0 to 4.
    #[arg(long, default_value_t = 1.0)]
    gain: f64,
}

impl ConfigureArgs {
    fn settings(&self) -> Result<ChannelSettings> {
        if !(-16.0..16.0).contains(&self.offset) {
            bail!("offset must be at least -16 pF and less than 16 pF");
        }
        if !(0.0..4.0).contains(&self.gain) {
            bail!("gain must be at least 0 and less than 4");
        }
        let settings = ChannelSettings {
            channel: self.channel.0,
            positive: self.positive.into(),
            negative: self.negative.into(),
            capdac: self.capdac,
            offset: fixed_point::encode_signed(self.offset, OFFSET_FRACTIONAL_BITS),
            gain: fixed_point::encode_unsigned(self.gain, GAIN_FRACTIONAL_BITS),
        };
        settings.validate()?;
        Ok(settings)
    }
}

pub(crate) fn read(link: &mut Link, channel: ChannelArg) -> Result<()> {
    match link.query(Request::ReadChannel(channel.0), PacketKind::ChannelSettings)? {
        Packet::ChannelSettings(Some(settings)) => print_settings(&settings),
        _ => bail!("board could not read {:?}", channel.0),
    }
    Ok(())
}

pub(crate) fn configure(link: &mut Link, args: ConfigureArgs) -> Result<()> {
    let settings = args.settings()?;
    let request = link.commands().channel_settings_request(&settings);
    link.send(&request)?;
    println!("{}", link.await_notice()?);
    read(link, args.channel)
}

pub(crate) fn start(link: &mut Link, channels: &[ChannelArg]) -> Result<()> {
    for channel in channels {
        link.request(Request::StartMeasurement(channel.0))?;
    }
    Ok(())
}

fn print_settings(settings: &ChannelSettings) {
    println!("{:?}", settings.channel);
    println!("  positive: {:?}", settings.positive);
    println!("  negative: {:?}", settings.negative);
    println!(
        "  capdac:   {} ({} pF)",
        settings.capdac,
        f64::from(settings.capdac) * fdc1004_hal::constants::CAPDAC_STEP_PF
    );
    println!("  offset:   {} pF", settings.offset_pf());
    println!("  gain:     {}", settings.gain());
}
