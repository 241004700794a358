use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use fdc1004_hal::SampleRate;
use fdc1004_hal::protocol::{Packet, PacketKind, Request};

use crate::link::Link;

#[derive(Debug, Parser)]
#[command(flatten_help = true)]
pub(crate) enum SampleRateCommand {
    /// Read the current rate.
    Get,
    /// Change the rate.
    Set { rate: Rate },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum Rate {
    /// 100 samples per second
    #[value(name = "100")]
    Hz100,
    /// 200 samples per second
    #[value(name = "200")]
    Hz200,
    /// 400 samples per second
    #[value(name = "400")]
    Hz400,
}

impl From<Rate> for SampleRate {
    fn from(value: Rate) -> Self {
        match value {
            Rate::Hz100 => SampleRate::Hz100,
            Rate::Hz200 => SampleRate::Hz200,
            Rate::Hz400 => SampleRate::Hz400,
        }
    }
}

pub(crate) fn read(link: &mut Link) -> Result<SampleRate> {
    match link.query(Request::SampleRate, PacketKind::SampleRate)? {
        Packet::SampleRate(Some(rate)) => Ok(rate),
        _ => bail!("board could not read the sample rate"),
    }
}

pub(crate) fn action(link: &mut Link, command: SampleRateCommand) -> Result<()> {
    match command {
        SampleRateCommand::Get => println!("{} Hz", read(link)?.hertz()),
        SampleRateCommand::Set { rate } => {
            let request = link.commands().sample_rate_request(rate.into());
            link.send(&request)?;
            println!("{}", link.await_notice()?);
        }
    }
    Ok(())
}
