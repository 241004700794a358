use crate::channel::{ChannelArg, ConfigureArgs};
use crate::sample_rate::SampleRateCommand;

use clap::Parser;

/// Host tool for FDC1004 capacitance boards
///
/// Talks to a board running the capacitance monitor firmware over a serial port.
/// The board answers single-byte requests with small binary packets, accepts
/// sample rate and channel settings as multi-byte commands, and streams a
/// measurement packet whenever all four channels have a new result.
///
/// If no port is given, the first serial port found is used.
#[derive(Debug, Parser)]
#[command(version, about)]
pub(crate) struct Cli {
    /// Serial port the board is attached to
    #[arg(short, long)]
    pub(crate) port: Option<String>,
    /// Serial baud rate
    #[arg(short, long, default_value_t = 115_200)]
    pub(crate) baud: u32,
    /// Log every byte sent and received
    #[arg(short, long)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Debug, Parser)]
pub(crate) enum Commands {
    /// List the serial ports on this machine.
    Ports,
    /// Show the banner, chip IDs, presence and sample rate.
    Info,
    /// Read or set the measurement rate.
    #[command(subcommand)]
    SampleRate(SampleRateCommand),
    /// Read the settings of one channel.
    Channel {
        /// Channel number, 1 to 4.
        channel: ChannelArg,
    },
    /// Write the inputs, CAPDAC and calibration of one channel.
    Configure(ConfigureArgs),
    /// Start a single measurement on one or more channels.
    Start {
        /// Channel numbers, 1 to 4.
        #[arg(required = true)]
        channels: Vec<ChannelArg>,
    },
    /// Print measurement packets as they arrive.
    Stream {
        /// Stop after this many packets.
        #[arg(short = 'n', long)]
        count: Option<u64>,
    },
    /// Count measurement packets and report the packet rate.
    ///
    /// Packets arrive continuously only from a board started with its channels in
    /// repeat mode. Otherwise each `start` of all four channels gives one packet.
    Rate {
        /// Seconds to count for.
        #[arg(short, long, default_value_t = 5)]
        seconds: u64,
    },
}
