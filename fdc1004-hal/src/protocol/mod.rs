//! Serial command protocol spoken between the host and the device.
//!
//! The host sends single-byte requests, plus two multi-byte commands that carry a
//! parameter and end in a latch byte. The device answers read requests with binary
//! [`Packet`]s, answers multi-byte commands with text [`Notice`]s, and sends a
//! measurement data packet on its own whenever all four channels have a result.
//!
//! [`Session`] is the device end. The host end uses [`CommandSet`] to build
//! requests and [`PacketDecoder`] to split the reply stream.

mod command;
pub mod notice;
pub mod packet;
mod session;

pub use command::{CommandSet, Request};
pub use notice::Notice;
pub use packet::{Decoded, DecodeError, Packet, PacketDecoder, PacketKind};
pub use session::{MultiByteCommand, Session, State};

/// Ticks allowed for a multi-byte command to complete, counted from its first byte.
pub const DEFAULT_TIMEOUT_TICKS: u32 = 1000;

/// Protocol settings shared by both ends of the link.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProtocolConfig {
    /// Ticks a multi-byte command may take before it is dropped.
    pub timeout_ticks: u32,
    /// Byte values of the commands.
    pub commands: CommandSet,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            timeout_ticks: DEFAULT_TIMEOUT_TICKS,
            commands: CommandSet::default(),
        }
    }
}
