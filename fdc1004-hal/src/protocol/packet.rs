//! Binary packets sent from the device to the host.
//!
//! Every packet is `[header, id, payload..., TAIL]`. The payload length is fixed by
//! the packet id. Replies to requests use [`REPLY_HEADER`]; the measurement data
//! the device sends on its own uses [`DATA_HEADER`]. Neither header byte is ASCII,
//! so packets can be told apart from the text notices sharing the link.

use core::fmt;

use crate::{ChannelSettings, MeasurementSample, SampleRate};

/// First byte of a reply packet.
pub const REPLY_HEADER: u8 = 0xA0;

/// First byte of a measurement data packet.
pub const DATA_HEADER: u8 = 0xA1;

/// Last byte of every packet.
pub const TAIL: u8 = 0xC0;

/// Payload byte used when the value could not be read from the chip.
pub const FAILED: u8 = 0xFF;

/// Length of the longest packet, the measurement data packet.
pub const MAX_PACKET_LEN: usize = 3 + PacketKind::MeasurementData.payload_len();

/// Packet type, identified by the second byte of a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketKind {
    /// Whether the FDC1004 acknowledged its address.
    SensorCheck,
    /// RATE field code.
    SampleRate,
    /// Manufacturer ID register.
    ManufacturerId,
    /// Device ID register.
    DeviceId,
    /// Packed [`ChannelSettings`].
    ChannelSettings,
    /// Results of all four channels.
    MeasurementData,
}

impl PacketKind {
    /// Packet id byte.
    pub const fn id(self) -> u8 {
        match self {
            Self::SensorCheck => 0x00,
            Self::SampleRate => 0x01,
            Self::ManufacturerId => 0x02,
            Self::DeviceId => 0x03,
            Self::ChannelSettings => 0x04,
            Self::MeasurementData => 0x05,
        }
    }

    /// Packet type for an id byte.
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0x00 => Some(Self::SensorCheck),
            0x01 => Some(Self::SampleRate),
            0x02 => Some(Self::ManufacturerId),
            0x03 => Some(Self::DeviceId),
            0x04 => Some(Self::ChannelSettings),
            0x05 => Some(Self::MeasurementData),
            _ => None,
        }
    }

    /// Header byte packets of this type start with.
    pub const fn header(self) -> u8 {
        match self {
            Self::MeasurementData => DATA_HEADER,
            _ => REPLY_HEADER,
        }
    }

    /// Number of bytes between the id and the tail.
    pub const fn payload_len(self) -> usize {
        match self {
            Self::SensorCheck | Self::SampleRate => 1,
            Self::ManufacturerId | Self::DeviceId => 2,
            Self::ChannelSettings => ChannelSettings::PACKED_LEN,
            Self::MeasurementData => 4 * MeasurementSample::PACKED_LEN,
        }
    }
}

/// A decoded packet.
///
/// `None` stands for a value the device failed to read; it is sent as
/// [`FAILED`] in every payload byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Packet {
    /// True if the FDC1004 acknowledged its address.
    SensorCheck(bool),
    /// Current sample rate.
    SampleRate(Option<SampleRate>),
    /// Manufacturer ID, 0x5449 for a genuine part.
    ManufacturerId(Option<u16>),
    /// Device ID, 0x1004 for a genuine part.
    DeviceId(Option<u16>),
    /// Settings of one channel.
    ChannelSettings(Option<ChannelSettings>),
    /// One sample from each channel, channel 0 first.
    MeasurementData([MeasurementSample; 4]),
}

impl Packet {
    /// Type of this packet.
    pub fn kind(&self) -> PacketKind {
        match self {
            Self::SensorCheck(_) => PacketKind::SensorCheck,
            Self::SampleRate(_) => PacketKind::SampleRate,
            Self::ManufacturerId(_) => PacketKind::ManufacturerId,
            Self::DeviceId(_) => PacketKind::DeviceId,
            Self::ChannelSettings(_) => PacketKind::ChannelSettings,
            Self::MeasurementData(_) => PacketKind::MeasurementData,
        }
    }

    /// Serialize, including header and tail.
    pub fn encode(&self) -> Frame {
        let kind = self.kind();
        let len = kind.payload_len();
        let mut bytes = [0u8; MAX_PACKET_LEN];
        bytes[0] = kind.header();
        bytes[1] = kind.id();
        self.write_payload(&mut bytes[2..2 + len]);
        bytes[2 + len] = TAIL;
        Frame {
            bytes,
            len: len + 3,
        }
    }

    fn write_payload(&self, payload: &mut [u8]) {
        match self {
            Self::SensorCheck(present) => payload[0] = u8::from(*present),
            Self::SampleRate(rate) => payload[0] = rate.map_or(FAILED, SampleRate::code),
            Self::ManufacturerId(id) | Self::DeviceId(id) => {
                let bytes = id.map_or([FAILED; 2], u16::to_be_bytes);
                payload.copy_from_slice(&bytes);
            }
            Self::ChannelSettings(settings) => {
                let bytes = settings
                    .as_ref()
                    .map_or([FAILED; ChannelSettings::PACKED_LEN], ChannelSettings::to_bytes);
                payload.copy_from_slice(&bytes);
            }
            Self::MeasurementData(samples) => {
                for (chunk, sample) in payload
                    .chunks_exact_mut(MeasurementSample::PACKED_LEN)
                    .zip(samples)
                {
                    chunk.copy_from_slice(&sample.to_bytes());
                }
            }
        }
    }

    /// Parse the payload of a packet of type `kind`.
    ///
    /// `payload` must be exactly [`PacketKind::payload_len`] bytes.
    fn decode_payload(kind: PacketKind, payload: &[u8]) -> Result<Self, DecodeError> {
        let failed = payload.iter().all(|&b| b == FAILED);
        let invalid = DecodeError::InvalidPayload(kind);
        let packet = match kind {
            PacketKind::SensorCheck => match payload[0] {
                0 => Self::SensorCheck(false),
                1 => Self::SensorCheck(true),
                _ => return Err(invalid),
            },
            PacketKind::SampleRate if failed => Self::SampleRate(None),
            PacketKind::SampleRate => {
                Self::SampleRate(Some(SampleRate::try_from(payload[0]).map_err(|_| invalid)?))
            }
            PacketKind::ManufacturerId | PacketKind::DeviceId => {
                let id = (!failed).then(|| u16::from_be_bytes([payload[0], payload[1]]));
                if kind == PacketKind::ManufacturerId {
                    Self::ManufacturerId(id)
                } else {
                    Self::DeviceId(id)
                }
            }
            PacketKind::ChannelSettings if failed => Self::ChannelSettings(None),
            PacketKind::ChannelSettings => {
                let mut bytes = [0u8; ChannelSettings::PACKED_LEN];
                bytes.copy_from_slice(payload);
                let settings = ChannelSettings::from_bytes(&bytes).map_err(|_| invalid)?;
                Self::ChannelSettings(Some(settings))
            }
            PacketKind::MeasurementData => {
                let mut samples = [MeasurementSample::default(); 4];
                for (sample, chunk) in samples
                    .iter_mut()
                    .zip(payload.chunks_exact(MeasurementSample::PACKED_LEN))
                {
                    let mut bytes = [0u8; MeasurementSample::PACKED_LEN];
                    bytes.copy_from_slice(chunk);
                    *sample = MeasurementSample::from_bytes(&bytes);
                }
                Self::MeasurementData(samples)
            }
        };
        Ok(packet)
    }
}

/// A serialized packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; MAX_PACKET_LEN],
    len: usize,
}

impl Frame {
    /// The packet bytes, header to tail.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Something in the device's output that is neither text nor a well-formed packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// The byte after a header is not a known packet id.
    UnknownPacketId(u8),
    /// The packet id does not belong with the header byte before it.
    HeaderMismatch {
        /// Header byte received.
        header: u8,
        /// Packet type named by the id byte.
        kind: PacketKind,
    },
    /// The byte after the payload was not [`TAIL`].
    MissingTail(u8),
    /// The payload does not hold a valid value for its packet type.
    InvalidPayload(PacketKind),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPacketId(id) => write!(f, "unknown packet id {id:#04X}"),
            Self::HeaderMismatch { header, kind } => {
                write!(f, "header {header:#04X} does not match {kind:?} packet")
            }
            Self::MissingTail(b) => write!(f, "expected packet tail, got {b:#04X}"),
            Self::InvalidPayload(kind) => write!(f, "invalid {kind:?} payload"),
        }
    }
}

impl core::error::Error for DecodeError {}

/// One item of the device's output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// A complete packet.
    Packet(Packet),
    /// A byte of text outside any packet.
    Text(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    Text,
    Id { header: u8 },
    Payload { kind: PacketKind, received: usize },
    Tail { kind: PacketKind },
}

/// Incremental decoder for the device's output, which mixes packets with text.
///
/// Feed it every byte read from the serial port. After an error it goes back to
/// treating input as text, so it picks up again at the next header byte.
#[derive(Debug, Clone)]
pub struct PacketDecoder {
    state: DecoderState,
    payload: [u8; MAX_PACKET_LEN],
}

impl Default for PacketDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketDecoder {
    /// A decoder expecting text.
    pub fn new() -> Self {
        Self {
            state: DecoderState::Text,
            payload: [0; MAX_PACKET_LEN],
        }
    }

    /// True if the decoder is part way through a packet.
    pub fn in_packet(&self) -> bool {
        self.state != DecoderState::Text
    }

    /// Consume one byte.
    ///
    /// Returns the packet or text byte it completes, or `None` while a packet is
    /// still being received.
    pub fn push(&mut self, byte: u8) -> Result<Option<Decoded>, DecodeError> {
        match self.state {
            DecoderState::Text => {
                if byte == REPLY_HEADER || byte == DATA_HEADER {
                    self.state = DecoderState::Id { header: byte };
                    Ok(None)
                } else {
                    Ok(Some(Decoded::Text(byte)))
                }
            }
            DecoderState::Id { header } => {
                self.state = DecoderState::Text;
                let kind = PacketKind::from_id(byte).ok_or(DecodeError::UnknownPacketId(byte))?;
                if kind.header() != header {
                    return Err(DecodeError::HeaderMismatch { header, kind });
                }
                self.state = DecoderState::Payload { kind, received: 0 };
                Ok(None)
            }
            DecoderState::Payload { kind, received } => {
                self.payload[received] = byte;
                let received = received + 1;
                self.state = if received == kind.payload_len() {
                    DecoderState::Tail { kind }
                } else {
                    DecoderState::Payload { kind, received }
                };
                Ok(None)
            }
            DecoderState::Tail { kind } => {
                self.state = DecoderState::Text;
                if byte != TAIL {
                    return Err(DecodeError::MissingTail(byte));
                }
                let payload = &self.payload[..kind.payload_len()];
                Packet::decode_payload(kind, payload).map(|p| Some(Decoded::Packet(p)))
            }
        }
    }
}
