use crate::{Channel, ChannelSettings, SampleRate};

/// A request from the host, identified by its first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// Reply with the text banner.
    Identify,
    /// Reply with a manufacturer ID packet.
    ManufacturerId,
    /// Reply with a device ID packet.
    DeviceId,
    /// Reply with a sample rate packet.
    SampleRate,
    /// Reply with a sensor check packet.
    SensorCheck,
    /// Reply with the channel settings packet of a channel.
    ReadChannel(Channel),
    /// Trigger a single measurement on a channel. No reply.
    StartMeasurement(Channel),
    /// Begin a sample rate change: one ASCII digit and the latch byte follow.
    SetSampleRate,
    /// Begin a channel settings change: six packed bytes and the latch byte follow.
    SetChannelSettings,
}

/// Byte values of the serial commands.
///
/// The defaults are the printable ASCII characters listed on each field, so the
/// device can be driven from a terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandSet {
    /// `v`
    pub identify: u8,
    /// `m`
    pub manufacturer_id: u8,
    /// `d`
    pub device_id: u8,
    /// `t`
    pub sample_rate: u8,
    /// `u`
    pub sensor_check: u8,
    /// `1` to `4`, indexed by channel.
    pub read_channel: [u8; 4],
    /// `q`, `w`, `e`, `r`, indexed by channel.
    pub start_measurement: [u8; 4],
    /// `p`
    pub set_sample_rate: u8,
    /// `P`
    pub sample_rate_latch: u8,
    /// `x`
    pub set_channel_settings: u8,
    /// `X`
    pub channel_settings_latch: u8,
}

impl Default for CommandSet {
    fn default() -> Self {
        Self {
            identify: b'v',
            manufacturer_id: b'm',
            device_id: b'd',
            sample_rate: b't',
            sensor_check: b'u',
            read_channel: *b"1234",
            start_measurement: *b"qwer",
            set_sample_rate: b'p',
            sample_rate_latch: b'P',
            set_channel_settings: b'x',
            channel_settings_latch: b'X',
        }
    }
}

impl CommandSet {
    /// Length of a complete sample rate request.
    pub const SAMPLE_RATE_REQUEST_LEN: usize = 3;
    /// Length of a complete channel settings request.
    pub const CHANNEL_SETTINGS_REQUEST_LEN: usize = ChannelSettings::PACKED_LEN + 2;

    /// The request starting with `byte`, if any.
    pub fn decode(&self, byte: u8) -> Option<Request> {
        let request = match byte {
            b if b == self.identify => Request::Identify,
            b if b == self.manufacturer_id => Request::ManufacturerId,
            b if b == self.device_id => Request::DeviceId,
            b if b == self.sample_rate => Request::SampleRate,
            b if b == self.sensor_check => Request::SensorCheck,
            b if b == self.set_sample_rate => Request::SetSampleRate,
            b if b == self.set_channel_settings => Request::SetChannelSettings,
            b => {
                if let Some(channel) = Self::channel_for(&self.read_channel, b) {
                    Request::ReadChannel(channel)
                } else {
                    Request::StartMeasurement(Self::channel_for(&self.start_measurement, b)?)
                }
            }
        };
        Some(request)
    }

    fn channel_for(table: &[u8; 4], byte: u8) -> Option<Channel> {
        table
            .iter()
            .zip(Channel::ALL)
            .find_map(|(&b, channel)| (b == byte).then_some(channel))
    }

    /// The byte that starts `request`.
    pub fn encode(&self, request: Request) -> u8 {
        match request {
            Request::Identify => self.identify,
            Request::ManufacturerId => self.manufacturer_id,
            Request::DeviceId => self.device_id,
            Request::SampleRate => self.sample_rate,
            Request::SensorCheck => self.sensor_check,
            Request::ReadChannel(channel) => self.read_channel[usize::from(channel.index())],
            Request::StartMeasurement(channel) => {
                self.start_measurement[usize::from(channel.index())]
            }
            Request::SetSampleRate => self.set_sample_rate,
            Request::SetChannelSettings => self.set_channel_settings,
        }
    }

    /// The complete byte sequence that sets the sample rate to `rate`.
    pub fn sample_rate_request(&self, rate: SampleRate) -> [u8; Self::SAMPLE_RATE_REQUEST_LEN] {
        [
            self.set_sample_rate,
            b'0' + rate.code(),
            self.sample_rate_latch,
        ]
    }

    /// The complete byte sequence that applies `settings` to its channel.
    pub fn channel_settings_request(
        &self,
        settings: &ChannelSettings,
    ) -> [u8; Self::CHANNEL_SETTINGS_REQUEST_LEN] {
        let mut request = [0u8; Self::CHANNEL_SETTINGS_REQUEST_LEN];
        request[0] = self.set_channel_settings;
        request[1..=ChannelSettings::PACKED_LEN].copy_from_slice(&settings.to_bytes());
        request[Self::CHANNEL_SETTINGS_REQUEST_LEN - 1] = self.channel_settings_latch;
        request
    }
}
