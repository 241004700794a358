//! Serial link to the board.
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use fdc1004_hal::protocol::notice::{END_OF_TRANSMISSION, FAILURE, SUCCESS};
use fdc1004_hal::protocol::{CommandSet, Decoded, Packet, PacketDecoder, PacketKind, Request};
use serialport::SerialPort;

/// How long to wait for the answer to a request.
pub(crate) const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Something the board sent.
#[derive(Debug)]
pub(crate) enum Event {
    Packet(Packet),
    /// A complete text message, including its `$$$` line.
    Text(String),
}

pub(crate) struct Link {
    port: Box<dyn SerialPort>,
    commands: CommandSet,
    decoder: PacketDecoder,
    text: Vec<u8>,
    pending: Vec<Event>,
}

pub(crate) fn list_ports() -> Result<()> {
    let ports = serialport::available_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("{}\t{:?}", port.port_name, port.port_type);
    }
    Ok(())
}

impl Link {
    /// Open `port`, or the first port found if none is given.
    pub(crate) fn open(port: Option<&str>, baud: u32) -> Result<Self> {
        let name = match port {
            Some(name) => name.to_owned(),
            None => serialport::available_ports()?
                .into_iter()
                .next()
                .map(|p| p.port_name)
                .ok_or_else(|| anyhow!("No serial ports found!"))?,
        };
        log::info!("Opening serial port: \"{}\" @ {} baud", name, baud);
        let port = serialport::new(&name, baud)
            .timeout(READ_TIMEOUT)
            .open()
            .with_context(|| format!("could not open {name}"))?;
        Ok(Self {
            port,
            commands: CommandSet::default(),
            decoder: PacketDecoder::new(),
            text: Vec::new(),
            pending: Vec::new(),
        })
    }

    pub(crate) fn commands(&self) -> &CommandSet {
        &self.commands
    }

    pub(crate) fn send(&mut self, bytes: &[u8]) -> Result<()> {
        log::debug!("-> {}", hex::encode(bytes));
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    pub(crate) fn request(&mut self, request: Request) -> Result<()> {
        let byte = self.commands.encode(request);
        self.send(&[byte])
    }

    /// Next event from the board, or `None` once `deadline` has passed.
    pub(crate) fn next_event(&mut self, deadline: Instant) -> Result<Option<Event>> {
        loop {
            if !self.pending.is_empty() {
                return Ok(Some(self.pending.remove(0)));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            let mut buf = [0u8; 64];
            match self.port.read(&mut buf) {
                Ok(0) => {}
                Ok(n) => self.absorb(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn absorb(&mut self, bytes: &[u8]) {
        log::debug!("<- {}", hex::encode(bytes));
        for &byte in bytes {
            match self.decoder.push(byte) {
                Ok(Some(Decoded::Packet(packet))) => self.pending.push(Event::Packet(packet)),
                Ok(Some(Decoded::Text(byte))) => {
                    self.text.push(byte);
                    if self.text.ends_with(END_OF_TRANSMISSION.as_bytes()) {
                        let text = String::from_utf8_lossy(&self.text).into_owned();
                        self.text.clear();
                        self.pending.push(Event::Text(text));
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("Dropped malformed packet: {e}"),
            }
        }
    }

    /// Wait for the next packet of `kind`, skipping anything else.
    pub(crate) fn await_packet(&mut self, kind: PacketKind) -> Result<Packet> {
        let deadline = Instant::now() + REPLY_TIMEOUT;
        while let Some(event) = self.next_event(deadline)? {
            match event {
                Event::Packet(packet) if packet.kind() == kind => return Ok(packet),
                other => log::debug!("Skipped {other:?}"),
            }
        }
        bail!("no {kind:?} packet within {REPLY_TIMEOUT:?}")
    }

    /// Wait for the next text message.
    pub(crate) fn await_text(&mut self) -> Result<String> {
        let deadline = Instant::now() + REPLY_TIMEOUT;
        while let Some(event) = self.next_event(deadline)? {
            match event {
                Event::Text(text) => return Ok(text),
                other => log::debug!("Skipped {other:?}"),
            }
        }
        bail!("no reply within {REPLY_TIMEOUT:?}")
    }

    /// Wait for a notice, returning its detail line on success.
    pub(crate) fn await_notice(&mut self) -> Result<String> {
        let text = self.await_text()?;
        parse_notice(&text)
    }

    /// Send `request` and wait for its reply packet.
    pub(crate) fn query(&mut self, request: Request, kind: PacketKind) -> Result<Packet> {
        self.request(request)?;
        self.await_packet(kind)
    }
}

fn parse_notice(text: &str) -> Result<String> {
    let detail = |rest: &str| {
        rest.trim_end_matches(END_OF_TRANSMISSION)
            .trim_end()
            .to_owned()
    };
    if let Some(rest) = text.strip_prefix(SUCCESS) {
        Ok(detail(rest))
    } else if let Some(rest) = text.strip_prefix(FAILURE) {
        bail!("board reported failure: {}", detail(rest))
    } else {
        bail!("unexpected reply: {text:?}")
    }
}
