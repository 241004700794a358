//! Simulated hardware shared by the integration tests.
//!
//! Not every test file uses every item.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use fdc1004_hal::constants::I2C_ADDRESS;
use fdc1004_hal::{Channel, Clock, FDC1004, Register};

pub type SimError = fdc1004_hal::Error<ErrorKind>;

const FDC_CONF: u8 = 0x0C;

/// Register file of an FDC1004 as it is after power-on.
fn power_on_registers() -> [u16; 256] {
    let mut registers = [0u16; 256];
    for channel in Channel::ALL {
        // CHA = CINn, CHB = disabled.
        registers[usize::from(Register::MeasurementConfig(channel).addr())] =
            (u16::from(channel.index()) << 13) | 0x1C00;
        registers[usize::from(Register::GainCalibration(channel).addr())] = 0x4000;
    }
    registers[0xFE] = 0x5449;
    registers[0xFF] = 0x1004;
    registers
}

/// A register-level model of the FDC1004 on an I2C bus.
#[derive(Debug)]
pub struct SimulatedFdc {
    pub registers: [u16; 256],
    /// When false, every transfer is refused with a NACK on the address.
    pub present: bool,
    /// Number of transfers that succeed before every later one fails.
    pub fail_after: Option<usize>,
    /// FDC_CONF reads the chip needs to finish a software reset.
    pub reset_reads: u32,
    reset_remaining: Option<u32>,
    pointer: u8,
    pub transfers: usize,
    /// Every completed register write, in order.
    pub writes: Vec<(u8, u16)>,
}

impl Default for SimulatedFdc {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedFdc {
    pub fn new() -> Self {
        Self {
            registers: power_on_registers(),
            present: true,
            fail_after: None,
            reset_reads: 2,
            reset_remaining: None,
            pointer: 0,
            transfers: 0,
            writes: Vec::new(),
        }
    }

    pub fn register(&self, register: Register) -> u16 {
        self.registers[usize::from(register.addr())]
    }

    pub fn set_register(&mut self, register: Register, value: u16) {
        self.registers[usize::from(register.addr())] = value;
    }

    /// Store a left-aligned 24-bit result the way the chip splits it over two
    /// registers.
    pub fn set_result(&mut self, channel: Channel, raw: i32) {
        let raw = raw as u32;
        self.set_register(Register::MeasurementMsb(channel), (raw >> 16) as u16);
        self.set_register(Register::MeasurementLsb(channel), raw as u16 & 0xFF00);
    }

    /// Raise the done bits in `mask`, channel 0 at bit 3.
    pub fn set_done(&mut self, mask: u8) {
        self.registers[usize::from(FDC_CONF)] |= u16::from(mask & 0x0F);
    }

    fn read_register(&mut self) -> u16 {
        if self.pointer == FDC_CONF {
            if let Some(remaining) = self.reset_remaining {
                if remaining == 0 {
                    self.registers = power_on_registers();
                    self.reset_remaining = None;
                } else {
                    self.reset_remaining = Some(remaining - 1);
                }
            }
        }
        self.registers[usize::from(self.pointer)]
    }

    fn write_register(&mut self, value: u16) {
        self.writes.push((self.pointer, value));
        match self.pointer {
            FDC_CONF => {
                // Done bits are read-only.
                let done = self.registers[usize::from(FDC_CONF)] & 0x000F;
                self.registers[usize::from(FDC_CONF)] = (value & 0xFFF0) | done;
                if value & 0x8000 != 0 {
                    self.reset_remaining = Some(self.reset_reads);
                }
            }
            0x08..=0x14 => self.registers[usize::from(self.pointer)] = value,
            _ => {}
        }
    }

    fn check_transfer(&mut self, address: u8) -> Result<(), ErrorKind> {
        if address != I2C_ADDRESS || !self.present {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        if self.fail_after.is_some_and(|allowed| self.transfers >= allowed) {
            return Err(ErrorKind::Bus);
        }
        self.transfers += 1;
        Ok(())
    }
}

impl ErrorType for SimulatedFdc {
    type Error = ErrorKind;
}

impl I2c for SimulatedFdc {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.check_transfer(address)?;
        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    if let Some((&pointer, data)) = bytes.split_first() {
                        self.pointer = pointer;
                        if let [high, low] = data {
                            self.write_register(u16::from_be_bytes([*high, *low]));
                        }
                    }
                }
                Operation::Read(buf) => {
                    let value = self.read_register().to_be_bytes();
                    for (dst, src) in buf.iter_mut().zip(value.iter().cycle()) {
                        *dst = *src;
                    }
                }
            }
        }
        Ok(())
    }
}

/// A driver talking to a fresh simulated chip.
pub fn simulated() -> FDC1004<SimulatedFdc> {
    FDC1004::new(SimulatedFdc::new())
}

/// A clock the test moves by hand. Clones share the reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Rc<Cell<u32>>);

impl ManualClock {
    pub fn at(ticks: u32) -> Self {
        Self(Rc::new(Cell::new(ticks)))
    }

    pub fn advance(&self, ticks: u32) {
        self.0.set(self.0.get().wrapping_add(ticks));
    }
}

impl Clock for ManualClock {
    fn ticks(&self) -> u32 {
        self.0.get()
    }
}

#[derive(Debug, Default)]
struct Wire {
    to_device: VecDeque<u8>,
    from_device: Vec<u8>,
}

/// An in-memory serial port. Clones share both directions.
#[derive(Debug, Clone, Default)]
pub struct LoopbackSerial(Rc<RefCell<Wire>>);

impl LoopbackSerial {
    /// Queue bytes for the device to read.
    pub fn send(&self, bytes: &[u8]) {
        self.0.borrow_mut().to_device.extend(bytes);
    }

    /// Take everything the device has written so far.
    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut self.0.borrow_mut().from_device)
    }

    pub fn pending_input(&self) -> usize {
        self.0.borrow().to_device.len()
    }
}

impl embedded_io::ErrorType for LoopbackSerial {
    type Error = Infallible;
}

impl embedded_io::Read for LoopbackSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut wire = self.0.borrow_mut();
        let mut count = 0;
        for slot in buf.iter_mut() {
            match wire.to_device.pop_front() {
                Some(b) => {
                    *slot = b;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }
}

impl embedded_io::ReadReady for LoopbackSerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.borrow().to_device.is_empty())
    }
}

impl embedded_io::Write for LoopbackSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.0.borrow_mut().from_device.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// An indicator LED that remembers its level.
#[derive(Debug, Default)]
pub struct Led {
    pub lit: bool,
}

impl embedded_hal::digital::ErrorType for Led {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for Led {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.lit = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.lit = true;
        Ok(())
    }
}
