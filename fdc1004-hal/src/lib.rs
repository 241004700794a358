#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod channel;
pub mod constants;
mod driver;
mod error;
pub mod fixed_point;
mod measurement;
pub mod monitor;
pub mod protocol;
pub mod registers;

pub use channel::{Channel, ChannelSettings, MeasurementInput};
pub use driver::FDC1004;
pub use error::{ConfigError, Error};
pub use measurement::{MeasurementSample, capacitance_pf, raw_to_picofarads};
pub use monitor::{ChipStatus, Clock, Monitor, StartupConfig};
pub use registers::{FdcConfig, MeasurementConfig, Register, SampleRate};
