//! Bus interface abstraction for the ADS1299 driver.

pub mod spi;

#[cfg(test)]
pub(crate) mod mock;

use crate::frame::FRAME_LEN;
use crate::registers::{Command, Register};

/// Abstraction over the low-level bus access required by the driver.
///
/// Every method is one complete chip-select-framed exchange.
pub trait Ads1299Interface {
    /// Error type produced by the concrete bus implementation.
    type Error;

    /// Sends a single-byte command.
    fn send_command(&mut self, command: Command) -> core::result::Result<(), Self::Error>;

    /// Reads a single register.
    fn read_register(&mut self, register: Register) -> core::result::Result<u8, Self::Error>;

    /// Writes a single register.
    fn write_register(&mut self, register: Register, value: u8) -> core::result::Result<(), Self::Error>;

    /// Clocks one frame out of a device in continuous read mode.
    fn read_frame(&mut self, frame: &mut [u8; FRAME_LEN]) -> core::result::Result<(), Self::Error>;

    /// Issues `RDATA` and clocks out the frame that follows it.
    fn read_data(&mut self, frame: &mut [u8; FRAME_LEN]) -> core::result::Result<(), Self::Error>;
}
