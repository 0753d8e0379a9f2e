//! SPI interface implementation built on top of `embedded-hal` `SpiDevice`.
//!
//! The ADS1299 uses SPI mode 1 (CPOL = 0, CPHA = 1). `SpiDevice` asserts chip-select for the
//! duration of each transaction, so two devices sharing one bus through separate `SpiDevice`
//! handles never have overlapping exchanges.

use embedded_hal::spi::{Operation, SpiDevice};

use super::Ads1299Interface;
use crate::frame::FRAME_LEN;
use crate::registers::{Command, Register, RegisterFrame};

/// SPI-based interface implementation for the ADS1299 driver.
pub struct SpiInterface<SPI> {
    spi: SPI,
}

impl<SPI> SpiInterface<SPI> {
    /// Creates a new interface from the provided SPI device abstraction.
    pub const fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Provides mutable access to the wrapped SPI device.
    pub fn spi_mut(&mut self) -> &mut SPI {
        &mut self.spi
    }

    /// Consumes the interface and returns the owned SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> Ads1299Interface for SpiInterface<SPI>
where
    SPI: SpiDevice,
{
    type Error = SPI::Error;

    fn send_command(&mut self, command: Command) -> core::result::Result<(), Self::Error> {
        self.spi.write(&[command.opcode()])
    }

    fn read_register(&mut self, register: Register) -> core::result::Result<u8, Self::Error> {
        let mut frame = RegisterFrame::read(register).into_bytes();
        self.spi.transfer_in_place(&mut frame)?;
        Ok(frame[2])
    }

    fn write_register(&mut self, register: Register, value: u8) -> core::result::Result<(), Self::Error> {
        self.spi.write(RegisterFrame::write(register, value).as_bytes())
    }

    fn read_frame(&mut self, frame: &mut [u8; FRAME_LEN]) -> core::result::Result<(), Self::Error> {
        // DIN must stay low while streaming or the device decodes a command.
        frame.fill(0x00);
        self.spi.transfer_in_place(frame)
    }

    fn read_data(&mut self, frame: &mut [u8; FRAME_LEN]) -> core::result::Result<(), Self::Error> {
        frame.fill(0x00);
        let command = [Command::Rdata.opcode()];
        let mut operations = [Operation::Write(&command), Operation::TransferInPlace(frame)];
        self.spi.transaction(&mut operations)
    }
}
