//! Register map, command opcodes and register framing for the ADS1299.
#![allow(unused_parens)]

use modular_bitfield::prelude::*;

use crate::config::ConfigError;
use crate::error::ProtocolError;
use crate::params::{
    CompThreshold, ConversionMode, DataRate, Gain, InputMux, LeadOffCurrent, LeadOffFrequency,
    TestAmplitude, TestFrequency,
};

/// Opcode prefix of the read-register command (`001r rrrr`).
pub const RREG: u8 = 0x20;
/// Opcode prefix of the write-register command (`010r rrrr`).
pub const WREG: u8 = 0x40;
/// Number of addressable registers.
pub const REGISTER_COUNT: usize = 24;
/// Number of per-channel settings registers.
pub const CHANNEL_COUNT: usize = 8;

/// Single-byte control opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Wake-up from standby mode.
    Wakeup,
    /// Enter standby mode.
    Standby,
    /// Reset the device.
    Reset,
    /// Start conversions.
    Start,
    /// Stop conversions.
    Stop,
    /// Enable read data continuous mode.
    Rdatac,
    /// Stop read data continuous mode.
    Sdatac,
    /// Read data by command.
    Rdata,
}

impl Command {
    /// Returns the opcode transmitted on the bus.
    pub const fn opcode(self) -> u8 {
        match self {
            Self::Wakeup => 0x02,
            Self::Standby => 0x04,
            Self::Reset => 0x06,
            Self::Start => 0x08,
            Self::Stop => 0x0A,
            Self::Rdatac => 0x10,
            Self::Sdatac => 0x11,
            Self::Rdata => 0x12,
        }
    }
}

/// Register addresses.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Factory-programmed identification (read-only).
    ID = 0x00,
    /// Data rate, daisy-chain and clock output.
    CONFIG1 = 0x01,
    /// Test signal generation.
    CONFIG2 = 0x02,
    /// Reference buffer and bias operation.
    CONFIG3 = 0x03,
    /// Lead-off control.
    LOFF = 0x04,
    /// Channel 1 settings.
    CH1SET = 0x05,
    /// Channel 2 settings.
    CH2SET = 0x06,
    /// Channel 3 settings.
    CH3SET = 0x07,
    /// Channel 4 settings.
    CH4SET = 0x08,
    /// Channel 5 settings.
    CH5SET = 0x09,
    /// Channel 6 settings.
    CH6SET = 0x0A,
    /// Channel 7 settings.
    CH7SET = 0x0B,
    /// Channel 8 settings.
    CH8SET = 0x0C,
    /// Positive inputs routed to bias derivation.
    BIAS_SENSP = 0x0D,
    /// Negative inputs routed to bias derivation.
    BIAS_SENSN = 0x0E,
    /// Positive-side lead-off detection enable.
    LOFF_SENSP = 0x0F,
    /// Negative-side lead-off detection enable.
    LOFF_SENSN = 0x10,
    /// Lead-off current direction flip.
    LOFF_FLIP = 0x11,
    /// Positive-side lead-off status (read-only).
    LOFF_STATP = 0x12,
    /// Negative-side lead-off status (read-only).
    LOFF_STATN = 0x13,
    /// General-purpose I/O.
    GPIO = 0x14,
    /// SRB1 routing.
    MISC1 = 0x15,
    /// Reserved, must be written as zero.
    MISC2 = 0x16,
    /// Conversion mode and lead-off comparator power.
    CONFIG4 = 0x17,
}

impl Register {
    /// Every register in address order.
    pub const ALL: [Register; REGISTER_COUNT] = [
        Self::ID,
        Self::CONFIG1,
        Self::CONFIG2,
        Self::CONFIG3,
        Self::LOFF,
        Self::CH1SET,
        Self::CH2SET,
        Self::CH3SET,
        Self::CH4SET,
        Self::CH5SET,
        Self::CH6SET,
        Self::CH7SET,
        Self::CH8SET,
        Self::BIAS_SENSP,
        Self::BIAS_SENSN,
        Self::LOFF_SENSP,
        Self::LOFF_SENSN,
        Self::LOFF_FLIP,
        Self::LOFF_STATP,
        Self::LOFF_STATN,
        Self::GPIO,
        Self::MISC1,
        Self::MISC2,
        Self::CONFIG4,
    ];

    /// Returns the 5-bit register address.
    pub const fn address(self) -> u8 {
        self as u8
    }

    /// Returns the register `count` addresses after this one.
    pub fn offset(self, count: usize) -> core::result::Result<Self, ProtocolError> {
        let target = self.address() as usize + count;
        match u8::try_from(target) {
            Ok(address) => Self::try_from(address),
            Err(_) => Err(ProtocolError::InvalidRegister(u8::MAX)),
        }
    }

    /// Returns the `CHnSET` register of a zero-based channel index.
    pub fn channel_set(channel: usize) -> core::result::Result<Self, ConfigError> {
        if channel >= CHANNEL_COUNT {
            return Err(ConfigError::ChannelOutOfRange(channel));
        }
        Ok(Self::ALL[Self::CH1SET.address() as usize + channel])
    }

    /// Returns `true` when the host must not write this register.
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::ID | Self::LOFF_STATP | Self::LOFF_STATN)
    }
}

impl TryFrom<u8> for Register {
    type Error = ProtocolError;

    fn try_from(address: u8) -> core::result::Result<Self, Self::Error> {
        Self::ALL
            .get(address as usize)
            .copied()
            .ok_or(ProtocolError::InvalidRegister(address))
    }
}

/// Three-byte single-register command: opcode, count minus one, payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterFrame([u8; 3]);

impl RegisterFrame {
    /// Frame reading one register; the third byte clocks out the value.
    pub const fn read(register: Register) -> Self {
        Self([RREG | register.address(), 0x00, 0x00])
    }

    /// Frame writing `value` into one register.
    pub const fn write(register: Register, value: u8) -> Self {
        Self([WREG | register.address(), 0x00, value])
    }

    /// Returns the bytes to shift out.
    pub const fn as_bytes(&self) -> &[u8; 3] {
        &self.0
    }

    /// Returns the bytes to shift out by value.
    pub const fn into_bytes(self) -> [u8; 3] {
        self.0
    }

    /// Register addressed by this frame.
    pub fn register(&self) -> core::result::Result<Register, ProtocolError> {
        Register::try_from(self.0[0] & 0x1F)
    }

    /// Byte carried in the payload slot.
    pub const fn payload(&self) -> u8 {
        self.0[2]
    }
}

/// Access permissions encoded for each register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterAccess {
    /// Read-only register.
    ReadOnly,
    /// Read/write register.
    ReadWrite,
}

/// Metadata tying a typed register value to its address.
pub trait RegisterLayout: Copy + Into<u8> {
    /// Register this type describes.
    const REGISTER: Register;
    /// Access permission classification.
    const ACCESS: RegisterAccess;
    /// Power-on reset value defined by the datasheet.
    const RESET_VALUE: u8;
}

// Fixed "must be 1" bits are stripped on decode and restored on encode so
// typed values compare equal regardless of how they were built.
macro_rules! byte_register {
    ($ty:ident, $reg:ident, $access:ident, $reset:expr, $fixed:expr) => {
        impl $ty {
            /// Bits the datasheet requires to be written as one.
            pub const FIXED_BITS: u8 = $fixed;
        }

        impl From<u8> for $ty {
            fn from(value: u8) -> Self {
                Self::from_bytes([value & !$fixed])
            }
        }

        impl From<$ty> for u8 {
            fn from(value: $ty) -> Self {
                value.into_bytes()[0] | $fixed
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::from(<Self as RegisterLayout>::RESET_VALUE)
            }
        }

        impl RegisterLayout for $ty {
            const REGISTER: Register = Register::$reg;
            const ACCESS: RegisterAccess = RegisterAccess::$access;
            const RESET_VALUE: u8 = $reset;
        }
    };
}

/// Bitfield representation of the `ID` register (address `0x00`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Id {
    // Channel count code (bits 1:0).
    pub channels: B2,
    // Device family code (bits 3:2).
    pub device: B2,
    #[skip]
    __: B1,
    // Revision code (bits 7:5).
    pub revision: B3,
}

byte_register!(Id, ID, ReadOnly, 0x3E, 0x00);

/// Device family code reported by every ADS1299 variant.
pub const ADS1299_DEVICE_CODE: u8 = 0b11;

impl Id {
    /// Number of channels reported by the `NU_CH` field.
    pub fn channel_count(&self) -> Option<u8> {
        match self.channels() {
            0b00 => Some(4),
            0b01 => Some(6),
            0b10 => Some(8),
            _ => None,
        }
    }

    /// Returns `true` when the ID identifies an ADS1299-family part.
    pub fn is_ads1299(&self) -> bool {
        self.device() == ADS1299_DEVICE_CODE && self.channel_count().is_some()
    }
}

/// Bitfield representation of the `CONFIG1` register (address `0x01`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config1 {
    // Output data rate (bits 2:0).
    pub data_rate: DataRate,
    #[skip]
    __: B2,
    // Oscillator clock output on CLK pin (bit 5).
    pub clock_output: bool,
    // DAISY_EN: set selects multiple-readback instead of daisy-chain (bit 6).
    pub daisy_chain_disabled: bool,
    #[skip]
    __: B1,
}

byte_register!(Config1, CONFIG1, ReadWrite, 0x96, 0x90);

/// Bitfield representation of the `CONFIG2` register (address `0x02`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config2 {
    // Test signal frequency (bits 1:0).
    pub test_frequency: TestFrequency,
    // Test signal amplitude (bit 2).
    pub test_amplitude: TestAmplitude,
    #[skip]
    __: B1,
    // INT_CAL: test signal generated internally (bit 4).
    pub internal_test_signal: bool,
    #[skip]
    __: B3,
}

byte_register!(Config2, CONFIG2, ReadWrite, 0xC0, 0xC0);

/// Bitfield representation of the `CONFIG3` register (address `0x03`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config3 {
    // BIAS_STAT: bias connected (bit 0).
    pub bias_connected: bool,
    // BIAS_LOFF_SENS: bias sense function (bit 1).
    pub bias_sense_enabled: bool,
    // PD_BIAS: bias buffer powered (bit 2).
    pub bias_buffer_enabled: bool,
    // BIASREF_INT: internally generated bias reference (bit 3).
    pub internal_bias_ref: bool,
    // BIAS_MEAS: route BIASIN to channels set to BiasMeasure (bit 4).
    pub bias_measure: bool,
    #[skip]
    __: B2,
    // PD_REFBUF: internal reference buffer powered (bit 7).
    pub ref_buffer_enabled: bool,
}

byte_register!(Config3, CONFIG3, ReadWrite, 0x60, 0x60);

/// Bitfield representation of the `LOFF` register (address `0x04`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadOff {
    // Excitation frequency (bits 1:0).
    pub frequency: LeadOffFrequency,
    // Excitation current magnitude (bits 3:2).
    pub current: LeadOffCurrent,
    #[skip]
    __: B1,
    // Comparator threshold (bits 7:5).
    pub threshold: CompThreshold,
}

byte_register!(LeadOff, LOFF, ReadWrite, 0x00, 0x00);

/// Bitfield representation of the `CHnSET` registers (addresses `0x05..=0x0C`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSet {
    // Input routing (bits 2:0).
    pub input_mux: InputMux,
    // SRB2 switch closed (bit 3).
    pub srb2: bool,
    // PGA gain (bits 6:4).
    pub gain: Gain,
    // Channel powered down (bit 7).
    pub power_down: bool,
}

byte_register!(ChannelSet, CH1SET, ReadWrite, 0x61, 0x00);

/// Bitfield representation of the `GPIO` register (address `0x14`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gpio {
    // GPIOC: pin direction, set = input (bits 3:0).
    pub control: B4,
    // GPIOD: pin data (bits 7:4).
    pub data: B4,
}

byte_register!(Gpio, GPIO, ReadWrite, 0x0F, 0x00);

/// Bitfield representation of the `MISC1` register (address `0x15`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Misc1 {
    #[skip]
    __: B5,
    // SRB1 connected to all inverting inputs (bit 5).
    pub srb1: bool,
    #[skip]
    __: B2,
}

byte_register!(Misc1, MISC1, ReadWrite, 0x00, 0x00);

/// Bitfield representation of the `CONFIG4` register (address `0x17`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config4 {
    #[skip]
    __: B1,
    // PD_LOFF_COMP: lead-off comparators powered (bit 1).
    pub lead_off_comparators: bool,
    #[skip]
    __: B1,
    // SINGLE_SHOT conversion mode (bit 3).
    pub conversion_mode: ConversionMode,
    #[skip]
    __: B4,
}

byte_register!(Config4, CONFIG4, ReadWrite, 0x00, 0x00);

/// One bit per channel, bit 0 = channel 1.
///
/// Shared layout of `BIAS_SENSP/N`, `LOFF_SENSP/N`, `LOFF_FLIP` and `LOFF_STATP/N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMask(u8);

impl ChannelMask {
    /// No channel selected.
    pub const NONE: Self = Self(0x00);
    /// Every channel selected.
    pub const ALL: Self = Self(0xFF);

    /// Wraps a raw register byte.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Builds a mask from zero-based channel indices.
    pub fn from_channels(channels: &[usize]) -> core::result::Result<Self, ConfigError> {
        channels
            .iter()
            .try_fold(Self::NONE, |mask, &channel| mask.with_channel(channel, true))
    }

    /// Raw register byte.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns the state of one zero-based channel, `false` when out of range.
    pub const fn channel(self, channel: usize) -> bool {
        channel < CHANNEL_COUNT && self.0 & (1 << channel) != 0
    }

    /// Returns a copy with one zero-based channel set or cleared.
    pub fn with_channel(self, channel: usize, enabled: bool) -> core::result::Result<Self, ConfigError> {
        if channel >= CHANNEL_COUNT {
            return Err(ConfigError::ChannelOutOfRange(channel));
        }
        let bit = 1u8 << channel;
        Ok(if enabled { Self(self.0 | bit) } else { Self(self.0 & !bit) })
    }
}

impl From<u8> for ChannelMask {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<ChannelMask> for u8 {
    fn from(value: ChannelMask) -> Self {
        value.0
    }
}
