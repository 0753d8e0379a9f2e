//! Error handling primitives for the ADS1299 driver.

use crate::config::ConfigError;
use crate::device::DeviceState;
use crate::registers::Register;

/// Crate-wide result type alias.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Error variants produced by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Any error reported by the underlying bus interface.
    Interface(E),
    /// Malformed register address or frame.
    Protocol(ProtocolError),
    /// The operation is not allowed in the current device state.
    InvalidState {
        /// State the controller was in.
        state: DeviceState,
    },
    /// The provided configuration parameters are invalid.
    InvalidConfig(ConfigError),
    /// DRDY did not assert within the configured bound.
    BusTimeout,
    /// The DRDY input could not be read.
    DataReadyPin,
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Self::Interface(err)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Interface(err) => write!(f, "bus error: {:?}", err),
            Self::Protocol(err) => write!(f, "protocol error: {}", err),
            Self::InvalidState { state } => write!(f, "operation not allowed while {:?}", state),
            Self::InvalidConfig(err) => write!(f, "invalid configuration: {}", err),
            Self::BusTimeout => write!(f, "timed out waiting for data ready"),
            Self::DataReadyPin => write!(f, "data ready pin unreadable"),
        }
    }
}

impl<E: core::fmt::Debug> core::error::Error for Error<E> {}

/// Framing violations detected on the register or data path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// Address outside `0x00..=0x17`.
    InvalidRegister(u8),
    /// Data frame of the wrong size.
    FrameLength {
        /// Bytes required.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },
    /// ID register does not describe an ADS1299.
    UnexpectedDeviceId(u8),
    /// A register holds a reserved field encoding.
    InvalidBitPattern(Register),
    /// The host attempted to write a read-only register.
    ReadOnlyRegister(Register),
}

impl core::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidRegister(address) => write!(f, "invalid register address {:#04x}", address),
            Self::FrameLength { expected, actual } => {
                write!(f, "expected {} frame bytes, got {}", expected, actual)
            }
            Self::UnexpectedDeviceId(id) => write!(f, "unexpected device id {:#04x}", id),
            Self::InvalidBitPattern(register) => {
                write!(f, "reserved bit pattern in {:?}", register)
            }
            Self::ReadOnlyRegister(register) => write!(f, "{:?} is read-only", register),
        }
    }
}

impl core::error::Error for ProtocolError {}
