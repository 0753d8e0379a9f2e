#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod error;

pub mod acquisition;
pub mod batch;
pub mod config;
pub mod device;
pub mod encode;
pub mod frame;
pub mod interface;
mod log;
pub mod params;
pub mod registers;
#[cfg(feature = "std")]
pub mod sink;

pub use crate::device::{Ads1299, DeviceState};
pub use crate::error::{Error, ProtocolError, Result};
