//! Strongly typed parameter enumerations for the ADS1299 driver.
//!
//! These enums map directly to datasheet field encodings and are used across
//! [`DeviceConfig`](crate::config::DeviceConfig), [`ChannelConfig`](crate::config::ChannelConfig)
//! and the pure encoders in [`encode`](crate::encode). Prefer these types over raw integers
//! so an out-of-range option can never reach the analog front end.
//!
//! # Examples
//!
//! ```rust
//! use ads1299::params::{DataRate, Gain, InputMux};
//!
//! let rate = DataRate::Sps500;
//! let gain = Gain::from_multiplier(Some(24)).unwrap();
//! let mux = InputMux::Normal;
//! assert_eq!(rate.hz(), 500);
//! assert_eq!(gain, Gain::X24);
//! let _ = mux;
//! ```

use modular_bitfield::prelude::Specifier;

use crate::config::ConfigError;

/// Output data rate selections encoded in `CONFIG1.DR[2:0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 3]
pub enum DataRate {
    /// 16 kSPS.
    Sps16000 = 0b000,
    /// 8 kSPS.
    Sps8000 = 0b001,
    /// 4 kSPS.
    Sps4000 = 0b010,
    /// 2 kSPS.
    Sps2000 = 0b011,
    /// 1 kSPS.
    Sps1000 = 0b100,
    /// 500 SPS.
    Sps500 = 0b101,
    /// 250 SPS (power-on default).
    Sps250 = 0b110,
}

impl DataRate {
    /// Returns the output data rate in samples per second.
    pub const fn hz(self) -> u32 {
        match self {
            Self::Sps16000 => 16_000,
            Self::Sps8000 => 8_000,
            Self::Sps4000 => 4_000,
            Self::Sps2000 => 2_000,
            Self::Sps1000 => 1_000,
            Self::Sps500 => 500,
            Self::Sps250 => 250,
        }
    }

    /// Duration of one conversion period in microseconds, rounded up.
    pub const fn period_us(self) -> u32 {
        1_000_000u32.div_ceil(self.hz())
    }

    /// Looks up the selection matching `sps` exactly.
    pub const fn from_sps(sps: u32) -> Result<Self, ConfigError> {
        match sps {
            16_000 => Ok(Self::Sps16000),
            8_000 => Ok(Self::Sps8000),
            4_000 => Ok(Self::Sps4000),
            2_000 => Ok(Self::Sps2000),
            1_000 => Ok(Self::Sps1000),
            500 => Ok(Self::Sps500),
            250 => Ok(Self::Sps250),
            other => Err(ConfigError::UnsupportedDataRate(other)),
        }
    }
}

/// PGA gain selections encoded in `CHnSET.GAIN[2:0]`.
///
/// Codes ascend with the multiplier; `0b111` is the disabled/unused setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 3]
pub enum Gain {
    /// Gain of 1.
    X1 = 0b000,
    /// Gain of 2.
    X2 = 0b001,
    /// Gain of 4.
    X4 = 0b010,
    /// Gain of 6.
    X6 = 0b011,
    /// Gain of 8.
    X8 = 0b100,
    /// Gain of 12.
    X12 = 0b101,
    /// Gain of 24 (power-on default).
    X24 = 0b110,
    /// No gain selected.
    Disabled = 0b111,
}

impl Gain {
    /// Returns the gain multiplier, or `None` for [`Gain::Disabled`].
    pub const fn multiplier(self) -> Option<u8> {
        match self {
            Self::X1 => Some(1),
            Self::X2 => Some(2),
            Self::X4 => Some(4),
            Self::X6 => Some(6),
            Self::X8 => Some(8),
            Self::X12 => Some(12),
            Self::X24 => Some(24),
            Self::Disabled => None,
        }
    }

    /// Maps a named multiplier to its gain code.
    ///
    /// An unspecified gain selects [`Gain::Disabled`]; a multiplier the PGA does not
    /// support is rejected instead of being replaced by a default.
    pub const fn from_multiplier(multiplier: Option<u8>) -> Result<Self, ConfigError> {
        match multiplier {
            None => Ok(Self::Disabled),
            Some(1) => Ok(Self::X1),
            Some(2) => Ok(Self::X2),
            Some(4) => Ok(Self::X4),
            Some(6) => Ok(Self::X6),
            Some(8) => Ok(Self::X8),
            Some(12) => Ok(Self::X12),
            Some(24) => Ok(Self::X24),
            Some(other) => Err(ConfigError::UnsupportedGain(other)),
        }
    }
}

/// Channel input routing encoded in `CHnSET.MUX[2:0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 3]
pub enum InputMux {
    /// Normal electrode input.
    Normal = 0b000,
    /// Inputs shorted (offset/noise measurement).
    Shorted = 0b001,
    /// Used with BIAS_MEAS for bias measurement.
    BiasMeasure = 0b010,
    /// Supply measurement (MVDD).
    Mvdd = 0b011,
    /// Temperature sensor.
    Temperature = 0b100,
    /// Internal test signal.
    TestSignal = 0b101,
    /// BIAS_DRP (positive electrode is the driver).
    BiasDrp = 0b110,
    /// BIAS_DRN (negative electrode is the driver).
    BiasDrn = 0b111,
}

/// Test signal frequency encoded in `CONFIG2.CAL_FREQ[1:0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum TestFrequency {
    /// Pulsed at fCLK / 2^21.
    FclkBy21 = 0b00,
    /// Pulsed at fCLK / 2^20.
    FclkBy20 = 0b01,
    /// Reserved encoding.
    Reserved = 0b10,
    /// DC test signal.
    Dc = 0b11,
}

/// Test signal amplitude encoded in `CONFIG2.CAL_AMP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 1]
pub enum TestAmplitude {
    /// 1 × −(VREFP − VREFN) / 2400.
    Single = 0,
    /// 2 × −(VREFP − VREFN) / 2400.
    Double = 1,
}

/// Lead-off comparator threshold encoded in `LOFF.COMP_TH[2:0]`.
///
/// Percentages describe the positive-side threshold; the negative side mirrors it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 3]
pub enum CompThreshold {
    /// 95 %.
    Pct95 = 0b000,
    /// 92.5 %.
    Pct92_5 = 0b001,
    /// 90 %.
    Pct90 = 0b010,
    /// 87.5 %.
    Pct87_5 = 0b011,
    /// 85 %.
    Pct85 = 0b100,
    /// 80 %.
    Pct80 = 0b101,
    /// 75 %.
    Pct75 = 0b110,
    /// 70 %.
    Pct70 = 0b111,
}

/// Lead-off excitation current encoded in `LOFF.ILEAD_OFF[1:0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum LeadOffCurrent {
    /// 6 nA.
    Na6 = 0b00,
    /// 24 nA.
    Na24 = 0b01,
    /// 6 µA.
    Ua6 = 0b10,
    /// 24 µA.
    Ua24 = 0b11,
}

/// Lead-off excitation frequency encoded in `LOFF.FLEAD_OFF[1:0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum LeadOffFrequency {
    /// DC lead-off detection.
    Dc = 0b00,
    /// AC detection at 7.8 Hz.
    Ac7_8Hz = 0b01,
    /// AC detection at 31.2 Hz.
    Ac31_2Hz = 0b10,
    /// AC detection at fDR / 4.
    AcDataRateBy4 = 0b11,
}

/// Conversion mode encoded in `CONFIG4.SINGLE_SHOT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 1]
pub enum ConversionMode {
    /// Continuous conversion (power-on default).
    Continuous = 0,
    /// Single-shot conversion.
    SingleShot = 1,
}
