//! Configuration primitives for the ADS1299 driver.
//!
//! [`Config`] holds the driver's timing and robustness policy, [`DeviceConfig`] the global
//! register image written by [`Ads1299::initialize`](crate::Ads1299::initialize) and
//! [`ChannelConfig`] the logical view of one `CHnSET` register.

use crate::params::{DataRate, Gain, InputMux};
use crate::registers::{
    ChannelMask, ChannelSet, Config1, Config2, Config3, Config4, Gpio, LeadOff, Misc1,
};

/// How long to wait after `START` + `RDATAC` before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StreamSettle {
    /// A number of conversion periods at the configured data rate.
    DataRatePeriods(u32),
    /// A fixed duration in microseconds.
    FixedMicros(u32),
}

impl StreamSettle {
    /// Resolves the settle time in microseconds for `rate`.
    pub const fn micros(self, rate: DataRate) -> u32 {
        match self {
            Self::DataRatePeriods(periods) => periods.saturating_mul(1_000_000).div_ceil(rate.hz()),
            Self::FixedMicros(us) => us,
        }
    }
}

/// Placement of the register-latch delay inside sequential writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteDelay {
    /// Wait after every single-register write.
    PerRegister,
    /// Wait once after the whole group.
    PerGroup,
}

/// Driver timing and robustness policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Wait after `RESET` before the next command (at least 18 tCLK).
    pub reset_delay_us: u32,
    /// Wait at the end of initialization.
    pub init_settle_ms: u32,
    /// Wait after entering continuous read mode.
    pub stream_settle: StreamSettle,
    /// Register-latch delay between sequential writes.
    pub write_delay_us: u32,
    /// Placement of [`Config::write_delay_us`].
    pub write_delay: WriteDelay,
    /// Additional attempts for a register write whose bus transfer failed.
    pub write_retries: u8,
    /// Upper bound on waiting for DRDY.
    pub data_ready_timeout_us: u32,
    /// DRDY polling interval.
    pub data_ready_poll_us: u32,
}

impl Config {
    /// Begins building a [`Config`] using the builder pattern.
    pub fn new() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Checks whether this configuration is usable.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if self.data_ready_poll_us == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reset_delay_us: 10,
            init_settle_ms: 4,
            stream_settle: StreamSettle::DataRatePeriods(4),
            write_delay_us: 10,
            write_delay: WriteDelay::PerRegister,
            write_retries: 2,
            data_ready_timeout_us: 50_000,
            data_ready_poll_us: 10,
        }
    }
}

/// Builder for [`Config`] allowing piecemeal construction.
#[derive(Debug, Clone, Copy)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new builder seeded with [`Config::default()`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Overrides the post-reset wait.
    pub fn reset_delay_us(mut self, us: u32) -> Self {
        self.config.reset_delay_us = us;
        self
    }

    /// Overrides the end-of-initialization wait.
    pub fn init_settle_ms(mut self, ms: u32) -> Self {
        self.config.init_settle_ms = ms;
        self
    }

    /// Overrides the continuous-read settle policy.
    pub fn stream_settle(mut self, settle: StreamSettle) -> Self {
        self.config.stream_settle = settle;
        self
    }

    /// Sets the register-latch delay and where it is applied.
    pub fn write_delay(mut self, us: u32, placement: WriteDelay) -> Self {
        self.config.write_delay_us = us;
        self.config.write_delay = placement;
        self
    }

    /// Sets the number of retries for failed register writes.
    pub fn write_retries(mut self, retries: u8) -> Self {
        self.config.write_retries = retries;
        self
    }

    /// Sets the bounded DRDY wait.
    pub fn data_ready_timeout(mut self, timeout_us: u32, poll_us: u32) -> Self {
        self.config.data_ready_timeout_us = timeout_us;
        self.config.data_ready_poll_us = poll_us;
        self
    }

    /// Finalizes the builder and returns the [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Lead-off detection block (`LOFF`, `LOFF_SENSP/N`, `LOFF_FLIP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeadOffConfig {
    /// Comparator threshold, current and frequency.
    pub control: LeadOff,
    /// Positive inputs with lead-off detection.
    pub sense_positive: ChannelMask,
    /// Negative inputs with lead-off detection.
    pub sense_negative: ChannelMask,
    /// Channels with flipped excitation current.
    pub flip: ChannelMask,
}

/// Inputs combined into the bias derivation (`BIAS_SENSP/N`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BiasRouting {
    /// Positive inputs.
    pub positive: ChannelMask,
    /// Negative inputs.
    pub negative: ChannelMask,
}

/// Global register image applied during initialization.
///
/// `CONFIG3`, `CONFIG1` and `CONFIG2` are always written, in that order. The optional
/// blocks are written afterwards only when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Data rate, daisy-chain and clock output.
    pub config1: Config1,
    /// Test signal generation.
    pub config2: Config2,
    /// Reference buffer and bias operation.
    pub config3: Config3,
    /// Lead-off detection.
    pub lead_off: Option<LeadOffConfig>,
    /// Bias derivation routing.
    pub bias: Option<BiasRouting>,
    /// SRB1 routing.
    pub misc1: Option<Misc1>,
    /// General-purpose I/O.
    pub gpio: Option<Gpio>,
    /// Conversion mode and lead-off comparators.
    pub config4: Option<Config4>,
}

impl DeviceConfig {
    /// Chip power-on reset values (`CONFIG3` = `0x60`, reference buffer off).
    pub fn power_on_reset() -> Self {
        Self {
            config1: Config1::default(),
            config2: Config2::default(),
            config3: Config3::default(),
            lead_off: None,
            bias: None,
            misc1: None,
            gpio: None,
            config4: None,
        }
    }

    /// Replaces `CONFIG1`.
    pub fn with_config1(mut self, config1: Config1) -> Self {
        self.config1 = config1;
        self
    }

    /// Replaces `CONFIG2`.
    pub fn with_config2(mut self, config2: Config2) -> Self {
        self.config2 = config2;
        self
    }

    /// Replaces `CONFIG3`.
    pub fn with_config3(mut self, config3: Config3) -> Self {
        self.config3 = config3;
        self
    }

    /// Enables the lead-off block.
    pub fn with_lead_off(mut self, lead_off: LeadOffConfig) -> Self {
        self.lead_off = Some(lead_off);
        self
    }

    /// Enables bias routing.
    pub fn with_bias(mut self, bias: BiasRouting) -> Self {
        self.bias = Some(bias);
        self
    }

    /// Enables the `MISC1` write.
    pub fn with_misc1(mut self, misc1: Misc1) -> Self {
        self.misc1 = Some(misc1);
        self
    }

    /// Enables the `GPIO` write.
    pub fn with_gpio(mut self, gpio: Gpio) -> Self {
        self.gpio = Some(gpio);
        self
    }

    /// Enables the `CONFIG4` write.
    pub fn with_config4(mut self, config4: Config4) -> Self {
        self.config4 = Some(config4);
        self
    }
}

impl Default for DeviceConfig {
    /// 250 SPS, test signal off, internal reference buffer on (`0x96`, `0xC0`, `0xE0`).
    fn default() -> Self {
        Self::power_on_reset().with_config3(Config3::default().with_ref_buffer_enabled(true))
    }
}

/// Logical view of one `CHnSET` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// Channel powered down.
    pub power_down: bool,
    /// PGA gain.
    pub gain: Gain,
    /// SRB2 switch closed.
    pub srb2: bool,
    /// Input routing.
    pub input_mux: InputMux,
}

impl ChannelConfig {
    /// Powered-up channel with the given gain and routing, SRB2 open.
    pub const fn active(gain: Gain, input_mux: InputMux) -> Self {
        Self {
            power_down: false,
            gain,
            srb2: false,
            input_mux,
        }
    }

    /// Same settings with the power-down bit set.
    pub const fn powered_down(self) -> Self {
        Self {
            power_down: true,
            ..self
        }
    }

    /// Same settings with the SRB2 switch set.
    pub const fn with_srb2(self, srb2: bool) -> Self {
        Self { srb2, ..self }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::from(ChannelSet::default())
    }
}

impl From<ChannelConfig> for ChannelSet {
    fn from(config: ChannelConfig) -> Self {
        ChannelSet::new()
            .with_power_down(config.power_down)
            .with_gain(config.gain)
            .with_srb2(config.srb2)
            .with_input_mux(config.input_mux)
    }
}

impl From<ChannelSet> for ChannelConfig {
    fn from(register: ChannelSet) -> Self {
        Self {
            power_down: register.power_down(),
            gain: register.gain(),
            srb2: register.srb2(),
            input_mux: register.input_mux(),
        }
    }
}

impl From<ChannelConfig> for u8 {
    fn from(config: ChannelConfig) -> Self {
        u8::from(ChannelSet::from(config))
    }
}

impl From<u8> for ChannelConfig {
    fn from(value: u8) -> Self {
        Self::from(ChannelSet::from(value))
    }
}

/// Validation errors for options and configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Gain multiplier not supported by the PGA.
    UnsupportedGain(u8),
    /// Data rate not supported by the modulator.
    UnsupportedDataRate(u32),
    /// Channel index outside `0..8`.
    ChannelOutOfRange(usize),
    /// Active channel count outside `0..=8`.
    ChannelCount(usize),
    /// GPIO nibble wider than four bits.
    NibbleOutOfRange(u8),
    /// Flush cadence of zero or larger than the batch capacity.
    FlushCadence {
        /// Requested cycles per flush.
        requested: usize,
        /// Samples each channel buffer can hold.
        capacity: usize,
    },
    /// More devices than the batch has channel slots for.
    DeviceCount {
        /// Devices supplied.
        devices: usize,
        /// Channel slots in the batch.
        channels: usize,
    },
    /// DRDY polling interval of zero.
    ZeroPollInterval,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnsupportedGain(gain) => write!(f, "unsupported gain: {}", gain),
            Self::UnsupportedDataRate(sps) => write!(f, "unsupported data rate: {} SPS", sps),
            Self::ChannelOutOfRange(channel) => write!(f, "channel {} out of range", channel),
            Self::ChannelCount(count) => write!(f, "invalid active channel count: {}", count),
            Self::NibbleOutOfRange(value) => write!(f, "value {:#04x} exceeds four bits", value),
            Self::FlushCadence {
                requested,
                capacity,
            } => write!(
                f,
                "flush every {} cycles does not fit capacity {}",
                requested, capacity
            ),
            Self::DeviceCount { devices, channels } => write!(
                f,
                "{} devices do not fit {} channel slots",
                devices, channels
            ),
            Self::ZeroPollInterval => write!(f, "data-ready poll interval must be non-zero"),
        }
    }
}

impl core::error::Error for ConfigError {}
