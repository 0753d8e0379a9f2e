//! Pure register-byte encoders.
//!
//! Each function maps logical settings to the exact byte the device expects, fixed
//! "must be 1" bits included. They are thin wrappers over the typed registers in
//! [`crate::registers`] for callers that work with raw bytes.

use crate::config::{ChannelConfig, ConfigError};
use crate::params::{
    CompThreshold, ConversionMode, DataRate, Gain, InputMux, LeadOffCurrent, LeadOffFrequency,
    TestAmplitude, TestFrequency,
};
use crate::registers::{
    ChannelMask, ChannelSet, Config1, Config2, Config3, Config4, Gpio, LeadOff, Misc1,
};

/// `CONFIG1`: daisy-chain/multiple-readback, clock output and data rate.
pub fn encode_config1(daisy_chain_disabled: bool, clock_output_enabled: bool, data_rate: DataRate) -> u8 {
    Config1::new()
        .with_daisy_chain_disabled(daisy_chain_disabled)
        .with_clock_output(clock_output_enabled)
        .with_data_rate(data_rate)
        .into()
}

/// `CONFIG2`: test signal source, amplitude and frequency.
pub fn encode_config2(
    internal_test_signal: bool,
    amplitude: TestAmplitude,
    frequency: TestFrequency,
) -> u8 {
    Config2::new()
        .with_internal_test_signal(internal_test_signal)
        .with_test_amplitude(amplitude)
        .with_test_frequency(frequency)
        .into()
}

/// `CONFIG3`: reference buffer and bias block.
pub fn encode_config3(
    ref_buffer_enabled: bool,
    bias_measure: bool,
    internal_bias_ref: bool,
    bias_buffer_enabled: bool,
    bias_sense_enabled: bool,
    bias_connected: bool,
) -> u8 {
    Config3::new()
        .with_ref_buffer_enabled(ref_buffer_enabled)
        .with_bias_measure(bias_measure)
        .with_internal_bias_ref(internal_bias_ref)
        .with_bias_buffer_enabled(bias_buffer_enabled)
        .with_bias_sense_enabled(bias_sense_enabled)
        .with_bias_connected(bias_connected)
        .into()
}

/// `CONFIG4`: conversion mode and lead-off comparators.
pub fn encode_config4(mode: ConversionMode, lead_off_comparators: bool) -> u8 {
    Config4::new()
        .with_conversion_mode(mode)
        .with_lead_off_comparators(lead_off_comparators)
        .into()
}

/// `LOFF`: comparator threshold, excitation current and frequency.
pub fn encode_loff(
    threshold: CompThreshold,
    current: LeadOffCurrent,
    frequency: LeadOffFrequency,
) -> u8 {
    LeadOff::new()
        .with_threshold(threshold)
        .with_current(current)
        .with_frequency(frequency)
        .into()
}

/// `CHnSET`: power-down, gain, SRB2 and input routing.
pub fn encode_channel_set(power_down: bool, gain: Gain, srb2_closed: bool, input_mux: InputMux) -> u8 {
    ChannelSet::new()
        .with_power_down(power_down)
        .with_gain(gain)
        .with_srb2(srb2_closed)
        .with_input_mux(input_mux)
        .into()
}

/// Inverse of [`encode_channel_set`].
pub fn decode_channel_set(value: u8) -> ChannelConfig {
    ChannelConfig::from(value)
}

/// Per-channel bit mask (`BIAS_SENSP/N`, `LOFF_SENSP/N`, `LOFF_FLIP`), bit 0 = channel 1.
pub fn encode_channel_mask(channels: &[usize]) -> Result<u8, ConfigError> {
    ChannelMask::from_channels(channels).map(u8::from)
}

/// `GPIO`: direction nibble and data nibble.
pub fn encode_gpio(control: u8, data: u8) -> Result<u8, ConfigError> {
    for nibble in [control, data] {
        if nibble > 0x0F {
            return Err(ConfigError::NibbleOutOfRange(nibble));
        }
    }
    Ok(Gpio::new().with_control(control).with_data(data).into())
}

/// `MISC1`: SRB1 routed to all inverting inputs.
pub fn encode_misc1(srb1: bool) -> u8 {
    Misc1::new().with_srb1(srb1).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config1_defaults() {
        assert_eq!(encode_config1(false, false, DataRate::Sps250), 0x96);
        assert_eq!(encode_config1(true, false, DataRate::Sps250), 0xD6);
        assert_eq!(encode_config1(false, true, DataRate::Sps16000), 0xB0);
        // bit 7 is written as one even when nothing else is set
        assert_eq!(encode_config1(false, false, DataRate::Sps16000), 0x90);
    }

    #[test]
    fn config2_sets_fixed_bits() {
        assert_eq!(
            encode_config2(false, TestAmplitude::Single, TestFrequency::FclkBy21),
            0xC0
        );
        assert_eq!(
            encode_config2(true, TestAmplitude::Double, TestFrequency::Dc),
            0xD7
        );
    }

    #[test]
    fn config3_reference_buffer_and_bias() {
        assert_eq!(encode_config3(true, false, false, false, false, false), 0xE0);
        assert_eq!(encode_config3(false, false, false, false, false, false), 0x60);
        assert_eq!(encode_config3(true, false, true, true, false, false), 0xEC);
    }

    #[test]
    fn config4_mode_and_comparators() {
        assert_eq!(encode_config4(ConversionMode::Continuous, false), 0x00);
        assert_eq!(encode_config4(ConversionMode::SingleShot, true), 0x0A);
    }

    #[test]
    fn loff_fields() {
        assert_eq!(
            encode_loff(CompThreshold::Pct95, LeadOffCurrent::Na6, LeadOffFrequency::Dc),
            0x00
        );
        assert_eq!(
            encode_loff(
                CompThreshold::Pct70,
                LeadOffCurrent::Ua24,
                LeadOffFrequency::AcDataRateBy4
            ),
            0xEF
        );
    }

    #[test]
    fn channel_set_bytes() {
        assert_eq!(encode_channel_set(false, Gain::X2, false, InputMux::Normal), 0x10);
        assert_eq!(encode_channel_set(false, Gain::X24, true, InputMux::Normal), 0x68);
        assert_eq!(encode_channel_set(true, Gain::X24, false, InputMux::Shorted), 0xE1);
    }

    #[test]
    fn channel_set_decodes_every_byte() {
        for value in 0..=u8::MAX {
            let config = decode_channel_set(value);
            assert_eq!(
                encode_channel_set(config.power_down, config.gain, config.srb2, config.input_mux),
                value
            );
        }
    }

    #[test]
    fn channel_mask_bits() {
        assert_eq!(encode_channel_mask(&[]), Ok(0x00));
        assert_eq!(encode_channel_mask(&[0, 7]), Ok(0x81));
        assert_eq!(encode_channel_mask(&[0, 1, 2, 3, 4, 5, 6, 7]), Ok(0xFF));
        assert_eq!(
            encode_channel_mask(&[8]),
            Err(ConfigError::ChannelOutOfRange(8))
        );
    }

    #[test]
    fn gpio_nibbles() {
        assert_eq!(encode_gpio(0x0F, 0x00), Ok(0x0F));
        assert_eq!(encode_gpio(0x00, 0x0A), Ok(0xA0));
        assert_eq!(encode_gpio(0x10, 0x00), Err(ConfigError::NibbleOutOfRange(0x10)));
    }

    #[test]
    fn misc1_srb1() {
        assert_eq!(encode_misc1(false), 0x00);
        assert_eq!(encode_misc1(true), 0x20);
    }
}
