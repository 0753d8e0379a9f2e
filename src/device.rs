//! High-level ADS1299 device driver implementation.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use embedded_hal::spi::SpiDevice;

use crate::config::{ChannelConfig, Config, ConfigError, DeviceConfig, WriteDelay};
use crate::error::{Error, ProtocolError, Result};
use crate::frame::{FRAME_LEN, SampleFrame, SampleVector};
use crate::interface::Ads1299Interface;
use crate::interface::spi::SpiInterface;
use crate::log::{debug, trace, warning};
use crate::params::DataRate;
use crate::registers::{
    CHANNEL_COUNT, ChannelSet, Command, Id, REGISTER_COUNT, Register, RegisterLayout,
};

/// Lifecycle of the controller as tracked by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Device state unknown: after construction or a bus fault.
    Uninitialized,
    /// `RESET` issued; the device is back in its power-on streaming mode.
    Reset,
    /// Continuous read stopped and global registers written.
    Configured,
    /// Continuous read active; only frame reads are allowed.
    Streaming,
    /// Continuous read stopped after a streaming session.
    Stopped,
}

impl DeviceState {
    /// Returns `true` when register commands are decoded by the device.
    pub const fn accepts_registers(self) -> bool {
        matches!(self, Self::Configured | Self::Stopped)
    }
}

/// High-level synchronous driver for the ADS1299 analog front end.
pub struct Ads1299<IFACE> {
    interface: IFACE,
    config: Config,
    state: DeviceState,
    data_rate: DataRate,
}

impl<IFACE> Ads1299<IFACE> {
    // ==================================================================
    // == Driver Construction & Ownership ===============================
    // ==================================================================
    /// Creates a new driver instance from the provided bus interface.
    pub fn new(interface: IFACE, config: Config) -> Self {
        Self {
            interface,
            config,
            state: DeviceState::Uninitialized,
            data_rate: DataRate::Sps250,
        }
    }

    /// Consumes the driver and returns the owned interface.
    pub fn release(self) -> (IFACE, Config) {
        (self.interface, self.config)
    }

    /// Provides mutable access to the underlying interface.
    pub fn interface_mut(&mut self) -> &mut IFACE {
        &mut self.interface
    }

    /// Returns the active driver configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// Data rate programmed by the last initialization.
    pub fn data_rate(&self) -> DataRate {
        self.data_rate
    }
}

impl<SPI> Ads1299<SpiInterface<SPI>>
where
    SPI: SpiDevice,
{
    // ==================================================================
    // == SPI Convenience Constructors ==================================
    // ==================================================================
    /// Convenience constructor for SPI transports.
    pub fn new_spi(spi: SPI, config: Config) -> Self {
        Self::new(SpiInterface::new(spi), config)
    }

    /// Releases the driver, returning the SPI device and configuration.
    pub fn release_spi(self) -> (SPI, Config) {
        let (iface, config) = self.release();
        (iface.release(), config)
    }
}

impl<IFACE, CommE> Ads1299<IFACE>
where
    IFACE: Ads1299Interface<Error = CommE>,
{
    // ==================================================================
    // == Initialization & Global Configuration ==========================
    // ==================================================================
    /// Resets the device and programs the global registers.
    ///
    /// Sequence: `RESET`, `SDATAC` twice, `STOP`, then `CONFIG3`, `CONFIG1`, `CONFIG2`
    /// and the optional blocks of `device` in address order. The reference buffer in
    /// `CONFIG3` must be up before the other registers are written.
    ///
    /// Allowed from every state; this is the only way out of
    /// [`DeviceState::Uninitialized`].
    pub fn initialize(&mut self, device: &DeviceConfig, delay: &mut impl DelayNs) -> Result<(), CommE> {
        self.config.validate().map_err(Error::InvalidConfig)?;
        let data_rate = device
            .config1
            .data_rate_or_err()
            .map_err(|_| Error::Protocol(ProtocolError::InvalidBitPattern(Register::CONFIG1)))?;

        self.reset_device(delay)?;
        self.command(Command::Sdatac)?;
        self.command(Command::Sdatac)?;
        self.command(Command::Stop)?;

        let required = [
            (Register::CONFIG3, u8::from(device.config3)),
            (Register::CONFIG1, u8::from(device.config1)),
            (Register::CONFIG2, u8::from(device.config2)),
        ];
        let lead_off_control = device
            .lead_off
            .map(|lead_off| (Register::LOFF, u8::from(lead_off.control)));
        let bias = device.bias.into_iter().flat_map(|bias| {
            [
                (Register::BIAS_SENSP, u8::from(bias.positive)),
                (Register::BIAS_SENSN, u8::from(bias.negative)),
            ]
        });
        let lead_off_routing = device.lead_off.into_iter().flat_map(|lead_off| {
            [
                (Register::LOFF_SENSP, u8::from(lead_off.sense_positive)),
                (Register::LOFF_SENSN, u8::from(lead_off.sense_negative)),
                (Register::LOFF_FLIP, u8::from(lead_off.flip)),
            ]
        });
        let misc = device
            .gpio
            .map(|gpio| (Register::GPIO, u8::from(gpio)))
            .into_iter()
            .chain(device.misc1.map(|misc1| (Register::MISC1, u8::from(misc1))))
            .chain(device.config4.map(|config4| (Register::CONFIG4, u8::from(config4))));

        let writes = required
            .into_iter()
            .chain(lead_off_control)
            .chain(bias)
            .chain(lead_off_routing)
            .chain(misc);
        self.write_group(writes, delay)?;
        delay.delay_ms(self.config.init_settle_ms);

        self.data_rate = data_rate;
        self.transition(DeviceState::Configured);
        Ok(())
    }

    /// Issues `RESET` and waits the configured reset time.
    ///
    /// The device restarts in continuous read mode, so register access stays blocked
    /// until [`Ads1299::initialize`] runs. Not allowed while streaming; use
    /// [`Ads1299::initialize`] to recover from there.
    pub fn reset(&mut self, delay: &mut impl DelayNs) -> Result<(), CommE> {
        if self.state == DeviceState::Streaming {
            return Err(Error::InvalidState { state: self.state });
        }
        self.reset_device(delay)
    }

    /// Powers up the first `active_count` channels with `channel` and powers down the rest.
    ///
    /// Inactive channels keep the same settings with the power-down bit set, so every
    /// `CHnSET` register ends up in a defined state.
    pub fn configure_channels(
        &mut self,
        active_count: usize,
        channel: ChannelConfig,
        delay: &mut impl DelayNs,
    ) -> Result<(), CommE> {
        if active_count > CHANNEL_COUNT {
            return Err(Error::InvalidConfig(ConfigError::ChannelCount(active_count)));
        }

        let active = ChannelConfig {
            power_down: false,
            ..channel
        };
        let mut settings = [channel.powered_down(); CHANNEL_COUNT];
        settings[..active_count].fill(active);
        self.configure_each_channel(&settings, delay)
    }

    /// Writes one `CHnSET` value per channel, channel 1 first.
    pub fn configure_each_channel(
        &mut self,
        channels: &[ChannelConfig; CHANNEL_COUNT],
        delay: &mut impl DelayNs,
    ) -> Result<(), CommE> {
        let bytes = channels.map(u8::from);
        self.write_registers(Register::CH1SET, &bytes, delay)?;
        self.transition(DeviceState::Configured);
        Ok(())
    }

    /// Reads back the logical configuration of one zero-based channel.
    pub fn channel_config(&mut self, channel: usize) -> Result<ChannelConfig, CommE> {
        let register = Register::channel_set(channel).map_err(Error::InvalidConfig)?;
        let value = self.read_register(register)?;
        Ok(ChannelConfig::from(ChannelSet::from(value)))
    }

    // ==================================================================
    // == Identification & Register Access ==============================
    // ==================================================================
    /// Reads and decodes the `ID` register.
    pub fn read_id(&mut self) -> Result<Id, CommE> {
        self.read_register(Register::ID).map(Id::from)
    }

    /// Reads the `ID` register and checks it describes an ADS1299.
    pub fn verify_id(&mut self) -> Result<Id, CommE> {
        let id = self.read_id()?;
        if !id.is_ads1299() {
            return Err(Error::Protocol(ProtocolError::UnexpectedDeviceId(u8::from(id))));
        }
        Ok(id)
    }

    /// Reads one register.
    pub fn read_register(&mut self, register: Register) -> Result<u8, CommE> {
        self.require_registers()?;
        let result = self.interface.read_register(register);
        self.bus(result)
    }

    /// Writes one register, retrying failed transfers up to [`Config::write_retries`] times.
    ///
    /// Each retry waits [`Config::write_delay_us`] first.
    pub fn write_register(
        &mut self,
        register: Register,
        value: u8,
        delay: &mut impl DelayNs,
    ) -> Result<(), CommE> {
        self.require_registers()?;
        self.write_with_retry(register, value, delay)
    }

    /// Writes a typed register value to its own address.
    pub fn write_value<R: RegisterLayout>(&mut self, value: R, delay: &mut impl DelayNs) -> Result<(), CommE> {
        self.write_register(R::REGISTER, value.into(), delay)
    }

    /// Reads `buf.len()` registers starting at `start`, one single-register read each.
    pub fn read_registers(&mut self, start: Register, buf: &mut [u8]) -> Result<(), CommE> {
        self.require_registers()?;
        if buf.is_empty() {
            return Ok(());
        }
        start.offset(buf.len() - 1).map_err(Error::Protocol)?;

        for (index, slot) in buf.iter_mut().enumerate() {
            let register = start.offset(index).map_err(Error::Protocol)?;
            let result = self.interface.read_register(register);
            *slot = self.bus(result)?;
        }
        Ok(())
    }

    /// Writes `data` into consecutive registers starting at `start`.
    ///
    /// Each byte is its own single-register write; the register-latch delay is applied
    /// according to [`Config::write_delay`].
    pub fn write_registers(
        &mut self,
        start: Register,
        data: &[u8],
        delay: &mut impl DelayNs,
    ) -> Result<(), CommE> {
        self.require_registers()?;
        if data.is_empty() {
            return Ok(());
        }
        start.offset(data.len() - 1).map_err(Error::Protocol)?;

        let mut writes = [(Register::ID, 0u8); REGISTER_COUNT];
        for (index, (slot, value)) in writes.iter_mut().zip(data).enumerate() {
            *slot = (start.offset(index).map_err(Error::Protocol)?, *value);
        }
        self.write_group(writes[..data.len()].iter().copied(), delay)
    }

    /// Reads the whole register map in address order.
    pub fn read_all_registers(&mut self) -> Result<[u8; REGISTER_COUNT], CommE> {
        let mut registers = [0u8; REGISTER_COUNT];
        self.read_registers(Register::ID, &mut registers)?;
        Ok(registers)
    }

    // ==================================================================
    // == Power & Conversion Commands ===================================
    // ==================================================================
    /// Leaves standby mode.
    pub fn wake_up(&mut self) -> Result<(), CommE> {
        self.require_registers()?;
        self.command(Command::Wakeup)
    }

    /// Enters standby mode.
    pub fn standby(&mut self) -> Result<(), CommE> {
        self.require_registers()?;
        self.command(Command::Standby)
    }

    /// Starts conversions without entering continuous read mode.
    pub fn start(&mut self) -> Result<(), CommE> {
        self.require_registers()?;
        self.command(Command::Start)
    }

    /// Stops conversions.
    pub fn stop(&mut self) -> Result<(), CommE> {
        self.require_registers()?;
        self.command(Command::Stop)
    }

    /// Reads one frame by command (`RDATA`); conversions must already be running.
    pub fn read_data(&mut self) -> Result<SampleFrame, CommE> {
        self.require_registers()?;
        let mut raw = [0u8; FRAME_LEN];
        let result = self.interface.read_data(&mut raw);
        self.bus(result)?;
        Ok(SampleFrame::new(raw))
    }

    // ==================================================================
    // == Continuous Acquisition ========================================
    // ==================================================================
    /// Starts conversions and enters continuous read mode.
    ///
    /// Waits [`Config::stream_settle`] resolved against the programmed data rate before
    /// returning.
    pub fn enable_continuous_read(&mut self, delay: &mut impl DelayNs) -> Result<(), CommE> {
        self.require_registers()?;
        self.command(Command::Start)?;
        self.command(Command::Rdatac)?;
        delay.delay_us(self.config.stream_settle.micros(self.data_rate));
        self.transition(DeviceState::Streaming);
        Ok(())
    }

    /// Clocks out one frame while streaming.
    pub fn read_continuous_frame(&mut self) -> Result<SampleFrame, CommE> {
        self.require(DeviceState::Streaming)?;
        let mut raw = [0u8; FRAME_LEN];
        let result = self.interface.read_frame(&mut raw);
        self.bus(result)?;
        Ok(SampleFrame::new(raw))
    }

    /// Clocks out and decodes one frame while streaming.
    pub fn read_samples(&mut self) -> Result<SampleVector, CommE> {
        self.read_continuous_frame().map(|frame| frame.samples())
    }

    /// Waits for DRDY to go low, then reads and decodes one frame.
    ///
    /// Gives up after [`Config::data_ready_timeout_us`] with [`Error::BusTimeout`]; the
    /// controller then needs a fresh [`Ads1299::initialize`].
    pub fn read_samples_when_ready<P: InputPin>(
        &mut self,
        drdy: &mut P,
        delay: &mut impl DelayNs,
    ) -> Result<SampleVector, CommE> {
        self.require(DeviceState::Streaming)?;

        let mut waited_us = 0u32;
        while !drdy.is_low().map_err(|_| Error::DataReadyPin)? {
            if waited_us >= self.config.data_ready_timeout_us {
                warning!("DRDY timeout after {} us", waited_us);
                self.transition(DeviceState::Uninitialized);
                return Err(Error::BusTimeout);
            }
            delay.delay_us(self.config.data_ready_poll_us);
            waited_us = waited_us.saturating_add(self.config.data_ready_poll_us);
        }

        self.read_samples()
    }

    /// Leaves continuous read mode and stops conversions.
    pub fn disable_continuous_read(&mut self) -> Result<(), CommE> {
        self.require(DeviceState::Streaming)?;
        self.command(Command::Sdatac)?;
        self.command(Command::Stop)?;
        self.transition(DeviceState::Stopped);
        Ok(())
    }

    // ==================================================================
    // == Internal Helpers ==============================================
    // ==================================================================
    fn require(&self, expected: DeviceState) -> Result<(), CommE> {
        if self.state != expected {
            return Err(Error::InvalidState { state: self.state });
        }
        Ok(())
    }

    fn require_registers(&self) -> Result<(), CommE> {
        if !self.state.accepts_registers() {
            return Err(Error::InvalidState { state: self.state });
        }
        Ok(())
    }

    fn transition(&mut self, next: DeviceState) {
        if self.state != next {
            debug!("state {} -> {}", self.state, next);
            self.state = next;
        }
    }

    // A failed exchange leaves the device in an unknown mode.
    fn bus<T>(&mut self, result: core::result::Result<T, CommE>) -> Result<T, CommE> {
        result.map_err(|err| {
            self.transition(DeviceState::Uninitialized);
            Error::Interface(err)
        })
    }

    fn reset_device(&mut self, delay: &mut impl DelayNs) -> Result<(), CommE> {
        self.command(Command::Reset)?;
        delay.delay_us(self.config.reset_delay_us);
        self.transition(DeviceState::Reset);
        Ok(())
    }

    fn command(&mut self, command: Command) -> Result<(), CommE> {
        trace!("command {}", command);
        let result = self.interface.send_command(command);
        self.bus(result)
    }

    fn write_with_retry(
        &mut self,
        register: Register,
        value: u8,
        delay: &mut impl DelayNs,
    ) -> Result<(), CommE> {
        if register.is_read_only() {
            return Err(Error::Protocol(ProtocolError::ReadOnlyRegister(register)));
        }

        let mut attempt = 0u8;
        loop {
            match self.interface.write_register(register, value) {
                Ok(()) => {
                    trace!("write {} <- {}", register, value);
                    return Ok(());
                }
                Err(_) if attempt < self.config.write_retries => {
                    attempt += 1;
                    warning!("write {} failed, retry {}", register, attempt);
                    delay.delay_us(self.config.write_delay_us);
                }
                Err(err) => return self.bus(Err(err)),
            }
        }
    }

    fn write_group<I>(&mut self, writes: I, delay: &mut impl DelayNs) -> Result<(), CommE>
    where
        I: IntoIterator<Item = (Register, u8)>,
    {
        let mut written = 0usize;
        for (register, value) in writes {
            self.write_with_retry(register, value, delay)?;
            written += 1;
            if self.config.write_delay == WriteDelay::PerRegister {
                delay.delay_us(self.config.write_delay_us);
            }
        }
        if self.config.write_delay == WriteDelay::PerGroup && written > 0 {
            delay.delay_us(self.config.write_delay_us);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::config::{BiasRouting, StreamSettle};
    use crate::interface::mock::{
        Event, MockError, RecordingDelay, RecordingInterface, ScriptedPin, counting_frame,
    };
    use crate::params::{Gain, InputMux};
    use crate::registers::{ChannelMask, Config1};

    fn device(interface: RecordingInterface) -> Ads1299<RecordingInterface> {
        Ads1299::new(interface, Config::default())
    }

    fn configured() -> Ads1299<RecordingInterface> {
        let mut ads = device(RecordingInterface::with_frames(&[counting_frame()]));
        ads.initialize(&DeviceConfig::default(), &mut RecordingDelay::default())
            .unwrap();
        ads.interface_mut().events.clear();
        ads
    }

    #[test]
    fn initialize_resets_stops_and_writes_config3_first() {
        let mut ads = device(RecordingInterface::new());
        let mut delay = RecordingDelay::default();

        ads.initialize(&DeviceConfig::default(), &mut delay).unwrap();

        assert_eq!(
            ads.interface_mut().events,
            vec![
                Event::Command(Command::Reset),
                Event::Command(Command::Sdatac),
                Event::Command(Command::Sdatac),
                Event::Command(Command::Stop),
                Event::Write(Register::CONFIG3, 0xE0),
                Event::Write(Register::CONFIG1, 0x96),
                Event::Write(Register::CONFIG2, 0xC0),
            ]
        );
        assert_eq!(ads.state(), DeviceState::Configured);
        // reset wait + three per-register latches + 4 ms settle
        assert_eq!(delay.total_us(), 10 + 3 * 10 + 4_000);
    }

    #[test]
    fn initialize_appends_optional_blocks_in_address_order() {
        let mut ads = device(RecordingInterface::new());
        let config = DeviceConfig::power_on_reset().with_bias(BiasRouting {
            positive: ChannelMask::ALL,
            negative: ChannelMask::NONE,
        });

        ads.initialize(&config, &mut RecordingDelay::default()).unwrap();

        assert_eq!(
            ads.interface_mut().writes(),
            vec![
                (Register::CONFIG3, 0x60),
                (Register::CONFIG1, 0x96),
                (Register::CONFIG2, 0xC0),
                (Register::BIAS_SENSP, 0xFF),
                (Register::BIAS_SENSN, 0x00),
            ]
        );
    }

    #[test]
    fn initialize_rejects_reserved_data_rate_before_touching_the_bus() {
        let mut ads = device(RecordingInterface::new());
        let config = DeviceConfig::default().with_config1(Config1::from(0x97u8));

        let result = ads.initialize(&config, &mut RecordingDelay::default());

        assert_eq!(
            result,
            Err(Error::Protocol(ProtocolError::InvalidBitPattern(Register::CONFIG1)))
        );
        assert!(ads.interface_mut().events.is_empty());
        assert_eq!(ads.state(), DeviceState::Uninitialized);
    }

    #[test]
    fn configure_channels_powers_down_the_tail() {
        for active in 0..=CHANNEL_COUNT {
            let mut ads = configured();
            let channel = ChannelConfig::active(Gain::X2, InputMux::Normal);

            ads.configure_channels(active, channel, &mut RecordingDelay::default())
                .unwrap();

            let writes = ads.interface_mut().writes();
            assert_eq!(writes.len(), CHANNEL_COUNT);
            for (index, (register, value)) in writes.iter().enumerate() {
                assert_eq!(*register, Register::channel_set(index).unwrap());
                if index < active {
                    assert_eq!(*value, 0x10);
                } else {
                    assert_eq!(*value & 0x80, 0x80, "channel {} must be powered down", index);
                }
            }
        }
    }

    #[test]
    fn configure_channels_rejects_more_than_eight() {
        let mut ads = configured();
        let result = ads.configure_channels(
            9,
            ChannelConfig::default(),
            &mut RecordingDelay::default(),
        );
        assert_eq!(result, Err(Error::InvalidConfig(ConfigError::ChannelCount(9))));
        assert!(ads.interface_mut().events.is_empty());
    }

    #[test]
    fn configure_channels_requires_initialization() {
        let mut ads = device(RecordingInterface::new());
        let result = ads.configure_channels(
            8,
            ChannelConfig::default(),
            &mut RecordingDelay::default(),
        );
        assert_eq!(
            result,
            Err(Error::InvalidState {
                state: DeviceState::Uninitialized
            })
        );
    }

    #[test]
    fn per_group_delay_waits_once() {
        let config = Config::new()
            .write_delay(50, WriteDelay::PerGroup)
            .build();
        let mut ads = Ads1299::new(RecordingInterface::new(), config);
        ads.initialize(&DeviceConfig::default(), &mut RecordingDelay::default())
            .unwrap();

        let mut delay = RecordingDelay::default();
        ads.write_registers(Register::CH1SET, &[0x10; 8], &mut delay)
            .unwrap();

        assert_eq!(delay.calls, 1);
        assert_eq!(delay.total_us(), 50);
    }

    #[test]
    fn write_registers_rejects_overflowing_range() {
        let mut ads = configured();
        let result = ads.write_registers(Register::CONFIG4, &[0, 0], &mut RecordingDelay::default());
        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::InvalidRegister(_)))
        ));
        assert!(ads.interface_mut().events.is_empty());
    }

    #[test]
    fn read_registers_reads_one_address_at_a_time() {
        let mut ads = configured();
        let mut buf = [0u8; 3];
        ads.read_registers(Register::CONFIG1, &mut buf).unwrap();

        assert_eq!(buf, [0x96, 0xC0, 0xE0]);
        assert_eq!(
            ads.interface_mut().events,
            vec![
                Event::Read(Register::CONFIG1),
                Event::Read(Register::CONFIG2),
                Event::Read(Register::CONFIG3),
            ]
        );
    }

    #[test]
    fn read_all_registers_covers_the_map() {
        let mut ads = configured();
        let registers = ads.read_all_registers().unwrap();
        assert_eq!(registers[0], 0x3E);
        assert_eq!(ads.interface_mut().events.len(), REGISTER_COUNT);
    }

    #[test]
    fn verify_id_checks_device_family() {
        let mut ads = configured();
        assert_eq!(ads.verify_id().unwrap().channel_count(), Some(8));

        ads.interface_mut().registers[0] = 0x00;
        assert_eq!(
            ads.verify_id(),
            Err(Error::Protocol(ProtocolError::UnexpectedDeviceId(0x00)))
        );
    }

    #[test]
    fn writes_to_read_only_registers_are_refused() {
        let mut ads = configured();
        assert_eq!(
            ads.write_register(Register::LOFF_STATP, 0x00, &mut RecordingDelay::default()),
            Err(Error::Protocol(ProtocolError::ReadOnlyRegister(Register::LOFF_STATP)))
        );
    }

    #[test]
    fn failed_writes_are_retried_within_bound() {
        let mut ads = configured();
        ads.interface_mut().failing_writes = 2;
        let mut delay = RecordingDelay::default();

        ads.write_register(Register::MISC1, 0x20, &mut delay).unwrap();

        assert_eq!(ads.interface_mut().writes(), vec![(Register::MISC1, 0x20)]);
        assert_eq!(ads.state(), DeviceState::Configured);
        // one latch delay before each of the two retries
        assert_eq!(delay.calls, 2);
        assert_eq!(delay.total_us(), 2 * 10);
    }

    #[test]
    fn exhausted_retries_surface_the_bus_error() {
        let mut ads = configured();
        ads.interface_mut().failing_writes = 3;

        assert_eq!(
            ads.write_register(Register::MISC1, 0x20, &mut RecordingDelay::default()),
            Err(Error::Interface(MockError))
        );
        assert_eq!(ads.state(), DeviceState::Uninitialized);
        assert_eq!(
            ads.read_register(Register::MISC1),
            Err(Error::InvalidState {
                state: DeviceState::Uninitialized
            })
        );
    }

    #[test]
    fn streaming_lifecycle_decodes_counting_frame() {
        let mut ads = configured();
        let mut delay = RecordingDelay::default();

        ads.enable_continuous_read(&mut delay).unwrap();
        assert_eq!(ads.state(), DeviceState::Streaming);
        assert_eq!(delay.total_us(), 16_000);

        let frame = ads.read_continuous_frame().unwrap();
        assert_eq!(frame.samples(), [1, 2, 3, 4, 5, 6, 7, 8]);

        ads.disable_continuous_read().unwrap();
        assert_eq!(ads.state(), DeviceState::Stopped);
        assert_eq!(
            ads.interface_mut().commands(),
            vec![Command::Start, Command::Rdatac, Command::Sdatac, Command::Stop]
        );
    }

    #[test]
    fn stream_settle_follows_data_rate() {
        let mut ads = device(RecordingInterface::new());
        let config = DeviceConfig::default()
            .with_config1(Config1::default().with_data_rate(DataRate::Sps1000));
        ads.initialize(&config, &mut RecordingDelay::default()).unwrap();

        let mut delay = RecordingDelay::default();
        ads.enable_continuous_read(&mut delay).unwrap();
        assert_eq!(delay.total_us(), 4_000);

        let fixed = Config::new().stream_settle(StreamSettle::FixedMicros(16_000)).build();
        let mut ads = Ads1299::new(RecordingInterface::new(), fixed);
        ads.initialize(&config, &mut RecordingDelay::default()).unwrap();
        let mut delay = RecordingDelay::default();
        ads.enable_continuous_read(&mut delay).unwrap();
        assert_eq!(delay.total_us(), 16_000);
    }

    #[test]
    fn frame_reads_outside_streaming_are_state_errors() {
        let mut ads = configured();
        assert_eq!(
            ads.read_continuous_frame(),
            Err(Error::InvalidState {
                state: DeviceState::Configured
            })
        );

        ads.enable_continuous_read(&mut RecordingDelay::default())
            .unwrap();
        ads.disable_continuous_read().unwrap();
        assert_eq!(
            ads.read_continuous_frame(),
            Err(Error::InvalidState {
                state: DeviceState::Stopped
            })
        );
    }

    #[test]
    fn register_access_while_streaming_fails_fast() {
        let mut ads = configured();
        ads.enable_continuous_read(&mut RecordingDelay::default())
            .unwrap();
        ads.interface_mut().events.clear();

        assert_eq!(
            ads.read_register(Register::ID),
            Err(Error::InvalidState {
                state: DeviceState::Streaming
            })
        );
        assert_eq!(
            ads.write_register(Register::CONFIG1, 0x96, &mut RecordingDelay::default()),
            Err(Error::InvalidState {
                state: DeviceState::Streaming
            })
        );
        assert!(ads.interface_mut().events.is_empty());
        assert_eq!(ads.state(), DeviceState::Streaming);
    }

    #[test]
    fn reset_is_refused_while_streaming() {
        let mut ads = configured();
        ads.enable_continuous_read(&mut RecordingDelay::default())
            .unwrap();
        assert_eq!(
            ads.reset(&mut RecordingDelay::default()),
            Err(Error::InvalidState {
                state: DeviceState::Streaming
            })
        );

        ads.disable_continuous_read().unwrap();
        ads.reset(&mut RecordingDelay::default()).unwrap();
        assert_eq!(ads.state(), DeviceState::Reset);
        assert_eq!(ads.read_id(), Err(Error::InvalidState { state: DeviceState::Reset }));
    }

    #[test]
    fn frame_bus_error_requires_reinitialization() {
        let mut ads = configured();
        ads.enable_continuous_read(&mut RecordingDelay::default())
            .unwrap();
        ads.interface_mut().fail_frames = true;

        assert_eq!(ads.read_samples(), Err(Error::Interface(MockError)));
        assert_eq!(ads.state(), DeviceState::Uninitialized);

        ads.interface_mut().fail_frames = false;
        ads.initialize(&DeviceConfig::default(), &mut RecordingDelay::default())
            .unwrap();
        assert_eq!(ads.state(), DeviceState::Configured);
    }

    #[test]
    fn data_ready_wait_is_bounded() {
        let config = Config::new().data_ready_timeout(100, 10).build();
        let mut ads = Ads1299::new(RecordingInterface::new(), config);
        ads.initialize(&DeviceConfig::default(), &mut RecordingDelay::default())
            .unwrap();
        ads.enable_continuous_read(&mut RecordingDelay::default())
            .unwrap();

        let mut drdy = ScriptedPin::new(&[]);
        let mut delay = RecordingDelay::default();
        assert_eq!(
            ads.read_samples_when_ready(&mut drdy, &mut delay),
            Err(Error::BusTimeout)
        );
        assert_eq!(delay.total_us(), 100);
        assert_eq!(ads.state(), DeviceState::Uninitialized);
    }

    #[test]
    fn data_ready_low_reads_a_frame() {
        let mut ads = configured();
        ads.enable_continuous_read(&mut RecordingDelay::default())
            .unwrap();

        let mut drdy = ScriptedPin::new(&[Ok(false), Ok(false), Ok(true)]);
        let mut delay = RecordingDelay::default();
        let samples = ads.read_samples_when_ready(&mut drdy, &mut delay).unwrap();

        assert_eq!(samples, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(delay.calls, 2);
    }

    #[test]
    fn data_ready_pin_failure_is_reported() {
        let mut ads = configured();
        ads.enable_continuous_read(&mut RecordingDelay::default())
            .unwrap();

        let mut drdy = ScriptedPin::new(&[Err(MockError)]);
        assert_eq!(
            ads.read_samples_when_ready(&mut drdy, &mut RecordingDelay::default()),
            Err(Error::DataReadyPin)
        );
    }

    #[test]
    fn rdata_reads_a_frame_by_command() {
        let mut ads = configured();
        ads.start().unwrap();
        let frame = ads.read_data().unwrap();

        assert_eq!(frame.samples(), [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(
            ads.interface_mut().events,
            vec![Event::Command(Command::Start), Event::Data]
        );
    }

    #[test]
    fn channel_config_round_trips_through_the_device() {
        let mut ads = configured();
        let channel = ChannelConfig::active(Gain::X12, InputMux::TestSignal).with_srb2(true);
        ads.configure_each_channel(&[channel; CHANNEL_COUNT], &mut RecordingDelay::default())
            .unwrap();

        assert_eq!(ads.channel_config(5).unwrap(), channel);
        assert!(matches!(
            ads.channel_config(8),
            Err(Error::InvalidConfig(ConfigError::ChannelOutOfRange(8)))
        ));
    }

    mod wire {
        use super::*;
        use embedded_hal_mock::eh1::delay::NoopDelay;
        use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

        fn command(opcode: u8) -> Vec<SpiTransaction<u8>> {
            vec![
                SpiTransaction::transaction_start(),
                SpiTransaction::write(opcode),
                SpiTransaction::transaction_end(),
            ]
        }

        fn write(address: u8, value: u8) -> Vec<SpiTransaction<u8>> {
            vec![
                SpiTransaction::transaction_start(),
                SpiTransaction::write_vec(vec![0x40 | address, 0x00, value]),
                SpiTransaction::transaction_end(),
            ]
        }

        #[test]
        fn initialize_and_stream_on_the_wire() {
            let frame = counting_frame();
            let expectations: Vec<SpiTransaction<u8>> = [
                command(0x06),
                command(0x11),
                command(0x11),
                command(0x0A),
                write(0x03, 0xE0),
                write(0x01, 0x96),
                write(0x02, 0xC0),
                vec![
                    SpiTransaction::transaction_start(),
                    SpiTransaction::transfer_in_place(vec![0x20, 0x00, 0x00], vec![0x00, 0x00, 0x3E]),
                    SpiTransaction::transaction_end(),
                ],
                command(0x08),
                command(0x10),
                vec![
                    SpiTransaction::transaction_start(),
                    SpiTransaction::transfer_in_place(vec![0u8; FRAME_LEN], frame.to_vec()),
                    SpiTransaction::transaction_end(),
                ],
                command(0x11),
                command(0x0A),
            ]
            .concat();

            let mut spi = SpiMock::new(&expectations);
            let mut ads = Ads1299::new_spi(spi.clone(), Config::default());
            let mut delay = NoopDelay::new();

            ads.initialize(&DeviceConfig::default(), &mut delay).unwrap();
            assert!(ads.verify_id().is_ok());
            ads.enable_continuous_read(&mut delay).unwrap();
            assert_eq!(ads.read_samples().unwrap(), [1, 2, 3, 4, 5, 6, 7, 8]);
            ads.disable_continuous_read().unwrap();

            spi.done();
        }
    }
}
