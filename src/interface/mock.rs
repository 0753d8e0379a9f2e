//! Scripted test doubles for the bus, delay and DRDY line.

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin};

use super::Ads1299Interface;
use crate::frame::FRAME_LEN;
use crate::registers::{Command, REGISTER_COUNT, Register};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

impl digital::Error for MockError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// One bus exchange as seen by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Command(Command),
    Write(Register, u8),
    Read(Register),
    Frame,
    Data,
}

/// Register file backed interface that records every exchange.
pub struct RecordingInterface {
    pub events: Vec<Event>,
    pub registers: [u8; REGISTER_COUNT],
    pub frames: VecDeque<[u8; FRAME_LEN]>,
    /// Number of upcoming register writes that fail before one succeeds.
    pub failing_writes: usize,
    pub fail_frames: bool,
}

impl RecordingInterface {
    pub fn new() -> Self {
        let mut registers = [0u8; REGISTER_COUNT];
        registers[Register::ID.address() as usize] = 0x3E;
        Self {
            events: Vec::new(),
            registers,
            frames: VecDeque::new(),
            failing_writes: 0,
            fail_frames: false,
        }
    }

    pub fn with_frames(frames: &[[u8; FRAME_LEN]]) -> Self {
        let mut interface = Self::new();
        interface.frames.extend(frames.iter().copied());
        interface
    }

    pub fn writes(&self) -> Vec<(Register, u8)> {
        self.events
            .iter()
            .filter_map(|event| match *event {
                Event::Write(register, value) => Some((register, value)),
                _ => None,
            })
            .collect()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.events
            .iter()
            .filter_map(|event| match *event {
                Event::Command(command) => Some(command),
                _ => None,
            })
            .collect()
    }
}

impl Ads1299Interface for RecordingInterface {
    type Error = MockError;

    fn send_command(&mut self, command: Command) -> Result<(), Self::Error> {
        self.events.push(Event::Command(command));
        Ok(())
    }

    fn read_register(&mut self, register: Register) -> Result<u8, Self::Error> {
        self.events.push(Event::Read(register));
        Ok(self.registers[register.address() as usize])
    }

    fn write_register(&mut self, register: Register, value: u8) -> Result<(), Self::Error> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(MockError);
        }
        self.events.push(Event::Write(register, value));
        self.registers[register.address() as usize] = value;
        Ok(())
    }

    fn read_frame(&mut self, frame: &mut [u8; FRAME_LEN]) -> Result<(), Self::Error> {
        if self.fail_frames {
            return Err(MockError);
        }
        self.events.push(Event::Frame);
        *frame = self.frames.pop_front().unwrap_or([0u8; FRAME_LEN]);
        Ok(())
    }

    fn read_data(&mut self, frame: &mut [u8; FRAME_LEN]) -> Result<(), Self::Error> {
        self.events.push(Event::Data);
        *frame = self.frames.pop_front().unwrap_or([0u8; FRAME_LEN]);
        Ok(())
    }
}

/// Delay that only accumulates the requested time.
#[derive(Default)]
pub struct RecordingDelay {
    pub total_ns: u64,
    pub calls: usize,
}

impl RecordingDelay {
    pub fn total_us(&self) -> u64 {
        self.total_ns / 1_000
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.calls += 1;
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_ns(us.saturating_mul(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns += u64::from(ms) * 1_000_000;
        self.calls += 1;
    }
}

/// DRDY line replaying a script of `is_low` answers; exhausted scripts stay high.
pub struct ScriptedPin {
    pub levels: VecDeque<Result<bool, MockError>>,
}

impl ScriptedPin {
    pub fn new(levels: &[Result<bool, MockError>]) -> Self {
        Self {
            levels: levels.iter().copied().collect(),
        }
    }
}

impl digital::ErrorType for ScriptedPin {
    type Error = MockError;
}

impl InputPin for ScriptedPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.is_low().map(|low| !low)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.levels.pop_front().unwrap_or(Ok(false))
    }
}

/// Frame whose channel `n` carries the code `n + 1`.
pub fn counting_frame() -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    for channel in 0..8 {
        frame[(channel + 1) * 3 + 2] = channel as u8 + 1;
    }
    frame
}
