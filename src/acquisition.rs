//! Sampling loop driving one or more streaming devices into a batch.
//!
//! One cycle waits [`AcquisitionSettings::sample_interval_us`], then reads one frame from
//! every device in slice order and appends device `i`'s channels at offset `i * 8`. After
//! [`AcquisitionSettings::flush_every`] cycles the batch is handed to the sink and
//! cleared, so filling and flushing never overlap. Every device is read before anything is
//! appended; a failed read leaves the batch as it was.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::batch::{AcquisitionBatch, BatchError, SnapshotSink};
use crate::config::ConfigError;
use crate::device::Ads1299;
use crate::error::Error;
use crate::frame::SampleVector;
use crate::interface::Ads1299Interface;
use crate::log::debug;
use crate::registers::CHANNEL_COUNT;

/// Cadence of the sampling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcquisitionSettings {
    /// Cycles collected before each flush.
    pub flush_every: usize,
    /// Wait at the start of every cycle.
    pub sample_interval_us: u32,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            flush_every: 250,
            sample_interval_us: 1_000,
        }
    }
}

/// Failures of the sampling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionError<CommE, SinkE> {
    /// A device read failed; the device needs re-initialization.
    Device {
        /// Position of the failing device in the slice.
        index: usize,
        /// Underlying driver error.
        error: Error<CommE>,
    },
    /// More devices than the batch has channel slots for.
    InvalidConfig(ConfigError),
    /// The batch rejected a sample.
    Batch(BatchError),
    /// The sink failed to persist a batch.
    Sink(SinkE),
}

impl<CommE: core::fmt::Debug, SinkE: core::fmt::Debug> core::fmt::Display
    for AcquisitionError<CommE, SinkE>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Device { index, error } => write!(f, "device {}: {}", index, error),
            Self::InvalidConfig(err) => write!(f, "invalid configuration: {}", err),
            Self::Batch(err) => write!(f, "batch error: {}", err),
            Self::Sink(err) => write!(f, "sink error: {:?}", err),
        }
    }
}

impl<CommE: core::fmt::Debug, SinkE: core::fmt::Debug> core::error::Error
    for AcquisitionError<CommE, SinkE>
{
}

impl<CommE, SinkE> From<BatchError> for AcquisitionError<CommE, SinkE> {
    fn from(err: BatchError) -> Self {
        Self::Batch(err)
    }
}

/// Sampling session owning a batch of `CHANNELS` sequences of up to `CAPACITY` codes.
pub struct Acquisition<const CHANNELS: usize, const CAPACITY: usize> {
    settings: AcquisitionSettings,
    batch: AcquisitionBatch<CHANNELS, CAPACITY>,
    pending: usize,
    flushes: usize,
}

impl<const CHANNELS: usize, const CAPACITY: usize> Acquisition<CHANNELS, CAPACITY> {
    /// Creates a session; `flush_every` must be in `1..=CAPACITY`.
    pub fn new(settings: AcquisitionSettings) -> Result<Self, ConfigError> {
        if settings.flush_every == 0 || settings.flush_every > CAPACITY {
            return Err(ConfigError::FlushCadence {
                requested: settings.flush_every,
                capacity: CAPACITY,
            });
        }
        Ok(Self {
            settings,
            batch: AcquisitionBatch::new(),
            pending: 0,
            flushes: 0,
        })
    }

    /// Active settings.
    pub fn settings(&self) -> &AcquisitionSettings {
        &self.settings
    }

    /// Samples collected since the last flush.
    pub fn batch(&self) -> &AcquisitionBatch<CHANNELS, CAPACITY> {
        &self.batch
    }

    /// Cycles collected since the last flush.
    pub fn pending_cycles(&self) -> usize {
        self.pending
    }

    /// Number of batches handed to the sink so far.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Runs exactly `cycles` cycles.
    pub fn run_for<IFACE, CommE, S>(
        &mut self,
        devices: &mut [Ads1299<IFACE>],
        sink: &mut S,
        delay: &mut impl DelayNs,
        cycles: usize,
    ) -> Result<(), AcquisitionError<CommE, S::Error>>
    where
        IFACE: Ads1299Interface<Error = CommE>,
        S: SnapshotSink,
    {
        if let Err(err) = self.check_devices(devices.len()) {
            return Err(AcquisitionError::InvalidConfig(err));
        }
        for _ in 0..cycles {
            self.cycle(devices, sink, delay)?;
        }
        Ok(())
    }

    /// Runs cycles until `stop` is set, checked before every cycle.
    ///
    /// Samples collected since the last flush are persisted before returning.
    pub fn run_until<IFACE, CommE, S>(
        &mut self,
        devices: &mut [Ads1299<IFACE>],
        sink: &mut S,
        delay: &mut impl DelayNs,
        stop: &AtomicBool,
    ) -> Result<(), AcquisitionError<CommE, S::Error>>
    where
        IFACE: Ads1299Interface<Error = CommE>,
        S: SnapshotSink,
    {
        if let Err(err) = self.check_devices(devices.len()) {
            return Err(AcquisitionError::InvalidConfig(err));
        }
        while !stop.load(Ordering::Acquire) {
            self.cycle(devices, sink, delay)?;
        }
        if self.pending > 0 {
            debug!("stop requested, flushing {} pending cycles", self.pending);
            if let Err(err) = self.flush(sink) {
                return Err(AcquisitionError::Sink(err));
            }
        }
        Ok(())
    }

    /// Persists whatever has been collected and clears the batch.
    pub fn flush<S: SnapshotSink>(&mut self, sink: &mut S) -> Result<(), S::Error> {
        self.batch.flush_and_clear(sink)?;
        self.pending = 0;
        self.flushes += 1;
        Ok(())
    }

    fn check_devices(&self, devices: usize) -> Result<(), ConfigError> {
        if devices.saturating_mul(CHANNEL_COUNT) > CHANNELS {
            return Err(ConfigError::DeviceCount {
                devices,
                channels: CHANNELS,
            });
        }
        Ok(())
    }

    fn cycle<IFACE, CommE, S>(
        &mut self,
        devices: &mut [Ads1299<IFACE>],
        sink: &mut S,
        delay: &mut impl DelayNs,
    ) -> Result<(), AcquisitionError<CommE, S::Error>>
    where
        IFACE: Ads1299Interface<Error = CommE>,
        S: SnapshotSink,
    {
        delay.delay_us(self.settings.sample_interval_us);

        // A cycle lands in the batch whole or not at all.
        let mut frames: Vec<SampleVector, CHANNELS> = Vec::new();
        for (index, device) in devices.iter_mut().enumerate() {
            let samples = match device.read_samples() {
                Ok(samples) => samples,
                Err(error) => return Err(AcquisitionError::Device { index, error }),
            };
            if frames.push(samples).is_err() {
                return Err(AcquisitionError::Batch(BatchError::ChannelOutOfRange(
                    index * CHANNEL_COUNT,
                )));
            }
        }
        self.batch.append_frames(0, &frames)?;

        self.pending += 1;
        if self.pending >= self.settings.flush_every {
            if let Err(err) = self.flush(sink) {
                return Err(AcquisitionError::Sink(err));
            }
        }
        Ok(())
    }
}
