//! Fixed-capacity per-channel sample buffers.

use heapless::Vec;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::frame::SampleVector;
use crate::registers::CHANNEL_COUNT;

/// Reasons a sample could not be appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatchError {
    /// Channel index beyond the batch width.
    ChannelOutOfRange(usize),
    /// The channel buffer already holds `CAPACITY` samples.
    Full(usize),
}

impl core::fmt::Display for BatchError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ChannelOutOfRange(channel) => write!(f, "batch channel {} out of range", channel),
            Self::Full(channel) => write!(f, "batch channel {} is full", channel),
        }
    }
}

impl core::error::Error for BatchError {}

/// Destination for full or partial batches.
pub trait SnapshotSink {
    /// Error reported when persisting fails.
    type Error;

    /// Persists the whole batch, replacing any previous snapshot.
    fn persist<const CHANNELS: usize, const CAPACITY: usize>(
        &mut self,
        batch: &AcquisitionBatch<CHANNELS, CAPACITY>,
    ) -> Result<(), Self::Error>;
}

/// `CHANNELS` append-only sample sequences of up to `CAPACITY` codes each.
///
/// Serializes as a map from `"Ch{index}"` to the channel's codes in append order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionBatch<const CHANNELS: usize, const CAPACITY: usize> {
    channels: [Vec<i32, CAPACITY>; CHANNELS],
}

impl<const CHANNELS: usize, const CAPACITY: usize> AcquisitionBatch<CHANNELS, CAPACITY> {
    /// Creates an empty batch.
    pub const fn new() -> Self {
        Self {
            channels: [const { Vec::new() }; CHANNELS],
        }
    }

    /// Appends one code to `channel`.
    pub fn append(&mut self, channel: usize, value: i32) -> Result<(), BatchError> {
        self.channels
            .get_mut(channel)
            .ok_or(BatchError::ChannelOutOfRange(channel))?
            .push(value)
            .map_err(|_| BatchError::Full(channel))
    }

    /// Appends a decoded frame to channels `offset..offset + 8`.
    ///
    /// Checks every target channel first so a failed call leaves the batch unchanged.
    pub fn append_vector(&mut self, offset: usize, samples: &SampleVector) -> Result<(), BatchError> {
        self.append_frames(offset, core::slice::from_ref(samples))
    }

    /// Appends consecutive frames, frame `i` to channels `offset + 8 * i` onwards.
    ///
    /// All or nothing: either every frame is appended or the batch is unchanged.
    pub fn append_frames(&mut self, offset: usize, frames: &[SampleVector]) -> Result<(), BatchError> {
        let end = offset + frames.len() * CHANNEL_COUNT;
        for channel in offset..end {
            let buffer = self
                .channels
                .get(channel)
                .ok_or(BatchError::ChannelOutOfRange(channel))?;
            if buffer.is_full() {
                return Err(BatchError::Full(channel));
            }
        }
        for (channel, &value) in (offset..).zip(frames.iter().flatten()) {
            self.append(channel, value)?;
        }
        Ok(())
    }

    /// Codes collected so far for `channel`.
    pub fn channel(&self, channel: usize) -> Option<&[i32]> {
        self.channels.get(channel).map(|buffer| buffer.as_slice())
    }

    /// Length of the longest channel sequence.
    pub fn cycles(&self) -> usize {
        self.channels.iter().map(|buffer| buffer.len()).max().unwrap_or(0)
    }

    /// Returns `true` when no channel holds a sample.
    pub fn is_empty(&self) -> bool {
        self.channels.iter().all(|buffer| buffer.is_empty())
    }

    /// Drops every collected sample.
    pub fn clear(&mut self) {
        self.channels.iter_mut().for_each(|buffer| buffer.clear());
    }

    /// Persists the batch into `sink`, then clears it.
    ///
    /// On a sink error the samples are kept so the caller can retry.
    pub fn flush_and_clear<S: SnapshotSink>(&mut self, sink: &mut S) -> Result<(), S::Error> {
        sink.persist(self)?;
        self.clear();
        Ok(())
    }
}

impl<const CHANNELS: usize, const CAPACITY: usize> Default for AcquisitionBatch<CHANNELS, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

struct ChannelLabel(usize);

impl core::fmt::Display for ChannelLabel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Ch{}", self.0)
    }
}

impl Serialize for ChannelLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<const CHANNELS: usize, const CAPACITY: usize> Serialize for AcquisitionBatch<CHANNELS, CAPACITY> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CHANNELS))?;
        for (index, buffer) in self.channels.iter().enumerate() {
            map.serialize_entry(&ChannelLabel(index), buffer.as_slice())?;
        }
        map.end()
    }
}
