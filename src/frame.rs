//! Data frame decoding.
//!
//! One conversion produces a 27-byte frame: a 24-bit status word followed by eight
//! 24-bit big-endian two's-complement channel codes. Decoding is pure and bus-free.

use crate::error::ProtocolError;
use crate::params::Gain;
use crate::registers::{CHANNEL_COUNT, ChannelMask};

/// Bytes per status word or channel code.
pub const BYTES_PER_SAMPLE: usize = 3;
/// Bytes in one data frame (status + eight channels).
pub const FRAME_LEN: usize = BYTES_PER_SAMPLE * (CHANNEL_COUNT + 1);
/// Largest positive code.
pub const CODE_MAX: i32 = (1 << 23) - 1;
/// Most negative code.
pub const CODE_MIN: i32 = -(1 << 23);

// Status words always start with 0b1100.
const STATUS_HEADER: u8 = 0b1100;

/// Channel codes of one conversion, index 0 = channel 1.
pub type SampleVector = [i32; CHANNEL_COUNT];

/// Raw bytes of one conversion as clocked out of DOUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleFrame([u8; FRAME_LEN]);

impl SampleFrame {
    /// Wraps a complete frame.
    pub const fn new(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// Decodes the leading status word.
    pub fn status(&self) -> StatusWord {
        StatusWord::from_bytes([self.0[0], self.0[1], self.0[2]])
    }

    /// Decodes the eight channel codes.
    pub fn samples(&self) -> SampleVector {
        decode_frame(&self.0)
    }
}

impl Default for SampleFrame {
    fn default() -> Self {
        Self([0u8; FRAME_LEN])
    }
}

impl TryFrom<&[u8]> for SampleFrame {
    type Error = ProtocolError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let frame: [u8; FRAME_LEN] = bytes.try_into().map_err(|_| ProtocolError::FrameLength {
            expected: FRAME_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(frame))
    }
}

/// Decoded 24-bit status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusWord {
    /// Leading nibble, `0b1100` on a well-formed frame.
    pub header: u8,
    /// Positive-side lead-off flags (`LOFF_STATP`).
    pub lead_off_positive: ChannelMask,
    /// Negative-side lead-off flags (`LOFF_STATN`).
    pub lead_off_negative: ChannelMask,
    /// GPIO data bits.
    pub gpio: u8,
}

impl StatusWord {
    /// Splits `1100 | LOFF_STATP | LOFF_STATN | GPIO[7:4]`.
    pub const fn from_bytes(bytes: [u8; BYTES_PER_SAMPLE]) -> Self {
        let word = u24_be(bytes);
        Self {
            header: ((word >> 20) & 0x0F) as u8,
            lead_off_positive: ChannelMask::from_bits(((word >> 12) & 0xFF) as u8),
            lead_off_negative: ChannelMask::from_bits(((word >> 4) & 0xFF) as u8),
            gpio: (word & 0x0F) as u8,
        }
    }

    /// Returns `true` when the header nibble is intact.
    pub const fn is_valid(&self) -> bool {
        self.header == STATUS_HEADER
    }
}

#[inline]
const fn u24_be(bytes: [u8; BYTES_PER_SAMPLE]) -> u32 {
    ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | bytes[2] as u32
}

/// Interprets the low 24 bits of `raw` as two's complement.
#[inline]
pub const fn sign_extend_24(raw: u32) -> i32 {
    ((raw << 8) as i32) >> 8
}

/// Decodes a frame into eight signed channel codes; the status word is skipped.
pub fn decode_frame(bytes: &[u8; FRAME_LEN]) -> SampleVector {
    let mut samples = [0i32; CHANNEL_COUNT];
    for (sample, chunk) in samples
        .iter_mut()
        .zip(bytes[BYTES_PER_SAMPLE..].chunks_exact(BYTES_PER_SAMPLE))
    {
        *sample = sign_extend_24(u24_be([chunk[0], chunk[1], chunk[2]]));
    }
    samples
}

/// Slice variant of [`decode_frame`] that rejects any length other than [`FRAME_LEN`].
pub fn decode_frame_slice(bytes: &[u8]) -> Result<SampleVector, ProtocolError> {
    SampleFrame::try_from(bytes).map(|frame| frame.samples())
}

/// Converts a code to microvolts at the input for the given PGA gain and reference.
///
/// One LSB is `2 * VREF / gain / 2^24`. Returns `None` for [`Gain::Disabled`].
pub fn to_microvolts(code: i32, gain: Gain, vref_uv: f32) -> Option<f32> {
    let gain = gain.multiplier()? as f32;
    let lsb = 2.0 * vref_uv / gain / (1u32 << 24) as f32;
    Some(code as f32 * lsb)
}
