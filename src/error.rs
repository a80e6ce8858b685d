//! Error taxonomy for the audio subsystem.
//!
//! Hardware seams report their own small error types ([`BusError`],
//! [`StreamError`]); engine operations fold them into [`AudioError`].
//! Sample I/O and metering never return these: short counts and floor
//! values carry failure there.

use thiserror::Error;

pub use crate::hal::bus::BusError;
pub use crate::hal::i2s::StreamError;

/// Errors returned by engine action calls.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Operation attempted before a successful `begin()`.
    #[error("audio engine not initialized")]
    NotInitialized,

    /// Argument rejected before any hardware access.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Control-bus transaction failed (timeout or NACK).
    #[error("control bus: {0}")]
    Bus(#[from] BusError),

    /// Sample stream could not be installed or reconfigured.
    #[error("sample stream: {0}")]
    Stream(#[from] StreamError),

    /// Power amplifier enable line could not be driven.
    #[error("power amplifier line could not be driven")]
    AmpLine,

    /// Playback chunk was not fully accepted by the hardware.
    #[error("short transfer: {written} of {requested} samples")]
    ShortTransfer { written: usize, requested: usize },

    /// RIFF/WAVE parse failed.
    #[error("malformed RIFF/WAVE container")]
    MalformedContainer,

    /// Only 16-bit PCM payloads are playable.
    #[error("unsupported container: {0} bits per sample")]
    UnsupportedBitDepth(u16),

    /// Declared data chunk runs past the end of the buffer.
    #[error("container payload exceeds buffer")]
    PayloadOutOfBounds,

    /// File could not be read or written.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
}
