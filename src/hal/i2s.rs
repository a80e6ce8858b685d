//! Sample stream seam (I2S on the board).
//!
//! One full-duplex stream, one clock: a rate change applies to capture and
//! playback together. Reads and writes block; `timeout = None` waits until
//! the DMA ring produces or accepts data.

use core::time::Duration;
use thiserror::Error;

/// Sample stream failure
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// Stream used before `install`
    #[error("stream not installed")]
    NotInstalled,
    /// Clock cannot produce the requested rate
    #[error("unsupported sample rate {0} Hz")]
    UnsupportedRate(u32),
    /// Driver reported an error code
    #[error("stream I/O failed (code {0})")]
    Io(i32),
}

/// Blocking mono 16-bit PCM stream
pub trait SampleStream {
    /// Set up the stream at `sample_rate`. Re-installing an installed stream
    /// only reapplies the rate.
    fn install(&mut self, sample_rate: u32) -> Result<(), StreamError>;

    /// Change the shared clock.
    ///
    /// Implementations stop both directions while the clock is reprogrammed,
    /// so no transfer straddles two rates.
    fn set_sample_rate(&mut self, sample_rate: u32) -> Result<(), StreamError>;

    /// Fill `buf` from the capture side.
    ///
    /// Returns the number of samples read; fewer than `buf.len()` means the
    /// timeout expired first.
    fn read(&mut self, buf: &mut [i16], timeout: Option<Duration>) -> Result<usize, StreamError>;

    /// Queue `buf` on the playback side, returning the samples accepted.
    fn write(&mut self, buf: &[i16]) -> Result<usize, StreamError>;
}

/// One side of a full-duplex stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Playback
    Tx,
    /// Capture
    Rx,
}

/// Move both directions from `current` to `target` Hz, or leave both at
/// `current`.
///
/// `reconfig` retunes one direction. TX goes first; if RX then fails, TX is
/// put back on `current` before the RX error is returned.
pub fn retune_both<E>(
    current: u32,
    target: u32,
    mut reconfig: impl FnMut(Direction, u32) -> Result<(), E>,
) -> Result<(), E> {
    reconfig(Direction::Tx, target)?;
    if let Err(e) = reconfig(Direction::Rx, target) {
        if reconfig(Direction::Tx, current).is_err() {
            log::error!("i2s: TX stuck at {} Hz, RX at {} Hz", target, current);
        }
        return Err(e);
    }
    Ok(())
}
