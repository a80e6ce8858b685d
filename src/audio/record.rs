//! Bounded microphone recording into a caller-owned buffer.
//!
//! A session borrows both the engine and the target buffer, so only one
//! session can exist at a time and the buffer cannot be touched until the
//! session is gone.

use embedded_hal::digital::OutputPin;

use super::engine::AudioEngine;
use crate::config::{RECORD_CHUNK_SAMPLES, RECORD_TIMEOUT};
use crate::error::AudioError;
use crate::hal::bus::ControlBus;
use crate::hal::i2s::SampleStream;

/// Active capture into a borrowed buffer
pub struct RecordingSession<'a, B, S, P> {
    engine: &'a mut AudioEngine<B, S, P>,
    target: &'a mut [i16],
    written: usize,
    active: bool,
}

impl<B, S, P> AudioEngine<B, S, P>
where
    B: ControlBus,
    S: SampleStream,
    P: OutputPin,
{
    /// Start recording into `buffer`; its length is the capacity.
    pub fn start_record<'a>(
        &'a mut self,
        buffer: &'a mut [i16],
    ) -> Result<RecordingSession<'a, B, S, P>, AudioError> {
        if !self.is_ready() {
            return Err(AudioError::NotInitialized);
        }
        if buffer.is_empty() {
            return Err(AudioError::InvalidArgument("recording buffer is empty"));
        }
        log::debug!("record: start, capacity {} samples", buffer.len());
        Ok(RecordingSession {
            engine: self,
            target: buffer,
            written: 0,
            active: true,
        })
    }
}

impl<'a, B, S, P> RecordingSession<'a, B, S, P>
where
    B: ControlBus,
    S: SampleStream,
    P: OutputPin,
{
    /// Capture one chunk (at most [`RECORD_CHUNK_SAMPLES`]).
    ///
    /// Returns the samples added; 0 when inactive, full, or the stream
    /// timed out.
    pub fn poll(&mut self) -> usize {
        if !self.active || self.written >= self.target.len() {
            return 0;
        }
        let end = (self.written + RECORD_CHUNK_SAMPLES).min(self.target.len());
        let n = self
            .engine
            .read_samples_timeout(&mut self.target[self.written..end], Some(RECORD_TIMEOUT));
        self.written += n;
        n
    }

    /// Drain the stream until the buffer is full or a chunk comes back
    /// empty, then end the session.
    ///
    /// Returns the final sample count. Never blocks longer than one chunk
    /// timeout past the last sample.
    pub fn stop(&mut self) -> usize {
        while self.active && self.written < self.target.len() {
            if self.poll() == 0 {
                break;
            }
        }
        if self.active {
            log::debug!("record: stop, {} of {} samples", self.written, self.target.len());
        }
        self.active = false;
        self.written
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Samples captured so far
    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.target.len()
    }

    /// Captured audio
    pub fn samples(&self) -> &[i16] {
        &self.target[..self.written]
    }
}
