//! Container playback.
//!
//! Multi-channel files are passed through interleaved to the mono output;
//! there is no downmix.

use embedded_hal::digital::OutputPin;

use super::engine::AudioEngine;
use crate::config::{CONTAINER_CHUNK_SAMPLES, SILENCE_TAIL_SAMPLES};
use crate::error::AudioError;
use crate::hal::bus::ControlBus;
use crate::hal::i2s::SampleStream;
use crate::wav::{pcm_samples, WavDescriptor};

impl<B, S, P> AudioEngine<B, S, P>
where
    B: ControlBus,
    S: SampleStream,
    P: OutputPin,
{
    /// Play an in-memory RIFF/WAVE file (16-bit PCM only).
    ///
    /// Switches the stream to the file's sample rate if needed and leaves
    /// it there. The first short write aborts playback.
    pub fn play_container(&mut self, bytes: &[u8]) -> Result<(), AudioError> {
        if !self.is_ready() {
            return Err(AudioError::NotInitialized);
        }

        let desc = WavDescriptor::parse(bytes);
        if !desc.valid {
            return Err(AudioError::MalformedContainer);
        }
        if desc.bits_per_sample != 16 {
            return Err(AudioError::UnsupportedBitDepth(desc.bits_per_sample));
        }
        let payload = desc.payload(bytes).ok_or(AudioError::PayloadOutOfBounds)?;

        if desc.sample_rate != self.sample_rate() {
            self.set_sample_rate(desc.sample_rate)?;
        }
        if desc.channels > 1 {
            log::debug!("wav: {} channels played interleaved on mono output", desc.channels);
        }
        log::debug!(
            "wav: {} samples at {} Hz",
            desc.sample_count(),
            desc.sample_rate
        );

        let mut buf = [0i16; CONTAINER_CHUNK_SAMPLES];
        for chunk in payload.chunks(CONTAINER_CHUNK_SAMPLES * 2) {
            let mut n = 0;
            for (slot, sample) in buf.iter_mut().zip(pcm_samples(chunk)) {
                *slot = sample;
                n += 1;
            }
            if n > 0 {
                self.write_all(&buf[..n])?;
            }
        }

        if let Err(e) = self.write_silence(SILENCE_TAIL_SAMPLES) {
            log::debug!("wav: silence tail dropped: {}", e);
        }
        Ok(())
    }
}
