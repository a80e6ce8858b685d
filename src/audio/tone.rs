//! Tone generator with phase accumulator and attack/release envelope
//!
//! The envelope is a pure function of the position inside the tone:
//!
//! ```text
//! 1.0 |     ________________________
//!     |    /                        \
//!     |   /                          \
//! 0.0 |__/                            \__
//!     0  0.08                     0.85  1.0
//! ```
//!
//! Samples are produced in chunks of [`TONE_CHUNK_SAMPLES`] so a tone of
//! any length needs one small stack buffer.

use core::f32::consts::TAU;

use embedded_hal::digital::OutputPin;

use super::engine::AudioEngine;
use crate::config::{SILENCE_TAIL_SAMPLES, TONE_AMPLITUDE, TONE_ATTACK, TONE_CHUNK_SAMPLES, TONE_RELEASE};
use crate::error::AudioError;
use crate::hal::bus::ControlBus;
use crate::hal::i2s::SampleStream;

/// Amplitude multiplier at normalized position `t` (0..=1).
///
/// Linear ramp up over the first 8%, linear ramp down over the last 15%,
/// never negative.
#[inline]
pub fn envelope(t: f32) -> f32 {
    let env = if t < TONE_ATTACK {
        t / TONE_ATTACK
    } else if t > 1.0 - TONE_RELEASE {
        (1.0 - t) / TONE_RELEASE
    } else {
        1.0
    };
    env.max(0.0)
}

/// Number of samples in a tone of `duration_ms` at `sample_rate`
/// (truncating).
#[inline]
pub fn tone_samples(sample_rate: u32, duration_ms: u32) -> usize {
    (sample_rate as u64 * duration_ms as u64 / 1000) as usize
}

/// Finite sine tone
#[derive(Debug, Clone)]
pub struct ToneGen {
    /// Phase in radians, kept in [0, 2π)
    phase: f32,
    /// Phase increment per sample
    phase_inc: f32,
    /// Index of the next sample
    position: usize,
    total: usize,
}

impl ToneGen {
    /// Create a tone of `total_samples` samples
    ///
    /// # Arguments
    /// * `freq_hz` - Tone frequency in Hz
    /// * `sample_rate` - Output sample rate in Hz (non-zero)
    /// * `total_samples` - Tone length in samples
    pub fn new(freq_hz: u32, sample_rate: u32, total_samples: usize) -> Self {
        Self {
            phase: 0.0,
            phase_inc: TAU * freq_hz as f32 / sample_rate.max(1) as f32,
            position: 0,
            total: total_samples,
        }
    }

    /// Create a tone lasting `duration_ms`
    pub fn with_duration(freq_hz: u32, sample_rate: u32, duration_ms: u32) -> Self {
        Self::new(freq_hz, sample_rate, tone_samples(sample_rate, duration_ms))
    }

    #[inline]
    pub fn total_samples(&self) -> usize {
        self.total
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.total - self.position
    }

    /// Current phase in radians
    #[inline]
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Next sample, `None` once the tone is complete
    #[inline]
    pub fn next_sample(&mut self) -> Option<i16> {
        if self.position >= self.total {
            return None;
        }

        let t = self.position as f32 / self.total as f32;
        let sample = (self.phase.sin() * TONE_AMPLITUDE * envelope(t)) as i16;

        self.position += 1;
        self.phase += self.phase_inc;
        if self.phase >= TAU {
            self.phase %= TAU;
        }

        Some(sample)
    }

    /// Fill `buf` with the next samples, returning how many were produced
    pub fn fill(&mut self, buf: &mut [i16]) -> usize {
        let n = buf.len().min(self.remaining());
        for slot in &mut buf[..n] {
            // n <= remaining, so every call yields a sample
            *slot = self.next_sample().unwrap_or(0);
        }
        n
    }
}

/// Canned feedback sounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeepPattern {
    /// One short mid beep
    Ok,
    /// One long low beep
    Error,
    /// Two short high beeps
    Double,
    /// Three short high beeps
    Triple,
}

impl BeepPattern {
    /// Frequency (Hz)
    pub fn frequency_hz(self) -> u32 {
        match self {
            Self::Ok => 1000,
            Self::Error => 300,
            Self::Double | Self::Triple => 1200,
        }
    }

    /// Length of each beep (ms)
    pub fn beep_ms(self) -> u32 {
        match self {
            Self::Ok => 120,
            Self::Error => 400,
            Self::Double | Self::Triple => 80,
        }
    }

    /// Number of beeps
    pub fn count(self) -> usize {
        match self {
            Self::Ok | Self::Error => 1,
            Self::Double => 2,
            Self::Triple => 3,
        }
    }

    /// Silence between beeps (ms)
    pub fn gap_ms(self) -> u32 {
        80
    }
}

impl<B, S, P> AudioEngine<B, S, P>
where
    B: ControlBus,
    S: SampleStream,
    P: OutputPin,
{
    /// Play a sine tone with attack/release envelope.
    ///
    /// Blocks until the tone and a short silence tail are queued. The first
    /// short write aborts the tone.
    pub fn play_tone(&mut self, frequency_hz: u32, duration_ms: u32) -> Result<(), AudioError> {
        if !self.is_ready() {
            return Err(AudioError::NotInitialized);
        }
        if frequency_hz == 0 {
            return Err(AudioError::InvalidArgument("frequency must be positive"));
        }
        if duration_ms == 0 {
            return Err(AudioError::InvalidArgument("duration must be positive"));
        }

        let mut gen = ToneGen::with_duration(frequency_hz, self.sample_rate(), duration_ms);
        log::debug!(
            "tone: {} Hz, {} ms, {} samples",
            frequency_hz,
            duration_ms,
            gen.total_samples()
        );

        let mut buf = [0i16; TONE_CHUNK_SAMPLES];
        loop {
            let n = gen.fill(&mut buf);
            if n == 0 {
                break;
            }
            self.write_all(&buf[..n])?;
        }

        // Tail is best effort: the tone itself is already queued
        if let Err(e) = self.write_silence(SILENCE_TAIL_SAMPLES) {
            log::debug!("tone: silence tail dropped: {}", e);
        }
        Ok(())
    }

    /// Play one of the canned beep patterns
    pub fn play_beep_pattern(&mut self, pattern: BeepPattern) -> Result<(), AudioError> {
        for i in 0..pattern.count() {
            if i > 0 {
                let gap = tone_samples(self.sample_rate(), pattern.gap_ms());
                self.write_silence(gap)?;
            }
            self.play_tone(pattern.frequency_hz(), pattern.beep_ms())?;
        }
        Ok(())
    }
}
