//! Peak level metering.
//!
//! Levels are advisory: a capture that times out reads as silence
//! instead of an error.

use embedded_hal::digital::OutputPin;

use super::engine::AudioEngine;
use crate::config::{METER_BLOCK_SAMPLES, METER_TIMEOUT};
use crate::hal::bus::ControlBus;
use crate::hal::i2s::SampleStream;

/// Full-scale positive sample value
pub const FULL_SCALE: u32 = i16::MAX as u32;

/// dBFS reported for silence or a failed capture
pub const SILENCE_DB: f32 = -120.0;

/// Largest absolute sample value (`-32768` counts as 32768)
#[inline]
pub fn peak(samples: &[i16]) -> u32 {
    samples
        .iter()
        .map(|s| s.unsigned_abs() as u32)
        .max()
        .unwrap_or(0)
}

/// Peak level as 0-100% of full scale
#[inline]
pub fn samples_to_level_percent(samples: &[i16]) -> u8 {
    (peak(samples) * 100 / FULL_SCALE).min(100) as u8
}

/// Peak in dBFS, floored at [`SILENCE_DB`] and capped at 0
#[inline]
pub fn peak_to_dbfs(peak: u32) -> f32 {
    if peak == 0 {
        return SILENCE_DB;
    }
    (20.0 * (peak as f32 / FULL_SCALE as f32).log10()).min(0.0)
}

/// Result of one monitor step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorReading {
    /// Samples captured
    pub samples: usize,
    /// Peak level of the captured block (0-100%)
    pub level_percent: u8,
    /// Samples echoed back to the speaker
    pub echoed: usize,
}

impl<B, S, P> AudioEngine<B, S, P>
where
    B: ControlBus,
    S: SampleStream,
    P: OutputPin,
{
    /// Short capture for the meters; returns the block peak
    fn capture_peak(&mut self) -> Option<u32> {
        let mut block = [0i16; METER_BLOCK_SAMPLES];
        let n = self.read_samples_timeout(&mut block, Some(METER_TIMEOUT));
        if n == 0 {
            return None;
        }
        Some(peak(&block[..n]))
    }

    /// Current microphone level (0-100%), 0 if nothing could be captured
    pub fn instant_level_percent(&mut self) -> u8 {
        match self.capture_peak() {
            Some(p) => (p * 100 / FULL_SCALE).min(100) as u8,
            None => 0,
        }
    }

    /// Current microphone peak in dBFS, [`SILENCE_DB`] if silent or failed
    pub fn instant_peak_db(&mut self) -> f32 {
        peak_to_dbfs(self.capture_peak().unwrap_or(0))
    }

    /// Capture one block into `buf` and meter it, optionally echoing the
    /// block to the speaker (loopback).
    pub fn monitor_step(&mut self, buf: &mut [i16], echo: bool) -> MonitorReading {
        let samples = self.read_samples(buf);
        let level_percent = samples_to_level_percent(&buf[..samples]);
        let echoed = if echo && samples > 0 {
            self.write_samples(&buf[..samples])
        } else {
            0
        };
        MonitorReading {
            samples,
            level_percent,
            echoed,
        }
    }
}
