//! Module: config
//!
//! Purpose: Engine defaults, timing constants and the Box-Lite wiring.
//!
//! All values are compile-time constants except [`AudioConfig`], which the
//! caller hands to [`AudioEngine::new`](crate::AudioEngine::new).

use core::time::Duration;

/// Default stream sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

/// Default speaker volume (0-100%).
pub const DEFAULT_VOLUME_PERCENT: u8 = 65;

/// Default microphone analog gain in dB.
pub const DEFAULT_MIC_GAIN_DB: f32 = 24.0;

/// Upper bound for a single control-bus transaction.
pub const BUS_TIMEOUT: Duration = Duration::from_millis(100);

/// Samples synthesized per tone write.
pub const TONE_CHUNK_SAMPLES: usize = 256;

/// Silence written after a tone or container to flush the DMA ring.
pub const SILENCE_TAIL_SAMPLES: usize = 128;

/// Samples streamed per container write.
pub const CONTAINER_CHUNK_SAMPLES: usize = 512;

/// Peak amplitude of synthesized tones (~37% of full scale).
pub const TONE_AMPLITUDE: f32 = 12_000.0;

/// Fraction of a tone spent ramping up.
pub const TONE_ATTACK: f32 = 0.08;

/// Fraction of a tone spent ramping down.
pub const TONE_RELEASE: f32 = 0.15;

/// Samples captured per meter reading.
pub const METER_BLOCK_SAMPLES: usize = 64;

/// Meter capture timeout. Keeps the UI loop responsive on a quiet mic.
pub const METER_TIMEOUT: Duration = Duration::from_millis(10);

/// Largest read issued per recording step.
pub const RECORD_CHUNK_SAMPLES: usize = 256;

/// Per-chunk recording timeout.
pub const RECORD_TIMEOUT: Duration = Duration::from_millis(50);

/// Engine configuration applied by `begin()`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioConfig {
    /// Stream sample rate in Hz (shared by both directions)
    pub sample_rate: u32,
    /// Initial speaker volume (0-100%)
    pub volume_percent: u8,
    /// Initial microphone gain in dB
    pub mic_gain_db: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            volume_percent: DEFAULT_VOLUME_PERCENT,
            mic_gain_db: DEFAULT_MIC_GAIN_DB,
        }
    }
}

impl AudioConfig {
    /// Same defaults with another sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }
}

/// ESP32-S3-Box-Lite audio wiring (GPIO numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardPins {
    pub i2c_sda: i32,
    pub i2c_scl: i32,
    pub i2s_mclk: i32,
    pub i2s_bclk: i32,
    pub i2s_ws: i32,
    pub i2s_dout: i32,
    pub i2s_din: i32,
    /// Power amplifier enable, active high
    pub power_amp: i32,
}

/// Pin map of the production board.
pub const BOX_LITE_PINS: BoardPins = BoardPins {
    i2c_sda: 8,
    i2c_scl: 18,
    i2s_mclk: 2,
    i2s_bclk: 17,
    i2s_ws: 47,
    i2s_dout: 15,
    i2s_din: 16,
    power_amp: 46,
};

/// Control-bus clock in Hz.
pub const I2C_CLOCK_HZ: u32 = 100_000;
