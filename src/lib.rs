//! # BoxLite Audio
//!
//! Audio subsystem for the ESP32-S3-Box-Lite: ES8156 speaker DAC,
//! ES7243E microphone ADC, one shared I2S stream.
//!
//! ## Architecture
//!
//! Everything hangs off one [`AudioEngine`]:
//! - Control bus: register tables and level writes to both codecs
//! - Sample stream: blocking full-duplex PCM at one shared rate
//! - Tone, meter, record and playback build on the stream
//! - [`wav`] and [`storage`] turn samples into files and back
//!
//! Hardware sits behind the traits in [`hal`]; host builds run against
//! the simulated backend in `hal::sim`.

pub mod audio;
pub mod config;
pub mod error;
pub mod hal;
pub mod storage;
pub mod wav;

pub use audio::{samples_to_level_percent, AudioEngine, BeepPattern, MonitorReading, RecordingSession, ToneGen};
pub use config::AudioConfig;
pub use error::AudioError;
pub use hal::{CodecRole, PowerState};
pub use storage::save_recording;
pub use wav::{encode_container, parse_container, write_container, WavDescriptor};
