//! Audio engine and signal processing
//!
//! Architecture:
//! - Engine: owns bus, stream, amplifier line and both codecs
//! - Tone: phase accumulator + attack/release envelope, 256-sample chunks
//! - Meter: peak level as percent and dBFS
//! - Record: bounded capture into a borrowed buffer
//! - Playback: RIFF/WAVE payload streamed in 512-sample chunks

pub mod engine;
pub mod meter;
pub mod playback;
pub mod record;
pub mod tone;

pub use engine::{AudioEngine, StreamSession};
pub use meter::{samples_to_level_percent, MonitorReading};
pub use record::RecordingSession;
pub use tone::{BeepPattern, ToneGen};
