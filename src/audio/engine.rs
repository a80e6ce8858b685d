//! Audio engine: codec lifecycle and the shared sample stream.
//!
//! The engine is the single owner of the control bus, the sample stream,
//! the amplifier line and both codecs. Everything runs on the caller's
//! thread; a port that shares the engine between tasks wraps the whole
//! engine in one mutex.
//!
//! # Bring-up order
//!
//! ```text
//! PA low -> bus init -> stream install -> ES8156 table -> ES8156 start
//!        -> PA high -> ES7243E table -> volume + gain
//! ```
//!
//! The first failing step aborts `begin()`; earlier steps are not undone.

use core::time::Duration;

use embedded_hal::digital::OutputPin;

use crate::config::{AudioConfig, CONTAINER_CHUNK_SAMPLES, TONE_CHUNK_SAMPLES};
use crate::error::AudioError;
use crate::hal::bus::ControlBus;
use crate::hal::codec::{CodecDevice, CodecRole};
use crate::hal::es7243e::Es7243e;
use crate::hal::es8156::Es8156;
use crate::hal::i2s::SampleStream;

/// Shared clock of the sample stream.
///
/// Capture and playback always run at `sample_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSession {
    sample_rate: u32,
    chunk_samples: usize,
}

impl StreamSession {
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Block size used by chunked transfers
    #[inline]
    pub fn chunk_samples(&self) -> usize {
        self.chunk_samples
    }
}

/// Audio subsystem context
pub struct AudioEngine<B, S, P> {
    bus: B,
    stream: S,
    amp: P,
    output: Es8156,
    input: Es7243e,
    session: StreamSession,
    initialized: bool,
    muted: bool,
}

impl<B, S, P> AudioEngine<B, S, P>
where
    B: ControlBus,
    S: SampleStream,
    P: OutputPin,
{
    /// Create the engine. No hardware is touched until [`begin`](Self::begin).
    pub fn new(bus: B, stream: S, amp: P, config: AudioConfig) -> Self {
        Self {
            bus,
            stream,
            amp,
            output: Es8156::new(config.volume_percent),
            input: Es7243e::new(config.mic_gain_db),
            session: StreamSession {
                sample_rate: config.sample_rate,
                chunk_samples: TONE_CHUNK_SAMPLES,
            },
            initialized: false,
            muted: false,
        }
    }

    /// Bring up bus, stream and both codecs.
    ///
    /// Returns immediately if already initialized. After a failure the
    /// caller simply calls `begin()` again; the whole sequence reruns.
    pub fn begin(&mut self) -> Result<(), AudioError> {
        if self.initialized {
            return Ok(());
        }

        if self.session.sample_rate == 0 {
            return Err(AudioError::InvalidArgument("sample rate must be non-zero"));
        }
        log::info!("audio: bring-up at {} Hz", self.session.sample_rate);

        // 1. Amplifier off while the DAC is configured
        self.amp.set_low().map_err(|_| AudioError::AmpLine)?;

        // 2. Control bus
        self.bus.init()?;

        // 3. Sample stream at the configured rate
        self.stream.install(self.session.sample_rate)?;

        // 4-5. Output codec, then amplifier
        self.output.configure(&mut self.bus)?;
        self.output.start(&mut self.bus)?;
        self.amp.set_high().map_err(|_| AudioError::AmpLine)?;
        self.muted = false;

        // 6. Input codec
        self.input.configure(&mut self.bus)?;

        // 7. Levels
        let volume = self.output.volume();
        self.output.set_volume(&mut self.bus, volume)?;
        let gain = self.input.gain_db();
        self.input.set_gain(&mut self.bus, gain)?;

        self.initialized = true;
        log::info!("audio: ready (volume {}%, mic gain {} dB)", volume, gain);
        Ok(())
    }

    #[inline]
    fn ensure_ready(&self) -> Result<(), AudioError> {
        if self.initialized {
            Ok(())
        } else {
            Err(AudioError::NotInitialized)
        }
    }

    /// True after a successful `begin()`
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.initialized
    }

    /// Current stream sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.session.sample_rate
    }

    #[inline]
    pub fn session(&self) -> StreamSession {
        self.session
    }

    /// Speaker volume (0-100%)
    #[inline]
    pub fn volume_percent(&self) -> u8 {
        self.output.volume()
    }

    /// Last requested microphone gain in dB
    #[inline]
    pub fn input_gain_db(&self) -> f32 {
        self.input.gain_db()
    }

    #[inline]
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Codec serving `role`
    pub fn codec(&self, role: CodecRole) -> &CodecDevice {
        match role {
            CodecRole::Output => self.output.device(),
            CodecRole::Input => self.input.device(),
        }
    }

    /// Set speaker volume. `percent` above 100 clamps to 100.
    pub fn set_output_volume_percent(&mut self, percent: u8) -> Result<(), AudioError> {
        self.ensure_ready()?;
        self.output.set_volume(&mut self.bus, percent)?;
        Ok(())
    }

    /// Set microphone gain; the nearest PGA step is programmed.
    pub fn set_input_gain_db(&mut self, db: f32) -> Result<(), AudioError> {
        self.ensure_ready()?;
        if db.is_nan() {
            return Err(AudioError::InvalidArgument("gain must be a number"));
        }
        self.input.set_gain(&mut self.bus, db)?;
        Ok(())
    }

    /// Mute or unmute via the amplifier line. Volume is left alone.
    pub fn set_mute(&mut self, mute: bool) -> Result<(), AudioError> {
        self.ensure_ready()?;
        let result = if mute { self.amp.set_low() } else { self.amp.set_high() };
        result.map_err(|_| AudioError::AmpLine)?;
        self.muted = mute;
        log::debug!("audio: mute {}", mute);
        Ok(())
    }

    /// Flip mute, returning the new state
    pub fn toggle_mute(&mut self) -> Result<bool, AudioError> {
        let mute = !self.muted;
        self.set_mute(mute)?;
        Ok(mute)
    }

    /// Reprogram the shared clock for both directions.
    pub fn set_sample_rate(&mut self, hz: u32) -> Result<(), AudioError> {
        self.ensure_ready()?;
        if hz == 0 {
            return Err(AudioError::InvalidArgument("sample rate must be non-zero"));
        }
        if hz == self.session.sample_rate {
            return Ok(());
        }
        self.stream.set_sample_rate(hz)?;
        log::info!("audio: sample rate {} -> {} Hz", self.session.sample_rate, hz);
        self.session.sample_rate = hz;
        Ok(())
    }

    /// Read one codec register (diagnostics)
    pub fn read_codec_register(&mut self, role: CodecRole, reg: u8) -> Result<u8, AudioError> {
        self.ensure_ready()?;
        let address = self.codec(role).address();
        Ok(self.bus.read_register(address, reg)?)
    }

    /// Blocking capture into `buf`.
    ///
    /// Returns the samples read: 0 before `begin()`, for an empty buffer,
    /// or on a stream error.
    pub fn read_samples(&mut self, buf: &mut [i16]) -> usize {
        self.read_samples_timeout(buf, None)
    }

    pub(crate) fn read_samples_timeout(&mut self, buf: &mut [i16], timeout: Option<Duration>) -> usize {
        if !self.initialized || buf.is_empty() {
            return 0;
        }
        match self.stream.read(buf, timeout) {
            Ok(n) => n,
            Err(e) => {
                log::debug!("audio: read failed: {}", e);
                0
            }
        }
    }

    /// Blocking playback of `buf`.
    ///
    /// Returns once every sample is queued or the stream stops accepting;
    /// the count tells which.
    pub fn write_samples(&mut self, buf: &[i16]) -> usize {
        if !self.initialized || buf.is_empty() {
            return 0;
        }
        let mut written = 0;
        while written < buf.len() {
            match self.stream.write(&buf[written..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(e) => {
                    log::debug!("audio: write failed: {}", e);
                    break;
                }
            }
        }
        written
    }

    /// Write `buf` in full or fail
    pub(crate) fn write_all(&mut self, buf: &[i16]) -> Result<(), AudioError> {
        let written = self.write_samples(buf);
        if written != buf.len() {
            log::warn!("audio: short write {}/{}", written, buf.len());
            return Err(AudioError::ShortTransfer {
                written,
                requested: buf.len(),
            });
        }
        Ok(())
    }

    /// Write `samples` zeros
    pub(crate) fn write_silence(&mut self, samples: usize) -> Result<(), AudioError> {
        const ZEROS: [i16; CONTAINER_CHUNK_SAMPLES] = [0; CONTAINER_CHUNK_SAMPLES];
        let mut left = samples;
        while left > 0 {
            let n = left.min(ZEROS.len());
            self.write_all(&ZEROS[..n])?;
            left -= n;
        }
        Ok(())
    }

    /// Control bus (for inspection)
    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Sample stream (for inspection)
    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Amplifier enable line
    pub fn amp_line(&self) -> &P {
        &self.amp
    }

    /// Tear down the engine, returning the hardware handles
    pub fn into_parts(self) -> (B, S, P) {
        (self.bus, self.stream, self.amp)
    }
}
