//! BoxLite Audio - demo entry point
//!
//! On the board: bring up the codecs, beep, meter the microphone for a few
//! seconds with loopback, then record a short clip to SPIFFS and play it
//! back.
//!
//! On the host the same flow runs against the simulated backend, with the
//! microphone looped back from the speaker.
//!
//! # Usage (host)
//!
//! ```bash
//! boxlite-audio-demo --frequency 440 --duration-ms 500 --out tone.wav
//! boxlite-audio-demo --play tone.wav
//! ```

#[cfg(target_os = "espidf")]
fn main() {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!("{}", env!("VERSION_STRING"));

    if let Err(e) = board::run() {
        log::error!("demo aborted: {}", e);
    }
}

#[cfg(target_os = "espidf")]
mod board {
    use std::error::Error;

    use boxlite_audio::config::BOX_LITE_PINS;
    use boxlite_audio::hal::esp::{board_amp, mount_storage, EspControlBus, EspSampleStream, STORAGE_ROOT};
    use boxlite_audio::{AudioConfig, AudioEngine, BeepPattern};
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::gpio::OutputPin as _;
    use esp_idf_svc::hal::peripherals::Peripherals;

    const MONITOR_STEPS: usize = 200;
    const CLIP_SAMPLES: usize = 22_050 * 2;

    pub fn run() -> Result<(), Box<dyn Error>> {
        let p = Peripherals::take()?;

        let bus = EspControlBus::new(p.i2c0, p.pins.gpio8, p.pins.gpio18)?;
        let amp = board_amp(p.pins.gpio46.downgrade_output())?;
        let stream = EspSampleStream::with_pins(BOX_LITE_PINS);

        let mut engine = AudioEngine::new(bus, stream, amp, AudioConfig::default());
        engine.begin()?;
        engine.play_beep_pattern(BeepPattern::Ok)?;

        // Level meter with loopback
        let mut block = [0i16; 256];
        for step in 0..MONITOR_STEPS {
            let reading = engine.monitor_step(&mut block, true);
            if step % 20 == 0 {
                log::info!("mic level {}% ({:.1} dBFS)", reading.level_percent, engine.instant_peak_db());
            }
        }

        mount_storage()?;
        let path = format!("{}/clip.wav", STORAGE_ROOT);

        let mut clip = vec![0i16; CLIP_SAMPLES];
        engine.play_beep_pattern(BeepPattern::Double)?;
        let written = {
            let mut session = engine.start_record(&mut clip)?;
            session.stop()
        };
        log::info!("recorded {} samples", written);

        engine.save_recording_to_storage(&path, &clip[..written])?;
        engine.play_wav_from_storage(&path)?;
        engine.play_beep_pattern(BeepPattern::Triple)?;

        loop {
            FreeRtos::delay_ms(1000);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    host::run()
}

#[cfg(not(target_os = "espidf"))]
mod host {
    use std::error::Error;
    use std::path::PathBuf;

    use clap::Parser;

    use boxlite_audio::hal::sim::{SimBus, SimPin, SimStream};
    use boxlite_audio::{AudioConfig, AudioEngine, BeepPattern};

    #[derive(Parser)]
    #[command(name = "boxlite-audio-demo")]
    #[command(version, about = "BoxLite Audio - simulated codec demo")]
    struct Args {
        /// Tone frequency in Hz
        #[arg(long, short = 'f', default_value = "440")]
        frequency: u32,

        /// Tone length in milliseconds
        #[arg(long, short = 'd', default_value = "500")]
        duration_ms: u32,

        /// Stream sample rate in Hz
        #[arg(long, default_value = "22050")]
        sample_rate: u32,

        /// Where to save the looped-back recording
        #[arg(long, short = 'o', default_value = "recording.wav")]
        out: PathBuf,

        /// WAV file to play after recording
        #[arg(long)]
        play: Option<PathBuf>,
    }

    pub fn run() -> Result<(), Box<dyn Error>> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let args = Args::parse();

        log::info!("{}", env!("VERSION_STRING"));

        let config = AudioConfig::default().with_sample_rate(args.sample_rate);
        let mut engine = AudioEngine::new(SimBus::new(), SimStream::loopback(), SimPin::new(), config);
        engine.begin()?;

        engine.play_beep_pattern(BeepPattern::Ok)?;
        engine.play_tone(args.frequency, args.duration_ms)?;
        log::info!("speaker produced {} samples", engine.stream().played().len());

        let mut clip = vec![0i16; engine.stream().pending_capture()];
        let written = if clip.is_empty() {
            0
        } else {
            let mut session = engine.start_record(&mut clip)?;
            session.stop()
        };
        log::info!("recorded {} samples, peak level {}%", written, boxlite_audio::samples_to_level_percent(&clip[..written]));

        if written > 0 {
            let bytes = engine.save_recording_to_storage(&args.out, &clip[..written])?;
            log::info!("saved {} bytes to {}", bytes, args.out.display());
        }

        if let Some(path) = args.play {
            engine.play_wav_from_storage(&path)?;
            log::info!("played {}", path.display());
        }

        Ok(())
    }
}
