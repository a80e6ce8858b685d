//! Storage adapter tests (files in a temp directory)

use std::io::ErrorKind;

use boxlite_audio::hal::sim::{SimBus, SimPin, SimStream};
use boxlite_audio::{parse_container, save_recording, AudioConfig, AudioEngine, AudioError};

type SimEngine = AudioEngine<SimBus, SimStream, SimPin>;

fn ready_engine() -> SimEngine {
    let mut engine = AudioEngine::new(SimBus::new(), SimStream::new(), SimPin::new(), AudioConfig::default());
    engine.begin().unwrap();
    engine
}

fn ramp(len: usize) -> Vec<i16> {
    (0..len).map(|i| ((i * 97) % 20000) as i16 - 10000).collect()
}

#[test]
fn test_save_then_play() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    let samples = ramp(1500);

    assert_eq!(save_recording(&path, &samples, 22050).unwrap(), 44 + 3000);
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 3044);

    let mut engine = ready_engine();
    engine.play_wav_from_storage(&path).unwrap();
    assert_eq!(&engine.stream().played()[..1500], samples.as_slice());
}

#[test]
fn test_save_uses_engine_rate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rate.wav");

    let mut engine = ready_engine();
    engine.set_sample_rate(16000).unwrap();
    engine.save_recording_to_storage(&path, &ramp(64)).unwrap();

    let reader = hound::WavReader::open(&path).unwrap();
    assert_eq!(reader.spec().sample_rate, 16000);
    assert_eq!(reader.len(), 64);
}

#[test]
fn test_save_recorded_clip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rec.wav");

    let mut engine = AudioEngine::new(SimBus::new(), SimStream::loopback(), SimPin::new(), AudioConfig::default());
    engine.begin().unwrap();
    engine.play_tone(880, 40).unwrap();

    let mut clip = vec![0i16; 2048];
    let written = engine.start_record(&mut clip).unwrap().stop();
    engine.save_recording_to_storage(&path, &clip[..written]).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let desc = parse_container(&bytes);
    assert!(desc.valid);
    assert_eq!(desc.sample_count(), written);
    assert_eq!(desc.sample_rate, 22050);
}

#[test]
fn test_save_rejects_empty_recording() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.wav");

    assert!(matches!(save_recording(&path, &[], 22050), Err(AudioError::InvalidArgument(_))));
    assert!(!path.exists());
}

#[test]
fn test_save_into_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("clip.wav");

    match save_recording(&path, &ramp(8), 22050) {
        Err(AudioError::Storage(e)) => assert_eq!(e.kind(), ErrorKind::NotFound),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_play_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = ready_engine();

    match engine.play_wav_from_storage(dir.path().join("nope.wav")) {
        Err(AudioError::Storage(e)) => assert_eq!(e.kind(), ErrorKind::NotFound),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_play_from_storage_before_begin() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.wav");
    save_recording(&path, &ramp(8), 22050).unwrap();

    let mut engine = AudioEngine::new(SimBus::new(), SimStream::new(), SimPin::new(), AudioConfig::default());
    assert!(matches!(engine.play_wav_from_storage(&path), Err(AudioError::NotInitialized)));
}

#[test]
fn test_play_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.wav");
    std::fs::write(&path, vec![0u8; 128]).unwrap();

    let mut engine = ready_engine();
    assert!(matches!(engine.play_wav_from_storage(&path), Err(AudioError::MalformedContainer)));
}
