//! RIFF/WAVE container tests: parsing, encoding, playback

use boxlite_audio::hal::sim::{SimBus, SimPin, SimStream};
use boxlite_audio::wav::{container_header, encode_container, HEADER_LEN};
use boxlite_audio::{parse_container, write_container, AudioConfig, AudioEngine, AudioError, WavDescriptor};

type SimEngine = AudioEngine<SimBus, SimStream, SimPin>;

const TAIL: usize = 128;

fn ready_engine() -> SimEngine {
    let mut engine = AudioEngine::new(SimBus::new(), SimStream::new(), SimPin::new(), AudioConfig::default());
    engine.begin().unwrap();
    engine
}

fn fmt_body(channels: u16, sample_rate: u32, bits: u16) -> Vec<u8> {
    let block_align = channels * bits / 8;
    let mut body = Vec::new();
    body.extend_from_slice(&1u16.to_le_bytes());
    body.extend_from_slice(&channels.to_le_bytes());
    body.extend_from_slice(&sample_rate.to_le_bytes());
    body.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
    body.extend_from_slice(&block_align.to_le_bytes());
    body.extend_from_slice(&bits.to_le_bytes());
    body
}

fn pcm(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// RIFF file from raw chunks; odd-sized chunks get their pad byte
fn riff(chunks: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut body = b"WAVE".to_vec();
    for (id, data) in chunks {
        body.extend_from_slice(*id);
        body.extend_from_slice(&(data.len() as u32).to_le_bytes());
        body.extend_from_slice(data);
        if data.len() % 2 == 1 {
            body.push(0);
        }
    }
    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    out
}

fn ramp(len: usize) -> Vec<i16> {
    (0..len).map(|i| (i as i16).wrapping_mul(37)).collect()
}

#[test]
fn test_encode_then_parse() {
    let samples = ramp(300);
    let bytes = encode_container(&samples, 16000).unwrap();
    assert_eq!(bytes.len(), HEADER_LEN + 600);

    let desc = parse_container(&bytes);
    assert_eq!(
        desc,
        WavDescriptor {
            sample_rate: 16000,
            channels: 1,
            bits_per_sample: 16,
            data_offset: 44,
            data_len: 600,
            valid: true,
        }
    );
    assert_eq!(desc.sample_count(), 300);
    assert_eq!(desc.payload(&bytes).unwrap(), pcm(&samples).as_slice());
}

#[test]
fn test_write_container_reports_bytes() {
    let mut out = Vec::new();
    assert_eq!(write_container(&mut out, &ramp(1000), 22050).unwrap(), 2044);
    assert_eq!(out.len(), 2044);
    assert_eq!(&out[..HEADER_LEN], &container_header(22050, 2000)[..]);
}

#[test]
fn test_hound_reads_our_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ours.wav");
    let samples = ramp(777);

    let mut file = std::fs::File::create(&path).unwrap();
    write_container(&mut file, &samples, 22050).unwrap();
    drop(file);

    let mut reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 22050);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);

    let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(decoded, samples);
}

#[test]
fn test_parse_hound_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hound.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let samples = ramp(500);
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for &s in &samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let desc = parse_container(&bytes);
    assert!(desc.valid);
    assert_eq!(desc.sample_rate, 8000);
    assert_eq!(desc.channels, 1);
    assert_eq!(desc.bits_per_sample, 16);
    assert_eq!(desc.payload(&bytes).unwrap(), pcm(&samples).as_slice());
}

#[test]
fn test_parse_skips_odd_sized_chunk() {
    let samples = ramp(10);
    let bytes = riff(&[
        (b"LIST", vec![1, 2, 3]),
        (b"fmt ", fmt_body(1, 11025, 16)),
        (b"data", pcm(&samples)),
    ]);

    let desc = parse_container(&bytes);
    assert!(desc.valid);
    assert_eq!(desc.sample_rate, 11025);
    assert_eq!(desc.data_offset, 12 + 8 + 4 + 8 + 16 + 8);
    assert_eq!(desc.payload(&bytes).unwrap(), pcm(&samples).as_slice());
}

#[test]
fn test_parse_extended_fmt_chunk() {
    let mut fmt = fmt_body(2, 44100, 16);
    fmt.extend_from_slice(&[0, 0]); // cbSize
    let bytes = riff(&[(b"fmt ", fmt), (b"data", pcm(&ramp(8)))]);

    let desc = parse_container(&bytes);
    assert!(desc.valid);
    assert_eq!(desc.channels, 2);
    assert_eq!(desc.sample_rate, 44100);
}

#[test]
fn test_parse_rejects_malformed() {
    let good = encode_container(&ramp(20), 22050).unwrap();

    assert!(!parse_container(&good[..40]).valid);
    assert!(!parse_container(&[]).valid);

    let mut bad_riff = good.clone();
    bad_riff[0..4].copy_from_slice(b"RIFX");
    assert!(!parse_container(&bad_riff).valid);

    let mut bad_wave = good.clone();
    bad_wave[8..12].copy_from_slice(b"AVI ");
    assert!(!parse_container(&bad_wave).valid);

    let no_data = riff(&[(b"fmt ", fmt_body(1, 22050, 16)), (b"LIST", vec![0; 40])]);
    assert!(!parse_container(&no_data).valid);

    let no_fmt = riff(&[(b"LIST", vec![0; 20]), (b"data", pcm(&ramp(16)))]);
    assert!(!parse_container(&no_fmt).valid);
}

#[test]
fn test_parse_huge_chunk_size_does_not_panic() {
    let mut bytes = riff(&[(b"JUNK", vec![0; 8]), (b"fmt ", fmt_body(1, 22050, 16))]);
    bytes[16..20].copy_from_slice(&u32::MAX.to_le_bytes());
    assert!(!parse_container(&bytes).valid);
}

#[test]
fn test_truncated_payload_is_out_of_bounds() {
    let mut bytes = encode_container(&ramp(50), 22050).unwrap();
    bytes[40..44].copy_from_slice(&1000u32.to_le_bytes());

    let desc = parse_container(&bytes);
    assert!(desc.valid);
    assert_eq!(desc.payload(&bytes), None);

    let mut engine = ready_engine();
    assert!(matches!(engine.play_container(&bytes), Err(AudioError::PayloadOutOfBounds)));
    assert!(engine.stream().write_calls().is_empty());
}

#[test]
fn test_play_streams_in_512_sample_chunks() {
    let samples = ramp(1200);
    let bytes = encode_container(&samples, 22050).unwrap();

    let mut engine = ready_engine();
    engine.play_container(&bytes).unwrap();

    assert_eq!(engine.stream().write_calls(), &[512, 512, 176, TAIL]);
    let played = engine.stream().played();
    assert_eq!(&played[..1200], samples.as_slice());
    assert!(played[1200..].iter().all(|&s| s == 0));
    assert_eq!(engine.stream().rate_history(), &[22050]);
}

#[test]
fn test_play_switches_sample_rate() {
    let bytes = encode_container(&ramp(100), 16000).unwrap();

    let mut engine = ready_engine();
    engine.play_container(&bytes).unwrap();

    assert_eq!(engine.sample_rate(), 16000);
    assert_eq!(engine.stream().rate_history(), &[22050, 16000]);
}

#[test]
fn test_play_rejects_8_bit() {
    let bytes = riff(&[(b"fmt ", fmt_body(1, 8000, 8)), (b"data", vec![0x80; 64])]);

    let mut engine = ready_engine();
    assert!(matches!(engine.play_container(&bytes), Err(AudioError::UnsupportedBitDepth(8))));
    assert_eq!(engine.sample_rate(), 22050);
}

#[test]
fn test_play_rejects_malformed() {
    let mut engine = ready_engine();
    assert!(matches!(engine.play_container(b"not a wav file at all"), Err(AudioError::MalformedContainer)));
}

#[test]
fn test_play_stereo_passes_through() {
    let samples = ramp(64);
    let bytes = riff(&[(b"fmt ", fmt_body(2, 22050, 16)), (b"data", pcm(&samples))]);

    let mut engine = ready_engine();
    engine.play_container(&bytes).unwrap();
    assert_eq!(&engine.stream().played()[..64], samples.as_slice());
}

#[test]
fn test_play_aborts_on_short_write() {
    let bytes = encode_container(&ramp(2000), 22050).unwrap();

    let mut engine = ready_engine();
    engine.stream_mut().limit_writes(700);
    assert!(matches!(
        engine.play_container(&bytes),
        Err(AudioError::ShortTransfer {
            written: 188,
            requested: 512
        })
    ));
    assert_eq!(engine.stream().played().len(), 700);
}

#[test]
fn test_play_before_begin() {
    let bytes = encode_container(&ramp(10), 22050).unwrap();
    let mut engine = AudioEngine::new(SimBus::new(), SimStream::new(), SimPin::new(), AudioConfig::default());
    assert!(matches!(engine.play_container(&bytes), Err(AudioError::NotInitialized)));
}
