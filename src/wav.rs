//! RIFF/WAVE container codec.
//!
//! Decoding scans the chunk list of an in-memory file and reports where
//! the PCM payload lives; it never copies and never reads past the slice.
//! Encoding writes the canonical 44-byte mono 16-bit PCM header followed
//! by the samples.
//!
//! Layout written by [`write_container`]:
//! ```text
//! [0-3]    "RIFF"
//! [4-7]    36 + data_size
//! [8-11]   "WAVE"
//! [12-15]  "fmt "
//! [16-19]  16 (PCM format chunk size)
//! [20-21]  1 (PCM format code)
//! [22-23]  1 (channels)
//! [24-27]  sample_rate
//! [28-31]  byte_rate = sample_rate * 2
//! [32-33]  block_align = 2
//! [34-35]  16 (bits per sample)
//! [36-39]  "data"
//! [40-43]  data_size = samples * 2
//! ```
//! All integers little-endian.

use std::io::{self, Write};

/// Size of the canonical header in bytes
pub const HEADER_LEN: usize = 44;

/// Offset of the first chunk after "RIFF" size "WAVE"
const FIRST_CHUNK: usize = 12;

/// Minimum `fmt ` body we understand (PCM)
const FMT_BODY_LEN: usize = 16;

/// Structural view of a RIFF/WAVE buffer.
///
/// Offsets refer to the buffer that was parsed; the descriptor does not
/// own it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WavDescriptor {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Byte offset of the `data` payload
    pub data_offset: usize,
    /// Declared payload length in bytes
    pub data_len: usize,
    /// Both `fmt ` and `data` chunks were found
    pub valid: bool,
}

#[inline]
fn le_u16(bytes: &[u8], at: usize) -> Option<u16> {
    let b = bytes.get(at..at.checked_add(2)?)?;
    Some(u16::from_le_bytes([b[0], b[1]]))
}

#[inline]
fn le_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let b = bytes.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

impl WavDescriptor {
    /// Parse `bytes`. Malformed input gives `valid == false`.
    pub fn parse(bytes: &[u8]) -> Self {
        let mut desc = Self::default();
        if bytes.len() < HEADER_LEN || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return desc;
        }

        let mut found_fmt = false;
        let mut found_data = false;
        let mut offset = FIRST_CHUNK;

        while let (Some(id), Some(size)) = (
            offset.checked_add(4).and_then(|end| bytes.get(offset..end)),
            offset.checked_add(4).and_then(|at| le_u32(bytes, at)),
        ) {
            let size = size as usize;
            let body = offset + 8;

            match id {
                b"fmt " if !found_fmt && size >= FMT_BODY_LEN => {
                    if let (Some(channels), Some(rate), Some(bits)) = (
                        le_u16(bytes, body + 2),
                        le_u32(bytes, body + 4),
                        le_u16(bytes, body + 14),
                    ) {
                        desc.channels = channels;
                        desc.sample_rate = rate;
                        desc.bits_per_sample = bits;
                        found_fmt = true;
                    }
                }
                b"data" if !found_data => {
                    desc.data_offset = body;
                    desc.data_len = size;
                    found_data = true;
                }
                _ => {}
            }

            // Chunks are word aligned: odd sizes carry one pad byte
            match body.checked_add(size).and_then(|end| end.checked_add(size & 1)) {
                Some(next) => offset = next,
                None => break,
            }
        }

        desc.valid = found_fmt && found_data;
        desc
    }

    /// Payload bytes inside `bytes`, `None` if invalid or out of bounds
    pub fn payload<'a>(&self, bytes: &'a [u8]) -> Option<&'a [u8]> {
        if !self.valid {
            return None;
        }
        let end = self.data_offset.checked_add(self.data_len)?;
        bytes.get(self.data_offset..end)
    }

    /// Number of 16-bit samples in the payload (interleaved, all channels)
    pub fn sample_count(&self) -> usize {
        self.data_len / 2
    }
}

/// Parse a RIFF/WAVE buffer.
#[inline]
pub fn parse_container(bytes: &[u8]) -> WavDescriptor {
    WavDescriptor::parse(bytes)
}

/// Decode little-endian 16-bit PCM. A trailing odd byte is ignored.
pub fn pcm_samples(payload: &[u8]) -> impl Iterator<Item = i16> + '_ {
    payload
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
}

/// Canonical mono 16-bit PCM header for `data_len` payload bytes
pub fn container_header(sample_rate: u32, data_len: u32) -> [u8; HEADER_LEN] {
    const CHANNELS: u16 = 1;
    const BITS: u16 = 16;
    let block_align = CHANNELS * BITS / 8;
    let byte_rate = sample_rate.wrapping_mul(block_align as u32);

    let mut header = [0u8; HEADER_LEN];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&data_len.saturating_add(36).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&(FMT_BODY_LEN as u32).to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
    header[22..24].copy_from_slice(&CHANNELS.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&BITS.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_len.to_le_bytes());

    header
}

/// Write `samples` as a mono 16-bit WAV file to `sink`.
///
/// Returns the number of bytes written (header + payload).
pub fn write_container<W: Write>(sink: &mut W, samples: &[i16], sample_rate: u32) -> io::Result<usize> {
    let data_len = samples
        .len()
        .checked_mul(2)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n <= u32::MAX - 36)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "recording too large for RIFF"))?;

    sink.write_all(&container_header(sample_rate, data_len))?;

    let mut buf = [0u8; 1024];
    for chunk in samples.chunks(buf.len() / 2) {
        for (dst, sample) in buf.chunks_exact_mut(2).zip(chunk) {
            dst.copy_from_slice(&sample.to_le_bytes());
        }
        sink.write_all(&buf[..chunk.len() * 2])?;
    }

    Ok(HEADER_LEN + data_len as usize)
}

/// Encode into a fresh buffer
pub fn encode_container(samples: &[i16], sample_rate: u32) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN + samples.len() * 2);
    write_container(&mut out, samples, sample_rate)?;
    Ok(out)
}
