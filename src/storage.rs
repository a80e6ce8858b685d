//! File adapters around the container codec.
//!
//! Whole files are read into memory or written in one pass; on the board
//! the paths live on the SPIFFS mount.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use embedded_hal::digital::OutputPin;

use crate::audio::AudioEngine;
use crate::error::AudioError;
use crate::hal::bus::ControlBus;
use crate::hal::i2s::SampleStream;
use crate::wav::write_container;

/// Save `samples` as a mono 16-bit WAV file.
///
/// Returns the bytes written.
pub fn save_recording(path: impl AsRef<Path>, samples: &[i16], sample_rate: u32) -> Result<usize, AudioError> {
    if samples.is_empty() {
        return Err(AudioError::InvalidArgument("no samples to save"));
    }
    let path = path.as_ref();
    let file = File::create(path)?;
    let written = save_into(path, BufWriter::new(file), samples, sample_rate)?;
    log::info!("storage: saved {} samples to {}", samples.len(), path.display());
    Ok(written)
}

/// Write the container to `sink` (already open on `path`). On failure the
/// partial file at `path` is removed.
fn save_into<W: Write>(path: &Path, mut sink: W, samples: &[i16], sample_rate: u32) -> Result<usize, AudioError> {
    let result = write_container(&mut sink, samples, sample_rate).and_then(|n| sink.flush().map(|_| n));
    drop(sink);
    result.map_err(|e| {
        if let Err(rm) = fs::remove_file(path) {
            log::warn!("storage: partial {} left behind: {}", path.display(), rm);
        }
        AudioError::Storage(e)
    })
}

impl<B, S, P> AudioEngine<B, S, P>
where
    B: ControlBus,
    S: SampleStream,
    P: OutputPin,
{
    /// Load a WAV file and play it
    pub fn play_wav_from_storage(&mut self, path: impl AsRef<Path>) -> Result<(), AudioError> {
        if !self.is_ready() {
            return Err(AudioError::NotInitialized);
        }
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        log::debug!("storage: loaded {} bytes from {}", bytes.len(), path.display());
        self.play_container(&bytes)
    }

    /// Save a recording at the current stream rate
    pub fn save_recording_to_storage(&self, path: impl AsRef<Path>, samples: &[i16]) -> Result<usize, AudioError> {
        save_recording(path, samples, self.sample_rate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Accepts `budget` bytes, then fails every write
    struct FullDisk {
        budget: usize,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "no space left"));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        File::create(&path).unwrap();

        let result = save_into(&path, FullDisk { budget: 100 }, &[1000; 512], 22050);
        assert!(matches!(result, Err(AudioError::Storage(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_successful_write_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let file = File::create(&path).unwrap();

        assert_eq!(save_into(&path, BufWriter::new(file), &[7; 10], 8000).unwrap(), 64);
        assert_eq!(fs::metadata(&path).unwrap().len(), 64);
    }
}
