//! WAV file I/O
//!
//! Loads WAV files into `Waveform`s (any channel count, integer or float
//! samples) and writes them back as 32-bit float or integer PCM. Sample
//! rates are passed through untouched; augmentation never resamples the
//! file itself.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::engine::buffer::Waveform;
use crate::error::{AugmentError, Result};

/// Audio loaded from disk
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAudio {
    pub waveform: Waveform,
    pub sample_rate: u32,
}

/// Import a WAV file
///
/// # Errors
/// * `InvalidAudio` - If the file is missing, is not a valid WAV file, or
///   holds no samples
pub fn import_wav(path: &Path) -> Result<LoadedAudio> {
    let reader = WavReader::open(path).map_err(|e| AugmentError::InvalidAudio {
        reason: format!("Failed to open WAV file {}: {}", path.display(), e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    let samples = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;

    if samples.is_empty() {
        return Err(AugmentError::InvalidAudio {
            reason: format!("{} contains no samples", path.display()),
            source: None,
        });
    }

    Ok(LoadedAudio {
        waveform: Waveform::from_interleaved(&samples, channels)?,
        sample_rate: spec.sample_rate,
    })
}

/// Export a waveform to a WAV file
///
/// # Arguments
/// * `waveform` - Audio to write
/// * `sample_rate` - Sample rate written to the header
/// * `bit_depth` - 16, 24 (integer PCM) or 32 (float)
pub fn export_wav(path: &Path, waveform: &Waveform, sample_rate: u32, bit_depth: u16) -> Result<()> {
    if !matches!(bit_depth, 16 | 24 | 32) {
        return Err(AugmentError::invalid_parameter(
            "bit_depth",
            bit_depth,
            "16, 24 or 32",
        ));
    }

    let spec = WavSpec {
        channels: waveform.num_channels() as u16,
        sample_rate,
        bits_per_sample: bit_depth,
        sample_format: if bit_depth == 32 {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };

    let interleaved = waveform.to_interleaved();
    let mut writer = WavWriter::create(path, spec)?;

    match bit_depth {
        16 => {
            for sample in interleaved {
                writer.write_sample((sample * 32767.0).clamp(-32768.0, 32767.0) as i16)?;
            }
        }
        24 => {
            for sample in interleaved {
                // 24-bit stored as i32 in hound
                writer.write_sample((sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32)?;
            }
        }
        _ => {
            for sample in interleaved {
                writer.write_sample(sample)?;
            }
        }
    }

    writer.finalize()?;
    Ok(())
}

// ============================================================================
// Internal helper functions
// ============================================================================

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let samples = match (sample_format, bits_per_sample) {
        (SampleFormat::Float, _) => reader.samples::<f32>().collect::<std::result::Result<Vec<_>, _>>(),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect(),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect(),
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect(),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect(),
        (SampleFormat::Int, bits) => {
            return Err(AugmentError::InvalidAudio {
                reason: format!("{}-bit integer audio is not supported", bits),
                source: None,
            })
        }
    };

    samples.map_err(|e| AugmentError::InvalidAudio {
        reason: format!("Failed to read samples: {}", e),
        source: Some(Box::new(e)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_float_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roundtrip.wav");
        let waveform =
            Waveform::from_channels(vec![vec![0.25, -0.5, 0.75], vec![0.0, 0.1, -0.1]]).unwrap();

        export_wav(&path, &waveform, 22050, 32).unwrap();
        let loaded = import_wav(&path).unwrap();

        assert_eq!(loaded.sample_rate, 22050);
        assert_eq!(loaded.waveform, waveform);
    }

    #[test]
    fn test_16_bit_roundtrip_is_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pcm16.wav");
        let waveform = Waveform::mono(vec![0.5, -0.5, 0.0, 0.9]);

        export_wav(&path, &waveform, 16000, 16).unwrap();
        let loaded = import_wav(&path).unwrap();

        for (a, b) in loaded.waveform.iter_samples().zip(waveform.iter_samples()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_unsupported_bit_depth() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.wav");
        let err = export_wav(&path, &Waveform::mono(vec![0.0]), 16000, 12).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_missing_file() {
        let err = import_wav(Path::new("/definitely/not/here.wav")).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AUDIO");
    }
}
