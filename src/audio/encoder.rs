use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;

use super::device::AudioFragment;
use crate::error::CaptureError;

/// PCM audio recovered from a WAV container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }
}

/// Concatenate fragments, in order, into a single 16-bit PCM WAV blob.
///
/// The format is taken from the first fragment; every fragment must match it.
pub fn encode_wav(fragments: &[AudioFragment]) -> Result<Vec<u8>, CaptureError> {
    let first = match fragments.iter().find(|f| !f.samples.is_empty()) {
        Some(f) => f,
        None => return Err(CaptureError::EmptyCapture),
    };

    let spec = WavSpec {
        channels: first.channels,
        sample_rate: first.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(device_error)?;

        for fragment in fragments {
            if fragment.samples.is_empty() {
                continue;
            }
            if fragment.sample_rate != spec.sample_rate || fragment.channels != spec.channels {
                return Err(CaptureError::DeviceError(format!(
                    "fragment format changed mid-capture: {}Hz/{}ch, expected {}Hz/{}ch",
                    fragment.sample_rate, fragment.channels, spec.sample_rate, spec.channels
                )));
            }
            for &sample in &fragment.samples {
                writer.write_sample(sample).map_err(device_error)?;
            }
        }

        writer.finalize().map_err(device_error)?;
    }

    Ok(cursor.into_inner())
}

/// Decode a 16-bit PCM WAV blob
pub fn decode_wav(bytes: &[u8]) -> Result<DecodedAudio> {
    let reader = WavReader::new(Cursor::new(bytes)).context("Failed to parse WAV container")?;
    let spec = reader.spec();

    if spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int {
        anyhow::bail!(
            "Unsupported WAV sample format: {} bits {:?}",
            spec.bits_per_sample,
            spec.sample_format
        );
    }

    let samples = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read audio samples")?;

    Ok(DecodedAudio {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

fn device_error(e: hound::Error) -> CaptureError {
    CaptureError::DeviceError(e.to_string())
}
