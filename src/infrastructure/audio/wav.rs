use crate::domain::voice::{AudioFormat, SynthesizedAudio};
use crate::error::{AppError, AppResult};
use hound::{SampleFormat, WavReader};
use std::io::{Cursor, Read};
use std::path::Path;

/// Split a WAV container into its frame layout and raw little-endian PCM
pub fn read_wav<R: Read>(reader: R) -> AppResult<SynthesizedAudio> {
    let mut reader = WavReader::new(reader)?;
    let spec = reader.spec();
    let width = spec.bits_per_sample.div_ceil(8);
    let mut pcm = Vec::with_capacity(reader.len() as usize * usize::from(width));

    match (spec.sample_format, spec.bits_per_sample) {
        // 8-bit WAV is unsigned on disk, hound hands it out shifted to i8
        (SampleFormat::Int, 8) => {
            for sample in reader.samples::<i8>() {
                pcm.push((i16::from(sample?) + 128) as u8);
            }
        }
        (SampleFormat::Int, 16) => {
            for sample in reader.samples::<i16>() {
                pcm.extend_from_slice(&sample?.to_le_bytes());
            }
        }
        (SampleFormat::Int, 24) => {
            for sample in reader.samples::<i32>() {
                pcm.extend_from_slice(&sample?.to_le_bytes()[..3]);
            }
        }
        (SampleFormat::Int, 32) => {
            for sample in reader.samples::<i32>() {
                pcm.extend_from_slice(&sample?.to_le_bytes());
            }
        }
        (SampleFormat::Float, 32) => {
            for sample in reader.samples::<f32>() {
                pcm.extend_from_slice(&sample?.to_le_bytes());
            }
        }
        (format, bits) => {
            return Err(AppError::Backend(format!(
                "Unsupported WAV sample format: {:?} {}-bit",
                format, bits
            )));
        }
    }

    Ok(SynthesizedAudio {
        format: AudioFormat {
            rate: spec.sample_rate,
            width,
            channels: spec.channels,
        },
        pcm,
    })
}

pub fn read_wav_bytes(bytes: &[u8]) -> AppResult<SynthesizedAudio> {
    read_wav(Cursor::new(bytes))
}

pub async fn read_wav_file(path: &Path) -> AppResult<SynthesizedAudio> {
    let bytes = tokio::fs::read(path).await?;
    read_wav_bytes(&bytes)
}
