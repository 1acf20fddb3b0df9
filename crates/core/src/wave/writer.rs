use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use super::{full_scale, DecodeError, WaveHeader};

/// Quantises `samples` to little-endian PCM at `bits_per_sample`, clamping
/// to `[-1, 1]` first. 8-bit output is offset to the unsigned range.
pub fn encode_pcm(
    samples: &[f32],
    bits_per_sample: u16,
    out: &mut Vec<u8>,
) -> Result<(), DecodeError> {
    let scale = full_scale(bits_per_sample);
    let quantise = |sample: f32| (f64::from(sample).clamp(-1.0, 1.0) * scale).round();

    match bits_per_sample {
        8 => out.extend(samples.iter().map(|&s| (quantise(s) as i32 + 128) as u8)),
        16 => {
            for &s in samples {
                out.extend_from_slice(&(quantise(s) as i16).to_le_bytes());
            }
        }
        32 => {
            for &s in samples {
                out.extend_from_slice(&(quantise(s) as i32).to_le_bytes());
            }
        }
        other => {
            return Err(DecodeError::UnsupportedFormat(format!("{other}-bit samples")));
        }
    }
    Ok(())
}

/// Writes a canonical PCM WAV stream: 44-byte header followed by the data.
pub fn write_wav_to<W: Write>(
    writer: &mut W,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    samples: &[f32],
) -> Result<(), DecodeError> {
    if channels == 0 || samples.len() % usize::from(channels) != 0 {
        return Err(DecodeError::UnsupportedFormat(format!(
            "{} samples do not fill whole {channels}-channel frames",
            samples.len()
        )));
    }

    let mut data = Vec::with_capacity(samples.len() * usize::from(bits_per_sample / 8));
    encode_pcm(samples, bits_per_sample, &mut data)?;
    let data_size = u32::try_from(data.len())
        .ok()
        .filter(|size| *size <= u32::MAX - 36)
        .ok_or_else(|| DecodeError::UnsupportedFormat("data exceeds RIFF size limit".into()))?;

    let header = WaveHeader::pcm(channels, sample_rate, bits_per_sample, data_size)?;
    header.write_to(writer)?;
    writer.write_all(&data)?;
    writer.flush()?;
    Ok(())
}

/// Creates (or truncates) `path` and writes `samples` to it as PCM.
pub fn write_wav(
    path: impl AsRef<Path>,
    channels: u16,
    sample_rate: u32,
    bits_per_sample: u16,
    samples: &[f32],
) -> Result<(), DecodeError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_wav_to(&mut writer, channels, sample_rate, bits_per_sample, samples)
}
