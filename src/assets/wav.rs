use std::io::Cursor;
use std::time::Duration;

use crate::foundation::error::{ScriptcastError, ScriptcastResult};

/// Wrap raw little-endian 16-bit PCM into a WAV file.
pub fn pcm16_to_wav(pcm_le: &[u8], sample_rate: u32, channels: u16) -> ScriptcastResult<Vec<u8>> {
    if sample_rate == 0 || channels == 0 {
        return Err(ScriptcastError::validation(
            "wav sample_rate and channels must be non-zero",
        ));
    }
    let block_align = usize::from(channels) * 2;
    if !pcm_le.len().is_multiple_of(block_align) {
        return Err(ScriptcastError::validation(
            "pcm byte length is not aligned to whole sample frames",
        ));
    }

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut out = Vec::with_capacity(44 + pcm_le.len());
    let mut writer = hound::WavWriter::new(Cursor::new(&mut out), spec)
        .map_err(|e| ScriptcastError::validation(format!("wav header write failed: {e}")))?;
    for sample in pcm_le.chunks_exact(2) {
        writer
            .write_sample(i16::from_le_bytes([sample[0], sample[1]]))
            .map_err(|e| ScriptcastError::validation(format!("wav sample write failed: {e}")))?;
    }
    writer
        .finalize()
        .map_err(|e| ScriptcastError::validation(format!("wav finalize failed: {e}")))?;
    Ok(out)
}

/// Playback duration of a WAV file: sample frames over the sample rate.
pub fn wav_duration(bytes: &[u8]) -> ScriptcastResult<Duration> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| ScriptcastError::validation(format!("not a readable wav file: {e}")))?;
    let rate = reader.spec().sample_rate;
    if rate == 0 {
        return Err(ScriptcastError::validation("wav sample rate is zero"));
    }
    let nanos = u128::from(reader.duration()) * 1_000_000_000 / u128::from(rate);
    Ok(Duration::from_nanos(nanos as u64))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/wav.rs"]
mod tests;
