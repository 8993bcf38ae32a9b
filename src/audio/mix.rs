use std::path::Path;

use anyhow::Context as _;

use crate::audio::manifest::{AudioManifest, AudioSegment};
use crate::foundation::error::ScriptcastResult;

/// Mix all manifest segments into interleaved output PCM.
pub fn mix_manifest(manifest: &AudioManifest) -> Vec<f32> {
    let frames = manifest.total_samples as usize;
    let mut out = vec![0.0f32; frames * usize::from(manifest.channels)];

    for seg in &manifest.segments {
        mix_segment(&mut out, manifest, seg);
    }

    for s in &mut out {
        *s = s.clamp(-1.0, 1.0);
    }
    out
}

fn mix_segment(out: &mut [f32], manifest: &AudioManifest, seg: &AudioSegment) {
    let src = seg.source_interleaved_f32.as_ref();
    let src_channels = usize::from(seg.source_channels.max(1));
    let src_frames = src.len() / src_channels;
    let dst_channels = usize::from(manifest.channels);

    let end = seg.timeline_end_sample.min(manifest.total_samples);
    for dst_sample in seg.timeline_start_sample..end {
        let rel = (dst_sample - seg.timeline_start_sample) as usize;
        if rel >= src_frames {
            break;
        }
        let i = rel * src_channels;
        let (l, r) = if src_channels == 1 {
            (src[i], src[i])
        } else {
            (src[i], src[i + 1])
        };

        let dst_idx = dst_sample as usize * dst_channels;
        out[dst_idx] += l;
        if dst_channels > 1 {
            out[dst_idx + 1] += r;
        }
    }
}

/// Write interleaved `f32` PCM samples to raw little-endian `.f32le` file.
pub fn write_mix_to_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> ScriptcastResult<()> {
    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes)
        .with_context(|| format!("write mixed audio file '{}'", out_path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
