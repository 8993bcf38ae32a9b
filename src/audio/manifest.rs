use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    assets::media::AudioPcm,
    foundation::core::sample_at,
    foundation::error::{ScriptcastError, ScriptcastResult},
    timeline::compose::Timeline,
};

#[derive(Clone, Debug)]
/// One track's speech placed in timeline sample space.
pub struct AudioSegment {
    pub timeline_start_sample: u64,
    pub timeline_end_sample: u64,
    pub source_channels: u16,
    pub source_interleaved_f32: Arc<Vec<f32>>,
}

#[derive(Clone, Debug)]
/// Audio plan for a whole timeline.
pub struct AudioManifest {
    pub sample_rate: u32,
    pub channels: u16,
    pub total_samples: u64,
    pub segments: Vec<AudioSegment>,
}

impl AudioManifest {
    /// `true` when no track carries audio.
    pub fn is_silent(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Place every track's audio at its start offset.
///
/// `decode` must return PCM at `sample_rate`; each distinct file is decoded once. A clip is cut
/// at its track's end so neighbouring tracks never overlap.
pub fn build_audio_manifest<D>(
    timeline: &Timeline,
    sample_rate: u32,
    mut decode: D,
) -> ScriptcastResult<AudioManifest>
where
    D: FnMut(&Path, u32) -> ScriptcastResult<AudioPcm>,
{
    if sample_rate == 0 {
        return Err(ScriptcastError::validation("audio sample_rate must be non-zero"));
    }

    let mut decoded: HashMap<PathBuf, (u16, Arc<Vec<f32>>)> = HashMap::new();
    let mut segments = Vec::new();

    for track in timeline.tracks() {
        let Some(audio) = track.audio.as_ref() else {
            continue;
        };
        let (channels, pcm) = match decoded.get(&audio.path) {
            Some(found) => found.clone(),
            None => {
                let pcm = decode(&audio.path, sample_rate)?;
                if pcm.sample_rate != sample_rate || pcm.channels == 0 {
                    return Err(ScriptcastError::encode(format!(
                        "decoded audio '{}' has {} Hz / {} ch, expected {sample_rate} Hz",
                        audio.path.display(),
                        pcm.sample_rate,
                        pcm.channels
                    )));
                }
                let entry = (pcm.channels, Arc::new(pcm.interleaved_f32));
                decoded.insert(audio.path.clone(), entry.clone());
                entry
            }
        };

        segments.push(AudioSegment {
            timeline_start_sample: sample_at(track.start, sample_rate),
            timeline_end_sample: sample_at(track.end(), sample_rate),
            source_channels: channels,
            source_interleaved_f32: pcm,
        });
    }

    Ok(AudioManifest {
        sample_rate,
        channels: 2,
        total_samples: sample_at(timeline.duration(), sample_rate),
        segments,
    })
}
