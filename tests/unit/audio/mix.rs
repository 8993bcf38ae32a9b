use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;

use super::*;
use crate::assets::media::AudioPcm;
use crate::audio::manifest::build_audio_manifest;
use crate::cache::store::AudioArtifact;
use crate::render::dispatch::RenderedSegment;
use crate::timeline::compose::{CompositorOpts, compose};

const RATE: u32 = 1_000;

fn narration(name: &str, millis: u64) -> RenderedSegment {
    RenderedSegment::Narration {
        text: name.to_string(),
        speech: AudioArtifact {
            path: PathBuf::from(format!("/cache/{name}.wav")),
            duration: Duration::from_millis(millis),
        },
    }
}

fn constant_pcm(value: f32, frames: usize) -> AudioPcm {
    AudioPcm {
        sample_rate: RATE,
        channels: 2,
        interleaved_f32: vec![value; frames * 2],
    }
}

#[test]
fn clips_land_at_their_track_offsets() {
    let opts = CompositorOpts {
        heading_duration: Duration::from_millis(100),
        ..CompositorOpts::default()
    };
    let timeline = compose(
        &[
            RenderedSegment::Heading {
                text: "Intro".to_string(),
            },
            narration("a", 50),
            narration("b", 30),
        ],
        &opts,
    );

    let manifest = build_audio_manifest(&timeline, RATE, |path, _| {
        Ok(if path.ends_with("a.wav") {
            constant_pcm(0.25, 50)
        } else {
            constant_pcm(-0.5, 30)
        })
    })
    .unwrap();
    assert_eq!(manifest.total_samples, 180);
    assert_eq!(manifest.segments.len(), 2);
    assert_eq!(manifest.segments[0].timeline_start_sample, 100);
    assert_eq!(manifest.segments[1].timeline_start_sample, 150);

    let mixed = mix_manifest(&manifest);
    assert_eq!(mixed.len(), 180 * 2);
    assert_eq!(mixed[99 * 2], 0.0);
    assert_eq!(mixed[100 * 2], 0.25);
    assert_eq!(mixed[149 * 2 + 1], 0.25);
    assert_eq!(mixed[150 * 2], -0.5);
    assert_eq!(mixed[179 * 2 + 1], -0.5);
}

#[test]
fn longer_decoded_audio_is_cut_at_track_end() {
    let timeline = compose(
        &[narration("a", 20), narration("b", 20)],
        &CompositorOpts::default(),
    );
    let manifest = build_audio_manifest(&timeline, RATE, |path, _| {
        Ok(if path.ends_with("a.wav") {
            constant_pcm(0.5, 40)
        } else {
            constant_pcm(0.0, 20)
        })
    })
    .unwrap();

    let mixed = mix_manifest(&manifest);
    assert_eq!(mixed[19 * 2], 0.5);
    assert_eq!(mixed[20 * 2], 0.0);
}

#[test]
fn repeated_clips_are_decoded_once() {
    let timeline = compose(
        &[narration("a", 10), narration("a", 10), narration("a", 10)],
        &CompositorOpts::default(),
    );
    let calls = RefCell::new(0);
    let manifest = build_audio_manifest(&timeline, RATE, |_, _| {
        *calls.borrow_mut() += 1;
        Ok(constant_pcm(0.1, 10))
    })
    .unwrap();
    assert_eq!(*calls.borrow(), 1);
    assert_eq!(manifest.segments.len(), 3);
}

#[test]
fn mono_sources_are_duplicated_and_sums_clamped() {
    let manifest = AudioManifest {
        sample_rate: RATE,
        channels: 2,
        total_samples: 2,
        segments: vec![
            AudioSegment {
                timeline_start_sample: 0,
                timeline_end_sample: 2,
                source_channels: 1,
                source_interleaved_f32: std::sync::Arc::new(vec![0.75, 0.75]),
            },
            AudioSegment {
                timeline_start_sample: 1,
                timeline_end_sample: 2,
                source_channels: 1,
                source_interleaved_f32: std::sync::Arc::new(vec![0.75]),
            },
        ],
    };
    assert_eq!(mix_manifest(&manifest), vec![0.75, 0.75, 1.0, 1.0]);
}

#[test]
fn f32le_output_is_little_endian() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mix.f32le");
    write_mix_to_f32le_file(&[1.0, -0.5], &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], &1.0f32.to_le_bytes());
    assert_eq!(&bytes[4..], &(-0.5f32).to_le_bytes());
}

#[test]
fn silent_timeline_has_no_segments() {
    let timeline = compose(
        &[RenderedSegment::Heading {
            text: "Only".to_string(),
        }],
        &CompositorOpts::default(),
    );
    let manifest = build_audio_manifest(&timeline, RATE, |_, _| unreachable!()).unwrap();
    assert!(manifest.is_silent());
    assert_eq!(manifest.total_samples, 3_000);
}
