use super::*;
use crate::cache::store::ImageArtifact;
use crate::script::segment::CodeSegment;

fn audio(name: &str, millis: u64) -> AudioArtifact {
    AudioArtifact {
        path: PathBuf::from(format!("/cache/{name}.wav")),
        duration: Duration::from_millis(millis),
    }
}

fn sample() -> Vec<RenderedSegment> {
    vec![
        RenderedSegment::Heading {
            text: "Intro".to_string(),
        },
        RenderedSegment::Narration {
            text: "Hello there.".to_string(),
            speech: audio("a", 1_250),
        },
        RenderedSegment::Code {
            code: CodeSegment {
                narration: "Print it:".to_string(),
                source: "print(1)".to_string(),
                language: "python".to_string(),
                extension: ".py".to_string(),
            },
            speech: audio("b", 2_100),
            image: ImageArtifact {
                path: PathBuf::from("/cache/c.png"),
            },
        },
    ]
}

#[test]
fn tracks_follow_segment_order_without_gaps() {
    let opts = CompositorOpts::default();
    let timeline = compose(&sample(), &opts);

    assert_eq!(timeline.len(), 3);
    timeline.validate().unwrap();
    let starts: Vec<Duration> = timeline.tracks().iter().map(|t| t.start).collect();
    assert_eq!(
        starts,
        vec![
            Duration::ZERO,
            Duration::from_secs(3),
            Duration::from_millis(4_250)
        ]
    );
    for pair in timeline.tracks().windows(2) {
        assert_eq!(pair[0].start + pair[0].duration, pair[1].start);
    }
    assert_eq!(timeline.duration(), Duration::from_millis(6_350));
}

#[test]
fn heading_has_fixed_duration_and_no_audio() {
    let opts = CompositorOpts {
        heading_duration: Duration::from_millis(2_500),
        ..CompositorOpts::default()
    };
    let timeline = compose(&sample()[..1], &opts);
    let track = &timeline.tracks()[0];

    assert_eq!(track.duration, Duration::from_millis(2_500));
    assert!(track.audio.is_none());
    let Visual::Text { lines, .. } = &track.visual else {
        panic!("heading must be a text card");
    };
    assert_eq!(lines, &vec!["Intro".to_string()]);
}

#[test]
fn spoken_tracks_last_exactly_as_long_as_their_audio() {
    let timeline = compose(&sample(), &CompositorOpts::default());

    for track in &timeline.tracks()[1..] {
        let speech = track.audio.as_ref().unwrap();
        assert_eq!(track.duration, speech.duration);
    }
    assert!(matches!(
        &timeline.tracks()[2].visual,
        Visual::Image { path, .. } if path == &PathBuf::from("/cache/c.png")
    ));
}

#[test]
fn empty_input_gives_empty_timeline() {
    let timeline = compose(&[], &CompositorOpts::default());
    assert!(timeline.is_empty());
    assert_eq!(timeline.duration(), Duration::ZERO);
    timeline.validate().unwrap();
}

#[test]
fn validate_rejects_gaps_and_late_starts() {
    let mut timeline = compose(&sample(), &CompositorOpts::default());
    timeline.tracks[2].start += Duration::from_millis(1);
    assert!(matches!(
        timeline.validate(),
        Err(ScriptcastError::Validation(_))
    ));

    let mut late = compose(&sample()[..1], &CompositorOpts::default());
    late.tracks[0].start = Duration::from_millis(10);
    assert!(late.validate().is_err());
}
