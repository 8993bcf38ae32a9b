use std::path::PathBuf;
use std::time::Duration;

use crate::{
    cache::store::AudioArtifact,
    foundation::core::{Canvas, Rgb8},
    foundation::error::{ScriptcastError, ScriptcastResult},
    render::dispatch::RenderedSegment,
    timeline::wrap::{wrap_caption, wrap_heading},
};

/// Layout and timing settings for [`compose`].
#[derive(Clone, Debug, PartialEq)]
pub struct CompositorOpts {
    /// Fixed on-screen time of a heading card.
    pub heading_duration: Duration,
    /// Output frame size.
    pub canvas: Canvas,
    /// Fill behind every visual.
    pub background: Rgb8,
    /// Heading and caption color.
    pub text_color: Rgb8,
    /// Heading font size in pixels.
    pub heading_font_px: f32,
    /// Caption font size in pixels.
    pub caption_font_px: f32,
    /// Words per heading line.
    pub heading_words_per_line: usize,
    /// Soft limit for caption line length, in characters.
    pub caption_chars_per_line: usize,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            heading_duration: Duration::from_secs(3),
            canvas: Canvas::PORTRAIT,
            background: Rgb8::new(144, 169, 183),
            text_color: Rgb8::BLACK,
            heading_font_px: 96.0,
            caption_font_px: 64.0,
            heading_words_per_line: 3,
            caption_chars_per_line: 24,
        }
    }
}

/// What a track shows while it plays.
#[derive(Clone, Debug, PartialEq)]
pub enum Visual {
    /// Plain background.
    Solid(Rgb8),
    /// Centered lines of text.
    Text {
        /// Pre-wrapped lines, top to bottom.
        lines: Vec<String>,
        /// Font size in pixels.
        font_px: f32,
        /// Text color.
        color: Rgb8,
        /// Fill behind the text.
        background: Rgb8,
    },
    /// A still image centered over a fill.
    Image {
        /// Image file (a cached code screenshot).
        path: PathBuf,
        /// Fill around the image.
        background: Rgb8,
    },
}

/// One placed unit of playback.
#[derive(Clone, Debug, PartialEq)]
pub struct TimedTrack {
    /// Picture shown for the whole track.
    pub visual: Visual,
    /// Speech played from the track start, if any.
    pub audio: Option<AudioArtifact>,
    /// Offset from the start of the timeline.
    pub start: Duration,
    /// Track length.
    pub duration: Duration,
}

impl TimedTrack {
    /// Offset where the next track starts.
    pub fn end(&self) -> Duration {
        self.start + self.duration
    }
}

/// Ordered, gapless sequence of tracks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Timeline {
    tracks: Vec<TimedTrack>,
}

impl Timeline {
    /// Tracks in playback order.
    pub fn tracks(&self) -> &[TimedTrack] {
        &self.tracks
    }

    /// Number of tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// True when the script produced no tracks.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Sum of all track durations.
    pub fn duration(&self) -> Duration {
        self.tracks.last().map(TimedTrack::end).unwrap_or_default()
    }

    /// Check placement: the first track starts at zero and each track starts where the previous
    /// one ends.
    pub fn validate(&self) -> ScriptcastResult<()> {
        let mut expected = Duration::ZERO;
        for (i, track) in self.tracks.iter().enumerate() {
            if track.start != expected {
                return Err(ScriptcastError::validation(format!(
                    "track {i} starts at {:?}, expected {:?}",
                    track.start, expected
                )));
            }
            expected = track.end();
        }
        Ok(())
    }

    fn push(&mut self, visual: Visual, audio: Option<AudioArtifact>, duration: Duration) {
        let start = self.duration();
        self.tracks.push(TimedTrack {
            visual,
            audio,
            start,
            duration,
        });
    }
}

/// Place rendered segments back to back, one track each, in input order.
///
/// Headings last `opts.heading_duration`; narration and code tracks last exactly as long as
/// their speech.
#[tracing::instrument(skip_all, fields(segments = rendered.len()))]
pub fn compose(rendered: &[RenderedSegment], opts: &CompositorOpts) -> Timeline {
    let mut timeline = Timeline {
        tracks: Vec::with_capacity(rendered.len()),
    };

    for segment in rendered {
        match segment {
            RenderedSegment::Heading { text } => timeline.push(
                Visual::Text {
                    lines: wrap_heading(text, opts.heading_words_per_line),
                    font_px: opts.heading_font_px,
                    color: opts.text_color,
                    background: opts.background,
                },
                None,
                opts.heading_duration,
            ),
            RenderedSegment::Narration { text, speech } => timeline.push(
                Visual::Text {
                    lines: wrap_caption(text, opts.caption_chars_per_line),
                    font_px: opts.caption_font_px,
                    color: opts.text_color,
                    background: opts.background,
                },
                Some(speech.clone()),
                speech.duration,
            ),
            RenderedSegment::Code { speech, image, .. } => timeline.push(
                Visual::Image {
                    path: image.path.clone(),
                    background: opts.background,
                },
                Some(speech.clone()),
                speech.duration,
            ),
        }
    }

    tracing::debug!(
        tracks = timeline.len(),
        duration_ms = timeline.duration().as_millis() as u64,
        "timeline composed"
    );
    timeline
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/compose.rs"]
mod tests;
