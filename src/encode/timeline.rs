use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    assets::media::{AudioPcm, MIX_SAMPLE_RATE, decode_audio_f32_stereo},
    audio::manifest::build_audio_manifest,
    audio::mix::{mix_manifest, write_mix_to_f32le_file},
    encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts},
    encode::sink::{AudioInputConfig, FrameSink, SinkConfig},
    foundation::core::{Canvas, Fps},
    foundation::error::{ScriptcastError, ScriptcastResult},
    raster::frame::FrameRasterizer,
    timeline::compose::Timeline,
};

/// Something that turns a [`Timeline`] into a media file.
pub trait TimelineEncoder {
    /// Encode `timeline` and return the path of the written file.
    fn encode(&mut self, timeline: &Timeline) -> ScriptcastResult<PathBuf>;
}

/// Hand a timeline to `encoder`.
///
/// Empty timelines are rejected with [`ScriptcastError::EmptyTimeline`] before the encoder is
/// touched; misplaced tracks are rejected as validation errors.
#[tracing::instrument(skip_all, fields(tracks = timeline.len()))]
pub fn write_timeline(
    timeline: &Timeline,
    encoder: &mut dyn TimelineEncoder,
) -> ScriptcastResult<PathBuf> {
    if timeline.is_empty() {
        return Err(ScriptcastError::EmptyTimeline);
    }
    timeline.validate()?;
    let path = encoder.encode(timeline)?;
    tracing::info!(path = %path.display(), "video written");
    Ok(path)
}

type AudioDecoder = fn(&Path, u32) -> ScriptcastResult<AudioPcm>;

/// Encodes a timeline by rasterizing each track once and repeating it over the track's frames.
///
/// Frame spans come from the nearest frame boundary of each track's start and end, so adjacent
/// tracks share a boundary. Speech is mixed into one PCM file that the sink encodes alongside.
pub struct FrameEncoder<S> {
    fps: Fps,
    rasterizer: FrameRasterizer,
    sink: S,
    decode: AudioDecoder,
}

impl<S: FrameSink> FrameEncoder<S> {
    pub fn new(fps: Fps, rasterizer: FrameRasterizer, sink: S) -> Self {
        Self {
            fps,
            rasterizer,
            sink,
            decode: decode_audio_f32_stereo,
        }
    }

    /// Replace the audio decoder (ffmpeg by default).
    pub fn with_decoder(mut self, decode: AudioDecoder) -> Self {
        self.decode = decode;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: FrameSink> TimelineEncoder for FrameEncoder<S> {
    #[tracing::instrument(skip_all, fields(fps = self.fps.as_f64()))]
    fn encode(&mut self, timeline: &Timeline) -> ScriptcastResult<PathBuf> {
        if timeline.is_empty() {
            return Err(ScriptcastError::EmptyTimeline);
        }

        let manifest = build_audio_manifest(timeline, MIX_SAMPLE_RATE, self.decode)?;
        let audio_file = if manifest.is_silent() {
            None
        } else {
            let file = tempfile::Builder::new()
                .prefix("scriptcast-mix-")
                .suffix(".f32le")
                .tempfile()
                .context("create audio mix file")?;
            write_mix_to_f32le_file(&mix_manifest(&manifest), file.path())?;
            Some(file)
        };

        let canvas = self.rasterizer.canvas();
        self.sink.begin(SinkConfig {
            width: canvas.width,
            height: canvas.height,
            fps: self.fps,
            audio: audio_file.as_ref().map(|f| AudioInputConfig {
                path: f.path().to_path_buf(),
                sample_rate: manifest.sample_rate,
                channels: manifest.channels,
            }),
        })?;

        for (i, track) in timeline.tracks().iter().enumerate() {
            let first = self.fps.frame_at(track.start);
            let last = self.fps.frame_at(track.end());
            tracing::debug!(track = i, first, last, "encoding track");
            if first == last {
                continue;
            }
            let frame = self.rasterizer.rasterize(&track.visual)?;
            for idx in first..last {
                self.sink.push_frame(idx, &frame)?;
            }
        }

        self.sink.end()?;
        Ok(self.sink.destination().to_path_buf())
    }
}

/// Settings for the MP4 encoder built by [`ffmpeg_encoder`].
#[derive(Clone, Debug)]
pub struct FfmpegEncoderOpts {
    /// Output MP4 path.
    pub out_path: PathBuf,
    /// Frame size.
    pub canvas: Canvas,
    /// Frame rate.
    pub fps: Fps,
    /// Replace an existing output file.
    pub overwrite: bool,
}

impl FfmpegEncoderOpts {
    /// 1080x1920 at 24 fps, overwriting `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            canvas: Canvas::PORTRAIT,
            fps: Fps { num: 24, den: 1 },
            overwrite: true,
        }
    }
}

/// [`FrameEncoder`] writing MP4 through the system `ffmpeg`.
pub type FfmpegEncoder = FrameEncoder<FfmpegSink>;

/// Build an MP4 encoder with system fonts loaded for text cards.
pub fn ffmpeg_encoder(opts: FfmpegEncoderOpts) -> FfmpegEncoder {
    let sink = FfmpegSink::new(FfmpegSinkOpts {
        out_path: opts.out_path,
        overwrite: opts.overwrite,
    });
    FrameEncoder::new(opts.fps, FrameRasterizer::new(opts.canvas), sink)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/timeline.rs"]
mod tests;
