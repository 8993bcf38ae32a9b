//! Scriptcast compiles a narrated markdown script into a timed video.
//!
//! A run goes through four stages:
//!
//! - Extract [`Segment`]s from the script (headings, narration, captioned code blocks)
//! - Resolve speech and code screenshots through the content-addressed [`RenderCache`], so an
//!   unchanged script never calls the external renderers twice
//! - Place the results on a gapless [`Timeline`]
//! - Hand the timeline to a [`TimelineEncoder`] (MP4 through `ffmpeg` by default)
#![forbid(unsafe_code)]

mod assets;
mod audio;
mod cache;
mod encode;
mod foundation;
mod pipeline;
mod raster;
mod render;
mod script;
mod timeline;

pub use crate::foundation::core::{Canvas, Fps, Rgb8};
pub use crate::foundation::error::{ScriptcastError, ScriptcastResult};

pub use crate::assets::media::{AudioPcm, MIX_SAMPLE_RATE, decode_audio_f32_stereo};
pub use crate::assets::wav::{pcm16_to_wav, wav_duration};
pub use crate::cache::key::{CacheKey, RenderKind, RenderRequest};
pub use crate::cache::store::{
    Artifact, AudioArtifact, CacheStats, ImageArtifact, RenderCache, RenderOutput,
};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::encode::timeline::{
    FfmpegEncoder, FfmpegEncoderOpts, FrameEncoder, TimelineEncoder, ffmpeg_encoder,
    write_timeline,
};
pub use crate::pipeline::{Pipeline, PipelineConfig, RunStats, dump_segments};
pub use crate::raster::frame::{Frame, FrameRasterizer};
pub use crate::render::code_image::{CarbonNow, CodeImageRenderer};
pub use crate::render::dispatch::{DispatchConfig, RenderDispatcher, RenderedSegment};
pub use crate::render::speech::{
    ElevenLabsConfig, ElevenLabsSpeech, SayCommand, SpeechClip, SpeechRenderer,
};
pub use crate::script::language::extension_for_language;
pub use crate::script::markup::{MarkupNode, parse_markup};
pub use crate::script::segment::{CodeSegment, Segment, extract_segments};
pub use crate::timeline::compose::{CompositorOpts, TimedTrack, Timeline, Visual, compose};
