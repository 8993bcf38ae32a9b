use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    cache::key::RenderRequest,
    cache::store::{AudioArtifact, ImageArtifact, RenderCache, RenderOutput},
    foundation::error::{ScriptcastError, ScriptcastResult},
    render::code_image::CodeImageRenderer,
    render::speech::SpeechRenderer,
    script::segment::{CodeSegment, Segment},
};

#[derive(Clone, Debug)]
/// Render dispatch settings.
pub struct DispatchConfig {
    /// Voice identifier handed to the speech backend.
    pub voice: String,
    /// Maximum number of renders in flight.
    pub concurrency: usize,
}

impl DispatchConfig {
    /// Config for `voice` with the default concurrency of 4.
    pub fn new(voice: impl Into<String>) -> Self {
        Self {
            voice: voice.into(),
            concurrency: 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A segment together with the artifacts its playback needs.
pub enum RenderedSegment {
    /// Heading; its visual is synthesized text, so nothing is rendered.
    Heading {
        /// Heading text.
        text: String,
    },
    /// Narration and its speech.
    Narration {
        /// Caption text.
        text: String,
        /// Spoken caption.
        speech: AudioArtifact,
    },
    /// Code block, its screenshot and the spoken caption.
    Code {
        /// The extracted code segment.
        code: CodeSegment,
        /// Spoken narration.
        speech: AudioArtifact,
        /// Code screenshot.
        image: ImageArtifact,
    },
}

/// Maps segments to render requests and resolves them through the [`RenderCache`].
///
/// Renders for different segments are independent and run on a dedicated pool bounded by
/// [`DispatchConfig::concurrency`]. Results always come back in segment order.
pub struct RenderDispatcher {
    cfg: DispatchConfig,
    cache: Arc<RenderCache>,
    speech: Arc<dyn SpeechRenderer>,
    code: Arc<dyn CodeImageRenderer>,
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for RenderDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderDispatcher")
            .field("cfg", &self.cfg)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl RenderDispatcher {
    /// Build a dispatcher. Fails on an empty voice or a zero concurrency limit.
    pub fn new(
        cfg: DispatchConfig,
        cache: Arc<RenderCache>,
        speech: Arc<dyn SpeechRenderer>,
        code: Arc<dyn CodeImageRenderer>,
    ) -> ScriptcastResult<Self> {
        if cfg.voice.trim().is_empty() {
            return Err(ScriptcastError::validation("voice must be non-empty"));
        }
        let pool = build_thread_pool(cfg.concurrency)?;
        Ok(Self {
            cfg,
            cache,
            speech,
            code,
            pool,
        })
    }

    /// Shared render cache.
    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// Resolve every artifact one segment needs.
    pub fn dispatch(&self, segment: &Segment) -> ScriptcastResult<RenderedSegment> {
        self.pool.install(|| self.dispatch_in_pool(segment))
    }

    /// Resolve all segments concurrently, preserving input order in the result.
    ///
    /// The first failure aborts the run; artifacts already stored stay valid for a retry.
    #[tracing::instrument(skip_all, fields(segments = segments.len(), concurrency = self.cfg.concurrency))]
    pub fn dispatch_all(&self, segments: &[Segment]) -> ScriptcastResult<Vec<RenderedSegment>> {
        self.pool.install(|| {
            segments
                .par_iter()
                .enumerate()
                .map(|(index, segment)| {
                    tracing::info!(step = index, kind = segment.kind_name(), "rendering segment");
                    self.dispatch_in_pool(segment)
                })
                .collect()
        })
    }

    fn dispatch_in_pool(&self, segment: &Segment) -> ScriptcastResult<RenderedSegment> {
        match segment {
            Segment::Heading { text } => Ok(RenderedSegment::Heading { text: text.clone() }),
            Segment::Narration { text } => Ok(RenderedSegment::Narration {
                text: text.clone(),
                speech: self.speak(text)?,
            }),
            Segment::Code(code) => {
                let (speech, image) = rayon::join(
                    || self.speak(&code.narration),
                    || self.screenshot(&code.source, &code.extension),
                );
                Ok(RenderedSegment::Code {
                    code: code.clone(),
                    speech: speech?,
                    image: image?,
                })
            }
        }
    }

    fn speak(&self, text: &str) -> ScriptcastResult<AudioArtifact> {
        let voice = self.cfg.voice.trim();
        let text = text.trim();
        let request = RenderRequest::speech(voice, text);
        self.cache
            .resolve(&request, || {
                tracing::debug!(text, "synthesizing speech");
                let clip = self.speech.synthesize(voice, text)?;
                Ok(RenderOutput::Speech {
                    audio: clip.wav,
                    duration: clip.duration,
                })
            })?
            .into_audio()
    }

    fn screenshot(&self, source: &str, extension: &str) -> ScriptcastResult<ImageArtifact> {
        let source = source.trim();
        let request = RenderRequest::code_image(source, extension);
        self.cache
            .resolve(&request, || {
                tracing::debug!(extension, "rendering code image");
                let png = self.code.render(source, extension)?;
                Ok(RenderOutput::Image { png })
            })?
            .into_image()
    }
}

fn build_thread_pool(concurrency: usize) -> ScriptcastResult<rayon::ThreadPool> {
    if concurrency == 0 {
        return Err(ScriptcastError::validation(
            "render concurrency must be >= 1",
        ));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .thread_name(|i| format!("scriptcast-render-{i}"))
        .build()
        .map_err(|e| ScriptcastError::Other(anyhow::anyhow!("failed to build render thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/dispatch.rs"]
mod tests;
