use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;

use crate::{
    cache::store::{CacheStats, RenderCache},
    encode::timeline::{TimelineEncoder, write_timeline},
    foundation::error::{ScriptcastError, ScriptcastResult},
    render::code_image::CodeImageRenderer,
    render::dispatch::{DispatchConfig, RenderDispatcher},
    render::speech::SpeechRenderer,
    script::markup::parse_markup,
    script::segment::{Segment, extract_segments},
    timeline::compose::{CompositorOpts, Timeline, compose},
};

/// Everything a [`Pipeline`] needs besides its renderers.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Directory holding `<digest>.<ext>` artifacts; shared across runs.
    pub cache_dir: PathBuf,
    /// Voice and render concurrency.
    pub dispatch: DispatchConfig,
    /// Timeline layout and timing.
    pub compositor: CompositorOpts,
}

impl PipelineConfig {
    /// Cache artifacts directly in `workdir`, with default layout.
    pub fn new(workdir: impl Into<PathBuf>, voice: impl Into<String>) -> Self {
        Self {
            cache_dir: workdir.into(),
            dispatch: DispatchConfig::new(voice),
            compositor: CompositorOpts::default(),
        }
    }
}

/// Summary of one [`Pipeline::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Segments extracted from the script.
    pub segments: usize,
    /// Total playback time.
    pub duration: Duration,
    /// Cache counters, cumulative for this pipeline.
    pub cache: CacheStats,
}

/// Script text to video: extract, render through the cache, compose, encode.
#[derive(Debug)]
pub struct Pipeline {
    dispatcher: RenderDispatcher,
    compositor: CompositorOpts,
}

impl Pipeline {
    /// Open the cache and set up the render pool.
    pub fn new(
        cfg: PipelineConfig,
        speech: Arc<dyn SpeechRenderer>,
        code: Arc<dyn CodeImageRenderer>,
    ) -> ScriptcastResult<Self> {
        let cache = Arc::new(RenderCache::open(cfg.cache_dir)?);
        let dispatcher = RenderDispatcher::new(cfg.dispatch, cache, speech, code)?;
        Ok(Self {
            dispatcher,
            compositor: cfg.compositor,
        })
    }

    /// Parse a script document and extract its segments. Renders nothing.
    pub fn plan(script: &str) -> ScriptcastResult<Vec<Segment>> {
        extract_segments(&parse_markup(script))
    }

    /// Render every segment (cache permitting) and place the results on a timeline.
    pub fn build_timeline(&self, segments: &[Segment]) -> ScriptcastResult<Timeline> {
        let rendered = self.dispatcher.dispatch_all(segments)?;
        Ok(compose(&rendered, &self.compositor))
    }

    /// Run the whole script and return the encoded file's path.
    ///
    /// A malformed script fails before any renderer runs.
    #[tracing::instrument(skip_all)]
    pub fn run(
        &self,
        script: &str,
        encoder: &mut dyn TimelineEncoder,
    ) -> ScriptcastResult<(PathBuf, RunStats)> {
        let segments = Self::plan(script)?;
        tracing::info!(segments = segments.len(), "script parsed");

        let timeline = self.build_timeline(&segments)?;
        let stats = RunStats {
            segments: segments.len(),
            duration: timeline.duration(),
            cache: self.cache_stats(),
        };
        tracing::info!(
            hits = stats.cache.hits,
            renders = stats.cache.renders,
            duration_ms = stats.duration.as_millis() as u64,
            "renders resolved"
        );

        let path = write_timeline(&timeline, encoder)?;
        Ok((path, stats))
    }

    /// Hit/render counters of the shared render cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.dispatcher.cache().stats()
    }
}

/// Write `segments` as pretty JSON, tagged by kind.
pub fn dump_segments(segments: &[Segment], path: &Path) -> ScriptcastResult<()> {
    let json = serde_json::to_vec_pretty(segments).map_err(|e| ScriptcastError::serde(e.to_string()))?;
    std::fs::write(path, json)
        .with_context(|| format!("write segment dump '{}'", path.display()))?;
    Ok(())
}
