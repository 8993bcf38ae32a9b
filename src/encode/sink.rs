use std::path::{Path, PathBuf};

use crate::foundation::core::Fps;
use crate::foundation::error::{ScriptcastError, ScriptcastResult};
use crate::raster::frame::Frame;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
    /// Optional raw PCM audio file input.
    pub audio: Option<AudioInputConfig>,
}

/// Raw PCM audio input for sinks that encode audio.
#[derive(Debug, Clone)]
pub struct AudioInputConfig {
    /// Path to interleaved `f32le` PCM data.
    pub path: PathBuf,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
}

/// Consumer of rendered frames in timeline order.
///
/// `push_frame` is called with strictly increasing, contiguous frame indices starting at 0.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> ScriptcastResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: u64, frame: &Frame) -> ScriptcastResult<()>;
    /// Called once after the last frame; finalizes the output.
    fn end(&mut self) -> ScriptcastResult<()>;
    /// Where the finished output lives.
    fn destination(&self) -> &Path;
}

/// In-memory sink for tests and debugging.
///
/// Consecutive identical frames are stored once with a repeat count.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    runs: Vec<(Frame, u64)>,
    audio: Option<Vec<u8>>,
    next_idx: u64,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Distinct frames in order, each with how many times it was pushed in a row.
    pub fn runs(&self) -> &[(Frame, u64)] {
        &self.runs
    }

    /// Total frames pushed.
    pub fn frame_count(&self) -> u64 {
        self.next_idx
    }

    /// Audio input bytes, read when the sink started.
    pub fn audio(&self) -> Option<&[u8]> {
        self.audio.as_deref()
    }

    /// `true` once `end` has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ScriptcastResult<()> {
        self.audio = match cfg.audio.as_ref() {
            Some(audio) => Some(std::fs::read(&audio.path).map_err(anyhow::Error::from)?),
            None => None,
        };
        self.cfg = Some(cfg);
        self.runs.clear();
        self.next_idx = 0;
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &Frame) -> ScriptcastResult<()> {
        if idx != self.next_idx {
            return Err(ScriptcastError::encode(format!(
                "expected frame {}, got {idx}",
                self.next_idx
            )));
        }
        self.next_idx += 1;
        match self.runs.last_mut() {
            Some((last, count)) if last == frame => *count += 1,
            _ => self.runs.push((frame.clone(), 1)),
        }
        Ok(())
    }

    fn end(&mut self) -> ScriptcastResult<()> {
        self.finished = true;
        Ok(())
    }

    fn destination(&self) -> &Path {
        Path::new("<memory>")
    }
}
