use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use anyhow::Context;
use once_cell::sync::OnceCell;

use crate::{
    cache::key::{CacheKey, RenderKind, RenderRequest},
    foundation::error::{ScriptcastError, ScriptcastResult},
};

/// Bytes produced by an external renderer, before they are persisted.
#[derive(Clone, Debug)]
pub enum RenderOutput {
    /// Encoded audio (WAV) plus its measured duration.
    Speech {
        /// Audio file bytes.
        audio: Vec<u8>,
        /// Playback duration.
        duration: Duration,
    },
    /// Encoded still image (PNG).
    Image {
        /// Image file bytes.
        png: Vec<u8>,
    },
}

impl RenderOutput {
    fn kind(&self) -> RenderKind {
        match self {
            RenderOutput::Speech { .. } => RenderKind::Speech,
            RenderOutput::Image { .. } => RenderKind::CodeImage,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Cached speech audio.
pub struct AudioArtifact {
    /// Path of the `<key>.wav` file inside the cache directory.
    pub path: PathBuf,
    /// Playback duration recorded when the audio was rendered.
    pub duration: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Cached still image.
pub struct ImageArtifact {
    /// Path of the `<key>.png` file inside the cache directory.
    pub path: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A persisted render result. Artifacts live as long as the cache directory.
pub enum Artifact {
    /// Speech audio.
    Audio(AudioArtifact),
    /// Code image.
    Image(ImageArtifact),
}

impl Artifact {
    /// Unwrap an audio artifact, or fail with a render error for `kind`.
    pub fn into_audio(self) -> ScriptcastResult<AudioArtifact> {
        match self {
            Artifact::Audio(a) => Ok(a),
            Artifact::Image(_) => Err(ScriptcastError::render_failed(
                RenderKind::Speech,
                "cache returned an image artifact for a speech request",
            )),
        }
    }

    /// Unwrap an image artifact, or fail with a render error.
    pub fn into_image(self) -> ScriptcastResult<ImageArtifact> {
        match self {
            Artifact::Image(a) => Ok(a),
            Artifact::Audio(_) => Err(ScriptcastError::render_failed(
                RenderKind::CodeImage,
                "cache returned an audio artifact for a code image request",
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Counters for one cache instance.
pub struct CacheStats {
    /// Requests served without calling a renderer.
    pub hits: u64,
    /// Requests that invoked a renderer and persisted its output.
    pub renders: u64,
}

/// Shared outcome of one coalesced resolve. Failures keep only the cause text.
type Slot = Arc<OnceCell<Result<Artifact, String>>>;

#[derive(serde::Serialize, serde::Deserialize)]
struct SpeechMeta {
    duration_ns: u64,
}

/// Content-addressed store of render artifacts.
///
/// Artifacts are named `<digest>.<ext>` in a flat directory. Speech additionally has a
/// `<digest>.json` sidecar holding the measured duration; it is written after the audio and is
/// what marks a speech artifact as complete. Every file is written to a temporary name in the same
/// directory and renamed into place, so a final name only ever refers to complete content.
///
/// Concurrent `resolve` calls for the same kind and key are coalesced in-process: one caller
/// renders, the others block on it and receive the same outcome.
pub struct RenderCache {
    root: PathBuf,
    in_flight: Mutex<HashMap<(RenderKind, CacheKey), Slot>>,
    hits: AtomicU64,
    renders: AtomicU64,
}

impl std::fmt::Debug for RenderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderCache")
            .field("root", &self.root)
            .field("stats", &self.stats())
            .finish()
    }
}

impl RenderCache {
    /// Open (creating if needed) a cache rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> ScriptcastResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create cache directory '{}'", root.display()))?;
        Ok(Self {
            root,
            in_flight: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            renders: AtomicU64::new(0),
        })
    }

    /// Cache directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the primary artifact file for `key`.
    pub fn artifact_path(&self, key: CacheKey, kind: RenderKind) -> PathBuf {
        self.root
            .join(format!("{key}.{}", kind.artifact_extension()))
    }

    fn meta_path(&self, key: CacheKey) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Hit/render counters since this cache was opened.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            renders: self.renders.load(Ordering::Relaxed),
        }
    }

    /// Return the stored artifact for `request`, if complete on disk. Never renders.
    pub fn lookup(&self, request: &RenderRequest) -> ScriptcastResult<Option<Artifact>> {
        self.lookup_key(request.key(), request.kind())
    }

    /// Return the artifact for `request`, calling `render` only when nothing is stored yet.
    ///
    /// `render` runs at most once per distinct request for the lifetime of the cache directory.
    /// Callers that join an in-flight render share its outcome, including a failure; they never
    /// call their own `render`. A failure stores nothing, so a later call renders again.
    /// Renderer failures surface as [`ScriptcastError::RenderFailed`].
    #[tracing::instrument(level = "debug", skip_all, fields(kind = %request.kind(), key = %request.key()))]
    pub fn resolve<F>(&self, request: &RenderRequest, render: F) -> ScriptcastResult<Artifact>
    where
        F: FnOnce() -> ScriptcastResult<RenderOutput>,
    {
        let key = request.key();
        let kind = request.kind();
        let slot_key = (kind, key);
        let cell = {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(in_flight.entry(slot_key).or_default())
        };

        let mut owner = false;
        let mut rendered = false;
        let mut own_error = None;
        let outcome = cell
            .get_or_init(|| {
                owner = true;
                let result = match self.lookup_key(key, kind) {
                    Ok(Some(found)) => Ok(found),
                    Ok(None) => {
                        rendered = true;
                        self.render_and_store(key, kind, render)
                    }
                    Err(e) => Err(e),
                };
                result.map_err(|e| {
                    let cause = match &e {
                        ScriptcastError::RenderFailed { cause, .. } => cause.clone(),
                        other => other.to_string(),
                    };
                    own_error = Some(e);
                    cause
                })
            })
            .clone();

        if owner {
            // Settled outcomes leave the map; the disk is the record from here on.
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if in_flight
                .get(&slot_key)
                .is_some_and(|current| Arc::ptr_eq(current, &cell))
            {
                in_flight.remove(&slot_key);
            }
        }

        match outcome {
            Ok(artifact) => {
                if rendered {
                    self.renders.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!("rendered and stored");
                } else {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!("cache hit");
                }
                Ok(artifact)
            }
            Err(cause) => {
                Err(own_error.unwrap_or_else(|| ScriptcastError::render_failed(kind, cause)))
            }
        }
    }

    fn lookup_key(&self, key: CacheKey, kind: RenderKind) -> ScriptcastResult<Option<Artifact>> {
        let path = self.artifact_path(key, kind);
        if !path.is_file() {
            return Ok(None);
        }

        match kind {
            RenderKind::CodeImage => Ok(Some(Artifact::Image(ImageArtifact { path }))),
            RenderKind::Speech => {
                let meta_path = self.meta_path(key);
                let bytes = match std::fs::read(&meta_path) {
                    Ok(b) => b,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                    Err(e) => {
                        return Err(anyhow::Error::new(e)
                            .context(format!("read cache metadata '{}'", meta_path.display()))
                            .into());
                    }
                };
                // An unreadable sidecar is a miss; the next render replaces it.
                let Ok(meta) = serde_json::from_slice::<SpeechMeta>(&bytes) else {
                    tracing::warn!(path = %meta_path.display(), "ignoring corrupt cache metadata");
                    return Ok(None);
                };
                Ok(Some(Artifact::Audio(AudioArtifact {
                    path,
                    duration: Duration::from_nanos(meta.duration_ns),
                })))
            }
        }
    }

    fn render_and_store<F>(
        &self,
        key: CacheKey,
        kind: RenderKind,
        render: F,
    ) -> ScriptcastResult<Artifact>
    where
        F: FnOnce() -> ScriptcastResult<RenderOutput>,
    {
        let output = render().map_err(|e| match e {
            e @ ScriptcastError::RenderFailed { .. } => e,
            other => ScriptcastError::render_failed(kind, other),
        })?;
        if output.kind() != kind {
            return Err(ScriptcastError::render_failed(
                kind,
                format!("renderer returned {} output", output.kind()),
            ));
        }

        let path = self.artifact_path(key, kind);
        match output {
            RenderOutput::Speech { audio, duration } => {
                if audio.is_empty() {
                    return Err(ScriptcastError::render_failed(kind, "renderer returned no audio"));
                }
                let duration_ns = u64::try_from(duration.as_nanos()).map_err(|_| {
                    ScriptcastError::render_failed(kind, "speech duration out of range")
                })?;
                let meta = serde_json::to_vec(&SpeechMeta { duration_ns })
                    .map_err(|e| ScriptcastError::serde(e.to_string()))?;

                write_atomic(&self.root, &path, &audio)?;
                write_atomic(&self.root, &self.meta_path(key), &meta)?;
                Ok(Artifact::Audio(AudioArtifact {
                    path,
                    duration: Duration::from_nanos(duration_ns),
                }))
            }
            RenderOutput::Image { png } => {
                if png.is_empty() {
                    return Err(ScriptcastError::render_failed(kind, "renderer returned no image"));
                }
                write_atomic(&self.root, &path, &png)?;
                Ok(Artifact::Image(ImageArtifact { path }))
            }
        }
    }
}

/// Write `bytes` to `path` through a temporary file in `dir` and an atomic rename.
fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> ScriptcastResult<()> {
    use std::io::Write as _;

    let mut tmp = tempfile::Builder::new()
        .prefix(".partial-")
        .tempfile_in(dir)
        .with_context(|| format!("create temporary file in '{}'", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("write temporary file for '{}'", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("sync temporary file for '{}'", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("move artifact into place at '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/cache/store.rs"]
mod tests;
