use std::ffi::OsString;
use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use anyhow::Context as _;

use crate::assets::media::is_tool_on_path;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::error::{ScriptcastError, ScriptcastResult};
use crate::raster::frame::Frame;

/// Options for [`FfmpegSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Output MP4 file path.
    pub out_path: PathBuf,
    /// Replace an existing file at `out_path`. When false, `begin` refuses to start.
    pub overwrite: bool,
}

impl FfmpegSinkOpts {
    /// Options for writing an MP4 to `out_path`, replacing any existing file.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
        }
    }
}

/// A running `ffmpeg` process fed over stdin.
struct Encoder {
    child: Child,
    stdin: ChildStdin,
    stderr: JoinHandle<std::io::Result<Vec<u8>>>,
    width: u32,
    height: u32,
    last_idx: Option<u64>,
}

/// Sink that spawns the system `ffmpeg` and streams raw RGBA frames to its stdin.
///
/// The mixed narration, when present, comes in as a second f32le input.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    running: Option<Encoder>,
}

impl FfmpegSink {
    /// Sink writing to `opts.out_path`. Nothing is spawned until `begin`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            running: None,
        }
    }
}

/// Command line for one encode: rawvideo RGBA on stdin, optional f32le narration, H.264/AAC out.
fn ffmpeg_args(cfg: &SinkConfig, out_path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-y",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(format!("{}x{}", cfg.width, cfg.height).into());
    // Rawvideo takes its rate before `-i`.
    args.push("-r".into());
    args.push(format!("{}/{}", cfg.fps.num, cfg.fps.den).into());
    args.extend(["-i", "pipe:0"].map(OsString::from));

    match &cfg.audio {
        Some(audio) => {
            args.extend(["-f", "f32le", "-ar"].map(OsString::from));
            args.push(audio.sample_rate.to_string().into());
            args.push("-ac".into());
            args.push(audio.channels.to_string().into());
            args.push("-i".into());
            args.push(audio.path.clone().into_os_string());
            args.extend(["-c:a", "aac", "-shortest"].map(OsString::from));
        }
        None => args.push("-an".into()),
    }
    args.extend(
        ["-c:v", "libx264", "-pix_fmt", "yuv420p", "-movflags", "+faststart"].map(OsString::from),
    );
    args.push(out_path.as_os_str().to_owned());
    args
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ScriptcastResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(ScriptcastError::validation("fps must be non-zero"));
        }
        let even = |v: u32| v != 0 && v.is_multiple_of(2);
        if !even(cfg.width) || !even(cfg.height) {
            return Err(ScriptcastError::validation(format!(
                "yuv420p output needs non-zero even dimensions, got {}x{}",
                cfg.width, cfg.height
            )));
        }
        if let Some(audio) = &cfg.audio
            && (audio.sample_rate == 0 || audio.channels == 0)
        {
            return Err(ScriptcastError::validation(
                "audio sample_rate and channels must be non-zero",
            ));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(ScriptcastError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        if !is_tool_on_path("ffmpeg") {
            return Err(ScriptcastError::encode("ffmpeg was not found on PATH"));
        }

        tracing::debug!(out = %self.opts.out_path.display(), "spawning ffmpeg");
        let mut child = Command::new("ffmpeg")
            .args(ffmpeg_args(&cfg, &self.opts.out_path))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ScriptcastError::encode(format!("failed to spawn ffmpeg: {e}")))?;

        let (Some(stdin), Some(mut stderr)) = (child.stdin.take(), child.stderr.take()) else {
            return Err(ScriptcastError::encode("ffmpeg pipes were not opened"));
        };
        let stderr = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        self.running = Some(Encoder {
            child,
            stdin,
            stderr,
            width: cfg.width,
            height: cfg.height,
            last_idx: None,
        });
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &Frame) -> ScriptcastResult<()> {
        let enc = self
            .running
            .as_mut()
            .ok_or_else(|| ScriptcastError::encode("ffmpeg sink not started"))?;
        if enc.last_idx.is_some_and(|last| idx <= last) {
            return Err(ScriptcastError::encode(format!(
                "frame {idx} arrived out of order"
            )));
        }
        if frame.width != enc.width || frame.height != enc.height {
            return Err(ScriptcastError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, enc.width, enc.height
            )));
        }
        enc.last_idx = Some(idx);
        enc.stdin
            .write_all(&frame.data)
            .map_err(|e| ScriptcastError::encode(format!("failed to write frame {idx}: {e}")))
    }

    fn end(&mut self) -> ScriptcastResult<()> {
        let Encoder {
            mut child,
            stdin,
            stderr,
            ..
        } = self
            .running
            .take()
            .ok_or_else(|| ScriptcastError::encode("ffmpeg sink not started"))?;
        drop(stdin);

        let status = child
            .wait()
            .map_err(|e| ScriptcastError::encode(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr = stderr
            .join()
            .map_err(|_| ScriptcastError::encode("ffmpeg stderr reader panicked"))?
            .map_err(|e| ScriptcastError::encode(format!("ffmpeg stderr read failed: {e}")))?;
        if !status.success() {
            return Err(ScriptcastError::encode(format!(
                "ffmpeg exited with {status}: {}",
                String::from_utf8_lossy(&stderr).trim()
            )));
        }
        Ok(())
    }

    fn destination(&self) -> &Path {
        &self.opts.out_path
    }
}

/// Create the parent directory of `path` if it is missing.
pub fn ensure_parent_dir(path: &Path) -> ScriptcastResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    Ok(())
}
