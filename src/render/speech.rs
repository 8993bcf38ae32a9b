use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::Context as _;

use crate::assets::wav::{pcm16_to_wav, wav_duration};
use crate::cache::key::RenderKind;
use crate::foundation::error::{ScriptcastError, ScriptcastResult};

/// Synthesized speech: WAV bytes plus playback duration.
#[derive(Clone, Debug)]
pub struct SpeechClip {
    /// RIFF/WAVE file bytes.
    pub wav: Vec<u8>,
    /// Playback duration.
    pub duration: Duration,
}

impl SpeechClip {
    /// Build a clip from WAV bytes, measuring the duration from the data chunk.
    pub fn from_wav(wav: Vec<u8>) -> ScriptcastResult<Self> {
        let duration = wav_duration(&wav)?;
        Ok(Self { wav, duration })
    }
}

/// Text-to-speech backend.
///
/// Implementations must be deterministic enough that caching by `(voice, text)` is sound.
pub trait SpeechRenderer: Send + Sync {
    /// Speak `text` with `voice`.
    fn synthesize(&self, voice: &str, text: &str) -> ScriptcastResult<SpeechClip>;
}

/// macOS `say`, writing 16-bit little-endian PCM WAV.
#[derive(Clone, Debug)]
pub struct SayCommand {
    program: PathBuf,
    sample_rate: u32,
}

impl Default for SayCommand {
    fn default() -> Self {
        Self {
            program: PathBuf::from("say"),
            sample_rate: 22_050,
        }
    }
}

impl SayCommand {
    /// Use a specific `say`-compatible executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }
}

impl SpeechRenderer for SayCommand {
    fn synthesize(&self, voice: &str, text: &str) -> ScriptcastResult<SpeechClip> {
        let scratch = tempfile::tempdir().context("create speech scratch directory")?;
        let input = scratch.path().join("input.txt");
        let output = scratch.path().join("speech.wav");
        std::fs::write(&input, text).context("write speech input text")?;

        let out = Command::new(&self.program)
            .arg("-v")
            .arg(voice)
            .arg("-o")
            .arg(&output)
            .arg(format!("--data-format=LEI16@{}", self.sample_rate))
            .arg("-f")
            .arg(&input)
            .output()
            .map_err(|e| {
                ScriptcastError::render_failed(
                    RenderKind::Speech,
                    format!("failed to run '{}': {e}", self.program.display()),
                )
            })?;
        if !out.status.success() {
            return Err(ScriptcastError::render_failed(
                RenderKind::Speech,
                format!(
                    "'{}' exited with {}: {}",
                    self.program.display(),
                    out.status,
                    String::from_utf8_lossy(&out.stderr).trim()
                ),
            ));
        }

        let wav = std::fs::read(&output)
            .with_context(|| format!("read synthesized speech '{}'", output.display()))?;
        SpeechClip::from_wav(wav)
    }
}

/// Credentials and model selection for the ElevenLabs text-to-speech API.
#[derive(Clone)]
pub struct ElevenLabsConfig {
    /// `xi-api-key` header value.
    pub api_key: String,
    /// Model used for synthesis.
    pub model_id: String,
    /// API origin, without a trailing slash.
    pub base_url: String,
    /// PCM output rate; one of 16000, 22050, 24000, 44100.
    pub sample_rate: u32,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for ElevenLabsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsConfig")
            .field("api_key", &"<redacted>")
            .field("model_id", &self.model_id)
            .field("base_url", &self.base_url)
            .field("sample_rate", &self.sample_rate)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ElevenLabsConfig {
    /// Defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_id: "eleven_multilingual_v2".to_string(),
            base_url: "https://api.elevenlabs.io".to_string(),
            sample_rate: 22_050,
            timeout: Duration::from_secs(120),
        }
    }
}

/// ElevenLabs HTTP backend. Requests raw PCM and wraps it into WAV locally.
pub struct ElevenLabsSpeech {
    cfg: ElevenLabsConfig,
    client: reqwest::blocking::Client,
}

impl ElevenLabsSpeech {
    /// Build a client. Fails on an empty key or an unsupported sample rate.
    pub fn new(cfg: ElevenLabsConfig) -> ScriptcastResult<Self> {
        if cfg.api_key.trim().is_empty() {
            return Err(ScriptcastError::validation("ElevenLabs api key must be set"));
        }
        if ![16_000, 22_050, 24_000, 44_100].contains(&cfg.sample_rate) {
            return Err(ScriptcastError::validation(format!(
                "unsupported ElevenLabs pcm sample rate {}",
                cfg.sample_rate
            )));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .context("build ElevenLabs http client")?;
        Ok(Self { cfg, client })
    }
}

impl SpeechRenderer for ElevenLabsSpeech {
    fn synthesize(&self, voice: &str, text: &str) -> ScriptcastResult<SpeechClip> {
        let url = format!(
            "{}/v1/text-to-speech/{}?output_format=pcm_{}",
            self.cfg.base_url.trim_end_matches('/'),
            voice,
            self.cfg.sample_rate
        );
        let fail = |msg: String| ScriptcastError::render_failed(RenderKind::Speech, msg);

        let resp = self
            .client
            .post(&url)
            .header("xi-api-key", &self.cfg.api_key)
            .json(&serde_json::json!({
                "text": text,
                "model_id": self.cfg.model_id,
            }))
            .send()
            .map_err(|e| fail(format!("ElevenLabs request failed: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(fail(format!("voice '{voice}' unavailable")));
        }
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(fail(format!("ElevenLabs returned {status}: {}", body.trim())));
        }

        let pcm = resp
            .bytes()
            .map_err(|e| fail(format!("ElevenLabs response read failed: {e}")))?;
        let wav = pcm16_to_wav(&pcm, self.cfg.sample_rate, 1)?;
        SpeechClip::from_wav(wav)
    }
}
