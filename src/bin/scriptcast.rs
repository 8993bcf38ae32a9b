use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "scriptcast", version, about = "Compile a narrated markdown script into a video")]
struct Cli {
    /// Narration script (markdown, optional front matter).
    script: PathBuf,

    /// Working directory for cached renders and the output video.
    workdir: PathBuf,

    /// Voice passed to the speech backend (a `say` voice name or an ElevenLabs voice id).
    #[arg(long)]
    voice: String,

    /// Speech backend.
    #[arg(long, value_enum, default_value_t = SpeechChoice::Say)]
    speech: SpeechChoice,

    /// ElevenLabs API key.
    #[arg(long, env = "ELEVENLABS_API_KEY", hide_env_values = true)]
    elevenlabs_api_key: Option<String>,

    /// ElevenLabs model id.
    #[arg(long, default_value = "eleven_multilingual_v2")]
    elevenlabs_model: String,

    /// `say`-compatible executable.
    #[arg(long, default_value = "say")]
    say_program: PathBuf,

    /// `carbon-now`-compatible executable.
    #[arg(long, default_value = "carbon-now")]
    carbon_program: PathBuf,

    /// Maximum renders in flight.
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// Output frame rate.
    #[arg(long, default_value_t = 24)]
    fps: u32,

    /// On-screen time of heading cards, in seconds.
    #[arg(long, default_value_t = 3.0)]
    heading_seconds: f64,

    /// Output path (default: `<WORKDIR>/output.mp4`).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also write the extracted segments to `<WORKDIR>/script.json`.
    #[arg(long)]
    dump_segments: bool,

    /// Fail instead of replacing an existing output file.
    #[arg(long)]
    no_overwrite: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SpeechChoice {
    Say,
    ElevenLabs,
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let script = std::fs::read_to_string(&cli.script)
        .with_context(|| format!("read script '{}'", cli.script.display()))?;
    let segments = scriptcast::Pipeline::plan(&script)?;

    std::fs::create_dir_all(&cli.workdir)
        .with_context(|| format!("create working directory '{}'", cli.workdir.display()))?;
    if cli.dump_segments {
        let path = cli.workdir.join("script.json");
        scriptcast::dump_segments(&segments, &path)?;
        tracing::info!(path = %path.display(), "segments written");
    }

    let speech = make_speech(&cli)?;
    let code = Arc::new(scriptcast::CarbonNow::with_program(&cli.carbon_program));

    let mut cfg = scriptcast::PipelineConfig::new(&cli.workdir, cli.voice.clone());
    cfg.dispatch.concurrency = cli.concurrency;
    cfg.compositor.heading_duration = Duration::try_from_secs_f64(cli.heading_seconds)
        .context("--heading-seconds must be a non-negative number")?;
    let canvas = cfg.compositor.canvas;
    let pipeline = scriptcast::Pipeline::new(cfg, speech, code)?;

    let out_path = cli
        .out
        .clone()
        .unwrap_or_else(|| cli.workdir.join("output.mp4"));
    let mut encoder = scriptcast::ffmpeg_encoder(scriptcast::FfmpegEncoderOpts {
        out_path,
        canvas,
        fps: scriptcast::Fps::new(cli.fps, 1)?,
        overwrite: !cli.no_overwrite,
    });

    let (path, stats) = pipeline.run(&script, &mut encoder)?;
    eprintln!(
        "wrote {} ({} segments, {:.1}s, {} renders, {} cache hits)",
        path.display(),
        stats.segments,
        stats.duration.as_secs_f64(),
        stats.cache.renders,
        stats.cache.hits
    );
    Ok(())
}

fn make_speech(cli: &Cli) -> anyhow::Result<Arc<dyn scriptcast::SpeechRenderer>> {
    let speech: Arc<dyn scriptcast::SpeechRenderer> = match cli.speech {
        SpeechChoice::Say => Arc::new(scriptcast::SayCommand::with_program(&cli.say_program)),
        SpeechChoice::ElevenLabs => {
            let key = cli
                .elevenlabs_api_key
                .clone()
                .context("--elevenlabs-api-key or ELEVENLABS_API_KEY is required for ElevenLabs")?;
            let mut cfg = scriptcast::ElevenLabsConfig::new(key);
            cfg.model_id = cli.elevenlabs_model.clone();
            Arc::new(scriptcast::ElevenLabsSpeech::new(cfg)?)
        }
    };
    Ok(speech)
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .context("install tracing subscriber")
}
