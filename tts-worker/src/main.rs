//! tts-worker - Chatterbox multilingual TTS worker with long-text chunking

mod audio;
mod config;
mod error;
mod pipeline;
mod text;
mod tts;
mod worker;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::WorkerConfig;
use log::{error, info};
use pipeline::{Pipeline, SynthesisRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use worker::protocol::JobOutput;

#[derive(Parser, Debug)]
#[command(name = "tts-worker")]
#[command(about = "Synthesize speech of any length with Chatterbox multilingual TTS", long_about = None)]
#[command(version)]
struct Args {
    /// Device to use (cuda, mps, cpu); overrides the config file
    #[arg(long, global = true)]
    device: Option<String>,

    /// Path to the config file (default: ~/.config/tts-worker/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a single job from stdin, output result to stdout
    Run,

    /// Synthesize text into a WAV file
    Synthesize {
        /// Text to speak ("-" reads from stdin)
        text: String,

        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,

        /// Language code
        #[arg(short, long, default_value = tts::DEFAULT_LANGUAGE)]
        language: String,

        /// Path to voice reference audio for voice cloning
        #[arg(long)]
        voice: Option<PathBuf>,

        /// Expressiveness/exaggeration
        #[arg(long, default_value = "0.5")]
        exaggeration: f32,

        /// Pacing/CFG weight
        #[arg(long, default_value = "0.5")]
        cfg_weight: f32,
    },

    /// Show how text would be split into chunks
    Split {
        /// Text to split ("-" reads from stdin)
        text: String,

        /// Maximum chunk size in characters (default: from config)
        #[arg(long)]
        max_length: Option<usize>,
    },

    /// Download and cache the model weights
    Prefetch,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set the default voice reference
    SetVoice {
        /// Path to voice reference audio
        path: PathBuf,
    },
    /// Set the default device
    SetDevice {
        /// cuda, mps or cpu
        device: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => WorkerConfig::config_path()?,
    };
    let config = WorkerConfig::load_from(&config_path).context("Failed to load configuration")?;
    let device = args.device.clone().or_else(|| config.device.clone());

    match &args.command {
        Commands::Run => handle_run(&config, device.as_deref()).await,
        Commands::Synthesize {
            text,
            output,
            language,
            voice,
            exaggeration,
            cfg_weight,
        } => {
            let text = read_text_arg(text).await?;
            let mut config = config.clone();
            if let Some(voice) = voice {
                config.default_voice_ref = Some(require_voice_file(voice)?);
            }
            let request = SynthesisRequest {
                language_id: language.clone(),
                exaggeration: *exaggeration,
                cfg_weight: *cfg_weight,
                ..SynthesisRequest::new(text)
            };
            handle_synthesize(&config, device.as_deref(), &request, output).await
        }
        Commands::Split { text, max_length } => {
            let text = read_text_arg(text).await?;
            handle_split(&text, max_length.unwrap_or(config.max_chunk_length))
        }
        Commands::Prefetch => handle_prefetch(device.as_deref()),
        Commands::Config { action } => handle_config_command(action, &config_path, config),
    }
}

fn init_logging(debug: bool) {
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

/// Load the engine once and wrap it in a pipeline.
fn build_pipeline(config: &WorkerConfig, device: Option<&str>) -> Result<Pipeline> {
    let engine = tts::create_backend(device)?;
    Ok(Pipeline::new(Arc::from(engine), config.pipeline_settings()))
}

/// An explicitly named voice reference must exist.
fn require_voice_file(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        anyhow::bail!("Voice reference not found: {}", path.display());
    }
    Ok(path.to_path_buf())
}

/// Treat "-" as "read from stdin".
async fn read_text_arg(text: &str) -> Result<String> {
    if text != "-" {
        return Ok(text.to_string());
    }
    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .context("Failed to read text from stdin")?;
    Ok(buf)
}

async fn handle_run(config: &WorkerConfig, device: Option<&str>) -> Result<()> {
    let output = match build_pipeline(config, device) {
        Ok(pipeline) => worker::run_job(&pipeline, tokio::io::stdin()).await,
        Err(e) => {
            error!("Failed to initialize TTS engine: {:#}", e);
            JobOutput::failure(format!("{:#}", e))
        }
    };
    worker::write_output(&output).await
}

async fn handle_synthesize(
    config: &WorkerConfig,
    device: Option<&str>,
    request: &SynthesisRequest,
    output: &Path,
) -> Result<()> {
    let pipeline = build_pipeline(config, device)?;
    let outcome = pipeline.run(request).await?;

    audio::wav::write_wav(output, &outcome.audio)?;
    info!(
        "Wrote {} ({:.2}s, {} Hz, {} chunk(s))",
        output.display(),
        outcome.duration_seconds(),
        outcome.sample_rate(),
        outcome.chunks_processed
    );
    Ok(())
}

fn handle_split(text: &str, max_length: usize) -> Result<()> {
    let chunks = text::segment(text, max_length)?;
    for chunk in &chunks {
        println!("[{}] ({} chars) {}", chunk.index, chunk.length, chunk.content);
    }
    eprintln!("{} chunk(s), max length {}", chunks.len(), max_length);
    Ok(())
}

fn handle_prefetch(device: Option<&str>) -> Result<()> {
    // Loading on CPU is enough to populate the weight cache
    let device = device.unwrap_or("cpu");
    info!("Downloading Chatterbox multilingual model...");
    let engine = tts::create_backend(Some(device))?;
    info!("Model downloaded successfully (loaded on {})", engine.device());
    Ok(())
}

fn handle_config_command(
    action: &ConfigAction,
    config_path: &Path,
    mut config: WorkerConfig,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("Configuration file: {}", config_path.display());
            println!();
            match &config.device {
                Some(device) => println!("device = \"{}\"", device),
                None => println!("device = (auto-detect)"),
            }
            match &config.default_voice_ref {
                Some(voice) => println!("default_voice_ref = \"{}\"", voice.display()),
                None => println!("default_voice_ref = (built-in voice)"),
            }
            println!("max_chunk_length = {}", config.max_chunk_length);
            println!("silence_seconds = {}", config.silence_seconds);
        }
        ConfigAction::SetVoice { path } => {
            config.default_voice_ref = Some(require_voice_file(path)?);
            config.save_to(config_path)?;
            println!("Default voice reference set to: {}", path.display());
        }
        ConfigAction::SetDevice { device } => {
            if !matches!(device.as_str(), "cuda" | "mps" | "cpu") {
                anyhow::bail!("Unknown device '{}'. Use cuda, mps or cpu.", device);
            }
            config.device = Some(device.clone());
            config.save_to(config_path)?;
            println!("Default device set to: {}", device);
        }
    }
    Ok(())
}
