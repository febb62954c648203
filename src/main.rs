use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use car_shorts::config::Config;
use car_shorts::review::{AutoContinue, DecisionSource, StdinDecisions};
use car_shorts::workspace::Workspace;
use car_shorts::{generator, images, pipeline, publish, review, video, voice};

#[derive(Parser)]
#[command(name = "car-shorts", about = "Generates and publishes short car-themed videos")]
struct Cli {
    /// Skip the interactive review gate (batch mode).
    #[arg(long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the whole pipeline: reset, generate, review, voice, images, video, publish.
    Run,
    /// Clear and recreate the workspace directories.
    Reset,
    /// Generate title, description, hashtags, script and image query.
    Generate,
    /// Review and optionally edit or regenerate the generated content.
    Review,
    /// Synthesize the narration audio from the script.
    Voice,
    /// Search and download stock images for the video.
    Images,
    /// Assemble the vertical slideshow video.
    Video,
    /// Upload the latest video to YouTube.
    Publish,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let ws = Workspace::default();
    let cfg = Config::load(ws.config_path()).await?;
    let client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    let mut stdin_decisions = StdinDecisions;
    let mut auto = AutoContinue;
    let decisions: &mut dyn DecisionSource = if cli.yes { &mut auto } else { &mut stdin_decisions };

    match cli.command {
        Command::Run => {
            ws.ensure_directories().await?;
            if !car_shorts::workspace::check_ffmpeg().await {
                eprintln!("[WARNING] FFmpeg not found in PATH. Please install FFmpeg.");
            }
            if let Err(err) = pipeline::run(&ws, &cfg, &client, decisions).await {
                eprintln!("[ERROR] {}", err);
                std::process::exit(1);
            }
        }
        Command::Reset => ws.reset().await?,
        Command::Generate => {
            generator::run(&ws, &cfg, &client).await?;
        }
        Command::Review => {
            let outcome = review::run(&ws, &cfg, &client, decisions).await?;
            if outcome == car_shorts::review::ReviewOutcome::Aborted {
                std::process::exit(1);
            }
        }
        Command::Voice => voice::run(&ws, &cfg, &client).await?,
        Command::Images => {
            images::run(&ws, &cfg, &client).await?;
        }
        Command::Video => video::run(&ws).await?,
        Command::Publish => publish::run(&ws, &client).await?,
    }

    Ok(())
}
