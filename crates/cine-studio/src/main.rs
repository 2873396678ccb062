//! Cineboard command-line binary: manuscript in, storyboard video out.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use cine_media::{export_file_name, ExportProgress};
use cine_models::{Genre, SceneState};
use cine_studio::{init_tracing, LogFormat, Studio, StudioConfig};

#[derive(Parser, Debug)]
#[command(name = "cineboard", about = "Turn a script into a storyboard video")]
struct Cli {
    /// Manuscript or scene script to storyboard.
    #[arg(long)]
    script: PathBuf,

    /// Scene title, also used for the video file name.
    #[arg(long)]
    title: String,

    #[arg(long, default_value = "")]
    location: String,

    /// Drama, Comedy, Horror, Action, Sci-Fi or Noir.
    #[arg(long, default_value = "Drama")]
    genre: Genre,

    /// Where to write the video. Defaults to `<title>.mp4` in the current directory.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also write the final scene document as JSON.
    #[arg(long)]
    scene_json: Option<PathBuf>,

    /// Build frames without synthesizing audio. Nothing is exported.
    #[arg(long)]
    skip_audio: bool,
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env());

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("cineboard failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let manuscript = tokio::fs::read_to_string(&cli.script)
        .await
        .with_context(|| format!("failed to read {}", cli.script.display()))?;

    let config = StudioConfig::from_env().context("invalid configuration")?;
    info!(
        frame_policy = %config.frame_policy,
        plate_policy = %config.plate_policy,
        text_model = %config.gateway.text_model,
        image_model = %config.gateway.image_model,
        "Starting cineboard"
    );

    let scene = SceneState::new(&cli.title, &cli.location, cli.genre);
    let studio = Studio::from_config(config, scene)?;

    let imported = studio.import_manuscript(&manuscript).await?;
    info!(?imported, "Manifest ready");

    let storyboard = studio.build_storyboard().await?;
    info!(?storyboard, "Storyboard ready");

    if cli.skip_audio {
        warn!("Audio skipped, no video exported");
    } else {
        let voiced = studio.synthesize_storyboard_audio().await?;
        info!(frames = voiced, "Audio ready");

        let video = studio
            .export(&|progress: ExportProgress| {
                info!(
                    stage = progress.stage.as_str(),
                    percent = progress.percent,
                    "Export progress"
                );
            })
            .await
            .context("export failed; ensure every frame has both image and audio")?;

        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(export_file_name(&cli.title)));
        tokio::fs::write(&output, &video.bytes)
            .await
            .with_context(|| format!("failed to write {}", output.display()))?;
        info!(
            path = %output.display(),
            segments = video.segments.len(),
            duration_secs = video.total_duration_secs(),
            "Video written"
        );
    }

    if let Some(path) = &cli.scene_json {
        let scene = studio.snapshot().await?;
        let json = serde_json::to_vec_pretty(&scene)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "Scene document written");
    }

    Ok(())
}
