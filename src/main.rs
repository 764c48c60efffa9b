use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

mod config;
mod error;
mod extract;
mod fetch;
mod pipeline;
mod platform;
mod resolve;
mod retry;
mod sample;

use pipeline::Pipeline;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL to process (youtube, facebook, instagram, tiktok, twitter/x, bilibili, ...)
    url: Option<String>,

    /// Process one URL per line from a file instead
    #[arg(long, conflicts_with = "url")]
    batch: Option<PathBuf>,

    /// Directory the frames are written to (created if absent)
    #[arg(short, long, default_value = "output_frames")]
    output_dir: PathBuf,

    /// Number of frames to extract per video
    #[arg(short = 'n', long)]
    frames: Option<usize>,

    /// Path to the config file
    #[arg(short, long)]
    config: Option<String>,
}

fn get_config_path(args: &Args) -> Option<String> {
    if let Some(path) = &args.config {
        return Some(path.clone());
    }

    if let Ok(path) = std::env::var("CONFIG_FILE") {
        return Some(path);
    }

    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        let config_path = format!("{}/framegrab/config.toml", xdg_config_home);
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        let config_path = format!("{}/.config/framegrab/config.toml", home.display());
        if std::path::Path::new(&config_path).exists() {
            return Some(config_path);
        }
    }

    None
}

fn build_pipeline(config: &config::Config) -> Result<Pipeline> {
    let extractor = Arc::new(extract::YtDlpExtractor::with_timeouts(
        Duration::from_secs(config.extract_timeout_secs),
        Duration::from_secs(config.download_timeout_secs),
    ));
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .context("Failed to create HTTP client")?;
    Ok(Pipeline::new(extractor, client, config.max_attempts))
}

async fn process_one(pipeline: &Pipeline, url: &str, output_dir: &PathBuf, frames: usize) -> bool {
    match pipeline.process_url(url, output_dir, frames).await {
        Ok(report) => {
            info!(
                "Extracted {} of {} requested frame(s) from {} via {} into {}",
                report.frames_saved,
                report.requested,
                report.platform.name(),
                match report.stage {
                    sample::FallbackStage::Video => "video sampling",
                    sample::FallbackStage::Image => "image decode",
                    sample::FallbackStage::Placeholder => "placeholder synthesis",
                },
                output_dir.display()
            );
            true
        }
        Err(e) => {
            error!("Failed to process {}: {}", url, e);
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = if let Some(config_path) = get_config_path(&args) {
        config::Config::from_file(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path))?
    } else {
        config::Config::default()
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    if config.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    extract::test_availability().await;

    let pipeline = build_pipeline(&config)?;
    let frames = args.frames.unwrap_or(config.frame_count);

    if let Some(batch_path) = &args.batch {
        let contents = std::fs::read_to_string(batch_path)
            .with_context(|| format!("Failed to read batch file {}", batch_path.display()))?;
        let urls: Vec<&str> = contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();

        let mut failed = 0usize;
        for url in &urls {
            // Each URL is an independent pipeline invocation; one failure
            // does not stop the batch.
            if !process_one(&pipeline, url, &args.output_dir, frames).await {
                failed += 1;
            }
        }
        info!("Batch complete: {}/{} succeeded", urls.len() - failed, urls.len());
        if failed > 0 {
            std::process::exit(1);
        }
        return Ok(());
    }

    let Some(url) = &args.url else {
        anyhow::bail!("Provide a URL or --batch <file>; see --help");
    };

    if !process_one(&pipeline, url, &args.output_dir, frames).await {
        std::process::exit(1);
    }
    Ok(())
}
