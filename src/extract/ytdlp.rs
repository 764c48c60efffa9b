use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::types::{ExtractOptions, ExtractedInfo};
use super::Extractor;

const EXTRACT_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Extraction collaborator backed by the yt-dlp binary.
pub struct YtDlpExtractor {
    extract_timeout: Duration,
    download_timeout: Duration,
}

impl YtDlpExtractor {
    pub fn new() -> Self {
        Self {
            extract_timeout: EXTRACT_TIMEOUT,
            download_timeout: DOWNLOAD_TIMEOUT,
        }
    }

    pub fn with_timeouts(extract_timeout: Duration, download_timeout: Duration) -> Self {
        Self {
            extract_timeout,
            download_timeout,
        }
    }

    fn apply_options(cmd: &mut Command, opts: &ExtractOptions) {
        if let Some(format) = &opts.format {
            cmd.arg("--format").arg(format);
        }
        if opts.no_playlist {
            cmd.arg("--no-playlist");
        }
        if opts.flat_playlist {
            cmd.arg("--flat-playlist");
        }
        if opts.force_generic {
            cmd.arg("--force-generic-extractor");
        }
        // yt-dlp takes one FIELD:VALUE per --add-header use.
        for (key, value) in &opts.headers {
            cmd.arg("--add-header").arg(format!("{}:{}", key, value));
        }
    }

    fn extract_command(url: &str, opts: &ExtractOptions) -> Command {
        let mut cmd = Command::new("yt-dlp");
        cmd.arg("--dump-single-json")
            .arg("--no-download")
            .arg("--no-warnings");
        Self::apply_options(&mut cmd, opts);
        cmd.arg(url);
        cmd
    }

    fn download_command(url: &str, opts: &ExtractOptions, dest: &Path) -> Command {
        let mut cmd = Command::new("yt-dlp");
        // The destination is a pre-created temp file; without forcing,
        // yt-dlp treats it as already downloaded and writes nothing.
        cmd.arg("--output")
            .arg(dest)
            .arg("--force-overwrites")
            .arg("--no-warnings");
        Self::apply_options(&mut cmd, opts);
        cmd.arg(url);
        cmd
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    async fn extract(&self, url: &str, opts: &ExtractOptions) -> Result<ExtractedInfo> {
        debug!("Extracting media info with yt-dlp for: {}", url);

        let mut cmd = Self::extract_command(url, opts);
        let output = tokio::time::timeout(self.extract_timeout, cmd.output())
            .await
            .context("Media info extraction timed out")?
            .context("Failed to run yt-dlp")?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow::anyhow!("Media info extraction failed: {}", error));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        debug!("yt-dlp JSON output: {} bytes", json_str.len());

        serde_json::from_str(&json_str).context("Failed to parse media info")
    }

    async fn download(&self, url: &str, opts: &ExtractOptions, dest: &Path) -> Result<()> {
        info!("Downloading media with yt-dlp to {}", dest.display());

        let mut cmd = Self::download_command(url, opts, dest);
        let output = tokio::time::timeout(self.download_timeout, cmd.output())
            .await
            .context("Media download timed out")?
            .context("Failed to run yt-dlp")?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow::anyhow!("Media download failed: {}", error));
        }

        Ok(())
    }
}

/// Probe for the external binaries the pipeline shells out to, logging what
/// was found. Returns true when yt-dlp is usable; ffmpeg is reported but not
/// required (the image and placeholder paths work without it).
pub async fn test_availability() -> bool {
    let yt_dlp_available = match Command::new("yt-dlp").arg("--version").output().await {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            info!("yt-dlp is available, version: {}", version.trim());
            true
        }
        Ok(_) => {
            warn!("yt-dlp command failed");
            false
        }
        Err(e) => {
            warn!("yt-dlp not found: {}", e);
            false
        }
    };

    match Command::new("ffmpeg").arg("-version").output().await {
        Ok(output) if output.status.success() => {
            let version_line = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("unknown")
                .to_string();
            info!("ffmpeg is available: {}", version_line);
        }
        _ => {
            warn!("ffmpeg not found; video decoding will fall back to image/placeholder output");
        }
    }

    yt_dlp_available
}
