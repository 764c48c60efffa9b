use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use tracing::{debug, info};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 360;
const BACKGROUND: Rgb<u8> = Rgb([32, 32, 32]);

/// Synthesize a placeholder frame annotated with diagnostic text (post id or
/// original URL). Text rendering needs ffmpeg's drawtext; without it a plain
/// canvas is still written, so only a filesystem or encode error fails.
pub fn render_placeholder(text: &str, dest: &Path) -> Result<()> {
    if !text.is_empty() {
        match render_with_ffmpeg(text, dest) {
            Ok(()) => {
                info!("Saved placeholder frame to {}", dest.display());
                return Ok(());
            }
            Err(e) => debug!("ffmpeg placeholder rendering failed: {}", e),
        }
    }

    render_canvas(dest)?;
    info!("Saved placeholder frame to {}", dest.display());
    Ok(())
}

fn render_with_ffmpeg(text: &str, dest: &Path) -> Result<()> {
    // drawtext treats backslash, colon and quote as syntax.
    let escaped = text
        .replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\\\\\'");
    let filter = format!(
        "drawtext=text='{}':fontcolor=white:fontsize=20:x=(w-text_w)/2:y=(h-text_h)/2",
        escaped
    );

    let output = Command::new("ffmpeg")
        .arg("-v")
        .arg("error")
        .arg("-f")
        .arg("lavfi")
        .arg("-i")
        .arg(format!("color=c=0x202020:s={}x{}", WIDTH, HEIGHT))
        .arg("-frames:v")
        .arg("1")
        .arg("-vf")
        .arg(&filter)
        .arg("-y")
        .arg(dest)
        .output()
        .context("Failed to run ffmpeg")?;

    if !output.status.success() {
        anyhow::bail!(
            "ffmpeg placeholder synthesis failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(())
}

fn render_canvas(dest: &Path) -> Result<()> {
    let canvas = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
    canvas
        .save(dest)
        .with_context(|| format!("Failed to save placeholder to {}", dest.display()))
}
