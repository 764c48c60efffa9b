use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use anyhow::{Context, Result};
use image::RgbImage;
use serde::Deserialize;
use tracing::{debug, warn};

/// Sequential frame-read interface over an opened video. Frame count and
/// rate are advisory; streams frequently cannot report either.
pub trait VideoSource {
    fn frame_count(&self) -> Option<u64>;

    fn fps(&self) -> Option<f64>;

    /// Next decoded frame, or `None` at end of stream.
    fn read_frame(&mut self) -> Result<Option<RgbImage>>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
}

/// `ffprobe` rational like "30000/1001". "0/0" means unreported.
fn parse_frame_rate(raw: &str) -> Option<f64> {
    let (num, den) = raw.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 || num <= 0.0 {
        return None;
    }
    Some(num / den)
}

fn parse_frame_count(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|&n| n > 0)
}

/// Video source backed by an ffmpeg rawvideo pipe, probed with ffprobe.
pub struct FfmpegVideoSource {
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
    fps: Option<f64>,
    frame_count: Option<u64>,
    frame_buf: Vec<u8>,
}

impl FfmpegVideoSource {
    pub fn open(path: &Path) -> Result<Self> {
        let probe = Command::new("ffprobe")
            .arg("-v")
            .arg("error")
            .arg("-select_streams")
            .arg("v:0")
            .arg("-show_entries")
            .arg("stream=width,height,r_frame_rate,nb_frames")
            .arg("-of")
            .arg("json")
            .arg(path)
            .output()
            .context("Failed to run ffprobe")?;

        if !probe.status.success() {
            anyhow::bail!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&probe.stderr)
            );
        }

        let parsed: ProbeOutput = serde_json::from_slice(&probe.stdout)
            .context("Failed to parse ffprobe output")?;
        let stream = parsed
            .streams
            .first()
            .context("No video stream found")?;
        let width = stream.width.context("Video stream reports no width")?;
        let height = stream.height.context("Video stream reports no height")?;
        let fps = stream.r_frame_rate.as_deref().and_then(parse_frame_rate);
        let frame_count = stream.nb_frames.as_deref().and_then(parse_frame_count);

        debug!(
            "Opened video {}x{} fps={:?} frames={:?}",
            width, height, fps, frame_count
        );

        let mut child = Command::new("ffmpeg")
            .arg("-v")
            .arg("error")
            .arg("-i")
            .arg(path)
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("pipe:1")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to spawn ffmpeg")?;

        let stdout = child.stdout.take().context("Failed to get ffmpeg stdout")?;
        let frame_size = width as usize * height as usize * 3;

        Ok(Self {
            child,
            stdout,
            width,
            height,
            fps,
            frame_count,
            frame_buf: vec![0u8; frame_size],
        })
    }
}

impl VideoSource for FfmpegVideoSource {
    fn frame_count(&self) -> Option<u64> {
        self.frame_count
    }

    fn fps(&self) -> Option<f64> {
        self.fps
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        let mut filled = 0;
        while filled < self.frame_buf.len() {
            let n = self
                .stdout
                .read(&mut self.frame_buf[filled..])
                .context("Failed to read frame data from ffmpeg")?;
            if n == 0 {
                if filled > 0 {
                    // Truncated trailing frame; treat as end of stream.
                    warn!("Discarding {} trailing bytes from ffmpeg pipe", filled);
                }
                return Ok(None);
            }
            filled += n;
        }

        let image = RgbImage::from_raw(self.width, self.height, self.frame_buf.clone())
            .context("Frame buffer size mismatch")?;
        Ok(Some(image))
    }
}

impl Drop for FfmpegVideoSource {
    fn drop(&mut self) {
        // The pipe is usually abandoned mid-stream once enough frames were
        // sampled; reap the decoder rather than leaving it writing.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
