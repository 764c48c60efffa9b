use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::placeholder::render_placeholder;
use super::source::VideoSource;

/// The stage that produced output. Video attempts come first; image decode
/// and placeholder synthesis are the ordered fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStage {
    Video,
    Image,
    Placeholder,
}

/// Outcome of a fallback-chain run.
#[derive(Debug)]
pub struct Extraction {
    pub stage: FallbackStage,
    pub frames_saved: usize,
}

/// Run the decode fallback chain over a fetched media file:
/// video attempt -> image attempt -> placeholder attempt.
///
/// A placeholder is an expected outcome for undecodable media, not an error;
/// the only failure here is placeholder synthesis itself (e.g. a filesystem
/// error). `open_video` is injected so decode backends are swappable.
pub fn extract_with_fallback<F>(
    open_video: F,
    media_path: &Path,
    output_dir: &Path,
    requested: usize,
    diagnostic: &str,
) -> Result<Extraction>
where
    F: FnOnce(&Path) -> Result<Box<dyn VideoSource>>,
{
    match open_video(media_path) {
        Ok(mut source) => match super::sample_frames(source.as_mut(), output_dir, requested) {
            Ok(frames_saved) => {
                return Ok(Extraction {
                    stage: FallbackStage::Video,
                    frames_saved,
                });
            }
            Err(e) => warn!("Frame sampling failed: {}", e),
        },
        Err(e) => warn!("Could not open as video: {}", e),
    }

    info!("Trying as image instead");
    match decode_as_image(media_path, output_dir) {
        Ok(()) => {
            return Ok(Extraction {
                stage: FallbackStage::Image,
                frames_saved: 1,
            });
        }
        Err(e) => warn!("Could not decode as image: {}", e),
    }

    info!("Falling back to placeholder frame");
    render_placeholder(diagnostic, &output_dir.join("frame_1.jpg"))?;
    Ok(Extraction {
        stage: FallbackStage::Placeholder,
        frames_saved: 1,
    })
}

fn decode_as_image(media_path: &Path, output_dir: &Path) -> Result<()> {
    // Fetched files keep a video suffix regardless of their real content, so
    // the format must be sniffed from the bytes rather than the file name.
    let file = File::open(media_path)
        .with_context(|| format!("Failed to open {}", media_path.display()))?;
    let image = image::ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .context("Failed to probe image format")?
        .decode()
        .context("Image decode failed")?;
    let dest = output_dir.join("frame_1.jpg");
    image
        .to_rgb8()
        .save(&dest)
        .with_context(|| format!("Failed to save image to {}", dest.display()))?;
    info!("Saved image to {}", dest.display());
    Ok(())
}
