mod fallback;
mod placeholder;
mod source;

pub use fallback::{extract_with_fallback, FallbackStage};
pub use placeholder::render_placeholder;
pub use source::{FfmpegVideoSource, VideoSource};

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Frames assumed per second when the source reports no rate.
const DEFAULT_FPS: f64 = 30.0;
/// Assumed duration in seconds for streams with no reliable frame count.
const ESTIMATED_DURATION_SECS: f64 = 60.0;

/// Best-effort total frame count: the source's reported count when it has
/// one, otherwise fps x 60s. Conservative for unseekable streams.
fn estimate_total_frames(source: &dyn VideoSource) -> u64 {
    if let Some(total) = source.frame_count().filter(|&t| t > 0) {
        return total;
    }
    let fps = source.fps().filter(|&f| f > 0.0).unwrap_or(DEFAULT_FPS);
    (fps * ESTIMATED_DURATION_SECS) as u64
}

/// Sampling interval: frames skipped between kept frames so that `requested`
/// frames spread across the estimated length, first frame always kept.
fn compute_stride(total_frames: u64, requested: usize) -> u64 {
    if total_frames > requested as u64 {
        (total_frames / (requested as u64 + 1)).saturating_sub(1)
    } else {
        0
    }
}

/// Read the source sequentially, saving `requested` evenly-spaced frames as
/// `frame_1.jpg … frame_N.jpg`. Returns the number saved; at least one frame
/// must decode or this fails. Stops early if the stream is exhausted.
pub fn sample_frames(
    source: &mut dyn VideoSource,
    output_dir: &Path,
    requested: usize,
) -> Result<usize> {
    let mut frames_captured = 0usize;
    let mut frames_read = 0u64;
    let mut stride = 0u64;

    while frames_captured < requested {
        let Some(frame) = source.read_frame()? else {
            break;
        };
        frames_read += 1;

        // The stride is computed once the first frame proves the stream
        // decodable; the first frame itself is always kept.
        if frames_read == 1 {
            let total_frames = estimate_total_frames(source);
            stride = compute_stride(total_frames, requested);
            debug!(
                "Sampling with stride {} over ~{} frames",
                stride, total_frames
            );
            save_frame(&frame, output_dir, frames_captured + 1)?;
            frames_captured += 1;
            continue;
        }

        if stride > 0 && (frames_read - 1) % (stride + 1) != 0 {
            continue;
        }

        save_frame(&frame, output_dir, frames_captured + 1)?;
        frames_captured += 1;
    }

    if frames_captured == 0 {
        anyhow::bail!("No decodable frames in video source");
    }
    Ok(frames_captured)
}

fn save_frame(frame: &image::RgbImage, output_dir: &Path, index: usize) -> Result<()> {
    let path = output_dir.join(format!("frame_{}.jpg", index));
    frame
        .save(&path)
        .with_context(|| format!("Failed to save frame to {}", path.display()))?;
    info!("Saved frame {} to {}", index, path.display());
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::{assert_encoded_index, SyntheticSource};
    use super::*;

    #[test]
    fn test_compute_stride_known_values() {
        // 100 frames, 5 requested: 100 / 6 - 1 = 15.
        assert_eq!(compute_stride(100, 5), 15);
        assert_eq!(compute_stride(5, 5), 0);
        assert_eq!(compute_stride(3, 5), 0);
        // total barely above requested still clamps to 0.
        assert_eq!(compute_stride(7, 5), 0);
    }

    #[test]
    fn test_estimate_prefers_reported_count() {
        let source = SyntheticSource::new(10, Some(100), Some(25.0));
        assert_eq!(estimate_total_frames(&source), 100);
    }

    #[test]
    fn test_estimate_falls_back_to_fps_times_sixty() {
        let source = SyntheticSource::new(10, None, Some(25.0));
        assert_eq!(estimate_total_frames(&source), 1500);
        let source = SyntheticSource::new(10, None, None);
        assert_eq!(estimate_total_frames(&source), 1800);
    }

    #[test]
    fn test_sample_uniform_spacing_over_100_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = SyntheticSource::new(100, Some(100), Some(30.0));

        let saved = sample_frames(&mut source, dir.path(), 5).unwrap();
        assert_eq!(saved, 5);

        // Stride 15: kept source indices are 0, 16, 32, 48, 64.
        let expected = [0u8, 16, 32, 48, 64];
        for (i, want) in expected.iter().enumerate() {
            let path = dir.path().join(format!("frame_{}.jpg", i + 1));
            assert!(path.exists(), "missing frame_{}", i + 1);
            assert_encoded_index(&path, *want);
        }
        assert!(!dir.path().join("frame_6.jpg").exists());
    }

    #[test]
    fn test_sample_short_source_keeps_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = SyntheticSource::new(3, Some(3), Some(30.0)).with_index_scale(64);

        let saved = sample_frames(&mut source, dir.path(), 5).unwrap();
        assert_eq!(saved, 3);
        for (i, want) in [0u8, 64, 128].iter().enumerate() {
            let path = dir.path().join(format!("frame_{}.jpg", i + 1));
            assert_encoded_index(&path, *want);
        }
    }

    #[test]
    fn test_sample_empty_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = SyntheticSource::new(0, None, None);
        assert!(sample_frames(&mut source, dir.path(), 5).is_err());
    }

    #[test]
    fn test_sample_stops_at_requested_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = SyntheticSource::new(200, Some(6), Some(30.0));

        // total 6 > requested 5, stride = 6/6 - 1 = 0: consecutive frames.
        let saved = sample_frames(&mut source, dir.path(), 5).unwrap();
        assert_eq!(saved, 5);
        assert!(!dir.path().join("frame_6.jpg").exists());
    }
}
