use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::extract::Extractor;
use crate::fetch::{Fetched, Fetcher};
use crate::platform::{classify, Platform};
use crate::resolve::{strategy_for, MediaDescriptor, MediaKind};
use crate::retry::with_retry;
use crate::sample::{
    extract_with_fallback, render_placeholder, FallbackStage, FfmpegVideoSource, VideoSource,
};

type VideoOpener = dyn Fn(&Path) -> Result<Box<dyn VideoSource>> + Send + Sync;

/// What a pipeline run produced.
#[derive(Debug)]
pub struct FrameReport {
    pub platform: Platform,
    pub stage: FallbackStage,
    pub frames_saved: usize,
    pub requested: usize,
}

/// Processes one URL end to end: classify, resolve under retry, fetch,
/// sample or fall back. Each call is independent; nothing is cached across
/// invocations, and the fetched temp file never outlives the call.
pub struct Pipeline {
    extractor: Arc<dyn Extractor>,
    client: reqwest::Client,
    max_attempts: u32,
    open_video: Box<VideoOpener>,
}

impl Pipeline {
    pub fn new(extractor: Arc<dyn Extractor>, client: reqwest::Client, max_attempts: u32) -> Self {
        Self {
            extractor,
            client,
            max_attempts,
            open_video: Box::new(|path| {
                FfmpegVideoSource::open(path).map(|s| Box::new(s) as Box<dyn VideoSource>)
            }),
        }
    }

    /// Swap the video decode backend. Used by tests to drive the sampling
    /// and fallback logic without ffmpeg.
    pub fn with_video_opener(mut self, opener: Box<VideoOpener>) -> Self {
        self.open_video = opener;
        self
    }

    pub async fn process_url(
        &self,
        url: &str,
        output_dir: &Path,
        requested: usize,
    ) -> Result<FrameReport, PipelineError> {
        let platform = classify(url).ok_or_else(|| PipelineError::UnsupportedPlatform {
            url: url.to_string(),
        })?;
        info!("Processing URL from {}: {}", platform.name(), url);

        std::fs::create_dir_all(output_dir).map_err(|source| PipelineError::OutputDir {
            path: output_dir.display().to_string(),
            source,
        })?;

        let strategy = strategy_for(platform, self.extractor.clone(), self.client.clone());
        let descriptor = with_retry(strategy.name(), self.max_attempts, || {
            strategy.resolve(url)
        })
        .await
        .map_err(|e| PipelineError::Resolution {
            attempts: self.max_attempts,
            reason: e.to_string(),
        })?;

        self.produce_frames(&descriptor, url, output_dir, requested)
            .await
    }

    async fn produce_frames(
        &self,
        descriptor: &MediaDescriptor,
        url: &str,
        output_dir: &Path,
        requested: usize,
    ) -> Result<FrameReport, PipelineError> {
        let diagnostic = diagnostic_text(descriptor, url);

        match descriptor.kind {
            MediaKind::Placeholder => {
                render_placeholder(&diagnostic, &output_dir.join("frame_1.jpg"))
                    .map_err(|e| PipelineError::Placeholder(e.to_string()))?;
                Ok(FrameReport {
                    platform: descriptor.platform,
                    stage: FallbackStage::Placeholder,
                    frames_saved: 1,
                    requested,
                })
            }
            MediaKind::Image => {
                let fetcher = Fetcher::new(self.client.clone(), self.extractor.clone());
                fetcher
                    .fetch(descriptor, output_dir)
                    .await
                    .map_err(|e| PipelineError::Transport(e.to_string()))?;
                Ok(FrameReport {
                    platform: descriptor.platform,
                    stage: FallbackStage::Image,
                    frames_saved: 1,
                    requested,
                })
            }
            MediaKind::Video => {
                let fetcher = Fetcher::new(self.client.clone(), self.extractor.clone());
                let fetched = fetcher
                    .fetch(descriptor, output_dir)
                    .await
                    .map_err(|e| PipelineError::Transport(e.to_string()))?;

                let Fetched::Video(temp) = fetched else {
                    // The fetcher only returns Image for image descriptors.
                    warn!("Video descriptor fetched as image output");
                    return Ok(FrameReport {
                        platform: descriptor.platform,
                        stage: FallbackStage::Image,
                        frames_saved: 1,
                        requested,
                    });
                };

                let extraction = extract_with_fallback(
                    |path| (self.open_video)(path),
                    temp.path(),
                    output_dir,
                    requested,
                    &diagnostic,
                )
                .map_err(|e| PipelineError::Placeholder(e.to_string()))?;
                // Dropping the handle deletes the fetched temp file on every
                // exit path above as well.
                drop(temp);

                if extraction.stage == FallbackStage::Video
                    && extraction.frames_saved < requested
                {
                    return Err(PipelineError::IncompleteFrames {
                        saved: extraction.frames_saved,
                        requested,
                    });
                }

                Ok(FrameReport {
                    platform: descriptor.platform,
                    stage: extraction.stage,
                    frames_saved: extraction.frames_saved,
                    requested,
                })
            }
        }
    }
}

/// Text stamped on placeholder frames: the post id when known, otherwise the
/// original URL.
fn diagnostic_text(descriptor: &MediaDescriptor, url: &str) -> String {
    if let Some(id) = &descriptor.post_id {
        return format!("Post {}", id);
    }
    descriptor
        .original_url
        .clone()
        .unwrap_or_else(|| url.to_string())
}
