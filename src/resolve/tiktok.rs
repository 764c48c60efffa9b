use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use super::descriptor::MediaDescriptor;
use super::youtube::find_image_entry;
use super::ResolveStrategy;
use crate::extract::{ExtractOptions, Extractor};
use crate::platform::{platform_headers, Platform};

/// TikTok resolution. Per-format CDN URLs from TikTok frequently cannot be
/// fetched directly, so the descriptor always records the original post URL
/// for the fetch stage to re-resolve through the extractor.
pub struct TiktokStrategy {
    extractor: Arc<dyn Extractor>,
}

impl TiktokStrategy {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self { extractor }
    }

    fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            // TikTok needs a more flexible format filter than best[ext=mp4].
            format: Some("best".to_string()),
            no_playlist: true,
            headers: platform_headers(Platform::Tiktok),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ResolveStrategy for TiktokStrategy {
    fn name(&self) -> &'static str {
        "tiktok"
    }

    async fn resolve(&self, url: &str) -> Result<MediaDescriptor> {
        let info = self.extractor.extract(url, &self.extract_options()).await?;

        if let Some(video_url) = info.formats.iter().find_map(|f| f.url.clone()) {
            debug!("TikTok video URL: {}", video_url);
            return Ok(
                MediaDescriptor::video(Platform::Tiktok, video_url).with_original_url(url)
            );
        }

        if let Some(image_url) = find_image_entry(&info) {
            info!("Detected TikTok image post");
            return Ok(
                MediaDescriptor::image(Platform::Tiktok, image_url).with_original_url(url)
            );
        }

        if let Some(thumbnail) = &info.thumbnail {
            info!("No video found, using thumbnail image");
            return Ok(MediaDescriptor::image(Platform::Tiktok, thumbnail.clone())
                .with_original_url(url));
        }

        anyhow::bail!("No suitable media stream found")
    }
}
