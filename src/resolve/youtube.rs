use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use super::descriptor::MediaDescriptor;
use super::ResolveStrategy;
use crate::extract::{ExtractOptions, ExtractedInfo, Extractor};
use crate::platform::{common_headers, Platform};

/// Strategy for YouTube and the platforms that behave like it (facebook,
/// instagram, clapper, generic hosts). Platform only changes the extraction
/// options, not the tier ordering.
pub struct YoutubeStrategy {
    platform: Platform,
    extractor: Arc<dyn Extractor>,
}

impl YoutubeStrategy {
    pub fn new(platform: Platform, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            platform,
            extractor,
        }
    }

    fn extract_options(&self) -> ExtractOptions {
        let mut opts = ExtractOptions {
            format: Some("best[ext=mp4]".to_string()),
            headers: common_headers(),
            ..Default::default()
        };
        match self.platform {
            Platform::Facebook => {
                opts.no_playlist = true;
            }
            Platform::Instagram => {
                opts.no_playlist = true;
                opts.flat_playlist = true;
            }
            _ => {}
        }
        opts
    }
}

/// Scan a playlist-shaped result for an image entry; some platforms return
/// playlists for posts that are actually image galleries.
pub(super) fn find_image_entry(info: &ExtractedInfo) -> Option<String> {
    if !info.is_playlist() {
        return None;
    }
    for entry in &info.entries {
        if entry.is_image() {
            if let Some(url) = entry.url.clone().or_else(|| entry.thumbnail.clone()) {
                return Some(url);
            }
        }
    }
    None
}

#[async_trait]
impl ResolveStrategy for YoutubeStrategy {
    fn name(&self) -> &'static str {
        "youtube"
    }

    async fn resolve(&self, url: &str) -> Result<MediaDescriptor> {
        let info = self.extractor.extract(url, &self.extract_options()).await?;

        if let Some(image_url) = find_image_entry(&info) {
            info!("Detected image post on {}", self.platform.name());
            return Ok(MediaDescriptor::image(self.platform, image_url));
        }

        if let Some(direct) = &info.url {
            debug!("Using direct media URL for {}", self.platform.name());
            return Ok(MediaDescriptor::video(self.platform, direct.clone()));
        }

        if !info.formats.is_empty() {
            // Prefer mp4 formats; otherwise take whatever is first.
            let chosen = info
                .formats
                .iter()
                .find(|f| f.ext.as_deref() == Some("mp4") && f.url.is_some())
                .or_else(|| info.formats.iter().find(|f| f.url.is_some()));
            if let Some(format) = chosen {
                if let Some(format_url) = format.url.clone() {
                    debug!(
                        "Selected format {} for {}",
                        format.format_id.as_deref().unwrap_or("unknown"),
                        self.platform.name()
                    );
                    return Ok(MediaDescriptor::video(self.platform, format_url));
                }
            }
        }

        if let Some(thumbnail) = &info.thumbnail {
            info!("No video found, using thumbnail image");
            return Ok(MediaDescriptor::image(self.platform, thumbnail.clone()));
        }

        anyhow::bail!("No suitable media stream found")
    }
}
