use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use super::descriptor::MediaDescriptor;
use super::youtube::find_image_entry;
use super::ResolveStrategy;
use crate::extract::{ExtractOptions, Extractor, MediaFormat};
use crate::platform::{common_headers, Platform};

/// Bilibili resolution with a three-tier format quality fallback: mp4
/// extension, then any format with a real video codec, then the first
/// format unconditionally.
pub struct BilibiliStrategy {
    extractor: Arc<dyn Extractor>,
}

impl BilibiliStrategy {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self { extractor }
    }

    fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            // No format restriction: Bilibili's format table is inconsistent
            // and a filter can reject everything it serves.
            format: None,
            no_playlist: true,
            headers: common_headers(),
            ..Default::default()
        }
    }

    fn select_format(formats: &[MediaFormat]) -> Option<&MediaFormat> {
        let candidates: Vec<&MediaFormat> =
            formats.iter().filter(|f| f.url.is_some()).collect();
        if candidates.is_empty() {
            return None;
        }

        if let Some(mp4) = candidates.iter().find(|f| f.ext.as_deref() == Some("mp4")) {
            debug!(
                "Selected mp4 format for Bilibili: {}",
                mp4.format_id.as_deref().unwrap_or("unknown")
            );
            return Some(mp4);
        }

        if let Some(video) = candidates
            .iter()
            .find(|f| f.vcodec.as_deref().is_some_and(|v| v != "none"))
        {
            debug!(
                "Selected alternative video format for Bilibili: {} (ext: {})",
                video.format_id.as_deref().unwrap_or("unknown"),
                video.ext.as_deref().unwrap_or("unknown")
            );
            return Some(video);
        }

        let first = candidates[0];
        debug!(
            "Selected fallback format for Bilibili: {}",
            first.format_id.as_deref().unwrap_or("unknown")
        );
        Some(first)
    }
}

#[async_trait]
impl ResolveStrategy for BilibiliStrategy {
    fn name(&self) -> &'static str {
        "bilibili"
    }

    async fn resolve(&self, url: &str) -> Result<MediaDescriptor> {
        let info = self.extractor.extract(url, &self.extract_options()).await?;

        if !info.formats.is_empty() {
            debug!(
                "Found {} available formats for Bilibili video",
                info.formats.len()
            );
            if let Some(video_url) =
                Self::select_format(&info.formats).and_then(|f| f.url.clone())
            {
                return Ok(
                    MediaDescriptor::video(Platform::Bilibili, video_url).with_original_url(url)
                );
            }
        }

        if let Some(image_url) = find_image_entry(&info) {
            info!("Detected Bilibili image post");
            return Ok(MediaDescriptor::image(Platform::Bilibili, image_url));
        }

        if let Some(thumbnail) = &info.thumbnail {
            info!("No video found, using thumbnail image");
            return Ok(MediaDescriptor::image(Platform::Bilibili, thumbnail.clone()));
        }

        anyhow::bail!("No suitable media stream found")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractedInfo;
    use crate::resolve::testing::StubExtractor;
    use crate::resolve::MediaKind;

    fn fmt(url: &str, ext: &str, vcodec: &str) -> MediaFormat {
        MediaFormat {
            url: Some(url.to_string()),
            ext: Some(ext.to_string()),
            vcodec: Some(vcodec.to_string()),
            format_id: Some(ext.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_prefers_mp4_format() {
        let info = ExtractedInfo {
            formats: vec![
                fmt("https://cdn.bili.example/a.flv", "flv", "avc1"),
                fmt("https://cdn.bili.example/b.mp4", "mp4", "avc1"),
            ],
            ..Default::default()
        };
        let strategy = BilibiliStrategy::new(Arc::new(StubExtractor::with_info(info)));
        let desc = strategy
            .resolve("https://www.bilibili.com/video/BV1")
            .await
            .unwrap();
        assert_eq!(desc.location_url.as_deref(), Some("https://cdn.bili.example/b.mp4"));
        assert_eq!(desc.original_url.as_deref(), Some("https://www.bilibili.com/video/BV1"));
    }

    #[tokio::test]
    async fn test_falls_back_to_real_vcodec() {
        let info = ExtractedInfo {
            formats: vec![
                fmt("https://cdn.bili.example/audio.m4a", "m4a", "none"),
                fmt("https://cdn.bili.example/video.flv", "flv", "avc1"),
            ],
            ..Default::default()
        };
        let strategy = BilibiliStrategy::new(Arc::new(StubExtractor::with_info(info)));
        let desc = strategy
            .resolve("https://www.bilibili.com/video/BV1")
            .await
            .unwrap();
        assert_eq!(
            desc.location_url.as_deref(),
            Some("https://cdn.bili.example/video.flv")
        );
    }

    #[tokio::test]
    async fn test_last_resort_first_format() {
        let info = ExtractedInfo {
            formats: vec![
                fmt("https://cdn.bili.example/a.m4a", "m4a", "none"),
                fmt("https://cdn.bili.example/b.m4a", "m4a", "none"),
            ],
            ..Default::default()
        };
        let strategy = BilibiliStrategy::new(Arc::new(StubExtractor::with_info(info)));
        let desc = strategy
            .resolve("https://www.bilibili.com/video/BV1")
            .await
            .unwrap();
        assert_eq!(desc.location_url.as_deref(), Some("https://cdn.bili.example/a.m4a"));
        assert_eq!(desc.kind, MediaKind::Video);
    }

    #[tokio::test]
    async fn test_thumbnail_when_no_formats() {
        let info = ExtractedInfo {
            thumbnail: Some("https://cdn.bili.example/cover.jpg".to_string()),
            ..Default::default()
        };
        let strategy = BilibiliStrategy::new(Arc::new(StubExtractor::with_info(info)));
        let desc = strategy
            .resolve("https://www.bilibili.com/video/BV1")
            .await
            .unwrap();
        assert_eq!(desc.kind, MediaKind::Image);
    }
}
