use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, warn};

use super::descriptor::{MediaDescriptor, MediaKind};
use super::ResolveStrategy;
use crate::extract::{ExtractOptions, ExtractedInfo, Extractor};
use crate::platform::{platform_headers, Platform};

/// Twitter/X resolution. Four tiers: full extraction, a direct scan of the
/// tweet page HTML, a force-generic re-extraction, and finally a placeholder
/// descriptor. A text-only tweet is an expected outcome, not an error, so
/// this strategy reaches the placeholder tier instead of failing.
pub struct TwitterStrategy {
    extractor: Arc<dyn Extractor>,
    client: reqwest::Client,
}

/// A media pointer found by one of the tiers, before it is wrapped into a
/// descriptor.
struct Found {
    url: String,
    kind: MediaKind,
}

impl TwitterStrategy {
    pub fn new(extractor: Arc<dyn Extractor>, client: reqwest::Client) -> Self {
        Self { extractor, client }
    }

    fn extract_options(force_generic: bool) -> ExtractOptions {
        ExtractOptions {
            no_playlist: true,
            force_generic,
            headers: platform_headers(Platform::Twitter),
            ..Default::default()
        }
    }

    /// Tier 1/3 inspection: direct URL, formats by descending height,
    /// thumbnails by descending width, the single thumbnail field, then
    /// media nested in playlist entries.
    fn inspect_info(info: &ExtractedInfo) -> Option<Found> {
        if let Some(url) = &info.url {
            return Some(Found {
                url: url.clone(),
                kind: MediaKind::Video,
            });
        }

        let mut formats: Vec<_> = info.formats.iter().filter(|f| f.url.is_some()).collect();
        formats.sort_by(|a, b| b.height.unwrap_or(0).cmp(&a.height.unwrap_or(0)));
        if let Some(url) = formats.first().and_then(|f| f.url.clone()) {
            return Some(Found {
                url,
                kind: MediaKind::Video,
            });
        }

        let mut thumbs: Vec<_> = info.thumbnails.iter().filter(|t| t.url.is_some()).collect();
        thumbs.sort_by(|a, b| b.width.unwrap_or(0).cmp(&a.width.unwrap_or(0)));
        if let Some(url) = thumbs.first().and_then(|t| t.url.clone()) {
            return Some(Found {
                url,
                kind: MediaKind::Image,
            });
        }

        if let Some(thumbnail) = &info.thumbnail {
            return Some(Found {
                url: thumbnail.clone(),
                kind: MediaKind::Image,
            });
        }

        if info.is_playlist() {
            for entry in &info.entries {
                if entry.is_image() || entry.thumbnail.is_some() {
                    if let Some(url) = entry.url.clone().or_else(|| entry.thumbnail.clone()) {
                        return Some(Found {
                            url,
                            kind: MediaKind::Image,
                        });
                    }
                }
                if let Some(url) = entry.formats.iter().find_map(|f| f.url.clone()) {
                    return Some(Found {
                        url,
                        kind: MediaKind::Video,
                    });
                }
            }
        }

        None
    }

    /// Tier 2: fetch the tweet page and scan the HTML for media pointers.
    fn scan_html(html: &str) -> Option<Found> {
        for meta in ["og:image", "twitter:image"] {
            if let Some(url) = find_meta_content(html, meta) {
                debug!("Found {} meta tag in tweet page", meta);
                return Some(Found {
                    url,
                    kind: MediaKind::Image,
                });
            }
        }

        let image_pattern = Regex::new(r#"https://pbs\.twimg\.com/media/[^\s"'<>\\]+"#).ok()?;
        if let Some(m) = image_pattern.find(html) {
            debug!("Found pbs.twimg.com image URL in tweet page");
            return Some(Found {
                url: m.as_str().to_string(),
                kind: MediaKind::Image,
            });
        }

        let video_pattern = Regex::new(r#"https://video\.twimg\.com/[^\s"'<>\\]+"#).ok()?;
        if let Some(m) = video_pattern.find(html) {
            debug!("Found video.twimg.com video URL in tweet page");
            return Some(Found {
                url: m.as_str().to_string(),
                kind: MediaKind::Video,
            });
        }

        None
    }

    async fn fetch_tweet_page(&self, url: &str) -> Result<String> {
        let mut request = self.client.get(url);
        for (key, value) in platform_headers(Platform::Twitter) {
            request = request.header(key, value);
        }
        let response = request.send().await.context("Failed to fetch tweet page")?;
        if !response.status().is_success() {
            anyhow::bail!("Tweet page returned HTTP {}", response.status());
        }
        response.text().await.context("Failed to read tweet page")
    }

    fn descriptor(found: Found, original_url: &str) -> MediaDescriptor {
        let desc = match found.kind {
            MediaKind::Image => MediaDescriptor::image(Platform::Twitter, found.url),
            _ => MediaDescriptor::video(Platform::Twitter, found.url),
        };
        desc.with_original_url(original_url)
    }
}

/// Numeric status id from a tweet URL path, e.g. `/user/status/12345`.
pub(super) fn parse_status_id(url: &str) -> Option<String> {
    let pattern = Regex::new(r"/status(?:es)?/(\d+)").ok()?;
    pattern
        .captures(url)
        .map(|c| c[1].to_string())
}

fn find_meta_content(html: &str, name: &str) -> Option<String> {
    // Attribute order varies across renderers; match both orders.
    let escaped = regex::escape(name);
    let patterns = [
        format!(
            r#"<meta[^>]*(?:property|name)=["']{}["'][^>]*content=["']([^"']+)["']"#,
            escaped
        ),
        format!(
            r#"<meta[^>]*content=["']([^"']+)["'][^>]*(?:property|name)=["']{}["']"#,
            escaped
        ),
    ];
    for pattern in &patterns {
        if let Some(captures) = Regex::new(pattern).ok()?.captures(html) {
            return Some(captures[1].to_string());
        }
    }
    None
}

#[async_trait]
impl ResolveStrategy for TwitterStrategy {
    fn name(&self) -> &'static str {
        "twitter"
    }

    async fn resolve(&self, url: &str) -> Result<MediaDescriptor> {
        // Tier 1: full extraction.
        match self
            .extractor
            .extract(url, &Self::extract_options(false))
            .await
        {
            Ok(info) => {
                if let Some(found) = Self::inspect_info(&info) {
                    return Ok(Self::descriptor(found, url));
                }
                debug!("Extraction returned no usable media for tweet");
            }
            Err(e) => warn!("Twitter/X extraction failed: {}", e),
        }

        // Tier 2: scan the tweet page directly.
        match self.fetch_tweet_page(url).await {
            Ok(html) => {
                if let Some(found) = Self::scan_html(&html) {
                    return Ok(Self::descriptor(found, url));
                }
                debug!("No media URLs found in tweet page HTML");
            }
            Err(e) => warn!("Tweet page fetch failed: {}", e),
        }

        // Tier 3: permissive re-extraction with the generic extractor.
        match self
            .extractor
            .extract(url, &Self::extract_options(true))
            .await
        {
            Ok(info) => {
                if let Some(found) = Self::inspect_info(&info) {
                    return Ok(Self::descriptor(found, url));
                }
            }
            Err(e) => warn!("Generic extraction failed: {}", e),
        }

        // Tier 4: text-only tweets are an expected outcome; synthesize a
        // placeholder instead of failing.
        info!("No media found in tweet, producing placeholder descriptor");
        let mut desc = MediaDescriptor::placeholder(Platform::Twitter, url);
        if let Some(id) = parse_status_id(url) {
            desc = desc.with_post_id(id);
        }
        Ok(desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{MediaFormat, Thumbnail};
    use crate::resolve::testing::StubExtractor;

    #[test]
    fn test_inspect_prefers_direct_url() {
        let info = ExtractedInfo {
            url: Some("https://video.twimg.example/direct.mp4".to_string()),
            formats: vec![MediaFormat {
                url: Some("https://video.twimg.example/f.mp4".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let found = TwitterStrategy::inspect_info(&info).unwrap();
        assert_eq!(found.url, "https://video.twimg.example/direct.mp4");
        assert_eq!(found.kind, MediaKind::Video);
    }

    #[test]
    fn test_inspect_sorts_formats_by_height() {
        let mk = |url: &str, height: u32| MediaFormat {
            url: Some(url.to_string()),
            height: Some(height),
            ..Default::default()
        };
        let info = ExtractedInfo {
            formats: vec![mk("low", 360), mk("high", 1080), mk("mid", 720)],
            ..Default::default()
        };
        let found = TwitterStrategy::inspect_info(&info).unwrap();
        assert_eq!(found.url, "high");
    }

    #[test]
    fn test_inspect_sorts_thumbnails_by_width() {
        let mk = |url: &str, width: u32| Thumbnail {
            url: Some(url.to_string()),
            width: Some(width),
        };
        let info = ExtractedInfo {
            thumbnails: vec![mk("small", 120), mk("large", 1200)],
            ..Default::default()
        };
        let found = TwitterStrategy::inspect_info(&info).unwrap();
        assert_eq!(found.url, "large");
        assert_eq!(found.kind, MediaKind::Image);
    }

    #[test]
    fn test_inspect_finds_entry_media() {
        let info = ExtractedInfo {
            media_type: Some("playlist".to_string()),
            entries: vec![ExtractedInfo {
                formats: vec![MediaFormat {
                    url: Some("https://video.twimg.example/entry.mp4".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };
        let found = TwitterStrategy::inspect_info(&info).unwrap();
        assert_eq!(found.kind, MediaKind::Video);
    }

    #[test]
    fn test_scan_html_og_image() {
        let html = r#"<html><head>
            <meta property="og:image" content="https://pbs.twimg.com/media/AbC123.jpg"/>
        </head></html>"#;
        let found = TwitterStrategy::scan_html(html).unwrap();
        assert_eq!(found.url, "https://pbs.twimg.com/media/AbC123.jpg");
        assert_eq!(found.kind, MediaKind::Image);
    }

    #[test]
    fn test_scan_html_twitter_image_reversed_attributes() {
        let html = r#"<meta content="https://pbs.twimg.com/media/XyZ.png" name="twitter:image">"#;
        let found = TwitterStrategy::scan_html(html).unwrap();
        assert_eq!(found.url, "https://pbs.twimg.com/media/XyZ.png");
    }

    #[test]
    fn test_scan_html_raw_cdn_urls() {
        let html = r#"<script>{"video_url":"https://video.twimg.com/ext_tw_video/123/pu/vid/720x900/abc.mp4?tag=12"}</script>"#;
        let found = TwitterStrategy::scan_html(html).unwrap();
        assert!(found.url.starts_with("https://video.twimg.com/"));
        assert_eq!(found.kind, MediaKind::Video);
    }

    #[test]
    fn test_scan_html_prefers_image_over_video() {
        let html = r#"
            <meta property="og:image" content="https://pbs.twimg.com/media/A.jpg">
            https://video.twimg.com/v.mp4
        "#;
        let found = TwitterStrategy::scan_html(html).unwrap();
        assert_eq!(found.kind, MediaKind::Image);
    }

    #[test]
    fn test_scan_html_nothing_found() {
        assert!(TwitterStrategy::scan_html("<html><body>hello</body></html>").is_none());
    }

    #[test]
    fn test_parse_status_id() {
        assert_eq!(
            parse_status_id("https://x.com/Silomare/status/1908928500645449860").as_deref(),
            Some("1908928500645449860")
        );
        assert_eq!(
            parse_status_id("https://twitter.com/a/statuses/42").as_deref(),
            Some("42")
        );
        assert!(parse_status_id("https://x.com/Silomare").is_none());
    }

    #[tokio::test]
    async fn test_resolve_tier_one_success_without_network() {
        let info = ExtractedInfo {
            formats: vec![MediaFormat {
                url: Some("https://video.twimg.example/best.mp4".to_string()),
                height: Some(720),
                ..Default::default()
            }],
            ..Default::default()
        };
        let strategy = TwitterStrategy::new(
            Arc::new(StubExtractor::with_info(info)),
            reqwest::Client::new(),
        );
        let desc = strategy
            .resolve("https://x.com/user/status/123")
            .await
            .unwrap();
        assert_eq!(desc.kind, MediaKind::Video);
        assert_eq!(desc.original_url.as_deref(), Some("https://x.com/user/status/123"));
    }
}
