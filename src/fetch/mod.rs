use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::extract::{ExtractOptions, Extractor};
use crate::platform::{platform_headers, Platform};
use crate::resolve::{MediaDescriptor, MediaKind};

/// Result of fetching a descriptor's media.
#[derive(Debug)]
pub enum Fetched {
    /// Video bytes in a temporary file. The file is deleted when this value
    /// is dropped, whichever way the sampling stage exits.
    Video(NamedTempFile),
    /// Image written directly as the sole output frame; the sampler is
    /// skipped entirely.
    Image(PathBuf),
}

/// Downloads resolved media, selecting transport and headers by platform.
pub struct Fetcher {
    client: reqwest::Client,
    extractor: Arc<dyn Extractor>,
}

impl Fetcher {
    pub fn new(client: reqwest::Client, extractor: Arc<dyn Extractor>) -> Self {
        Self { client, extractor }
    }

    pub async fn fetch(&self, desc: &MediaDescriptor, output_dir: &Path) -> Result<Fetched> {
        match desc.kind {
            MediaKind::Placeholder => {
                anyhow::bail!("Placeholder descriptors carry no fetchable media")
            }
            MediaKind::Image => {
                let url = desc
                    .location_url
                    .as_deref()
                    .context("Image descriptor without a location URL")?;
                let frame_path = output_dir.join("frame_1.jpg");
                self.download_image(url, desc.platform, &frame_path).await?;
                info!("Saved image to {}", frame_path.display());
                Ok(Fetched::Image(frame_path))
            }
            MediaKind::Video => {
                let temp = tempfile::Builder::new()
                    .prefix("framegrab_")
                    .suffix(".mp4")
                    .tempfile()
                    .context("Failed to create temporary file")?;

                if desc.platform.needs_extractor_download() {
                    // The resolved CDN URL is transient for these platforms;
                    // re-resolve through the original post URL.
                    let url = desc
                        .original_url
                        .as_deref()
                        .or(desc.location_url.as_deref())
                        .context("Video descriptor without any URL")?;
                    debug!(
                        "Using extractor direct download for {} video",
                        desc.platform.name()
                    );
                    let opts = ExtractOptions {
                        format: Some("best".to_string()),
                        headers: platform_headers(desc.platform),
                        ..Default::default()
                    };
                    self.extractor.download(url, &opts, temp.path()).await?;
                } else {
                    let url = desc
                        .location_url
                        .as_deref()
                        .context("Video descriptor without a location URL")?;
                    self.download_stream(url, desc.platform, temp.path())
                        .await?;
                }

                debug!("Media downloaded to temporary file: {}", temp.path().display());
                Ok(Fetched::Video(temp))
            }
        }
    }

    /// Streamed GET to a file on disk; fails on non-2xx status.
    async fn download_stream(&self, url: &str, platform: Platform, dest: &Path) -> Result<()> {
        let mut request = self.client.get(url);
        for (key, value) in platform_headers(platform) {
            request = request.header(key, value);
        }

        let mut response = request.send().await.context("Failed to fetch media URL")?;
        if !response.status().is_success() {
            anyhow::bail!("Failed to download media: HTTP {}", response.status());
        }

        let mut file = std::fs::File::create(dest)
            .with_context(|| format!("Failed to open {}", dest.display()))?;
        let mut written = 0usize;
        while let Some(chunk) = response.chunk().await.context("Failed to read media data")? {
            file.write_all(&chunk).context("Failed to write media data")?;
            written += chunk.len();
        }
        debug!("Downloaded {} bytes to {}", written, dest.display());
        Ok(())
    }

    async fn download_image(&self, url: &str, platform: Platform, dest: &Path) -> Result<()> {
        self.download_stream(url, platform, dest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::testing::StubExtractor;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        Fetcher::new(reqwest::Client::new(), Arc::new(StubExtractor::failing()))
    }

    #[tokio::test]
    async fn test_image_descriptor_writes_frame_1() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpegbytes".to_vec()))
            .mount(&server)
            .await;

        let output_dir = tempfile::tempdir().unwrap();
        let desc = MediaDescriptor::image(Platform::Youtube, format!("{}/img.jpg", server.uri()));
        let fetched = fetcher().fetch(&desc, output_dir.path()).await.unwrap();

        match fetched {
            Fetched::Image(path) => {
                assert_eq!(path.file_name().unwrap(), "frame_1.jpg");
                assert_eq!(std::fs::read(path).unwrap(), b"jpegbytes");
            }
            _ => panic!("expected image fetch"),
        }
    }

    #[tokio::test]
    async fn test_video_descriptor_streams_to_temp_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
            .mount(&server)
            .await;

        let output_dir = tempfile::tempdir().unwrap();
        let desc = MediaDescriptor::video(Platform::Generic, format!("{}/v.mp4", server.uri()));
        let fetched = fetcher().fetch(&desc, output_dir.path()).await.unwrap();

        let temp_path = match fetched {
            Fetched::Video(temp) => {
                assert_eq!(std::fs::read(temp.path()).unwrap().len(), 4096);
                temp.path().to_path_buf()
            }
            _ => panic!("expected video fetch"),
        };
        // Fetched::Video dropped above; the temp file must be gone.
        assert!(!temp_path.exists());
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let output_dir = tempfile::tempdir().unwrap();
        let desc = MediaDescriptor::video(Platform::Generic, format!("{}/v.mp4", server.uri()));
        let result = fetcher().fetch(&desc, output_dir.path()).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("403"));
    }

    #[tokio::test]
    async fn test_referer_sent_for_twitter_images() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Referer", "https://twitter.com/"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
            .mount(&server)
            .await;

        let output_dir = tempfile::tempdir().unwrap();
        let desc = MediaDescriptor::image(Platform::Twitter, format!("{}/m.jpg", server.uri()));
        assert!(fetcher().fetch(&desc, output_dir.path()).await.is_ok());
    }

    #[tokio::test]
    async fn test_placeholder_descriptor_is_rejected() {
        let output_dir = tempfile::tempdir().unwrap();
        let desc = MediaDescriptor::placeholder(Platform::Twitter, "https://x.com/a/status/1");
        assert!(fetcher().fetch(&desc, output_dir.path()).await.is_err());
    }
}
