mod types;
mod ytdlp;

pub use types::{ExtractOptions, ExtractedInfo, MediaFormat, Thumbnail};
pub use ytdlp::{test_availability, YtDlpExtractor};

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

/// The media-info extraction collaborator: given a URL and options, returns
/// candidate formats/thumbnails/entries, and supports a direct-download mode
/// that writes the media to disk itself.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, url: &str, opts: &ExtractOptions) -> Result<ExtractedInfo>;

    async fn download(&self, url: &str, opts: &ExtractOptions, dest: &Path) -> Result<()>;
}
