use serde::Deserialize;

/// Options for one extraction call, mapped onto yt-dlp flags by the
/// implementation.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Preferred format filter, e.g. `best[ext=mp4]` or `best`. `None` means
    /// no format restriction at all (Bilibili needs this).
    pub format: Option<String>,
    /// Do not expand playlists (facebook posts misbehave otherwise).
    pub no_playlist: bool,
    /// Flat playlist extraction (instagram).
    pub flat_playlist: bool,
    /// Force the generic extractor instead of the site-specific one.
    pub force_generic: bool,
    /// Extra HTTP headers the extractor should send upstream.
    pub headers: Vec<(String, String)>,
}

/// One candidate format from the extraction result.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MediaFormat {
    pub format_id: Option<String>,
    pub url: Option<String>,
    pub ext: Option<String>,
    pub vcodec: Option<String>,
    pub height: Option<u32>,
}

/// One candidate thumbnail from the extraction result.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Thumbnail {
    pub url: Option<String>,
    pub width: Option<u32>,
}

/// Structured extraction result, deserialized from the collaborator's JSON.
/// `entries` nests the same shape for playlist-style multi-media posts.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExtractedInfo {
    pub id: Option<String>,
    #[serde(rename = "_type")]
    pub media_type: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub formats: Vec<MediaFormat>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
    #[serde(default)]
    pub entries: Vec<ExtractedInfo>,
}

impl ExtractedInfo {
    /// Whether the result is playlist-shaped (multi-media post).
    pub fn is_playlist(&self) -> bool {
        self.media_type.as_deref() == Some("playlist")
    }

    /// Whether an entry represents a still image rather than a video.
    pub fn is_image(&self) -> bool {
        self.media_type.as_deref() == Some("image")
    }
}
