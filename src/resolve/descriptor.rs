use crate::platform::Platform;

/// What the resolved location points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Image,
    /// No real media; a diagnostic frame is synthesized instead.
    Placeholder,
}

/// The resolved result of a platform strategy. Immutable once returned;
/// consumed exactly once by the fetch/sample stage.
#[derive(Debug, Clone)]
pub struct MediaDescriptor {
    pub platform: Platform,
    pub kind: MediaKind,
    /// Fetchable media location. Present unless `kind` is `Placeholder`.
    pub location_url: Option<String>,
    /// The user-supplied URL. Required for platforms whose CDN URLs cannot
    /// be fetched directly and must be re-resolved at download time.
    pub original_url: Option<String>,
    /// Numeric post identifier, used for placeholder annotation.
    pub post_id: Option<String>,
}

impl MediaDescriptor {
    pub fn video(platform: Platform, location_url: impl Into<String>) -> Self {
        Self {
            platform,
            kind: MediaKind::Video,
            location_url: Some(location_url.into()),
            original_url: None,
            post_id: None,
        }
    }

    pub fn image(platform: Platform, location_url: impl Into<String>) -> Self {
        Self {
            platform,
            kind: MediaKind::Image,
            location_url: Some(location_url.into()),
            original_url: None,
            post_id: None,
        }
    }

    pub fn placeholder(platform: Platform, original_url: impl Into<String>) -> Self {
        Self {
            platform,
            kind: MediaKind::Placeholder,
            location_url: None,
            original_url: Some(original_url.into()),
            post_id: None,
        }
    }

    pub fn with_original_url(mut self, url: impl Into<String>) -> Self {
        self.original_url = Some(url.into());
        self
    }

    pub fn with_post_id(mut self, id: impl Into<String>) -> Self {
        self.post_id = Some(id.into());
        self
    }
}
