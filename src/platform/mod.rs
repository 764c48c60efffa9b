use url::Url;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Youtube,
    Facebook,
    Instagram,
    Tiktok,
    Clapper,
    Bilibili,
    Twitter,
    Generic,
}

impl Platform {
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Clapper => "clapper",
            Platform::Bilibili => "bilibili",
            Platform::Twitter => "twitter",
            Platform::Generic => "generic",
        }
    }

    /// Platforms whose upstream rejects requests without a matching Referer.
    pub fn referer(&self) -> Option<&'static str> {
        match self {
            Platform::Tiktok => Some("https://www.tiktok.com/"),
            Platform::Bilibili => Some("https://www.bilibili.com/"),
            Platform::Twitter => Some("https://twitter.com/"),
            _ => None,
        }
    }

    /// Whether the per-format CDN URL is reliably fetchable with a plain GET.
    /// TikTok and Bilibili format URLs frequently are not; the fetch stage
    /// must re-resolve through the original post URL instead.
    pub fn needs_extractor_download(&self) -> bool {
        matches!(self, Platform::Tiktok | Platform::Bilibili)
    }
}

/// Browser-like headers sent on every outbound request.
pub fn common_headers() -> Vec<(String, String)> {
    vec![
        ("User-Agent".to_string(), BROWSER_USER_AGENT.to_string()),
        (
            "Accept".to_string(),
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
        ),
        ("Accept-Language".to_string(), "en-US,en;q=0.5".to_string()),
        ("Connection".to_string(), "keep-alive".to_string()),
    ]
}

/// Headers for a specific platform: the common browser set plus the
/// platform's Referer when one is required.
pub fn platform_headers(platform: Platform) -> Vec<(String, String)> {
    let mut headers = common_headers();
    if let Some(referer) = platform.referer() {
        headers.push(("Referer".to_string(), referer.to_string()));
    }
    headers
}

/// Classify a URL into a platform tag. Returns `None` for URLs without a
/// scheme or host. Pure and deterministic; never panics, no network access.
pub fn classify(url: &str) -> Option<Platform> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();

    // Priority-ordered substring table; first match wins.
    if host.contains("youtube.com") || host.contains("youtu.be") {
        Some(Platform::Youtube)
    } else if host.contains("facebook.com") || host.contains("fb.com") {
        Some(Platform::Facebook)
    } else if host.contains("instagram.com") {
        Some(Platform::Instagram)
    } else if host.contains("tiktok.com") {
        Some(Platform::Tiktok)
    } else if host.contains("clapperapp") {
        Some(Platform::Clapper)
    } else if host.contains("bilibili.com") || host.contains("b23.tv") {
        Some(Platform::Bilibili)
    } else if host.contains("twitter.com") || host.contains("x.com") {
        Some(Platform::Twitter)
    } else {
        Some(Platform::Generic)
    }
}
