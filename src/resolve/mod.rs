mod bilibili;
mod descriptor;
mod tiktok;
mod twitter;
mod youtube;

pub use bilibili::BilibiliStrategy;
pub use descriptor::{MediaDescriptor, MediaKind};
pub use tiktok::TiktokStrategy;
pub use twitter::TwitterStrategy;
pub use youtube::YoutubeStrategy;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::extract::Extractor;
use crate::platform::Platform;

/// One platform's resolution strategy: turn a URL into a media descriptor,
/// trying every discovery tier the platform supports before failing. The
/// retry controller re-invokes the whole strategy, not individual tiers.
#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn resolve(&self, url: &str) -> Result<MediaDescriptor>;
}

/// Build the strategy for a classified platform. YouTube-like platforms
/// share one strategy parameterized by platform-specific extract options.
pub fn strategy_for(
    platform: Platform,
    extractor: Arc<dyn Extractor>,
    client: reqwest::Client,
) -> Box<dyn ResolveStrategy> {
    match platform {
        Platform::Tiktok => Box::new(TiktokStrategy::new(extractor)),
        Platform::Bilibili => Box::new(BilibiliStrategy::new(extractor)),
        Platform::Twitter => Box::new(TwitterStrategy::new(extractor, client)),
        other => Box::new(YoutubeStrategy::new(other, extractor)),
    }
}
