//! Error taxonomy for the frame extraction pipeline.
//!
//! Internals use `anyhow` with context; these variants are the typed outcomes
//! the pipeline boundary reports. Decode failures are absorbed by the
//! fallback chain and only surface here when placeholder synthesis itself
//! fails.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The URL has no scheme/host or matches no known platform table entry.
    #[error("Unsupported platform or invalid URL: {url}")]
    UnsupportedPlatform { url: String },

    /// Every tier of the platform strategy failed, across all retry attempts.
    #[error("Failed to resolve media after {attempts} attempts: {reason}")]
    Resolution { attempts: u32, reason: String },

    /// HTTP transfer or extractor download failed for a resolved descriptor.
    #[error("Failed to fetch media: {0}")]
    Transport(String),

    /// Video decode produced fewer frames than requested and no fallback
    /// applied (partial frame sets are reported through this variant).
    #[error("Extracted {saved} of {requested} requested frames")]
    IncompleteFrames { saved: usize, requested: usize },

    /// Placeholder synthesis failed. The only fatal decode-side outcome.
    #[error("Failed to synthesize placeholder frame: {0}")]
    Placeholder(String),

    /// Output directory could not be created or written.
    #[error("Output directory error at {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
