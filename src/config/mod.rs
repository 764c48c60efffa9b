use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

fn default_max_attempts() -> u32 {
    crate::retry::DEFAULT_MAX_ATTEMPTS
}

fn default_frame_count() -> usize {
    5
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_extract_timeout_secs() -> u64 {
    30
}

fn default_download_timeout_secs() -> u64 {
    120
}

fn default_log_format() -> String {
    "plain".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Resolution attempts per URL before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Frames extracted per video unless overridden on the command line.
    #[serde(default = "default_frame_count")]
    pub frame_count: usize,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_extract_timeout_secs")]
    pub extract_timeout_secs: u64,
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    /// "plain" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            frame_count: default_frame_count(),
            http_timeout_secs: default_http_timeout_secs(),
            extract_timeout_secs: default_extract_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse config file {}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.frame_count, 5);
        assert_eq!(config.log_format, "plain");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_attempts = 5\nlog_format = \"json\"").unwrap();

        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.log_format, "json");
        assert_eq!(config.frame_count, 5);
        assert_eq!(config.download_timeout_secs, 120);
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(Config::from_file("/nonexistent/config.toml").is_err());
    }
}
