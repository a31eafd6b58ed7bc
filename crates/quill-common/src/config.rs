use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

use crate::error::{QuillError, SerDeError};

/// Largest image accepted for upload, in bytes (15 MiB).
pub const MAXIMUM_UPLOAD_SIZE: u64 = 15_728_640;
/// Human readable form of [`MAXIMUM_UPLOAD_SIZE`], used in notices.
pub const MAXIMUM_UPLOAD_SIZE_HUMAN: &str = "15MB";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    /// Base URL of the image host. Uploads go to `{host}/@{username}/uploads`.
    pub host: String,
    /// Account the uploads are filed under.
    pub username: String,
    /// Maximum accepted blob size in bytes.
    pub max_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            host: "https://busy-img.herokuapp.com".into(),
            username: "anonymous".into(),
            max_size: MAXIMUM_UPLOAD_SIZE,
        }
    }
}

impl UploadConfig {
    /// Size limit formatted for people. Falls back to the raw byte count
    /// when the limit has been changed from the default.
    pub fn max_size_human(&self) -> String {
        if self.max_size == MAXIMUM_UPLOAD_SIZE {
            MAXIMUM_UPLOAD_SIZE_HUMAN.to_string()
        } else if self.max_size % (1024 * 1024) == 0 {
            format!("{}MB", self.max_size / (1024 * 1024))
        } else {
            format!("{} bytes", self.max_size)
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    /// Fewest rows the body input shrinks to.
    pub min_rows: usize,
    /// Most rows the body input grows to before scrolling.
    pub max_rows: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_rows: 6,
            max_rows: 12,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    /// Prefix prepended to the first metadata image to form the cover path.
    pub image_proxy: String,
    /// App layout string; `"list"` selects the list variant.
    pub layout: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            image_proxy: "https://steemitimages.com/600x800/".into(),
            layout: "card".into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct QuillConfig {
    pub upload: UploadConfig,
    pub editor: EditorConfig,
    pub feed: FeedConfig,
}

impl QuillConfig {
    pub fn load(config_file: impl AsRef<Path>) -> Result<QuillConfig, QuillError> {
        let path = config_file.as_ref();
        let config_string = fs::read_to_string(path).map_err(|e| {
            QuillError::Config(format!("error reading config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&config_string)
    }

    /// Parse a TOML document, substituting `$VAR` environment variables first.
    pub fn from_toml(source: &str) -> Result<QuillConfig, QuillError> {
        let mut config_string = source.to_string();
        // Longest names first so `$HOST_NAME` isn't clobbered by `$HOST`
        let mut vars: Vec<(String, String)> = env::vars().collect();
        vars.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        for (k, v) in vars {
            config_string = config_string.replace(&format!("${}", k), &v);
        }

        let config: QuillConfig =
            toml::from_str(&config_string).map_err(|e| QuillError::Serde(SerDeError::Toml(e)))?;
        tracing::debug!(
            host = %config.upload.host,
            max_size = config.upload.max_size,
            "loaded config"
        );
        Ok(config)
    }
}
