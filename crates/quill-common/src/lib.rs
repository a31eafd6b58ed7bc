//! Shared plumbing for the quill crates: errors, configuration, telemetry
//! and the image host client.

pub mod config;
pub mod error;
#[cfg(feature = "telemetry")]
pub mod telemetry;
pub mod upload;

pub use crate::config::{
    EditorConfig, FeedConfig, MAXIMUM_UPLOAD_SIZE, MAXIMUM_UPLOAD_SIZE_HUMAN, QuillConfig,
    UploadConfig,
};
pub use crate::error::{ParseError, QuillError, SerDeError};
pub use crate::upload::{HttpImageUploader, ImageBlob, ImageUploader, UploadError, is_valid_image};
