//! Framework-agnostic core of the post editor.
//!
//! - `TextBuffer` trait with a ropey-backed `EditorRope`
//! - `Selection` in char offsets
//! - token insertion (`insert`, `insert_token`, `insert_image`)
//! - hotkeys and the `Editor` that ties buffer, preview and sizing together

pub mod actions;
pub mod document;
pub mod execute;
pub mod text;
pub mod types;

pub use actions::{
    HeadingLevel, Hotkeys, InvalidKeyCombo, Key, KeyCombo, KeydownResult, Modifiers, TokenKind, UnknownToken,
};
pub use document::Editor;
pub use execute::{
    DEFAULT_IMAGE_ALT, image_markdown, insert, insert_image, insert_image_markdown, insert_token,
};
pub use text::{EditorRope, TextBuffer};
pub use types::Selection;

// Re-export the renderer seam so callers don't need the renderer crate directly.
pub use quill_renderer::{MarkdownRenderer, PreviewRenderer, ReadingStats};
