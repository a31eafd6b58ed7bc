//! Quill renderer
//!
//! Markdown → HTML for the editor preview, plus the read-only side of the
//! app: embed detection and the feed item presenter.

use markdown_weaver::Parser;

pub mod embed;
pub mod feed;
pub mod html;
pub mod reading;

pub use embed::{DefaultEmbedDetector, Embed, EmbedDetector, EmbedProvider};
pub use feed::{FeedItem, FeedItemProps, JsonMetadata, Layout, Panel, PostFeed, PostRecord, present};
pub use reading::ReadingStats;

/// Converts markdown source into HTML. Must be pure and synchronous.
pub trait MarkdownRenderer {
    fn render(&self, source: &str) -> String;
}

impl<T: MarkdownRenderer> MarkdownRenderer for &T {
    fn render(&self, source: &str) -> String {
        (*self).render(source)
    }
}

/// Parser options used for the preview.
pub fn default_md_options() -> markdown_weaver::Options {
    markdown_weaver::Options::ENABLE_FOOTNOTES
        | markdown_weaver::Options::ENABLE_TABLES
        | markdown_weaver::Options::ENABLE_GFM
        | markdown_weaver::Options::ENABLE_STRIKETHROUGH
        | markdown_weaver::Options::ENABLE_HEADING_ATTRIBUTES
}

/// The markdown renderer behind the live preview.
#[derive(Clone, Copy, Debug, Default)]
pub struct PreviewRenderer {
    options: Option<markdown_weaver::Options>,
}

impl PreviewRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: markdown_weaver::Options) -> Self {
        Self {
            options: Some(options),
        }
    }
}

impl MarkdownRenderer for PreviewRenderer {
    fn render(&self, source: &str) -> String {
        render_markdown_with(source, self.options.unwrap_or_else(default_md_options))
    }
}

/// Render markdown to HTML with the default preview options.
pub fn render_markdown(source: &str) -> String {
    render_markdown_with(source, default_md_options())
}

fn render_markdown_with(source: &str, options: markdown_weaver::Options) -> String {
    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() * 3 / 2);
    // Writing into a String can't fail
    if let Err(e) = html::push_html(&mut out, parser) {
        tracing::error!(error = %e, "preview render failed");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_inline_formatting() {
        let html = render_markdown("**bold** and *italic*");
        assert_eq!(html, "<p><strong>bold</strong> and <em>italic</em></p>\n");
    }

    #[test]
    fn test_render_heading_and_quote() {
        let html = render_markdown("## Title\n\n> quoted");
        insta::assert_snapshot!(html, @r"
        <h2>Title</h2>
        <blockquote>
        <p>quoted</p>
        </blockquote>
        ");
    }

    #[test]
    fn test_render_image_alt_text() {
        let html = render_markdown("![cat](https://img/cat.png)");
        assert_eq!(
            html,
            "<p><img src=\"https://img/cat.png\" alt=\"cat\" /></p>\n"
        );
    }

    #[test]
    fn test_render_link_template() {
        let html = render_markdown("[here](url)");
        assert_eq!(html, "<p><a href=\"url\">here</a></p>\n");
    }

    #[test]
    fn test_render_escapes_text() {
        let html = render_markdown("a < b & c");
        assert_eq!(html, "<p>a &lt; b &amp; c</p>\n");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_markdown(""), "");
    }

    #[test]
    fn test_preview_renderer_matches_free_fn() {
        let renderer = PreviewRenderer::new();
        let source = "- one\n- two\n";
        assert_eq!(renderer.render(source), render_markdown(source));
        assert_eq!(
            renderer.render(source),
            "<ul>\n<li>one</li>\n<li>two</li>\n</ul>\n"
        );
    }
}
