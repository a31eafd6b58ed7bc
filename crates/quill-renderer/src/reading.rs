use std::sync::LazyLock;

use regex::Regex;

/// Average reading speed used for the estimate.
pub const WORDS_PER_MINUTE: usize = 200;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Word count and estimated reading time of rendered content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReadingStats {
    pub words: usize,
    /// Whole minutes, rounded up.
    pub minutes: usize,
}

impl ReadingStats {
    pub fn from_text(text: &str) -> Self {
        let words = text.split_whitespace().count();
        Self {
            words,
            minutes: words.div_ceil(WORDS_PER_MINUTE),
        }
    }

    /// Stats for rendered HTML. Markup is stripped before counting.
    pub fn from_html(html: &str) -> Self {
        Self::from_text(&Self::strip_tags(html))
    }

    /// Replace every tag with a space.
    pub fn strip_tags(html: &str) -> std::borrow::Cow<'_, str> {
        TAG_RE.replace_all(html, " ")
    }
}

impl std::fmt::Display for ReadingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} words / {} min read", self.words, self.minutes)
    }
}
