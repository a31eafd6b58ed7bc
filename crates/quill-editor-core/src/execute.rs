//! Token insertion against a text buffer.
//!
//! Every operation takes the current selection, clamps it to the buffer,
//! edits, and returns the selection that keeps the cursor where the user
//! expects it: between the markers, so typing lands inside them.

use crate::actions::TokenKind;
use crate::text::{EditorRope, TextBuffer};
use crate::types::Selection;

/// Alt text for images inserted without a name.
pub const DEFAULT_IMAGE_ALT: &str = "image";

/// Wrap the selection in the markers for `kind`.
///
/// The buffer becomes `B[..s] + before + B[s..e] + after + B[e..]` and the
/// returned selection is the old one shifted by the opening marker length.
pub fn insert_token<B: TextBuffer>(buffer: &mut B, selection: Selection, kind: TokenKind) -> Selection {
    let sel = selection.clamp(buffer.len_chars());
    let before = kind.before();

    // Closing marker first so `sel.start` still points at the right place.
    buffer.insert(sel.end, kind.after());
    buffer.insert(sel.start, &before);

    let next = sel.shifted(kind.shift());
    tracing::trace!(token = %kind, from = %sel, to = %next, "inserted token");
    next
}

/// Replace the selection with an image line and put the cursor after it.
pub fn insert_image_markdown<B: TextBuffer>(
    buffer: &mut B,
    selection: Selection,
    url: &str,
    alt: &str,
) -> Selection {
    let sel = selection.clamp(buffer.len_chars());
    let alt = if alt.is_empty() { DEFAULT_IMAGE_ALT } else { alt };
    let text = image_markdown(url, alt);

    buffer.replace(sel.to_range(), &text);
    Selection::collapsed(sel.start + text.chars().count())
}

/// `![alt](url)` followed by a newline.
pub fn image_markdown(url: &str, alt: &str) -> String {
    format!("![{}]({})\n", alt, url)
}

/// [`insert_token`] on a plain string.
pub fn insert(source: &str, selection: Selection, kind: TokenKind) -> (String, Selection) {
    let mut buffer = EditorRope::from_str(source);
    let next = insert_token(&mut buffer, selection, kind);
    (buffer.to_string(), next)
}

/// [`insert_image_markdown`] on a plain string.
pub fn insert_image(source: &str, selection: Selection, url: &str, alt: &str) -> (String, Selection) {
    let mut buffer = EditorRope::from_str(source);
    let next = insert_image_markdown(&mut buffer, selection, url, alt);
    (buffer.to_string(), next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::HeadingLevel;

    fn all_kinds() -> Vec<TokenKind> {
        let mut kinds: Vec<TokenKind> = HeadingLevel::all().map(TokenKind::Heading).collect();
        kinds.extend([
            TokenKind::Bold,
            TokenKind::Italic,
            TokenKind::Quote,
            TokenKind::Link,
            TokenKind::Image,
        ]);
        kinds
    }

    #[test]
    fn test_bold_wraps_selection() {
        let (out, sel) = insert("say hello now", Selection::new(4, 9), TokenKind::Bold);
        assert_eq!(out, "say **hello** now");
        assert_eq!(sel, Selection::new(6, 11));
        assert_eq!(&out[sel.start..sel.end], "hello");
    }

    #[test]
    fn test_heading_at_cursor() {
        let (out, sel) = insert("", Selection::collapsed(0), TokenKind::heading(2).unwrap());
        assert_eq!(out, "## ");
        assert_eq!(sel, Selection::collapsed(3));
    }

    #[test]
    fn test_link_and_image_templates() {
        let (out, sel) = insert("see docs", Selection::new(4, 8), TokenKind::Link);
        assert_eq!(out, "see [docs](url)");
        assert_eq!(sel, Selection::new(5, 9));

        let (out, sel) = insert("", Selection::collapsed(0), TokenKind::Image);
        assert_eq!(out, "![](url)");
        assert_eq!(sel, Selection::collapsed(2));
    }

    #[test]
    fn test_buffer_and_selection_follow_the_table() {
        let source = "alpha beta gamma";
        for kind in all_kinds() {
            for (s, e) in [(0, 0), (6, 10), (0, 16), (16, 16)] {
                let (out, sel) = insert(source, Selection::new(s, e), kind);
                let expected = format!(
                    "{}{}{}{}{}",
                    &source[..s],
                    kind.before(),
                    &source[s..e],
                    kind.after(),
                    &source[e..]
                );
                assert_eq!(out, expected, "{kind} at {s}..{e}");
                let delta = kind.before().len();
                assert_eq!(sel, Selection::new(s + delta, e + delta), "{kind} at {s}..{e}");
            }
        }
    }

    #[test]
    fn test_typing_lands_inside_markers() {
        for kind in all_kinds() {
            let (out, sel) = insert("ab", Selection::collapsed(1), kind);
            assert!(sel.is_collapsed());
            let mut buffer = EditorRope::from_str(&out);
            buffer.insert(sel.start, "X");
            let expected = format!("a{}X{}b", kind.before(), kind.after());
            assert_eq!(buffer.to_string(), expected, "{kind}");
        }
    }

    #[test]
    fn test_selection_past_end_is_clamped() {
        let (out, sel) = insert("abc", Selection::new(1, 99), TokenKind::Italic);
        assert_eq!(out, "a*bc*");
        assert_eq!(sel, Selection::new(2, 4));

        let (out, sel) = insert("abc", Selection::collapsed(42), TokenKind::Quote);
        assert_eq!(out, "abc> ");
        assert_eq!(sel, Selection::collapsed(5));
    }

    #[test]
    fn test_offsets_count_chars_not_bytes() {
        let (out, sel) = insert("héllo wörld", Selection::new(6, 11), TokenKind::Bold);
        assert_eq!(out, "héllo **wörld**");
        assert_eq!(sel, Selection::new(8, 13));
    }

    #[test]
    fn test_insert_image_replaces_selection() {
        let (out, sel) = insert_image("a PLACEHOLDER b", Selection::new(2, 13), "https://x/y.png", "cat");
        assert_eq!(out, "a ![cat](https://x/y.png)\n b");
        assert_eq!(sel, Selection::collapsed(2 + "![cat](https://x/y.png)\n".len()));
    }

    #[test]
    fn test_insert_image_default_alt() {
        let (out, sel) = insert_image("", Selection::collapsed(0), "u", "");
        assert_eq!(out, "![image](u)\n");
        assert_eq!(sel, Selection::collapsed(12));
    }

    #[test]
    fn test_toolbar_sequence() {
        let (out, _) = insert("Title\nbold words\nquoted", Selection::collapsed(0), TokenKind::heading(2).unwrap());
        let (out, _) = insert(&out, Selection::new(9, 13), TokenKind::Bold);
        let (out, _) = insert(&out, Selection::collapsed(24), TokenKind::Quote);
        insta::assert_snapshot!(out, @r"
        ## Title
        **bold** words
        > quoted
        ");
    }
}
