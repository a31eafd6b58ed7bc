//! The editor: body buffer, cursor, live preview and input sizing.

use quill_common::EditorConfig;
use quill_renderer::{MarkdownRenderer, ReadingStats};

use crate::actions::{Hotkeys, KeyCombo, KeydownResult, TokenKind};
use crate::execute::{DEFAULT_IMAGE_ALT, insert_image_markdown, insert_token};
use crate::text::{EditorRope, TextBuffer};
use crate::types::Selection;

/// The mounted text input.
#[derive(Clone, Debug, Default)]
struct AttachedInput {
    buffer: EditorRope,
    selection: Selection,
}

/// Markdown editor state.
///
/// The text input may be detached (not mounted). Edits that need the live
/// buffer are no-ops then, and report so.
#[derive(Debug)]
pub struct Editor<R: MarkdownRenderer> {
    renderer: R,
    input: Option<AttachedInput>,
    html: String,
    rows: usize,
    config: EditorConfig,
    hotkeys: Hotkeys,
}

impl<R: MarkdownRenderer> Editor<R> {
    pub fn new(renderer: R) -> Self {
        Self::with_config(renderer, EditorConfig::default())
    }

    pub fn with_config(renderer: R, config: EditorConfig) -> Self {
        Self {
            renderer,
            input: None,
            html: String::new(),
            rows: config.min_rows,
            config,
            hotkeys: Hotkeys::default(),
        }
    }

    pub fn with_hotkeys(mut self, hotkeys: Hotkeys) -> Self {
        self.hotkeys = hotkeys;
        self
    }

    pub fn hotkeys_mut(&mut self) -> &mut Hotkeys {
        &mut self.hotkeys
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Mount the input with `body`, cursor at the end.
    pub fn attach(&mut self, body: &str) {
        let buffer = EditorRope::from_str(body);
        let selection = Selection::collapsed(buffer.len_chars());
        self.input = Some(AttachedInput { buffer, selection });
        self.refresh();
    }

    /// Unmount the input, returning the body it held.
    pub fn detach(&mut self) -> Option<String> {
        self.input.take().map(|input| input.buffer.to_string())
    }

    pub fn is_attached(&self) -> bool {
        self.input.is_some()
    }

    /// Insert a markdown token at the cursor. `false` when detached.
    pub fn insert_code(&mut self, kind: TokenKind) -> bool {
        let Some(input) = self.input.as_mut() else {
            tracing::debug!(token = %kind, "insert with no input attached");
            return false;
        };
        input.selection = insert_token(&mut input.buffer, input.selection, kind);
        self.refresh();
        true
    }

    /// Replace the selection with an image line. `false` when detached.
    pub fn insert_image(&mut self, url: &str, name: Option<&str>) -> bool {
        let Some(input) = self.input.as_mut() else {
            tracing::debug!(url, "image insert with no input attached");
            return false;
        };
        let alt = name.filter(|n| !n.is_empty()).unwrap_or(DEFAULT_IMAGE_ALT);
        input.selection = insert_image_markdown(&mut input.buffer, input.selection, url, alt);
        self.refresh();
        true
    }

    /// Hydrate the body. The cursor moves to the end.
    ///
    /// A detached editor still gets its preview and row count updated.
    pub fn set_body(&mut self, text: &str) {
        match self.input.as_mut() {
            Some(input) => {
                input.buffer = EditorRope::from_str(text);
                input.selection = Selection::collapsed(input.buffer.len_chars());
                self.refresh();
            }
            None => {
                self.html = self.renderer.render(text);
                self.rows = self.fit_rows(EditorRope::from_str(text).len_lines());
            }
        }
    }

    /// A user edit: the input now holds `text` with `selection`.
    pub fn on_input(&mut self, text: &str, selection: Selection) -> bool {
        let Some(input) = self.input.as_mut() else {
            return false;
        };
        input.buffer = EditorRope::from_str(text);
        input.selection = selection.clamp(input.buffer.len_chars());
        self.refresh();
        true
    }

    pub fn set_selection(&mut self, selection: Selection) {
        if let Some(input) = self.input.as_mut() {
            input.selection = selection.clamp(input.buffer.len_chars());
        }
    }

    /// The live body, if the input is attached.
    pub fn body(&self) -> Option<String> {
        self.input.as_ref().map(|input| input.buffer.to_string())
    }

    pub fn selection(&self) -> Option<Selection> {
        self.input.as_ref().map(|input| input.selection)
    }

    /// Last rendered preview.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Fitted row count for the text input.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn reading_stats(&self) -> ReadingStats {
        ReadingStats::from_html(&self.html)
    }

    /// Run the binding for `combo`, if there is one.
    pub fn handle_keydown(&mut self, combo: &KeyCombo) -> KeydownResult {
        match self.hotkeys.lookup(combo) {
            Some(kind) if self.insert_code(kind) => KeydownResult::Handled,
            _ => KeydownResult::NotHandled,
        }
    }

    fn refresh(&mut self) {
        let Some(input) = self.input.as_ref() else {
            return;
        };
        let body = input.buffer.to_string();
        let lines = input.buffer.len_lines();
        self.html = self.renderer.render(&body);
        self.rows = self.fit_rows(lines);
    }

    fn fit_rows(&self, lines: usize) -> usize {
        // not `clamp`: a config with min > max must not panic
        lines.max(self.config.min_rows).min(self.config.max_rows)
    }
}
