//! The composition form controller.
//!
//! Holds the form controls and the body editor, re-hydrates them when new
//! draft props arrive, and turns a submit into either a [`Submission`] or
//! a set of [`ValidationErrors`].

use quill_editor_core::{Editor, MarkdownRenderer};

use crate::draft::{DraftProps, DraftUpdate, FieldChange, FormFields, Submission};
use crate::validate::{BODY_EMPTY, FieldError, ValidationErrors, validate_fields};

/// Help text shown under the body input when it was empty on submit.
pub const NO_CONTENT_HELP: &str = "Story content can't be empty.";

/// The collaborators a submit or delete is handed to.
pub trait SubmitHandler {
    fn on_submit(&mut self, submission: Submission);
    fn on_error(&mut self, errors: &ValidationErrors);
    fn on_delete(&mut self) {}
}

impl<T: SubmitHandler> SubmitHandler for &mut T {
    fn on_submit(&mut self, submission: Submission) {
        (**self).on_submit(submission)
    }

    fn on_error(&mut self, errors: &ValidationErrors) {
        (**self).on_error(errors)
    }

    fn on_delete(&mut self) {
        (**self).on_delete()
    }
}

pub struct ComposeForm<R: MarkdownRenderer> {
    props: DraftProps,
    fields: FormFields,
    editor: Editor<R>,
    no_content: bool,
}

impl<R: MarkdownRenderer> ComposeForm<R> {
    /// Build the form and hydrate it from `props`.
    pub fn new(editor: Editor<R>, props: DraftProps) -> Self {
        let mut form = Self {
            fields: FormFields::from(&props),
            props,
            editor,
            no_content: false,
        };
        form.hydrate();
        form
    }

    pub fn props(&self) -> &DraftProps {
        &self.props
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn editor(&self) -> &Editor<R> {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor<R> {
        &mut self.editor
    }

    /// Set when the last submit found an empty body.
    pub fn no_content(&self) -> bool {
        self.no_content
    }

    /// Only a saved draft can be deleted.
    pub fn can_delete(&self) -> bool {
        self.props.draft_id.is_some()
    }

    /// Mount the body input, filled with the current draft body.
    pub fn mount(&mut self) {
        self.editor.attach(&self.props.body);
    }

    pub fn unmount(&mut self) {
        self.editor.detach();
    }

    /// Take new props. Re-hydrates, and returns `true`, only if they change
    /// what the form shows.
    pub fn receive_props(&mut self, next: DraftProps) -> bool {
        let changed = self.props.differs_from(&next);
        self.props = next;
        if changed {
            tracing::debug!(draft_id = ?self.props.draft_id, "re-hydrating compose form");
            self.hydrate();
        }
        changed
    }

    fn hydrate(&mut self) {
        self.fields = FormFields::from(&self.props);
        self.editor.set_body(&self.props.body);
    }

    /// Apply one control change and build the update for the draft store.
    pub fn on_update(&mut self, change: FieldChange) -> DraftUpdate {
        let mut body = None;
        match change {
            FieldChange::Title(title) => self.fields.title = title,
            FieldChange::Topics(topics) => self.fields.topics = topics,
            FieldChange::Reward(reward) => self.fields.reward = reward,
            FieldChange::Upvote(upvote) => self.fields.upvote = upvote,
            FieldChange::Body(text) => {
                let selection = self.editor.selection().unwrap_or_default();
                if self.editor.on_input(&text, selection) {
                    body = Some(text);
                } else {
                    tracing::debug!("body edit with no input mounted, dropping it");
                }
            }
        }
        DraftUpdate::from_fields(&self.fields, body)
    }

    /// Validate the form and read the live body.
    ///
    /// An empty body, or no mounted input to read it from, is an error on
    /// `body` alongside whatever the field rules found.
    pub fn check(&mut self) -> Result<Submission, ValidationErrors> {
        self.no_content = false;
        let mut errors = validate_fields(&self.fields);

        let body = self.editor.body().unwrap_or_default();
        if body.is_empty() {
            self.no_content = true;
            errors.push(FieldError::new("body", BODY_EMPTY).with_help(NO_CONTENT_HELP));
        }

        errors.into_result()?;
        Ok(Submission {
            title: self.fields.title.clone(),
            topics: self.fields.topics.clone(),
            body,
            reward: self.fields.reward,
            upvote: self.fields.upvote,
        })
    }

    /// Submit through `handler`: exactly one of `on_submit` or `on_error` is called.
    pub fn submit(&mut self, mut handler: impl SubmitHandler) -> bool {
        match self.check() {
            Ok(submission) => {
                tracing::info!(title = %submission.title, topics = submission.topics.len(), "submitting post");
                handler.on_submit(submission);
                true
            }
            Err(errors) => {
                handler.on_error(&errors);
                false
            }
        }
    }

    pub fn delete(&mut self, mut handler: impl SubmitHandler) {
        tracing::debug!(draft_id = ?self.props.draft_id, "deleting draft");
        handler.on_delete();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use quill_editor_core::{PreviewRenderer, Selection, TokenKind};

    use super::*;
    use crate::draft::RewardTier;

    #[derive(Default)]
    struct Recorder {
        submitted: Vec<Submission>,
        errors: Vec<ValidationErrors>,
        deleted: usize,
    }

    impl SubmitHandler for Recorder {
        fn on_submit(&mut self, submission: Submission) {
            self.submitted.push(submission);
        }

        fn on_error(&mut self, errors: &ValidationErrors) {
            self.errors.push(errors.clone());
        }

        fn on_delete(&mut self) {
            self.deleted += 1;
        }
    }

    #[derive(Default)]
    struct CountingRenderer {
        calls: Cell<usize>,
    }

    impl MarkdownRenderer for CountingRenderer {
        fn render(&self, source: &str) -> String {
            self.calls.set(self.calls.get() + 1);
            source.to_string()
        }
    }

    fn valid_props() -> DraftProps {
        DraftProps {
            title: "Hello".into(),
            topics: vec!["rust".into(), "web-dev".into()],
            body: "Some **body**".into(),
            reward: RewardTier::All,
            upvote: false,
            draft_id: Some("draft-1".into()),
        }
    }

    fn mounted(props: DraftProps) -> ComposeForm<PreviewRenderer> {
        let mut form = ComposeForm::new(Editor::new(PreviewRenderer::new()), props);
        form.mount();
        form
    }

    #[test]
    fn test_valid_submit() {
        let mut form = mounted(valid_props());
        let mut recorder = Recorder::default();

        assert!(form.submit(&mut recorder));
        assert!(recorder.errors.is_empty());
        assert_eq!(
            recorder.submitted,
            vec![Submission {
                title: "Hello".into(),
                topics: vec!["rust".into(), "web-dev".into()],
                body: "Some **body**".into(),
                reward: RewardTier::All,
                upvote: false,
            }]
        );
        assert!(!form.no_content());
    }

    #[test]
    fn test_empty_body_joins_field_errors() {
        let props = DraftProps {
            title: String::new(),
            body: String::new(),
            ..valid_props()
        };
        let mut form = mounted(props);
        let mut recorder = Recorder::default();

        assert!(!form.submit(&mut recorder));
        assert!(recorder.submitted.is_empty());
        let errors = &recorder.errors[0];
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["body", "title"]);
        assert_eq!(errors.get("body")[0].message, "Content can't be empty");
        let help = miette::Diagnostic::help(&errors.get("body")[0]).map(|h| h.to_string());
        assert_eq!(help.as_deref(), Some(NO_CONTENT_HELP));
        assert!(form.no_content());
    }

    #[test]
    fn test_bad_topics_block_submit() {
        let props = DraftProps {
            topics: vec!["Nope".into()],
            ..valid_props()
        };
        let mut form = mounted(props);
        let mut recorder = Recorder::default();

        assert!(!form.submit(&mut recorder));
        assert!(recorder.submitted.is_empty());
        assert_eq!(recorder.errors[0].get("topics")[0].message, "Topic Nope is invalid");
        assert!(!form.no_content());
    }

    #[test]
    fn test_detached_editor_is_no_content() {
        let mut form = ComposeForm::new(Editor::new(PreviewRenderer::new()), valid_props());
        let errors = form.check().unwrap_err();
        assert!(errors.has("body"));
        assert!(form.no_content());

        // the flag resets on the next good submit
        form.mount();
        assert!(form.check().is_ok());
        assert!(!form.no_content());
    }

    #[test]
    fn test_receive_props_only_rehydrates_on_change() {
        let renderer = CountingRenderer::default();
        let mut form = ComposeForm::new(Editor::new(&renderer), valid_props());
        form.mount();
        let renders = renderer.calls.get();

        // same values, fresh allocations
        assert!(!form.receive_props(valid_props()));
        assert_eq!(renderer.calls.get(), renders);

        // a new draft id appearing is not a change
        let mut next = valid_props();
        next.draft_id = Some("draft-2".into());
        assert!(!form.receive_props(next));

        let mut next = valid_props();
        next.upvote = true;
        assert!(form.receive_props(next));
        assert!(form.fields().upvote);
        assert_eq!(renderer.calls.get(), renders + 1);

        // draft deleted: id dropped, nothing else changed
        let mut next = valid_props();
        next.upvote = true;
        next.draft_id = None;
        assert!(form.receive_props(next));
        assert!(!form.can_delete());
    }

    #[test]
    fn test_rehydrate_replaces_body_and_preview() {
        let mut form = mounted(valid_props());
        form.editor_mut().insert_code(TokenKind::Italic);

        let next = DraftProps {
            body: "# New".into(),
            ..valid_props()
        };
        assert!(form.receive_props(next));
        assert_eq!(form.editor().body().as_deref(), Some("# New"));
        assert_eq!(form.editor().html(), "<h1>New</h1>\n");
        assert_eq!(form.editor().selection(), Some(Selection::collapsed(5)));
    }

    #[test]
    fn test_on_update_truncates_and_flags_body() {
        let mut form = mounted(valid_props());

        let topics: Vec<String> = (1..=7).map(|i| format!("t{i}")).collect();
        let update = form.on_update(FieldChange::Topics(topics.clone()));
        assert_eq!(update.topics.len(), 5);
        assert_eq!(update.body, None);
        // the control keeps what was typed
        assert_eq!(form.fields().topics, topics);

        let update = form.on_update(FieldChange::Title("t".repeat(300)));
        assert_eq!(update.title.chars().count(), 255);

        let update = form.on_update(FieldChange::Body("new body".into()));
        assert_eq!(update.body.as_deref(), Some("new body"));
        assert_eq!(form.editor().body().as_deref(), Some("new body"));

        let update = form.on_update(FieldChange::Reward(RewardTier::None));
        assert_eq!(update.reward, RewardTier::None);
        assert_eq!(update.body, None);
    }

    #[test]
    fn test_body_edit_needs_mounted_input() {
        let mut form = ComposeForm::new(Editor::new(PreviewRenderer::new()), valid_props());
        let update = form.on_update(FieldChange::Body("typed while unmounted".into()));
        assert_eq!(update.body, None);
        assert_eq!(update.title, "Hello");
        assert_eq!(form.editor().body(), None);

        form.mount();
        form.unmount();
        let update = form.on_update(FieldChange::Body("after unmount".into()));
        assert_eq!(update.body, None);
    }

    #[test]
    fn test_delete_forwards() {
        let mut form = mounted(valid_props());
        let mut recorder = Recorder::default();
        assert!(form.can_delete());
        form.delete(&mut recorder);
        assert_eq!(recorder.deleted, 1);
        assert!(recorder.submitted.is_empty());
    }
}
