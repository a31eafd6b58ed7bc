//! Field validation for the composition form.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use miette::Diagnostic;
use regex::Regex;
use serde::Serialize;

use crate::draft::{FormFields, MAX_TITLE_CHARS, MAX_TOPICS};

static TOPIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap());

pub const TITLE_EMPTY: &str = "Please enter a title";
pub const TITLE_TOO_LONG: &str = "Title can't be longer than 255 characters.";
pub const TOPICS_EMPTY: &str = "Please enter topics";
pub const TOPICS_COUNT: &str = "You have to add 1 to 5 topics";
pub const BODY_EMPTY: &str = "Content can't be empty";

/// Lowercase letters and digits, in hyphen-separated runs.
pub fn is_valid_topic(topic: &str) -> bool {
    TOPIC_RE.is_match(topic)
}

/// One failed rule on one field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error, Diagnostic)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
    /// Longer hint shown under the input.
    #[help]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

pub fn validate_title(title: &str) -> Vec<FieldError> {
    if title.is_empty() {
        vec![FieldError::new("title", TITLE_EMPTY)]
    } else if title.chars().count() > MAX_TITLE_CHARS {
        vec![FieldError::new("title", TITLE_TOO_LONG)]
    } else {
        Vec::new()
    }
}

/// An empty list fails both the required and the count rule. Too many
/// topics fails the count rule only. Otherwise the first malformed topic
/// is reported.
pub fn validate_topics(topics: &[String]) -> Vec<FieldError> {
    if topics.is_empty() {
        return vec![
            FieldError::new("topics", TOPICS_EMPTY),
            FieldError::new("topics", TOPICS_COUNT),
        ];
    }
    if topics.len() > MAX_TOPICS {
        return vec![FieldError::new("topics", TOPICS_COUNT)];
    }
    topics
        .iter()
        .find(|topic| !is_valid_topic(topic))
        .map(|topic| vec![FieldError::new("topics", format!("Topic {} is invalid", topic))])
        .unwrap_or_default()
}

/// Per-field validation failures.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, thiserror::Error, Diagnostic)]
#[error("{}", summarize(.fields))]
#[diagnostic(
    code(quill::compose::invalid_draft),
    help("fix the fields above and submit again")
)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<FieldError>>,
}

fn summarize(fields: &BTreeMap<String, Vec<FieldError>>) -> String {
    let messages: Vec<&str> = fields
        .values()
        .flatten()
        .map(|e| e.message.as_str())
        .collect();
    if messages.is_empty() {
        "no validation errors".to_string()
    } else {
        messages.join("; ")
    }
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.fields.entry(error.field.clone()).or_default().push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = FieldError>) {
        for error in errors {
            self.push(error);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> &[FieldError] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.fields.values().flatten()
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Run the title and topic rules over the form controls.
pub fn validate_fields(fields: &FormFields) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.extend(validate_title(&fields.title));
    errors.extend(validate_topics(&fields.topics));
    if !errors.is_empty() {
        tracing::debug!(fields = ?errors.fields().collect::<Vec<_>>(), "draft failed validation");
    }
    errors
}
