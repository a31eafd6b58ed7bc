//! The composition draft and the values that flow out of the form.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Most topics a post may carry.
pub const MAX_TOPICS: usize = 5;
/// Longest title, in chars.
pub const MAX_TITLE_CHARS: usize = 255;

/// How the author's payout is split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardTier {
    #[serde(rename = "100")]
    All,
    #[default]
    #[serde(rename = "50")]
    Half,
    #[serde(rename = "0")]
    None,
}

impl RewardTier {
    pub const ALL: [RewardTier; 3] = [Self::All, Self::Half, Self::None];

    /// Wire value.
    pub fn value(&self) -> &'static str {
        match self {
            Self::All => "100",
            Self::Half => "50",
            Self::None => "0",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "100% Steem Power",
            Self::Half => "50% SBD and 50% SP",
            Self::None => "Declined",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown reward tier {0:?}, expected 100, 50 or 0")]
pub struct UnknownRewardTier(pub String);

impl FromStr for RewardTier {
    type Err = UnknownRewardTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.value() == s)
            .ok_or_else(|| UnknownRewardTier(s.to_string()))
    }
}

impl std::fmt::Display for RewardTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn default_upvote() -> bool {
    true
}

/// Props the form is hydrated from: an empty draft, a saved draft or a post being edited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftProps {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub reward: RewardTier,
    #[serde(default = "default_upvote")]
    pub upvote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_id: Option<String>,
}

impl Default for DraftProps {
    fn default() -> Self {
        Self {
            title: String::new(),
            topics: Vec::new(),
            body: String::new(),
            reward: RewardTier::default(),
            upvote: true,
            draft_id: None,
        }
    }
}

impl DraftProps {
    /// Whether hydrating from `next` would change what the form shows.
    ///
    /// Dropping the draft id (the draft was published or deleted) counts too.
    pub fn differs_from(&self, next: &DraftProps) -> bool {
        self.title != next.title
            || self.topics != next.topics
            || self.body != next.body
            || self.reward != next.reward
            || self.upvote != next.upvote
            || (self.draft_id.is_some() && next.draft_id.is_none())
    }
}

/// Values held by the form controls. The body lives in the editor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormFields {
    pub title: String,
    pub topics: Vec<String>,
    pub reward: RewardTier,
    pub upvote: bool,
}

impl From<&DraftProps> for FormFields {
    fn from(props: &DraftProps) -> Self {
        Self {
            title: props.title.clone(),
            topics: props.topics.clone(),
            reward: props.reward,
            upvote: props.upvote,
        }
    }
}

/// One control changing value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldChange {
    Title(String),
    Topics(Vec<String>),
    Body(String),
    Reward(RewardTier),
    Upvote(bool),
}

/// Sent to the draft store on every change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DraftUpdate {
    pub title: String,
    pub topics: Vec<String>,
    pub reward: RewardTier,
    pub upvote: bool,
    /// Only set when the change was a body edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl DraftUpdate {
    /// Snapshot of `fields`, cut down to what the store accepts.
    pub fn from_fields(fields: &FormFields, body: Option<String>) -> Self {
        Self {
            title: fields.title.chars().take(MAX_TITLE_CHARS).collect(),
            topics: fields.topics.iter().take(MAX_TOPICS).cloned().collect(),
            reward: fields.reward,
            upvote: fields.upvote,
            body,
        }
    }
}

/// A validated post, handed to the submit collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub title: String,
    pub topics: Vec<String>,
    pub body: String,
    pub reward: RewardTier,
    pub upvote: bool,
}
