//! Feed item presentation.
//!
//! A stored post record is turned into the props of one of two variants,
//! list row or card, chosen by the app layout. Nothing in here fails: bad
//! metadata just means an empty metadata object.

use markdown_weaver_escape::{FmtWriter, escape_href, escape_html};
use quill_common::FeedConfig;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::embed::{Embed, EmbedDetector};
use crate::reading::ReadingStats;

const SUMMARY_CHARS: usize = 140;

/// A post as stored by the external store. Fields the feed doesn't look at
/// ride along in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct PostRecord {
    #[serde(default)]
    pub body: String,
    /// Raw JSON metadata blob. Some APIs send it pre-parsed; it is kept as text either way.
    #[serde(default, deserialize_with = "string_or_json")]
    pub json_metadata: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn string_or_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

impl PostRecord {
    pub fn new(body: impl Into<String>, json_metadata: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            json_metadata: json_metadata.into(),
            extra: Map::new(),
        }
    }

    fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.extra_str("title")
    }

    pub fn author(&self) -> Option<&str> {
        self.extra_str("author")
    }
}

/// Parsed post metadata. Always a JSON object, possibly empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct JsonMetadata(Map<String, Value>);

impl JsonMetadata {
    /// Parse tolerantly: anything that isn't a JSON object becomes `{}`.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Self(map),
            Ok(other) => {
                tracing::debug!(kind = json_kind(&other), "json_metadata is not an object");
                Self::default()
            }
            Err(e) => {
                tracing::debug!(error = %e, "unparseable json_metadata");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// String entries of the `image` array, in order.
    pub fn images(&self) -> Vec<&str> {
        match self.0.get("image") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn first_image(&self) -> Option<&str> {
        match self.0.get("image") {
            Some(Value::Array(items)) => items.first().and_then(Value::as_str),
            _ => None,
        }
        .filter(|s| !s.is_empty())
    }

    pub fn tags(&self) -> Vec<&str> {
        match self.0.get("tags") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Cover image path: the first metadata image behind the image proxy, or none.
pub fn cover_image_path(metadata: &JsonMetadata, image_proxy: &str) -> Option<String> {
    metadata
        .first_image()
        .map(|image| format!("{}{}", image_proxy, image))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    List,
    #[default]
    Card,
}

impl Layout {
    /// `"list"` selects the list variant; every other value means card.
    pub fn from_app_layout(layout: &str) -> Self {
        if layout == "list" { Self::List } else { Self::Card }
    }
}

/// Which expandable detail section of a feed item is open. At most one is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    #[default]
    None,
    Comments,
    Likes,
    Payout,
}

impl Panel {
    /// Open `requested`, closing whatever else was open. Requesting the open panel closes it.
    pub fn toggle(self, requested: Panel) -> Panel {
        if self == requested { Panel::None } else { requested }
    }

    fn class_suffix(&self) -> &'static str {
        match self {
            Panel::None => "none",
            Panel::Comments => "comments",
            Panel::Likes => "likes",
            Panel::Payout => "payout",
        }
    }
}

/// Per-item view state: which panel is open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PostFeed {
    panel: Panel,
}

impl PostFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn toggle(&mut self, requested: Panel) -> Panel {
        self.panel = self.panel.toggle(requested);
        self.panel
    }

    pub fn show_comments_request(&mut self) -> Panel {
        self.toggle(Panel::Comments)
    }

    pub fn show_likes_request(&mut self) -> Panel {
        self.toggle(Panel::Likes)
    }

    pub fn show_payout_request(&mut self) -> Panel {
        self.toggle(Panel::Payout)
    }

    pub fn show_comments(&self) -> bool {
        self.panel == Panel::Comments
    }

    pub fn show_likes(&self) -> bool {
        self.panel == Panel::Likes
    }

    pub fn show_payout(&self) -> bool {
        self.panel == Panel::Payout
    }

    /// Present `post` with this item's panel state.
    pub fn present<'a>(
        &self,
        post: &'a PostRecord,
        layout: Layout,
        detector: &impl EmbedDetector,
        config: &FeedConfig,
    ) -> FeedItem<'a> {
        present(post, layout, self.panel, detector, config)
    }
}

/// Everything either variant needs to draw a post.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedItemProps<'a> {
    pub post: &'a PostRecord,
    pub json_metadata: JsonMetadata,
    pub image_path: Option<String>,
    pub embeds: Vec<Embed>,
    pub panel: Panel,
    pub layout: Layout,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "variant", content = "props", rename_all = "lowercase")]
pub enum FeedItem<'a> {
    List(FeedItemProps<'a>),
    Card(FeedItemProps<'a>),
}

/// Assemble props for `post` and pick the variant for `layout`.
pub fn present<'a>(
    post: &'a PostRecord,
    layout: Layout,
    panel: Panel,
    detector: &impl EmbedDetector,
    config: &FeedConfig,
) -> FeedItem<'a> {
    let json_metadata = JsonMetadata::parse(&post.json_metadata);
    let image_path = cover_image_path(&json_metadata, &config.image_proxy);
    let embeds = detector.get_all(&post.body);
    let props = FeedItemProps {
        post,
        json_metadata,
        image_path,
        embeds,
        panel,
        layout,
    };
    match layout {
        Layout::List => FeedItem::List(props),
        Layout::Card => FeedItem::Card(props),
    }
}

impl<'a> FeedItem<'a> {
    pub fn props(&self) -> &FeedItemProps<'a> {
        match self {
            FeedItem::List(props) | FeedItem::Card(props) => props,
        }
    }

    pub fn layout(&self) -> Layout {
        match self {
            FeedItem::List(_) => Layout::List,
            FeedItem::Card(_) => Layout::Card,
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        let class = match self {
            FeedItem::List(_) => "PostFeedList",
            FeedItem::Card(_) => "PostFeedCard",
        };
        // fmt::Write into a String doesn't fail
        let _ = write_item(&mut out, class, self.props());
        out
    }
}

fn write_item(out: &mut String, class: &str, props: &FeedItemProps<'_>) -> std::fmt::Result {
    use std::fmt::Write;

    writeln!(out, "<div class=\"{}\">", class)?;

    let thumbnail = props
        .image_path
        .as_deref()
        .or_else(|| props.embeds.first().and_then(|e| e.thumbnail.as_deref()));
    match (props.layout, thumbnail, props.embeds.first()) {
        // Cards play the first embed inline when there is no cover image
        (Layout::Card, None, Some(embed)) => {
            writeln!(out, "<div class=\"{}__embed\">{}</div>", class, embed.html)?;
        }
        (_, Some(src), _) => {
            write!(out, "<div class=\"{}__cover\"><img src=\"", class)?;
            escape_href(FmtWriter(&mut *out), src)?;
            writeln!(out, "\" alt=\"\" /></div>")?;
        }
        _ => {}
    }

    if let Some(title) = props.post.title() {
        write!(out, "<h2 class=\"{}__title\">", class)?;
        escape_html(FmtWriter(&mut *out), title)?;
        writeln!(out, "</h2>")?;
    }
    if let Some(author) = props.post.author() {
        write!(out, "<span class=\"{}__author\">@", class)?;
        escape_html(FmtWriter(&mut *out), author)?;
        writeln!(out, "</span>")?;
    }

    let summary = summarize(&props.post.body);
    if !summary.is_empty() {
        write!(out, "<p class=\"{}__summary\">", class)?;
        escape_html(FmtWriter(&mut *out), &summary)?;
        writeln!(out, "</p>")?;
    }

    if props.panel != Panel::None {
        writeln!(
            out,
            "<div class=\"{}__panel {}__panel--{}\"></div>",
            class,
            class,
            props.panel.class_suffix()
        )?;
    }
    writeln!(out, "</div>")
}

/// Plain-text preview of a markdown body.
fn summarize(body: &str) -> String {
    let html = crate::render_markdown(body);
    let text = ReadingStats::strip_tags(&html);
    let words: Vec<&str> = text.split_whitespace().collect();
    let joined = words.join(" ");
    if joined.chars().count() <= SUMMARY_CHARS {
        joined
    } else {
        let mut cut: String = joined.chars().take(SUMMARY_CHARS).collect();
        cut.push('…');
        cut
    }
}
