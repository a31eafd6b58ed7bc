//! Embeddable media detection.
//!
//! Scans a post body for links to known media hosts and turns each into an
//! [`Embed`] descriptor the feed can show as a player or a thumbnail.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static YOUTUBE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:https?://)?(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:[^\s&]*&)*v=|embed/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .unwrap()
});

static VIMEO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.|player\.)?vimeo\.com/(?:video/)?(\d+)").unwrap()
});

static TWITCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?twitch\.tv/([A-Za-z0-9_]{3,25})\b").unwrap()
});

static SOUNDCLOUD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?soundcloud\.com/([A-Za-z0-9_-]+/[A-Za-z0-9_-]+)").unwrap()
});

const PLAYER_WIDTH: u32 = 640;
const PLAYER_HEIGHT: u32 = 360;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EmbedProvider {
    YouTube,
    Vimeo,
    Twitch,
    SoundCloud,
}

impl EmbedProvider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::Vimeo => "Vimeo",
            Self::Twitch => "Twitch",
            Self::SoundCloud => "SoundCloud",
        }
    }

    /// "video" or "music"
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SoundCloud => "music",
            _ => "video",
        }
    }

    fn regex(&self) -> &'static Regex {
        match self {
            Self::YouTube => &YOUTUBE_RE,
            Self::Vimeo => &VIMEO_RE,
            Self::Twitch => &TWITCH_RE,
            Self::SoundCloud => &SOUNDCLOUD_RE,
        }
    }

    fn canonical_url(&self, id: &str) -> String {
        match self {
            Self::YouTube => format!("https://www.youtube.com/watch?v={}", id),
            Self::Vimeo => format!("https://vimeo.com/{}", id),
            Self::Twitch => format!("https://www.twitch.tv/{}", id),
            Self::SoundCloud => format!("https://soundcloud.com/{}", id),
        }
    }

    fn player_url(&self, id: &str) -> String {
        match self {
            Self::YouTube => format!("https://www.youtube.com/embed/{}?autoplay=1", id),
            Self::Vimeo => format!("https://player.vimeo.com/video/{}?autoplay=1", id),
            Self::Twitch => format!("https://player.twitch.tv/?channel={}&autoplay=true", id),
            Self::SoundCloud => format!(
                "https://w.soundcloud.com/player/?url=https://soundcloud.com/{}&auto_play=true",
                id
            ),
        }
    }

    fn thumbnail(&self, id: &str) -> Option<String> {
        match self {
            Self::YouTube => Some(format!("https://img.youtube.com/vi/{}/0.jpg", id)),
            _ => None,
        }
    }

    const ALL: [EmbedProvider; 4] = [
        Self::YouTube,
        Self::Vimeo,
        Self::Twitch,
        Self::SoundCloud,
    ];
}

/// A piece of embeddable media found in a post body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub kind: &'static str,
    pub provider: EmbedProvider,
    pub id: String,
    pub url: String,
    pub thumbnail: Option<String>,
    /// Player markup.
    pub html: String,
}

impl Embed {
    pub fn new(provider: EmbedProvider, id: impl Into<String>) -> Self {
        let id = id.into();
        let html = format!(
            "<iframe width=\"{}\" height=\"{}\" src=\"{}\" frameborder=\"0\" allowfullscreen></iframe>",
            PLAYER_WIDTH,
            PLAYER_HEIGHT,
            provider.player_url(&id)
        );
        Self {
            kind: provider.kind(),
            provider,
            url: provider.canonical_url(&id),
            thumbnail: provider.thumbnail(&id),
            html,
            id,
        }
    }
}

/// Finds embeddable media in a post body.
pub trait EmbedDetector {
    fn get_all(&self, body: &str) -> Vec<Embed>;
}

impl<T: EmbedDetector> EmbedDetector for &T {
    fn get_all(&self, body: &str) -> Vec<Embed> {
        (*self).get_all(body)
    }
}

/// Detects YouTube, Vimeo, Twitch and SoundCloud links.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultEmbedDetector;

impl EmbedDetector for DefaultEmbedDetector {
    fn get_all(&self, body: &str) -> Vec<Embed> {
        let mut found: Vec<(usize, EmbedProvider, &str)> = Vec::new();
        for provider in EmbedProvider::ALL {
            for caps in provider.regex().captures_iter(body) {
                if let (Some(whole), Some(id)) = (caps.get(0), caps.get(1)) {
                    found.push((whole.start(), provider, id.as_str()));
                }
            }
        }
        found.sort_by_key(|(pos, _, _)| *pos);

        let mut embeds: Vec<Embed> = Vec::with_capacity(found.len());
        for (_, provider, id) in found {
            if embeds.iter().any(|e| e.provider == provider && e.id == id) {
                continue;
            }
            embeds.push(Embed::new(provider, id));
        }
        embeds
    }
}

/// No embeds, for callers that don't want detection.
impl EmbedDetector for () {
    fn get_all(&self, _body: &str) -> Vec<Embed> {
        Vec::new()
    }
}
