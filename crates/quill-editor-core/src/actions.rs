//! Markdown tokens and the keyboard types that trigger them.

use std::collections::HashMap;
use std::str::FromStr;

use smol_str::{SmolStr, format_smolstr};

/// ATX heading level, always 1 through 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const fn new(level: u8) -> Option<Self> {
        if matches!(level, 1..=6) {
            Some(Self(level))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (1..=6).map(Self)
    }
}

/// A markdown construct the toolbar or a hotkey can insert at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Heading(HeadingLevel),
    Bold,
    Italic,
    Quote,
    Link,
    Image,
}

impl TokenKind {
    /// Heading of the given level, if it is 1..=6.
    pub fn heading(level: u8) -> Option<Self> {
        HeadingLevel::new(level).map(Self::Heading)
    }

    /// Text inserted before the selection.
    pub fn before(&self) -> SmolStr {
        match self {
            Self::Heading(level) => format_smolstr!("{} ", "#".repeat(level.get() as usize)),
            Self::Bold => SmolStr::new_static("**"),
            Self::Italic => SmolStr::new_static("*"),
            Self::Quote => SmolStr::new_static("> "),
            Self::Link => SmolStr::new_static("["),
            Self::Image => SmolStr::new_static("!["),
        }
    }

    /// Text inserted after the selection.
    pub fn after(&self) -> &'static str {
        match self {
            Self::Heading(_) | Self::Quote => "",
            Self::Bold => "**",
            Self::Italic => "*",
            Self::Link | Self::Image => "](url)",
        }
    }

    /// How far both selection bounds move: the length of the opening marker.
    pub fn shift(&self) -> usize {
        self.before().chars().count()
    }

    pub fn name(&self) -> SmolStr {
        match self {
            Self::Heading(level) => format_smolstr!("h{}", level.get()),
            Self::Bold => SmolStr::new_static("b"),
            Self::Italic => SmolStr::new_static("i"),
            Self::Quote => SmolStr::new_static("q"),
            Self::Link => SmolStr::new_static("link"),
            Self::Image => SmolStr::new_static("image"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown token {0:?}, expected one of h1-h6, b, i, q, link, image")]
pub struct UnknownToken(pub String);

impl FromStr for TokenKind {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "b" | "bold" => Ok(Self::Bold),
            "i" | "italic" => Ok(Self::Italic),
            "q" | "quote" => Ok(Self::Quote),
            "link" => Ok(Self::Link),
            "image" => Ok(Self::Image),
            _ => s
                .strip_prefix('h')
                .and_then(|n| n.parse::<u8>().ok())
                .and_then(Self::heading)
                .ok_or_else(|| UnknownToken(s.to_string())),
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// Keyboard key values.
///
/// Platform code converts its native key events into this.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),
    Enter,
    Tab,
    Escape,
    Backspace,
    Unidentified,
}

impl Key {
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Enter" | "enter" => Self::Enter,
            "Tab" | "tab" => Self::Tab,
            "Escape" | "escape" | "esc" => Self::Escape,
            "Backspace" | "backspace" => Self::Backspace,
            s if s.chars().count() == 1 => Self::character(s),
            _ => Self::Unidentified,
        }
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL_SHIFT: Self = Self {
        ctrl: true,
        alt: false,
        shift: true,
        meta: false,
    };
}

/// A key combination for triggering an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn ctrl(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::CTRL)
    }

    pub fn ctrl_shift(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::CTRL_SHIFT)
    }

    /// The layout-independent form used for lookup: letters lowercased and
    /// shifted digits (US layout) mapped back to the digit.
    pub fn normalized(&self) -> Self {
        let key = match &self.key {
            Key::Character(s) => {
                let unshifted = match s.as_str() {
                    "!" => "1",
                    "@" => "2",
                    "#" => "3",
                    "$" => "4",
                    "%" => "5",
                    "^" => "6",
                    other => other,
                };
                Key::character(unshifted.to_lowercase())
            }
            other => other.clone(),
        };
        Self {
            key,
            modifiers: self.modifiers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("can't parse key combo {0:?}")]
pub struct InvalidKeyCombo(pub String);

/// Parses `ctrl+shift+1` style combos.
impl FromStr for KeyCombo {
    type Err = InvalidKeyCombo;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::NONE;
        let mut key = None;
        for part in s.split('+') {
            let part = part.trim();
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "meta" | "cmd" => modifiers.meta = true,
                "" => return Err(InvalidKeyCombo(s.to_string())),
                _ if key.is_none() => key = Some(Key::from_name(part)),
                _ => return Err(InvalidKeyCombo(s.to_string())),
            }
        }
        match key {
            Some(Key::Unidentified) | None => Err(InvalidKeyCombo(s.to_string())),
            Some(key) => Ok(Self::with_modifiers(key, modifiers).normalized()),
        }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownResult {
    /// A binding fired; prevent default.
    Handled,
    /// Not a binding, let the platform handle it.
    NotHandled,
}

/// Key bindings from combos to tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Hotkeys {
    bindings: HashMap<KeyCombo, TokenKind>,
}

impl Default for Hotkeys {
    /// `ctrl+shift+1..6` headings, `ctrl+b` bold, `ctrl+i` italic,
    /// `ctrl+q` quote, `ctrl+k` link and `ctrl+m` image.
    fn default() -> Self {
        let mut bindings = HashMap::new();
        for level in HeadingLevel::all() {
            bindings.insert(
                KeyCombo::ctrl_shift(Key::character(format_smolstr!("{}", level.get()))),
                TokenKind::Heading(level),
            );
        }
        for (key, kind) in [
            ("b", TokenKind::Bold),
            ("i", TokenKind::Italic),
            ("q", TokenKind::Quote),
            ("k", TokenKind::Link),
            ("m", TokenKind::Image),
        ] {
            bindings.insert(KeyCombo::ctrl(Key::character(key)), kind);
        }
        Self { bindings }
    }
}

impl Hotkeys {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn bind(&mut self, combo: KeyCombo, kind: TokenKind) -> Option<TokenKind> {
        self.bindings.insert(combo.normalized(), kind)
    }

    pub fn unbind(&mut self, combo: &KeyCombo) -> Option<TokenKind> {
        self.bindings.remove(&combo.normalized())
    }

    pub fn lookup(&self, combo: &KeyCombo) -> Option<TokenKind> {
        self.bindings.get(&combo.normalized()).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(level: u8) -> TokenKind {
        TokenKind::heading(level).unwrap()
    }

    #[test]
    fn test_marker_table() {
        let cases = [
            (h(1), "# ", "", 2),
            (h(3), "### ", "", 4),
            (h(6), "###### ", "", 7),
            (TokenKind::Bold, "**", "**", 2),
            (TokenKind::Italic, "*", "*", 1),
            (TokenKind::Quote, "> ", "", 2),
            (TokenKind::Link, "[", "](url)", 1),
            (TokenKind::Image, "![", "](url)", 2),
        ];
        for (kind, before, after, shift) in cases {
            assert_eq!(kind.before(), before, "{kind}");
            assert_eq!(kind.after(), after, "{kind}");
            assert_eq!(kind.shift(), shift, "{kind}");
        }
    }

    #[test]
    fn test_token_names_parse() {
        assert_eq!("h1".parse::<TokenKind>(), Ok(h(1)));
        assert_eq!("h6".parse::<TokenKind>(), Ok(h(6)));
        assert_eq!("b".parse::<TokenKind>(), Ok(TokenKind::Bold));
        assert_eq!("italic".parse::<TokenKind>(), Ok(TokenKind::Italic));
        assert_eq!("q".parse::<TokenKind>(), Ok(TokenKind::Quote));
        assert_eq!("link".parse::<TokenKind>(), Ok(TokenKind::Link));
        assert_eq!("image".parse::<TokenKind>(), Ok(TokenKind::Image));
        assert!("h7".parse::<TokenKind>().is_err());
        assert!("h0".parse::<TokenKind>().is_err());
        assert_eq!(
            "strike".parse::<TokenKind>(),
            Err(UnknownToken("strike".into()))
        );
        assert_eq!(TokenKind::heading(2).map(|k| k.name()), Some("h2".into()));
    }

    #[test]
    fn test_heading_level_bounds() {
        assert_eq!(HeadingLevel::new(0), None);
        assert_eq!(HeadingLevel::new(7), None);
        assert_eq!(TokenKind::heading(9), None);
        assert_eq!(HeadingLevel::all().map(HeadingLevel::get).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);

        // every constructible heading names itself in a form that parses back
        for level in HeadingLevel::all() {
            let kind = TokenKind::Heading(level);
            assert_eq!(kind.name().parse::<TokenKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_combo_parse() {
        let combo: KeyCombo = "ctrl+shift+1".parse().unwrap();
        assert_eq!(combo, KeyCombo::ctrl_shift(Key::character("1")));
        assert_eq!("Ctrl+B".parse::<KeyCombo>(), Ok(KeyCombo::ctrl(Key::character("b"))));
        assert!("ctrl+".parse::<KeyCombo>().is_err());
        assert!("ctrl+shift".parse::<KeyCombo>().is_err());
        assert!("ctrl+a+b".parse::<KeyCombo>().is_err());
        assert_eq!(
            "ctrl+Enter".parse::<KeyCombo>(),
            Ok(KeyCombo::ctrl(Key::Enter))
        );
    }

    #[test]
    fn test_default_hotkeys() {
        let keys = Hotkeys::default();
        assert_eq!(keys.len(), 11);
        assert_eq!(
            keys.lookup(&KeyCombo::ctrl(Key::character("k"))),
            Some(TokenKind::Link)
        );
        // browsers report shift+1 as "!"
        assert_eq!(
            keys.lookup(&KeyCombo::ctrl_shift(Key::character("!"))),
            Some(h(1))
        );
        assert_eq!(keys.lookup(&KeyCombo::new(Key::character("b"))), None);
        assert_eq!(keys.lookup(&KeyCombo::ctrl(Key::Enter)), None);
    }
}
