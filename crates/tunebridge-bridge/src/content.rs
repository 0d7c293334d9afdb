use std::fmt;

use serde::{Deserialize, Serialize};

const WEB_PLAYER_BASE: &str = "https://open.spotify.com";

/// Opaque identifier of a playable unit (track, album, episode) understood by
/// the embedded widget, usually in the `scheme:kind:id` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Wraps a raw identifier. Surrounding whitespace is dropped.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.len() == raw.len() {
            Self(raw)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Builds an identifier from its kind (`track`, `album`, ...) and id.
    pub fn from_parts(kind: &str, id: &str) -> Self {
        Self(format!("spotify:{kind}:{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Kind segment of a `scheme:kind:id` identifier.
    pub fn kind(&self) -> Option<&str> {
        self.parts().map(|(kind, _)| kind)
    }

    /// Trailing id segment of a `scheme:kind:id` identifier.
    pub fn id(&self) -> Option<&str> {
        self.parts().map(|(_, id)| id)
    }

    /// Converts `scheme:kind:id` to the public web player link.
    pub fn web_link(&self) -> Option<String> {
        self.parts()
            .map(|(kind, id)| format!("{WEB_PLAYER_BASE}/{kind}/{id}"))
    }

    fn parts(&self) -> Option<(&str, &str)> {
        let mut segments = self.0.split(':');
        let (_scheme, kind, id) = (segments.next()?, segments.next()?, segments.next()?);
        if segments.next().is_some() || kind.is_empty() || id.is_empty() {
            return None;
        }
        Some((kind, id))
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ContentId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ContentId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ContentId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
