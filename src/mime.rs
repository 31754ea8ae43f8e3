//! Media types for content negotiation.
//!
//! A [`MimeType`] is just a `(type, subtype)` pair. Parameters such as
//! `charset` or `q` are dropped on parse, so `application/json; charset=utf-8`
//! and `application/json` compare equal. Parsing never fails: whatever the
//! client sent still becomes a pair, it just won't match anything useful.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A media type such as `application/json`, `text/*` or `*/*`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct MimeType {
    kind: String,
    subtype: String,
}

impl MimeType {
    /// Wildcard segment.
    pub const WILDCARD: &'static str = "*";

    pub fn new(kind: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            kind: kind.into().to_ascii_lowercase(),
            subtype: subtype.into().to_ascii_lowercase(),
        }
    }

    /// `application/json`
    pub fn json() -> Self { Self::new("application", "json") }

    /// `application/yaml`
    pub fn yaml() -> Self { Self::new("application", "yaml") }

    /// `text/plain`
    pub fn plain_text() -> Self { Self::new("text", "plain") }

    /// `text/html`
    pub fn html() -> Self { Self::new("text", "html") }

    /// `application/xml`
    pub fn xml() -> Self { Self::new("application", "xml") }

    /// `*/*`
    pub fn any() -> Self { Self::new(Self::WILDCARD, Self::WILDCARD) }

    /// Parses a single media range out of a header value.
    ///
    /// Anything after `;` is ignored. A value without a `/` gets a wildcard
    /// subtype, so a bare `*` reads as `*/*`.
    pub fn parse(value: &str) -> Self {
        let essence = value.split(';').next().unwrap_or_default().trim();
        match essence.split_once('/') {
            Some((kind, subtype)) => Self::new(kind.trim(), subtype.trim()),
            None => Self::new(essence, Self::WILDCARD),
        }
    }

    /// Parses a comma-separated `Accept` header, preserving order.
    pub fn parse_list(header: &str) -> Vec<Self> {
        header
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Self::parse)
            .collect()
    }

    pub fn kind(&self) -> &str { &self.kind }
    pub fn subtype(&self) -> &str { &self.subtype }

    /// True if each segment is equal, or either side has a wildcard there.
    pub fn is_compatible_with(&self, other: &MimeType) -> bool {
        segment_compatible(&self.kind, &other.kind)
            && segment_compatible(&self.subtype, &other.subtype)
    }
}

fn segment_compatible(a: &str, b: &str) -> bool {
    a == b || a == MimeType::WILDCARD || b == MimeType::WILDCARD
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)
    }
}

impl FromStr for MimeType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for MimeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MimeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Joins media types for header values, e.g. `application/json, text/plain`.
pub(crate) fn join(types: &[MimeType]) -> String {
    types.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
