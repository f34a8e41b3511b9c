//! Entity tags for validators and conditional requests.

use std::fmt;

use super::HeaderError;

/// An opaque validator, optionally weak.
///
/// Parsing strips surrounding quotes and the `W/` marker; formatting writes
/// the tag back without adding quotes, so a bare tag round-trips byte for
/// byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityTag {
    weak: bool,
    tag: String,
}

impl EntityTag {
    pub fn strong(tag: impl Into<String>) -> Self {
        Self {
            weak: false,
            tag: tag.into(),
        }
    }

    pub fn weak(tag: impl Into<String>) -> Self {
        Self {
            weak: true,
            tag: tag.into(),
        }
    }

    pub fn is_weak(&self) -> bool {
        self.weak
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether two tags name the same representation, ignoring weakness.
    pub fn matches(&self, other: &EntityTag) -> bool {
        self.tag == other.tag
    }

    pub fn parse(value: &str) -> Result<Self, HeaderError> {
        Self::decode("ETag", value)
    }

    pub(crate) fn decode(name: &'static str, value: &str) -> Result<Self, HeaderError> {
        let (weak, rest) = match value.strip_prefix("W/") {
            Some(rest) => (true, rest),
            None => (false, value),
        };
        let rest = rest.trim();
        let tag = match rest.strip_prefix('"') {
            Some(inner) => match inner.strip_suffix('"') {
                Some(tag) => tag,
                None => return Err(HeaderError::malformed(name, value, "unterminated quote")),
            },
            None => rest,
        };
        if tag.contains('"') {
            return Err(HeaderError::malformed(name, value, "embedded quote"));
        }
        Ok(Self {
            weak,
            tag: tag.to_string(),
        })
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weak {
            write!(f, "W/{}", self.tag)
        } else {
            f.write_str(&self.tag)
        }
    }
}
