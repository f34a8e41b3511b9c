//! Typed header codecs.
//!
//! A [`Header`] pairs a header name with decode and encode functions for one
//! domain type, translating through the raw string lines of a message.
//! Single-valued headers refuse a second set; list-valued headers merge by
//! appending. Round-trips preserve the parsed value, not the raw bytes:
//! whitespace, quoting and quality formatting come out normalized.

pub mod date;
pub mod entity_tag;
pub mod standard;

pub use date::HttpDate;
pub use entity_tag::EntityTag;

use thiserror::Error;

use crate::message::{HeaderMap, HttpMessage, MessageError, RequestChange};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("{name}: malformed value `{value}`: {reason}")]
    Malformed {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("{name}: expected one value, found {count}")]
    NotSingle { name: &'static str, count: usize },
}

impl HeaderError {
    pub(crate) fn malformed(name: &'static str, value: &str, reason: impl Into<String>) -> Self {
        HeaderError::Malformed {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// A single-valued typed header codec.
///
/// The decode function receives the header name so shared decoders report
/// the right header in their errors.
pub struct Header<T> {
    name: &'static str,
    decode: fn(&'static str, &str) -> Result<T, HeaderError>,
    encode: fn(&T) -> String,
}

impl<T> Header<T> {
    pub const fn new(
        name: &'static str,
        decode: fn(&'static str, &str) -> Result<T, HeaderError>,
        encode: fn(&T) -> String,
    ) -> Self {
        Self {
            name,
            decode,
            encode,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_present(&self, headers: &HeaderMap) -> bool {
        headers.contains(self.name)
    }

    /// Decodes the header if present. More than one raw line is an error for
    /// a single-valued header.
    pub fn get(&self, headers: &HeaderMap) -> Result<Option<T>, HeaderError> {
        let values = headers.get_all(self.name);
        match values.len() {
            0 => Ok(None),
            1 => (self.decode)(self.name, values[0].trim()).map(Some),
            count => Err(HeaderError::NotSingle {
                name: self.name,
                count,
            }),
        }
    }

    /// Encodes `value` onto `message` with set-once semantics.
    pub fn set(&self, message: &mut dyn HttpMessage, value: &T) -> Result<(), MessageError> {
        message.set_header(self.name, (self.encode)(value))
    }

    /// The same mutation as [`set`](Self::set), packaged as a composable
    /// change.
    pub fn change(&self, value: &T) -> RequestChange {
        RequestChange::set_header(self.name, (self.encode)(value))
    }
}

/// A list-valued typed header codec; `T` is the item type.
pub struct ListHeader<T> {
    name: &'static str,
    decode: fn(&'static str, &str) -> Result<T, HeaderError>,
    encode: fn(&T) -> String,
}

impl<T> ListHeader<T> {
    pub const fn new(
        name: &'static str,
        decode: fn(&'static str, &str) -> Result<T, HeaderError>,
        encode: fn(&T) -> String,
    ) -> Self {
        Self {
            name,
            decode,
            encode,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_present(&self, headers: &HeaderMap) -> bool {
        headers.contains(self.name)
    }

    /// Decodes every item across every raw line, splitting on commas outside
    /// quoted strings.
    pub fn get(&self, headers: &HeaderMap) -> Result<Option<Vec<T>>, HeaderError> {
        let lines = headers.get_all(self.name);
        if lines.is_empty() {
            return Ok(None);
        }
        let mut items = Vec::new();
        for line in lines {
            for raw in split_list(line) {
                items.push((self.decode)(self.name, raw.trim())?);
            }
        }
        Ok(Some(items))
    }

    /// Appends one item as its own raw line.
    pub fn add(&self, message: &mut dyn HttpMessage, item: &T) {
        message.add_header_value(self.name, (self.encode)(item));
    }

    /// The same mutation as [`add`](Self::add), packaged as a composable
    /// change.
    pub fn change_add(&self, item: &T) -> RequestChange {
        RequestChange::add_header_value(self.name, (self.encode)(item))
    }

    /// Sets the whole list as one comma-joined line, set-once.
    pub fn set_all(&self, message: &mut dyn HttpMessage, items: &[T]) -> Result<(), MessageError> {
        let line = items
            .iter()
            .map(|item| (self.encode)(item))
            .collect::<Vec<_>>()
            .join(", ");
        message.set_header(self.name, line)
    }
}

/// Splits a comma-separated header line, leaving quoted strings intact.
pub fn split_list(line: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ',' if !quoted => {
                items.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&line[start..]);
    items.retain(|item| !item.trim().is_empty());
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_respects_quotes() {
        assert_eq!(split_list("a, b, c"), vec!["a", " b", " c"]);
        assert_eq!(split_list("x=\"1,2\", y"), vec!["x=\"1,2\"", " y"]);
        assert_eq!(split_list(""), Vec::<&str>::new());
        assert_eq!(split_list("one"), vec!["one"]);
    }
}
