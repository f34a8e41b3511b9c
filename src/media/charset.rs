//! Character sets for text-like representations.

use bytes::Bytes;

use super::MediaTypeError;

/// The charsets text codecs understand.
///
/// `UsAscii` is the conventional default when a response declares none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Charset {
    #[default]
    UsAscii,
    Utf8,
    Iso8859_1,
}

impl Charset {
    pub fn label(&self) -> &'static str {
        match self {
            Charset::UsAscii => "us-ascii",
            Charset::Utf8 => "utf-8",
            Charset::Iso8859_1 => "iso-8859-1",
        }
    }

    /// Case-insensitive lookup by label, accepting the common aliases.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "us-ascii" | "ascii" => Some(Charset::UsAscii),
            "utf-8" | "utf8" => Some(Charset::Utf8),
            "iso-8859-1" | "latin-1" | "latin1" => Some(Charset::Iso8859_1),
            _ => None,
        }
    }

    /// Decodes `raw`, or reports which charset the body failed to satisfy.
    pub fn decode(&self, raw: &[u8]) -> Result<String, MediaTypeError> {
        match self {
            Charset::UsAscii => {
                if raw.is_ascii() {
                    // ASCII bytes are valid UTF-8, so no replacement happens.
                    Ok(String::from_utf8_lossy(raw).into_owned())
                } else {
                    Err(MediaTypeError::Undecodable(self.label()))
                }
            }
            Charset::Utf8 => String::from_utf8(raw.to_vec())
                .map_err(|_| MediaTypeError::Undecodable(self.label())),
            Charset::Iso8859_1 => Ok(raw.iter().map(|&b| b as char).collect()),
        }
    }

    /// Encodes `text`, or reports that it does not fit this charset.
    pub fn encode(&self, text: &str) -> Result<Bytes, MediaTypeError> {
        match self {
            Charset::UsAscii => {
                if text.is_ascii() {
                    Ok(Bytes::copy_from_slice(text.as_bytes()))
                } else {
                    Err(MediaTypeError::Unrepresentable(self.label()))
                }
            }
            Charset::Utf8 => Ok(Bytes::copy_from_slice(text.as_bytes())),
            Charset::Iso8859_1 => {
                let mut out = Vec::with_capacity(text.len());
                for c in text.chars() {
                    let code = c as u32;
                    if code > 0xFF {
                        return Err(MediaTypeError::Unrepresentable(self.label()));
                    }
                    out.push(code as u8);
                }
                Ok(Bytes::from(out))
            }
        }
    }
}

impl std::fmt::Display for Charset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl<'de> serde::Deserialize<'de> for Charset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Charset::from_label(&label)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown charset `{label}`")))
    }
}
