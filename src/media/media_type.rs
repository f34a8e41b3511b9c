//! Media type values and structural matching.

use std::fmt;

use super::MediaTypeError;

/// A media type: primary name plus ordered parameters.
///
/// Names and parameter names are normalized to lowercase at construction;
/// parameter values keep their case, with any surrounding quotes stripped.
/// Equality is structural over the name and the ordered parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    name: String,
    params: Vec<(String, String)>,
}

impl MediaType {
    /// A media type with no parameters. The name is taken as given, apart
    /// from lowercasing.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_ascii_lowercase(),
            params: Vec::new(),
        }
    }

    /// Appends one parameter.
    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params
            .push((name.trim().to_ascii_lowercase(), value.to_string()));
        self
    }

    /// Parses `type/subtype` with optional `;key=value` parameters. Quoted
    /// parameter values are unwrapped.
    pub fn parse(value: &str) -> Result<Self, MediaTypeError> {
        let mut segments = value.split(';');
        let name = segments.next().map(str::trim).unwrap_or_default();
        if name.is_empty() || !name.contains('/') || name.starts_with('/') || name.ends_with('/') {
            return Err(MediaTypeError::Malformed(value.to_string()));
        }
        let mut parsed = MediaType::new(name);
        for segment in segments {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (key, raw) = segment
                .split_once('=')
                .ok_or_else(|| MediaTypeError::Malformed(value.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(MediaTypeError::Malformed(value.to_string()));
            }
            parsed = parsed.with_param(key, unquote(raw.trim()));
        }
        Ok(parsed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// First value of a parameter, by lowercase name.
    pub fn param(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.params
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether this type accepts what the response declared. Only the names
    /// are compared; parameters play no part in matching.
    pub fn matches(&self, declared: &MediaType) -> bool {
        self.name == declared.name
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (name, value) in &self.params {
            write!(f, ";{name}={value}")?;
        }
        Ok(())
    }
}
