//! Client configuration, loadable from YAML.
//!
//! ```yaml
//! user_agent: "waypoint/0.1"
//! default_charset: "utf-8"
//! ```
//!
//! Every field is optional; an empty document is a valid configuration.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::media::Charset;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Settings carried by every reference built from the same client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Appended to requests that do not set their own User-Agent.
    pub user_agent: Option<String>,
    /// Charset assumed for text bodies that declare none.
    pub default_charset: Charset,
}

impl ClientConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }
}
