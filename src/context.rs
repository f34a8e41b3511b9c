//! The context codecs deserialize under.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::media::Charset;
use crate::resource::ResourceReference;
use crate::transport::HttpClient;

/// What a codec gets alongside the body: enough to turn URI references in
/// the payload into live [`ResourceReference`]s.
#[derive(Clone)]
pub struct MediaContext {
    client: Arc<dyn HttpClient>,
    base: Url,
    config: ClientConfig,
}

impl MediaContext {
    pub fn new(client: Arc<dyn HttpClient>, base: Url, config: ClientConfig) -> Self {
        Self {
            client,
            base,
            config,
        }
    }

    /// The URI of the response this context came from.
    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn default_charset(&self) -> Charset {
        self.config.default_charset
    }

    /// Resolves `reference` against the base URI into a reference bound to
    /// the same transport.
    pub fn resolve(&self, reference: &str) -> Result<ResourceReference, Error> {
        let uri = self.base.join(reference).map_err(|source| Error::Uri {
            reference: reference.to_string(),
            source,
        })?;
        Ok(ResourceReference::with_config(
            uri,
            Arc::clone(&self.client),
            self.config.clone(),
        ))
    }
}

impl fmt::Debug for MediaContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaContext")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

/// Post-construction hook for payload types that carry links.
///
/// Codecs call this once the value is built, handing over the context so
/// embedded references can be resolved into live ones.
pub trait Hypermedia {
    fn on_deserialized(&mut self, ctx: &MediaContext) -> Result<(), Error>;
}
