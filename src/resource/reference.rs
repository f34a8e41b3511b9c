//! URI plus transport: the navigable handle everything starts from.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::media::ContentMedia;
use crate::message::{MessageParts, RequestChange};
use crate::transport::{HttpClient, Method};

use super::request::Request;

/// A navigable resource: where it lives and how to reach it.
///
/// Stateless and side-effect-free. Every verb call produces a fresh
/// [`Request`], and following a link produces a new reference relative to
/// this one.
#[derive(Clone)]
pub struct ResourceReference {
    uri: Url,
    client: Arc<dyn HttpClient>,
    config: ClientConfig,
}

impl ResourceReference {
    pub fn new(uri: Url, client: Arc<dyn HttpClient>) -> Self {
        Self::with_config(uri, client, ClientConfig::default())
    }

    pub fn with_config(uri: Url, client: Arc<dyn HttpClient>, config: ClientConfig) -> Self {
        Self {
            uri,
            client,
            config,
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &Arc<dyn HttpClient> {
        &self.client
    }

    /// A new reference for `reference`, resolved against this one's URI.
    pub fn follow(&self, reference: &str) -> Result<ResourceReference, Error> {
        let uri = self.uri.join(reference).map_err(|source| Error::Uri {
            reference: reference.to_string(),
            source,
        })?;
        Ok(self.at(uri))
    }

    /// The same transport and configuration at a different absolute URI.
    pub(crate) fn at(&self, uri: Url) -> ResourceReference {
        ResourceReference {
            uri,
            client: Arc::clone(&self.client),
            config: self.config.clone(),
        }
    }

    pub fn head(&self) -> Request {
        Request::new(Method::Head, self.clone(), RequestChange::none())
    }

    pub fn options(&self) -> Request {
        Request::new(Method::Options, self.clone(), RequestChange::none())
    }

    pub fn get(&self) -> Request {
        Request::new(Method::Get, self.clone(), RequestChange::none())
    }

    pub fn delete(&self) -> Request {
        Request::new(Method::Delete, self.clone(), RequestChange::none())
    }

    /// A POST carrying `value` in the representation `media` writes.
    pub fn post<T>(&self, media: &dyn ContentMedia<T>, value: &T) -> Result<Request, Error> {
        self.with_content(Method::Post, media, value)
    }

    /// A PUT carrying `value` in the representation `media` writes.
    pub fn put<T>(&self, media: &dyn ContentMedia<T>, value: &T) -> Result<Request, Error> {
        self.with_content(Method::Put, media, value)
    }

    fn with_content<T>(
        &self,
        method: Method,
        media: &dyn ContentMedia<T>,
        value: &T,
    ) -> Result<Request, Error> {
        // Serialization happens now, so a representation failure surfaces
        // here and not at send time.
        let mut parts = MessageParts::new();
        media.serialize(value, &mut parts)?;
        Ok(Request::new(method, self.clone(), parts.into_change()))
    }
}

impl fmt::Debug for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceReference")
            .field("uri", &self.uri.as_str())
            .finish_non_exhaustive()
    }
}
