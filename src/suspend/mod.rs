//! Suspend a prepared call to bytes and resume it later, elsewhere.
//!
//! Capture replays the request's change set against an in-memory recorder,
//! the same application path a live send uses, and serializes what was
//! recorded. Resume parses the bytes back and rebuilds a [`Request`] that is
//! indistinguishable from a freshly prepared one; the transport it runs
//! against is supplied at resume time and may be a different one entirely.

pub mod wire;

pub use wire::DecodedCall;

use std::sync::Arc;

use bytes::Bytes;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::message::{BodySource, MessageParts, RequestChange};
use crate::resource::{Request, ResourceReference};
use crate::transport::{HttpClient, Method};

/// Why a byte sequence is not a valid suspended call, or could not become
/// one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SuspendError {
    #[error("suspended call is empty")]
    Empty,
    #[error("unknown action code {0}")]
    UnknownAction(u8),
    #[error("unknown segment marker {0}")]
    UnknownSegment(u8),
    #[error("suspended call ends mid-field")]
    Truncated,
    #[error("{0} byte(s) after the terminator")]
    TrailingBytes(usize),
    #[error("more than one body segment")]
    DuplicateBody,
    #[error("string of {0} bytes exceeds the 65535-byte field limit")]
    StringTooLong(usize),
    #[error("string field is not valid utf-8")]
    InvalidUtf8,
    #[error("negative length {0}")]
    NegativeLength(i32),
    #[error("captured uri `{uri}` did not parse: {reason}")]
    InvalidUri { uri: String, reason: String },
    #[error("header carries {0} values, too many for the layout")]
    TooManyValues(usize),
    #[error("body of {0} bytes is too large for the layout")]
    BodyTooLarge(usize),
}

/// A call captured as a self-contained byte sequence.
///
/// The bytes are deterministic for a given request and carry everything a
/// resume needs except the transport: verb, absolute target, headers and the
/// materialized body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspendedCall {
    bytes: Bytes,
}

impl SuspendedCall {
    /// Wraps bytes previously produced by a capture. Validation happens on
    /// [`resume`](Self::resume) or [`decode`](Self::decode), not here.
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn capture(
        method: Method,
        reference: &ResourceReference,
        change: &RequestChange,
    ) -> Result<Self, Error> {
        let mut recorder = MessageParts::new();
        change.apply(&mut recorder)?;

        let headers = recorder.headers().grouped();
        let body = match recorder.body() {
            Some(source) => Some(source.materialize()?),
            None => None,
        };

        let bytes = wire::encode(method, reference.uri().as_str(), &headers, body.as_ref())
            .map_err(Error::Suspend)?;
        tracing::debug!(
            method = %method,
            uri = %reference.uri(),
            bytes = bytes.len(),
            "call suspended"
        );
        Ok(Self { bytes })
    }

    /// Rebuilds the call against `client` with a default configuration.
    pub fn resume(self, client: Arc<dyn HttpClient>) -> Result<Request, Error> {
        self.resume_with_config(client, ClientConfig::default())
    }

    /// Rebuilds the call against `client`, carrying `config` into the
    /// rebuilt reference.
    pub fn resume_with_config(
        self,
        client: Arc<dyn HttpClient>,
        config: ClientConfig,
    ) -> Result<Request, Error> {
        let decoded = wire::decode(&self.bytes).map_err(Error::Suspend)?;
        let uri = url::Url::parse(&decoded.uri).map_err(|e| {
            Error::Suspend(SuspendError::InvalidUri {
                uri: decoded.uri.clone(),
                reason: e.to_string(),
            })
        })?;

        let mut change = RequestChange::none();
        for (name, values) in decoded.headers {
            change = change.and(RequestChange::set_values(name, values));
        }
        if let Some(body) = decoded.body {
            change = change.and(RequestChange::body(BodySource::from_bytes(body)));
        }

        tracing::debug!(method = %decoded.method, uri = %uri, "call resumed");
        let reference = ResourceReference::with_config(uri, client, config);
        Ok(Request::new(decoded.method, reference, change))
    }

    /// Parses the captured bytes without rebuilding a request.
    pub fn decode(&self) -> Result<DecodedCall, SuspendError> {
        wire::decode(&self.bytes)
    }
}
