//! One prepared call and its way through the transport.
//!
//! ```text
//!  Request::send
//!     │
//!     ├── validate change set on scratch parts   (misuse fails pre-wire)
//!     ├── HttpClient::dispatch                   (transport failure → Transport)
//!     │
//!     ├── error-class status? ──► buffer body ──► Err(Protocol)
//!     ├── no accept matches?  ──► buffer body ──► Err(NoMatch)
//!     ├── decode fails?       ──► buffer rest ──► Err(Decode)
//!     │
//!     └── Ok(ContentResponse<T>)
//! ```

use std::sync::Arc;

use crate::context::MediaContext;
use crate::error::Error;
use crate::header::standard;
use crate::media::AcceptSet;
use crate::message::{MessageParts, RequestChange};
use crate::suspend::SuspendedCall;
use crate::transport::{Content, Method, TransportReply};

use super::reference::ResourceReference;
use super::response::{ContentResponse, ErrorResponse, ResponseParts};

/// A prepared call: verb, target and the accumulated change set.
///
/// Nothing touches the transport until [`send`](Self::send),
/// [`send_parts`](Self::send_parts) or [`suspend`](Self::suspend) consumes
/// the request.
#[derive(Debug)]
pub struct Request {
    method: Method,
    reference: ResourceReference,
    change: RequestChange,
}

impl Request {
    pub(crate) fn new(method: Method, reference: ResourceReference, change: RequestChange) -> Self {
        Self {
            method,
            reference,
            change,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn reference(&self) -> &ResourceReference {
        &self.reference
    }

    /// Composes `change` after everything accumulated so far.
    pub fn with(mut self, change: RequestChange) -> Self {
        self.change = self.change.and(change);
        self
    }

    /// Sends and negotiates the response body into a `T`.
    ///
    /// Success needs a non-error status, a candidate in `accepts` that
    /// recognizes the response, and a clean decode. Every other outcome
    /// buffers the full body into the error it returns.
    pub async fn send<T>(self, accepts: &AcceptSet<T>) -> Result<ContentResponse<T>, Error>
    where
        T: Send + 'static,
    {
        let change = self.change.clone().and(accepts.as_change());
        let (parts, mut content) = self.exchange(change).await?;

        if parts.status().is_error() {
            let response = buffer_error(parts, content).await?;
            return Err(Error::Protocol { response });
        }

        let codec = match accepts.resolve(parts.head()) {
            Ok(codec) => codec,
            Err(_) => {
                let response = buffer_error(parts, content).await?;
                return Err(Error::NoMatch { response });
            }
        };

        let ctx = MediaContext::new(
            Arc::clone(parts.reference().client()),
            parts.reference().uri().clone(),
            parts.reference().config().clone(),
        );

        match codec.deserialize(&mut content, parts.head(), &ctx).await {
            Ok(value) => Ok(ContentResponse::new(parts, value)),
            Err(source) => {
                // The content tee has recorded whatever the codec consumed;
                // pulling the rest completes the buffered body.
                let response = buffer_error(parts, content).await?;
                Err(Error::Decode {
                    source: Box::new(source),
                    response,
                })
            }
        }
    }

    /// Sends without negotiating content. HEAD and OPTIONS take this path,
    /// as does any exchange where only the envelope matters; the body is
    /// drained and discarded on success.
    pub async fn send_parts(self) -> Result<ResponseParts, Error> {
        let change = self.change.clone();
        let (parts, mut content) = self.exchange(change).await?;

        if parts.status().is_error() {
            let response = buffer_error(parts, content).await?;
            return Err(Error::Protocol { response });
        }

        content.drain().await?;
        Ok(parts)
    }

    /// Captures the call into a byte sequence instead of sending it.
    ///
    /// The accumulated change set is replayed against a recording sink, the
    /// same application path a live send uses, so the captured bytes cannot
    /// drift from what would have gone over the wire.
    pub fn suspend(self) -> Result<SuspendedCall, Error> {
        SuspendedCall::capture(self.method, &self.reference, &self.change)
    }

    /// Applies defaults, validates the change set, dispatches, and splits
    /// the reply.
    async fn exchange(self, change: RequestChange) -> Result<(ResponseParts, Content), Error> {
        let change = self.finish_change(change);

        // Conflicting mutations fail here, before anything reaches the wire.
        let mut scratch = MessageParts::new();
        change.apply(&mut scratch)?;

        tracing::debug!(method = %self.method, uri = %self.reference.uri(), "sending request");

        let reply = self
            .reference
            .client()
            .dispatch(self.method, self.reference.uri(), &change)
            .await?;
        let TransportReply { head, body } = reply;

        tracing::debug!(
            method = %self.method,
            uri = %self.reference.uri(),
            status = head.status.as_u16(),
            "response received"
        );

        let hint = head
            .get(&standard::content_length())
            .ok()
            .flatten()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        let content = Content::with_capacity(body, hint);
        let parts = ResponseParts::new(head, self.reference.clone());
        Ok((parts, content))
    }

    /// Appends the configured User-Agent unless the change set already
    /// provides one.
    fn finish_change(&self, change: RequestChange) -> RequestChange {
        match self.reference.config().user_agent.clone() {
            Some(agent) => {
                let name = standard::user_agent().name();
                change.and(RequestChange::from_fn(
                    move |message: &mut dyn crate::message::HttpMessage| {
                        if !message.has_header(name) {
                            message.add_header_value(name, agent.clone());
                        }
                        Ok(())
                    },
                ))
            }
            None => change,
        }
    }
}

async fn buffer_error(parts: ResponseParts, mut content: Content) -> Result<ErrorResponse, Error> {
    content.drain().await?;
    Ok(ErrorResponse::new(parts, content.into_seen()))
}
