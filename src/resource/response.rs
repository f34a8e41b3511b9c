//! What comes back: the envelope, the negotiated content, and the buffered
//! error forms.

use bytes::Bytes;

use crate::channel::BytesStream;
use crate::context::MediaContext;
use crate::error::Error;
use crate::header::{standard, EntityTag, HttpDate};
use crate::media::AcceptMedia;
use crate::message::RequestChange;
use crate::transport::{Content, Method, ResponseHead, StatusCode};

use super::reference::ResourceReference;

/// The response envelope: status, headers and the reference that produced it.
///
/// Everything derivable from the envelope lives here, in particular the
/// conditional-request changes built from validators the origin handed back.
#[derive(Debug, Clone)]
pub struct ResponseParts {
    head: ResponseHead,
    reference: ResourceReference,
}

impl ResponseParts {
    pub(crate) fn new(head: ResponseHead, reference: ResourceReference) -> Self {
        Self { head, reference }
    }

    pub fn status(&self) -> StatusCode {
        self.head.status
    }

    pub fn headers(&self) -> &crate::message::HeaderMap {
        &self.head.headers
    }

    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    /// The reference the request was sent to, relative-reference base for
    /// anything derived from this response.
    pub fn reference(&self) -> &ResourceReference {
        &self.reference
    }

    /// The entity tag the origin attached, if any.
    pub fn etag(&self) -> Result<Option<EntityTag>, Error> {
        Ok(self.head.get(&standard::etag())?)
    }

    /// `If-Match` conditioned on this response's entity tag.
    ///
    /// `None` when the origin sent no `ETag`; there is nothing to condition on.
    pub fn if_match(&self) -> Result<Option<RequestChange>, Error> {
        let Some(tag) = self.head.get(&standard::etag())? else {
            return Ok(None);
        };
        Ok(Some(standard::if_match().change(&tag)))
    }

    /// `If-None-Match` conditioned on this response's entity tag.
    pub fn if_none_match(&self) -> Result<Option<RequestChange>, Error> {
        let Some(tag) = self.head.get(&standard::etag())? else {
            return Ok(None);
        };
        Ok(Some(standard::if_none_match().change(&tag)))
    }

    /// `If-Modified-Since` from `Last-Modified`, falling back to `Date`.
    pub fn if_modified_since(&self) -> Result<Option<RequestChange>, Error> {
        let Some(date) = self.validator_date()? else {
            return Ok(None);
        };
        Ok(Some(standard::if_modified_since().change(&date)))
    }

    /// `If-Unmodified-Since` from `Last-Modified`, falling back to `Date`.
    pub fn if_unmodified_since(&self) -> Result<Option<RequestChange>, Error> {
        let Some(date) = self.validator_date()? else {
            return Ok(None);
        };
        Ok(Some(standard::if_unmodified_since().change(&date)))
    }

    /// Resolves `Location` against the request uri.
    pub fn location(&self) -> Result<Option<ResourceReference>, Error> {
        let Some(target) = self.head.get(&standard::location())? else {
            return Ok(None);
        };
        Ok(Some(self.reference.follow(&target)?))
    }

    /// The methods the origin advertised in `Allow`, if it sent the header.
    pub fn allow(&self) -> Result<Option<Vec<Method>>, Error> {
        Ok(self.head.get_all(&standard::allow())?)
    }

    fn validator_date(&self) -> Result<Option<HttpDate>, Error> {
        if let Some(date) = self.head.get(&standard::last_modified())? {
            return Ok(Some(date));
        }
        Ok(self.head.get(&standard::date())?)
    }
}

/// A successful exchange: the envelope plus the decoded content.
#[derive(Debug)]
pub struct ContentResponse<T> {
    parts: ResponseParts,
    content: T,
}

impl<T> ContentResponse<T> {
    pub(crate) fn new(parts: ResponseParts, content: T) -> Self {
        Self { parts, content }
    }

    pub fn parts(&self) -> &ResponseParts {
        &self.parts
    }

    pub fn status(&self) -> StatusCode {
        self.parts.status()
    }

    pub fn content(&self) -> &T {
        &self.content
    }

    pub fn into_content(self) -> T {
        self.content
    }

    pub fn into_parts(self) -> (ResponseParts, T) {
        (self.parts, self.content)
    }
}

/// A fully buffered failed exchange.
///
/// Error-class statuses, unmatched content types and decode failures all end
/// up here with the complete body in memory, so the caller can inspect what
/// the origin actually said.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    parts: ResponseParts,
    body: Bytes,
}

impl ErrorResponse {
    pub(crate) fn new(parts: ResponseParts, body: Bytes) -> Self {
        Self { parts, body }
    }

    pub fn parts(&self) -> &ResponseParts {
        &self.parts
    }

    pub fn status(&self) -> StatusCode {
        self.parts.status()
    }

    pub fn headers(&self) -> &crate::message::HeaderMap {
        &self.parts.head().headers
    }

    /// The buffered body, exactly as received.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decodes the buffered body with `media`, regardless of what the
    /// response declared.
    ///
    /// There is no handling check. The body already failed negotiation;
    /// this is the caller's second look at it, typically as a problem
    /// document or similar error payload.
    pub async fn deserialize_as<T>(&self, media: &dyn AcceptMedia<T>) -> Result<T, Error>
    where
        T: Send + 'static,
    {
        let reference = self.parts.reference();
        let ctx = MediaContext::new(
            std::sync::Arc::clone(reference.client()),
            reference.uri().clone(),
            reference.config().clone(),
        );
        let mut content = Content::new(Box::new(BytesStream::new(self.body.clone())));
        media.deserialize(&mut content, self.parts.head(), &ctx).await
    }
}
