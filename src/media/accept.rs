//! Accept and content capabilities, and ordered resolution between them.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::MediaContext;
use crate::error::Error;
use crate::header::standard;
use crate::message::{HttpMessage, MessageError, RequestChange};
use crate::transport::{Content, ResponseHead};

use super::{apply_accept, content_type_matches, MediaType, MediaTypeError, Quality};

/// Accept-direction capability: announce a representation, recognize it on a
/// response, and deserialize it.
#[async_trait]
pub trait AcceptMedia<T>: Send + Sync {
    /// The representation this capability stands for.
    fn offered(&self) -> &MediaType;

    /// The weight attached to the offer.
    fn quality(&self) -> Quality {
        Quality::MAX
    }

    /// Declares the offer on the outgoing request. List-append semantics, so
    /// prior Accept values are merged with rather than overwritten.
    fn apply_as_option(&self, message: &mut dyn HttpMessage) -> Result<(), MessageError> {
        apply_accept(message, self.offered(), self.quality());
        Ok(())
    }

    /// Whether this capability recognizes what the response declares.
    fn is_handling(&self, head: &ResponseHead) -> bool {
        content_type_matches(head, self.offered())
    }

    /// Decodes the body into a value. Implementations consume `content`
    /// through its pull interface and may resolve payload links through
    /// `ctx`.
    async fn deserialize(
        &self,
        content: &mut Content,
        head: &ResponseHead,
        ctx: &MediaContext,
    ) -> Result<T, Error>;
}

/// Content-direction capability: declare and serialize an outgoing
/// representation.
pub trait ContentMedia<T>: Send + Sync {
    /// The representation written.
    fn provided(&self) -> &MediaType;

    /// Declares the Content-Type, set-once.
    fn apply_as_content(&self, message: &mut dyn HttpMessage) -> Result<(), MessageError> {
        standard::content_type().set(message, self.provided())
    }

    /// Writes `value` onto the message: the Content-Type declaration plus a
    /// body producer.
    fn serialize(&self, value: &T, message: &mut dyn HttpMessage) -> Result<(), Error>;
}

/// Both directions for the same logical type.
pub trait MediaCodec<T>: AcceptMedia<T> + ContentMedia<T> {}

impl<T, M> MediaCodec<T> for M where M: AcceptMedia<T> + ContentMedia<T> {}

/// An ordered set of accept candidates for one target type.
///
/// Order is the whole contract: candidates announce themselves in insertion
/// order, and the first to recognize a response wins resolution.
pub struct AcceptSet<T> {
    candidates: Vec<Arc<dyn AcceptMedia<T>>>,
}

impl<T: 'static> AcceptSet<T> {
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
        }
    }

    /// A set with one candidate.
    pub fn of(candidate: impl AcceptMedia<T> + 'static) -> Self {
        Self::new().or(candidate)
    }

    /// Appends a lower-priority candidate.
    pub fn or(mut self, candidate: impl AcceptMedia<T> + 'static) -> Self {
        self.candidates.push(Arc::new(candidate));
        self
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Every candidate's accept offer, in order, as one composable change.
    pub fn as_change(&self) -> RequestChange {
        let mut change = RequestChange::none();
        for candidate in &self.candidates {
            let candidate = Arc::clone(candidate);
            change = change.and(RequestChange::from_fn(move |message: &mut dyn HttpMessage| {
                candidate.apply_as_option(message)
            }));
        }
        change
    }

    /// The first candidate that recognizes the response.
    pub fn resolve(&self, head: &ResponseHead) -> Result<&dyn AcceptMedia<T>, MediaTypeError> {
        self.candidates
            .iter()
            .find(|candidate| candidate.is_handling(head))
            .map(|candidate| candidate.as_ref())
            .ok_or_else(|| MediaTypeError::NoMatchingRepresentation {
                content_type: declared_content_type(head),
            })
    }
}

impl<T: 'static> Default for AcceptSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for AcceptSet<T> {
    fn clone(&self) -> Self {
        Self {
            candidates: self.candidates.clone(),
        }
    }
}

fn declared_content_type(head: &ResponseHead) -> String {
    head.headers
        .first("Content-Type")
        .unwrap_or("<none>")
        .to_string()
}

/// Alternatives that all map to the same logical type, for example two
/// versions of one representation.
///
/// The accept direction resolves among the alternatives exactly like
/// [`AcceptSet`]; the content direction always uses the first listed
/// alternative, because only the accept direction is negotiated.
pub struct Variants<T> {
    alternatives: Vec<Arc<dyn MediaCodec<T>>>,
}

impl<T: 'static> Variants<T> {
    /// A variant group seeded with its preferred alternative.
    pub fn of(preferred: impl MediaCodec<T> + 'static) -> Self {
        Self {
            alternatives: vec![Arc::new(preferred)],
        }
    }

    /// Appends a lower-priority alternative.
    pub fn or(mut self, alternative: impl MediaCodec<T> + 'static) -> Self {
        self.alternatives.push(Arc::new(alternative));
        self
    }

    fn preferred(&self) -> &dyn MediaCodec<T> {
        self.alternatives[0].as_ref()
    }
}

impl<T> Clone for Variants<T> {
    fn clone(&self) -> Self {
        Self {
            alternatives: self.alternatives.clone(),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> AcceptMedia<T> for Variants<T> {
    fn offered(&self) -> &MediaType {
        self.preferred().offered()
    }

    fn apply_as_option(&self, message: &mut dyn HttpMessage) -> Result<(), MessageError> {
        for alternative in &self.alternatives {
            alternative.apply_as_option(message)?;
        }
        Ok(())
    }

    fn is_handling(&self, head: &ResponseHead) -> bool {
        self.alternatives.iter().any(|a| a.is_handling(head))
    }

    async fn deserialize(
        &self,
        content: &mut Content,
        head: &ResponseHead,
        ctx: &MediaContext,
    ) -> Result<T, Error> {
        let handler = self
            .alternatives
            .iter()
            .find(|a| a.is_handling(head))
            .ok_or_else(|| {
                Error::Media(MediaTypeError::NoMatchingRepresentation {
                    content_type: declared_content_type(head),
                })
            })?;
        handler.deserialize(content, head, ctx).await
    }
}

impl<T: Send + 'static> ContentMedia<T> for Variants<T> {
    fn provided(&self) -> &MediaType {
        self.preferred().provided()
    }

    fn serialize(&self, value: &T, message: &mut dyn HttpMessage) -> Result<(), Error> {
        self.preferred().serialize(value, message)
    }
}
