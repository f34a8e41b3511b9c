//! Contracts between the request lifecycle and a concrete transport.
//!
//! The crate never opens sockets. A transport implements [`HttpClient`]: six
//! verb operations that take a target and a composed [`RequestChange`] and
//! come back with a [`TransportReply`], a status line plus headers and a
//! pull-based body stream. Everything downstream of that reply (negotiation,
//! error buffering, suspension) is transport-independent.

use std::fmt;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use thiserror::Error;
use url::Url;

use crate::channel::immediate::BytesStream;
use crate::channel::{
    BodyStream, ByteStream, ChannelError, Collect, DriverHandle, ReadDriver, ReadFollower,
};
use crate::header::{Header, HeaderError, ListHeader};
use crate::message::{HeaderMap, RequestChange};

/// Request verbs, with their action codes for the suspended-call layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Method {
    Head = 1,
    Options = 2,
    Get = 3,
    Post = 4,
    Put = 5,
    Delete = 6,
}

impl Method {
    /// Parses the uppercase wire name.
    ///
    /// # Example
    ///
    /// ```
    /// # use waypoint::transport::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::Get));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "HEAD" => Some(Method::Head),
            "OPTIONS" => Some(Method::Options),
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// The action code used in the suspended-call byte layout.
    pub fn action(&self) -> u8 {
        *self as u8
    }

    /// The verb for an action code.
    pub fn from_action(code: u8) -> Option<Self> {
        match code {
            1 => Some(Method::Head),
            2 => Some(Method::Options),
            3 => Some(Method::Get),
            4 => Some(Method::Post),
            5 => Some(Method::Put),
            6 => Some(Method::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP status code.
///
/// Open rather than enumerated: a client has to carry whatever code the
/// server sent, known or not.
///
/// # Example
///
/// ```
/// # use waypoint::transport::StatusCode;
/// assert_eq!(StatusCode::OK.as_u16(), 200);
/// assert!(StatusCode::from_u16(409).is_error());
/// assert_eq!(StatusCode::from_u16(404).reason_phrase(), "Not Found");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const CREATED: StatusCode = StatusCode(201);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const NOT_MODIFIED: StatusCode = StatusCode(304);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const CONFLICT: StatusCode = StatusCode(409);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    pub fn from_u16(code: u16) -> Self {
        StatusCode(code)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.0)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    pub fn is_redirection(&self) -> bool {
        (300..400).contains(&self.0)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }

    /// True for the classes an exchange is treated as failed on.
    pub fn is_error(&self) -> bool {
        self.0 >= 400
    }

    /// The conventional reason phrase, empty for unknown codes.
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            307 => "Temporary Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            406 => "Not Acceptable",
            409 => "Conflict",
            410 => "Gone",
            412 => "Precondition Failed",
            415 => "Unsupported Media Type",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = self.reason_phrase();
        if reason.is_empty() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "{} {}", self.0, reason)
        }
    }
}

/// Failure raised by the transport collaborator.
///
/// The cause is preserved all the way up; the core never retries on its own.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("i/o failure during exchange")]
    Io(#[from] std::io::Error),
    #[error("timed out waiting for the server")]
    Timeout,
    #[error("could not connect to {0}")]
    Connect(String),
    #[error("{0}")]
    Other(String),
}

/// Status line and headers of a reply.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl ResponseHead {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }

    /// Typed access through a header codec.
    pub fn get<T>(&self, header: &Header<T>) -> Result<Option<T>, HeaderError> {
        header.get(&self.headers)
    }

    /// Typed access through a list header codec.
    pub fn get_all<T>(&self, header: &ListHeader<T>) -> Result<Option<Vec<T>>, HeaderError> {
        header.get(&self.headers)
    }
}

/// What a transport hands back: the head plus a pull-based body.
pub struct TransportReply {
    pub head: ResponseHead,
    pub body: BodyStream,
}

impl TransportReply {
    pub fn new(head: ResponseHead, body: BodyStream) -> Self {
        Self { head, body }
    }

    /// A reply with an in-memory body, the form test transports use.
    pub fn buffered(head: ResponseHead, body: Bytes) -> Self {
        Self::new(head, Box::new(BytesStream::new(body)))
    }

    pub fn empty(head: ResponseHead) -> Self {
        Self::new(head, Box::new(BytesStream::empty()))
    }
}

/// The response body while it is being consumed.
///
/// Wraps the transport stream and records every chunk pulled, so a failure
/// partway through decoding can still surface the complete payload instead
/// of whatever happened to be left unread.
pub struct Content {
    stream: BodyStream,
    seen: BytesMut,
}

impl Content {
    pub fn new(stream: BodyStream) -> Self {
        Self {
            stream,
            seen: BytesMut::new(),
        }
    }

    /// Pre-sizes the record buffer, typically from Content-Length.
    pub fn with_capacity(stream: BodyStream, capacity: usize) -> Self {
        Self {
            stream,
            seen: BytesMut::with_capacity(capacity),
        }
    }

    /// Consumes the remaining body through a read follower.
    pub async fn consume<F: ReadFollower>(&mut self, follower: F) -> Result<F::Output, ChannelError> {
        let (driver, _handle) = ReadDriver::new(&mut *self);
        driver.run(follower).await
    }

    /// A driver plus its control handle, for consumers that need
    /// backpressure over the remaining body.
    pub fn reader<'a>(&'a mut self) -> (ReadDriver<&'a mut Content>, DriverHandle) {
        ReadDriver::new(self)
    }

    /// Collects the remaining body into one buffer.
    pub async fn bytes(&mut self) -> Result<Bytes, ChannelError> {
        let hint = self.seen.capacity().saturating_sub(self.seen.len());
        self.consume(Collect::with_capacity(hint)).await
    }

    /// Pulls the rest of the stream into the record.
    pub(crate) async fn drain(&mut self) -> Result<(), ChannelError> {
        while self.pull().await?.is_some() {}
        Ok(())
    }

    /// Everything pulled from the stream so far.
    pub(crate) fn into_seen(self) -> Bytes {
        self.seen.freeze()
    }
}

#[async_trait]
impl ByteStream for Content {
    async fn pull(&mut self) -> Result<Option<Bytes>, ChannelError> {
        let chunk = self.stream.pull().await?;
        if let Some(chunk) = &chunk {
            self.seen.extend_from_slice(chunk);
        }
        Ok(chunk)
    }
}

/// The transport collaborator.
///
/// Implementations bind these operations to a concrete HTTP stack. Each
/// takes the absolute target and the composed change that realizes the
/// request's headers and body.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn head(&self, uri: &Url, change: &RequestChange)
        -> Result<TransportReply, TransportError>;

    async fn options(
        &self,
        uri: &Url,
        change: &RequestChange,
    ) -> Result<TransportReply, TransportError>;

    async fn get(&self, uri: &Url, change: &RequestChange)
        -> Result<TransportReply, TransportError>;

    async fn post(&self, uri: &Url, change: &RequestChange)
        -> Result<TransportReply, TransportError>;

    async fn put(&self, uri: &Url, change: &RequestChange)
        -> Result<TransportReply, TransportError>;

    async fn delete(
        &self,
        uri: &Url,
        change: &RequestChange,
    ) -> Result<TransportReply, TransportError>;

    /// Dispatches on `method`. The request lifecycle and resumed calls both
    /// go through this single entry point.
    async fn dispatch(
        &self,
        method: Method,
        uri: &Url,
        change: &RequestChange,
    ) -> Result<TransportReply, TransportError> {
        match method {
            Method::Head => self.head(uri, change).await,
            Method::Options => self.options(uri, change).await,
            Method::Get => self.get(uri, change).await,
            Method::Post => self.post(uri, change).await,
            Method::Put => self.put(uri, change).await,
            Method::Delete => self.delete(uri, change).await,
        }
    }
}
