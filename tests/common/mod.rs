#![allow(dead_code)]

//! Shared test doubles: a scripted transport and a plain-text codec.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use waypoint::channel::{ByteStream, ChannelError};
use waypoint::context::MediaContext;
use waypoint::error::Error;
use waypoint::media::{self, AcceptMedia, Charset, ContentMedia, MediaType};
use waypoint::message::{BodySource, HttpMessage, MessageParts, RequestChange};
use waypoint::resource::ResourceReference;
use waypoint::transport::{
    Content, HttpClient, Method, ResponseHead, StatusCode, TransportError, TransportReply,
};

/// Installs the fmt subscriber so debug logs show up under `--nocapture`.
/// Later calls in the same binary are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_test_writer()
        .try_init();
}

/// Body stream that yields a scripted chunk sequence.
pub struct ChunkStream {
    chunks: VecDeque<Bytes>,
}

impl ChunkStream {
    pub fn new(chunks: Vec<Bytes>) -> Self {
        Self {
            chunks: chunks.into(),
        }
    }
}

#[async_trait]
impl ByteStream for ChunkStream {
    async fn pull(&mut self) -> Result<Option<Bytes>, ChannelError> {
        Ok(self.chunks.pop_front())
    }
}

/// One scripted reply: status, headers and body chunks.
pub struct Script {
    status: u16,
    headers: Vec<(&'static str, &'static str)>,
    chunks: Vec<Bytes>,
}

impl Script {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            chunks: Vec::new(),
        }
    }

    pub fn header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn body(self, body: &str) -> Self {
        self.chunk(body)
    }

    /// Appends one body chunk; several chunks exercise multi-pull paths.
    pub fn chunk(mut self, chunk: &str) -> Self {
        self.chunks.push(Bytes::copy_from_slice(chunk.as_bytes()));
        self
    }

    fn into_reply(self) -> TransportReply {
        let mut head = ResponseHead::new(StatusCode::from_u16(self.status));
        for (name, value) in self.headers {
            head.headers.append(name, value);
        }
        TransportReply::new(head, Box::new(ChunkStream::new(self.chunks)))
    }
}

/// What one dispatched request looked like after its change was applied.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub uri: Url,
    pub headers: Vec<(String, Vec<String>)>,
    pub body: Option<Bytes>,
}

/// Transport double: answers from a script and records everything it was
/// asked to send.
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Script>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn single(script: Script) -> Arc<Self> {
        Self::new(vec![script])
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(
        &self,
        method: Method,
        uri: &Url,
        change: &RequestChange,
    ) -> Result<TransportReply, TransportError> {
        let mut parts = MessageParts::new();
        change
            .apply(&mut parts)
            .map_err(|e| TransportError::Other(e.to_string()))?;
        let body = match parts.body() {
            Some(source) => Some(
                source
                    .materialize()
                    .map_err(|e| TransportError::Other(e.to_string()))?,
            ),
            None => None,
        };
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            uri: uri.clone(),
            headers: parts.headers().grouped(),
            body,
        });
        let script = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::Other("no scripted reply left".to_string()))?;
        Ok(script.into_reply())
    }
}

#[async_trait]
impl HttpClient for ScriptedTransport {
    async fn head(
        &self,
        uri: &Url,
        change: &RequestChange,
    ) -> Result<TransportReply, TransportError> {
        self.answer(Method::Head, uri, change)
    }

    async fn options(
        &self,
        uri: &Url,
        change: &RequestChange,
    ) -> Result<TransportReply, TransportError> {
        self.answer(Method::Options, uri, change)
    }

    async fn get(
        &self,
        uri: &Url,
        change: &RequestChange,
    ) -> Result<TransportReply, TransportError> {
        self.answer(Method::Get, uri, change)
    }

    async fn post(
        &self,
        uri: &Url,
        change: &RequestChange,
    ) -> Result<TransportReply, TransportError> {
        self.answer(Method::Post, uri, change)
    }

    async fn put(
        &self,
        uri: &Url,
        change: &RequestChange,
    ) -> Result<TransportReply, TransportError> {
        self.answer(Method::Put, uri, change)
    }

    async fn delete(
        &self,
        uri: &Url,
        change: &RequestChange,
    ) -> Result<TransportReply, TransportError> {
        self.answer(Method::Delete, uri, change)
    }
}

/// A reference over `transport` at `uri`.
pub fn reference(transport: &Arc<ScriptedTransport>, uri: &str) -> ResourceReference {
    let client: Arc<dyn HttpClient> = transport.clone();
    ResourceReference::new(Url::parse(uri).unwrap(), client)
}

/// Text codec over a configurable media type.
pub struct PlainText {
    media: MediaType,
}

impl PlainText {
    pub fn new() -> Self {
        Self {
            media: MediaType::new("text/plain"),
        }
    }

    pub fn with_media(media: MediaType) -> Self {
        Self { media }
    }
}

impl Default for PlainText {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AcceptMedia<String> for PlainText {
    fn offered(&self) -> &MediaType {
        &self.media
    }

    async fn deserialize(
        &self,
        content: &mut Content,
        head: &ResponseHead,
        ctx: &MediaContext,
    ) -> Result<String, Error> {
        media::read_text(content, head, ctx.default_charset()).await
    }
}

impl ContentMedia<String> for PlainText {
    fn provided(&self) -> &MediaType {
        &self.media
    }

    fn serialize(&self, value: &String, message: &mut dyn HttpMessage) -> Result<(), Error> {
        self.apply_as_content(message)?;
        let charset = self
            .media
            .param("charset")
            .and_then(Charset::from_label)
            .unwrap_or_default();
        let raw = charset.encode(value)?;
        message.set_body(BodySource::from_bytes(raw))?;
        Ok(())
    }
}
