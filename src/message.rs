//! Outbound message capability and composable request changes.
//!
//! Transports and the suspend recorder both realize a request by applying a
//! [`RequestChange`] to something that implements [`HttpMessage`]. A single
//! application path means a suspended call and a live request can never
//! drift apart: they are produced by the same code.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;

use crate::channel::{immediate, BytesBody, ChannelError, WriteFollower};

/// Misuse of the message-mutation contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// A single-valued header was set a second time.
    #[error("header `{0}` is already set")]
    HeaderAlreadySet(String),
    /// A body producer was installed twice.
    #[error("message body is already set")]
    BodyAlreadySet,
}

/// Ordered multimap of raw header lines.
///
/// Name lookups are case-insensitive. Names keep the spelling they were
/// first inserted with, and values keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one raw line.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// First value for `name`, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `name`, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Groups values under the spelling each name first appeared with,
    /// preserving first-appearance order of the names.
    pub fn grouped(&self) -> Vec<(String, Vec<String>)> {
        let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
        for (name, value) in &self.entries {
            match grouped
                .iter_mut()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
            {
                Some((_, values)) => values.push(value.clone()),
                None => grouped.push((name.clone(), vec![value.clone()])),
            }
        }
        grouped
    }
}

/// The outbound request surface a [`RequestChange`] mutates.
///
/// Implemented by transport request builders, by [`MessageParts`] for
/// validation and capture, and by test doubles.
pub trait HttpMessage {
    fn has_header(&self, name: &str) -> bool;

    /// Raw values currently recorded for `name`.
    fn header_values(&self, name: &str) -> Vec<String>;

    /// Sets a single-valued header. Fails if any value for `name` is already
    /// present; a silent overwrite would lose the first writer's intent.
    fn set_header(&mut self, name: &str, value: String) -> Result<(), MessageError>;

    /// Appends one value to a list-valued header.
    fn add_header_value(&mut self, name: &str, value: String);

    /// Installs the body producer. Fails if one is already installed.
    fn set_body(&mut self, body: BodySource) -> Result<(), MessageError>;
}

/// Replayable factory for request body producers.
///
/// Transports may need to retry or record a body, so they receive a factory
/// rather than a single follower; every [`follower`](Self::follower) call
/// yields a fresh producer for the same bytes.
#[derive(Clone)]
pub struct BodySource {
    factory: Arc<dyn Fn() -> Box<dyn WriteFollower> + Send + Sync>,
    length: Option<u64>,
}

impl BodySource {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn WriteFollower> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
            length: None,
        }
    }

    /// A source over a fixed in-memory payload.
    pub fn from_bytes(payload: Bytes) -> Self {
        let length = payload.len() as u64;
        Self::new(move || Box::new(BytesBody::new(payload.clone()))).known_length(length)
    }

    /// Declares the exact body length when it is known up front.
    pub fn known_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn length(&self) -> Option<u64> {
        self.length
    }

    /// A fresh producer for the body.
    pub fn follower(&self) -> Box<dyn WriteFollower> {
        (self.factory)()
    }

    /// Runs one producer to completion in memory and returns its bytes.
    pub fn materialize(&self) -> Result<Bytes, ChannelError> {
        let mut follower = self.follower();
        immediate::drain(follower.as_mut())
    }
}

impl fmt::Debug for BodySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodySource")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

type ChangeFn = dyn Fn(&mut dyn HttpMessage) -> Result<(), MessageError> + Send + Sync;

/// An ordered, composable sequence of request mutations.
///
/// Changes compose with [`and`](Self::and) and apply in composition order.
/// The same change can be applied to a live transport request or to a
/// recording sink; it has no opinion about which.
#[derive(Clone, Default)]
pub struct RequestChange {
    steps: Vec<Arc<ChangeFn>>,
}

impl RequestChange {
    /// The empty change.
    pub fn none() -> Self {
        Self::default()
    }

    /// A change from one closure.
    pub fn from_fn<F>(step: F) -> Self
    where
        F: Fn(&mut dyn HttpMessage) -> Result<(), MessageError> + Send + Sync + 'static,
    {
        Self {
            steps: vec![Arc::new(step)],
        }
    }

    /// Sets a single-valued header, failing on application if it is already
    /// present.
    pub fn set_header(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        Self::from_fn(move |message: &mut dyn HttpMessage| {
            message.set_header(&name, value.clone())
        })
    }

    /// Sets every value of one header at once, with the same set-once
    /// semantics as [`set_header`](Self::set_header).
    pub fn set_values(name: impl Into<String>, values: Vec<String>) -> Self {
        let name = name.into();
        Self::from_fn(move |message: &mut dyn HttpMessage| {
            if message.has_header(&name) {
                return Err(MessageError::HeaderAlreadySet(name.clone()));
            }
            for value in &values {
                message.add_header_value(&name, value.clone());
            }
            Ok(())
        })
    }

    /// Appends one value to a list-valued header.
    pub fn add_header_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        Self::from_fn(move |message: &mut dyn HttpMessage| {
            message.add_header_value(&name, value.clone());
            Ok(())
        })
    }

    /// Installs a body producer.
    pub fn body(source: BodySource) -> Self {
        Self::from_fn(move |message: &mut dyn HttpMessage| message.set_body(source.clone()))
    }

    /// Composes two changes; `self` applies first.
    pub fn and(mut self, other: RequestChange) -> Self {
        self.steps.extend(other.steps);
        self
    }

    /// Applies every step, in order, against `message`.
    pub fn apply(&self, message: &mut dyn HttpMessage) -> Result<(), MessageError> {
        for step in &self.steps {
            step(message)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

impl fmt::Debug for RequestChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestChange")
            .field("steps", &self.steps.len())
            .finish()
    }
}

/// Plain in-memory realization of [`HttpMessage`].
///
/// The request lifecycle applies changes here first, so conflicting
/// mutations fail before anything reaches the wire. The suspend capture
/// records into exactly this type as well, which is what keeps suspended
/// and live requests in step.
#[derive(Debug, Default)]
pub struct MessageParts {
    headers: HeaderMap,
    body: Option<BodySource>,
}

impl MessageParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&BodySource> {
        self.body.as_ref()
    }

    pub fn into_body(self) -> Option<BodySource> {
        self.body
    }

    /// Lifts the recorded state back into a change that reproduces it.
    pub fn into_change(self) -> RequestChange {
        let mut change = RequestChange::none();
        for (name, values) in self.headers.grouped() {
            change = change.and(RequestChange::set_values(name, values));
        }
        if let Some(body) = self.body {
            change = change.and(RequestChange::body(body));
        }
        change
    }
}

impl HttpMessage for MessageParts {
    fn has_header(&self, name: &str) -> bool {
        self.headers.contains(name)
    }

    fn header_values(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn set_header(&mut self, name: &str, value: String) -> Result<(), MessageError> {
        if self.headers.contains(name) {
            return Err(MessageError::HeaderAlreadySet(name.to_string()));
        }
        self.headers.append(name, value);
        Ok(())
    }

    fn add_header_value(&mut self, name: &str, value: String) {
        self.headers.append(name, value);
    }

    fn set_body(&mut self, body: BodySource) -> Result<(), MessageError> {
        if self.body.is_some() {
            return Err(MessageError::BodyAlreadySet);
        }
        self.body = Some(body);
        Ok(())
    }
}
