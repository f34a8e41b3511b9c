//! Pull-driven byte transfer between a driver and a follower.
//!
//! Every request and response body moves through this module. There are two
//! roles:
//!
//! - A **driver** owns the transfer loop. It decides when bytes (read side)
//!   or capacity (write side) are on offer, and it is the only party that
//!   can be paused, resumed, or closed.
//! - A **follower** reacts: `on_ready` fires whenever the driver has
//!   something for it, and `on_completed` fires exactly once when the
//!   transfer ends, successfully or not.
//!
//! ```text
//!   pause / resume / close           on_ready(chunk | window)
//!  ───────────────────────► Driver ──────────────────────────► Follower
//!                             │                                    │
//!                             └─────── on_completed(result) ◄──────┘
//! ```
//!
//! Backpressure is the only flow-control primitive. Once a pause has been
//! observed, no further `on_ready` is delivered until `resume`; bytes already
//! offered to a running `on_ready` call are still processed in full. `close`
//! ends the transfer irrecoverably and is safe to call repeatedly, from any
//! task or thread.
//!
//! Three driver families cover the byte sources this crate deals with:
//!
//! - [`driver`]: async drivers for transport bodies, gated by a watch channel
//! - [`passive`]: blocking `Read`/`Write` resources, looped on an externally
//!   supplied runtime handle with a mutex and condvar guarding the pause flag
//! - [`immediate`]: in-memory payloads that satisfy the follower in a single
//!   ready call and therefore reject `pause`/`resume` outright

pub mod driver;
pub mod follower;
pub mod immediate;
pub mod passive;

pub use driver::{ByteSink, DriverHandle, ReadDriver, WriteDriver};
pub use follower::{BytesBody, Collect};
pub use immediate::BytesStream;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use thiserror::Error;

/// How a transfer can go wrong.
///
/// `Unsupported` marks a misuse of the backpressure contract, for example
/// pausing an in-memory driver. It is distinct from `Io`, which reports a
/// failure of the underlying resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The underlying resource failed.
    #[error("i/o failure ({kind:?}): {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
    /// The transfer was closed before it finished.
    #[error("transfer closed before completion")]
    Closed,
    /// The operation is outside this driver's contract.
    #[error("{0} is not supported by this driver")]
    Unsupported(&'static str),
    /// The transport failed while producing body bytes, e.g. a timeout.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<std::io::Error> for ChannelError {
    fn from(e: std::io::Error) -> Self {
        ChannelError::Io {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// Bytes a read driver currently has on offer.
///
/// The follower drains the chunk inside `on_ready`; anything left untaken is
/// offered again on the next ready call.
pub struct SourceChunk<'a> {
    inner: &'a mut Bytes,
}

impl<'a> SourceChunk<'a> {
    pub(crate) fn new(inner: &'a mut Bytes) -> Self {
        Self { inner }
    }

    /// Bytes still available in this chunk.
    pub fn remaining(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// A look at the available bytes without consuming them.
    pub fn peek(&self) -> &[u8] {
        self.inner
    }

    /// Takes every available byte.
    pub fn take_all(&mut self) -> Bytes {
        let len = self.inner.len();
        self.inner.split_to(len)
    }

    /// Takes up to `n` bytes.
    pub fn take(&mut self, n: usize) -> Bytes {
        let n = n.min(self.inner.len());
        self.inner.split_to(n)
    }
}

/// Capacity a write driver currently has on offer.
pub struct SinkWindow<'a> {
    buf: &'a mut BytesMut,
    capacity: usize,
    finished: &'a mut bool,
}

impl<'a> SinkWindow<'a> {
    pub(crate) fn new(buf: &'a mut BytesMut, capacity: usize, finished: &'a mut bool) -> Self {
        Self {
            buf,
            capacity,
            finished,
        }
    }

    /// Capacity left in this window.
    pub fn remaining_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.buf.len())
    }

    /// Writes as much of `data` as the window accepts and returns how many
    /// bytes were taken.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.remaining_capacity());
        self.buf.extend_from_slice(&data[..n]);
        n
    }

    /// Marks the body complete. The driver stops offering capacity once the
    /// current ready call returns.
    pub fn finish(&mut self) {
        *self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        *self.finished
    }
}

/// Consumer side of a read transfer.
///
/// `on_completed` consumes the follower, which makes "completed exactly
/// once" a property of the type rather than a convention.
pub trait ReadFollower {
    type Output;

    /// Called whenever the driver has bytes on offer. Drain what is
    /// available; blocking or performing I/O here is outside the contract.
    fn on_ready(&mut self, chunk: &mut SourceChunk<'_>) -> Result<(), ChannelError>;

    /// Called exactly once when the transfer ends. Errors arrive through
    /// `result`, never through a silently truncated byte sequence.
    fn on_completed(self, result: Result<(), ChannelError>) -> Result<Self::Output, ChannelError>;
}

/// Producer side of a write transfer.
///
/// Object safe so request bodies can travel boxed behind a factory. Drivers
/// call `on_completed` exactly once.
pub trait WriteFollower: Send {
    /// Called whenever the driver has capacity on offer. Write into the
    /// window and call [`SinkWindow::finish`] once the body is complete.
    fn on_ready(&mut self, sink: &mut SinkWindow<'_>) -> Result<(), ChannelError>;

    /// Called exactly once when the transfer ends.
    fn on_completed(&mut self, result: Result<(), ChannelError>);
}

/// Control surface shared by every driver variant.
pub trait Driver {
    /// Stops `on_ready` delivery until [`resume`](Driver::resume).
    /// Idempotent.
    fn pause(&self) -> Result<(), ChannelError>;

    /// Lifts a pause. Idempotent.
    fn resume(&self) -> Result<(), ChannelError>;

    /// Ends the transfer irrecoverably. Safe to call repeatedly and from a
    /// different task or thread than the one running `on_ready`.
    fn close(&self);
}

/// An async pull source of body bytes, typically the transport's read side.
#[async_trait]
pub trait ByteStream: Send {
    /// Pulls the next chunk. `Ok(None)` means the source is exhausted.
    async fn pull(&mut self) -> Result<Option<Bytes>, ChannelError>;
}

#[async_trait]
impl<'s, S> ByteStream for &'s mut S
where
    S: ByteStream + ?Sized,
{
    async fn pull(&mut self) -> Result<Option<Bytes>, ChannelError> {
        (**self).pull().await
    }
}

#[async_trait]
impl<S> ByteStream for Box<S>
where
    S: ByteStream + ?Sized,
{
    async fn pull(&mut self) -> Result<Option<Bytes>, ChannelError> {
        (**self).pull().await
    }
}

/// Boxed stream, the form response bodies travel in.
pub type BodyStream = Box<dyn ByteStream>;
