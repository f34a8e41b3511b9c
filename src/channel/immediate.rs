//! In-memory channel endpoints.
//!
//! An in-memory payload can always satisfy its follower in one ready call,
//! so there is nothing for backpressure to act on. `pause` and `resume` fail
//! loudly here: silently ignoring them would hide a logic error in whatever
//! decided this source needed flow control.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};

use super::{ByteStream, ChannelError, Driver, ReadFollower, SinkWindow, SourceChunk, WriteFollower};

/// Delivers one in-memory payload to a read follower, synchronously.
pub struct Immediate {
    payload: Bytes,
}

impl Immediate {
    pub fn new(payload: Bytes) -> Self {
        Self { payload }
    }

    /// The control handle. Only `close` is accepted, and by the time a close
    /// could arrive the transfer has typically already completed.
    pub fn handle(&self) -> ImmediateHandle {
        ImmediateHandle
    }

    /// Runs the whole transfer: one `on_ready` with the full payload, more
    /// only if the follower leaves bytes untaken, then completion.
    pub fn deliver<F: ReadFollower>(self, mut follower: F) -> Result<F::Output, ChannelError> {
        let mut pending = self.payload;
        let outcome = loop {
            if pending.is_empty() {
                break Ok(());
            }
            let before = pending.len();
            let mut chunk = SourceChunk::new(&mut pending);
            if let Err(e) = follower.on_ready(&mut chunk) {
                break Err(e);
            }
            if pending.len() == before {
                // A stalled follower cannot be paused around here; refuse.
                break Err(ChannelError::Unsupported(
                    "a follower that takes no bytes",
                ));
            }
        };
        follower.on_completed(outcome)
    }
}

/// Handle for [`Immediate`] transfers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateHandle;

impl Driver for ImmediateHandle {
    fn pause(&self) -> Result<(), ChannelError> {
        Err(ChannelError::Unsupported("pause on an in-memory driver"))
    }

    fn resume(&self) -> Result<(), ChannelError> {
        Err(ChannelError::Unsupported("resume on an in-memory driver"))
    }

    fn close(&self) {}
}

/// Feeds a read follower from `payload`.
pub fn deliver<F: ReadFollower>(payload: Bytes, follower: F) -> Result<F::Output, ChannelError> {
    Immediate::new(payload).deliver(follower)
}

/// Drives a write follower against an unbounded in-memory window and returns
/// everything it produced.
pub fn drain(follower: &mut dyn WriteFollower) -> Result<Bytes, ChannelError> {
    let mut buf = BytesMut::new();
    let mut finished = false;

    let outcome = loop {
        let before = buf.len();
        let mut window = SinkWindow::new(&mut buf, usize::MAX, &mut finished);
        if let Err(e) = follower.on_ready(&mut window) {
            break Err(e);
        }
        if finished {
            break Ok(());
        }
        if buf.len() == before {
            break Err(ChannelError::Unsupported(
                "a follower that makes no progress against an unbounded window",
            ));
        }
    };

    follower.on_completed(outcome.clone());
    outcome.map(|()| buf.freeze())
}

/// A [`ByteStream`] over a single in-memory payload.
pub struct BytesStream {
    payload: Option<Bytes>,
}

impl BytesStream {
    pub fn new(payload: Bytes) -> Self {
        Self {
            payload: Some(payload),
        }
    }

    pub fn empty() -> Self {
        Self { payload: None }
    }
}

#[async_trait]
impl ByteStream for BytesStream {
    async fn pull(&mut self) -> Result<Option<Bytes>, ChannelError> {
        Ok(self.payload.take().filter(|chunk| !chunk.is_empty()))
    }
}
