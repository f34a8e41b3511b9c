//! Async drivers gated by a watch channel.
//!
//! The gate has three states. Pausing and resuming flip between `Running`
//! and `Paused`; `Closed` is terminal and wins every race. The loop re-reads
//! the gate after each pull so a pause that lands mid-flight still stops the
//! next delivery.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::sync::watch;

use super::{
    ByteStream, ChannelError, Driver, ReadFollower, SinkWindow, SourceChunk, WriteFollower,
};

/// Capacity offered per write window.
const DEFAULT_WINDOW: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Running,
    Paused,
    Closed,
}

/// Clonable control handle for [`ReadDriver`] and [`WriteDriver`].
///
/// Every clone controls the same transfer. Dropping all handles leaves the
/// transfer running to completion.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    tx: Arc<watch::Sender<Gate>>,
}

impl DriverHandle {
    fn new() -> (Self, watch::Receiver<Gate>) {
        let (tx, rx) = watch::channel(Gate::Running);
        (Self { tx: Arc::new(tx) }, rx)
    }
}

impl Driver for DriverHandle {
    fn pause(&self) -> Result<(), ChannelError> {
        self.tx.send_modify(|gate| {
            if *gate != Gate::Closed {
                *gate = Gate::Paused;
            }
        });
        Ok(())
    }

    fn resume(&self) -> Result<(), ChannelError> {
        self.tx.send_modify(|gate| {
            if *gate != Gate::Closed {
                *gate = Gate::Running;
            }
        });
        Ok(())
    }

    fn close(&self) {
        self.tx.send_modify(|gate| *gate = Gate::Closed);
    }
}

/// Blocks while paused. `Err(Closed)` once the gate reaches `Closed`.
async fn wait_running(gate: &mut watch::Receiver<Gate>) -> Result<(), ChannelError> {
    let state = match gate.wait_for(|g| *g != Gate::Paused).await {
        Ok(state) => *state,
        // Every handle is gone while we were paused; nobody can resume.
        Err(_) => Gate::Closed,
    };
    if state == Gate::Closed {
        Err(ChannelError::Closed)
    } else {
        Ok(())
    }
}

/// Pulls chunks from a [`ByteStream`] and feeds them to a read follower.
pub struct ReadDriver<S> {
    stream: S,
    gate: watch::Receiver<Gate>,
    pending: Bytes,
}

impl<S: ByteStream> ReadDriver<S> {
    pub fn new(stream: S) -> (Self, DriverHandle) {
        let (handle, gate) = DriverHandle::new();
        (
            Self {
                stream,
                gate,
                pending: Bytes::new(),
            },
            handle,
        )
    }

    /// Runs the transfer to completion and hands back the follower's output.
    ///
    /// `on_completed` is called exactly once: with `Ok` when the stream ran
    /// dry, with `Err` when the transfer failed or was closed.
    pub async fn run<F: ReadFollower>(mut self, mut follower: F) -> Result<F::Output, ChannelError> {
        let outcome = self.pump(&mut follower).await;
        follower.on_completed(outcome)
    }

    async fn pump<F: ReadFollower>(&mut self, follower: &mut F) -> Result<(), ChannelError> {
        loop {
            wait_running(&mut self.gate).await?;

            if self.pending.is_empty() {
                match self.stream.pull().await? {
                    Some(chunk) => self.pending = chunk,
                    None => return Ok(()),
                }
            }

            // The pull may have raced with a pause or close; re-check before
            // delivering so a paused transfer sees zero ready calls.
            if *self.gate.borrow() != Gate::Running {
                continue;
            }

            if self.pending.is_empty() {
                continue;
            }

            let mut chunk = SourceChunk::new(&mut self.pending);
            follower.on_ready(&mut chunk)?;

            if !self.pending.is_empty() {
                // Follower left bytes untaken; re-offer instead of pulling
                // ahead of it.
                tokio::task::yield_now().await;
            }
        }
    }
}

/// An async push target for body bytes.
#[async_trait]
pub trait ByteSink: Send {
    async fn push(&mut self, chunk: Bytes) -> Result<(), ChannelError>;
}

#[async_trait]
impl<'s, S> ByteSink for &'s mut S
where
    S: ByteSink + ?Sized,
{
    async fn push(&mut self, chunk: Bytes) -> Result<(), ChannelError> {
        (**self).push(chunk).await
    }
}

#[async_trait]
impl<S> ByteSink for Box<S>
where
    S: ByteSink + ?Sized,
{
    async fn push(&mut self, chunk: Bytes) -> Result<(), ChannelError> {
        (**self).push(chunk).await
    }
}

/// Offers capacity windows to a write follower and pushes what it produces
/// into a [`ByteSink`].
pub struct WriteDriver<S> {
    sink: S,
    gate: watch::Receiver<Gate>,
    window: usize,
}

impl<S: ByteSink> WriteDriver<S> {
    pub fn new(sink: S) -> (Self, DriverHandle) {
        Self::with_window(sink, DEFAULT_WINDOW)
    }

    pub fn with_window(sink: S, window: usize) -> (Self, DriverHandle) {
        let (handle, gate) = DriverHandle::new();
        (
            Self {
                sink,
                gate,
                window: window.max(1),
            },
            handle,
        )
    }

    /// Runs the transfer until the follower finishes its body.
    pub async fn run(mut self, follower: &mut dyn WriteFollower) -> Result<(), ChannelError> {
        let outcome = self.pump(follower).await;
        follower.on_completed(outcome.clone());
        outcome
    }

    async fn pump(&mut self, follower: &mut dyn WriteFollower) -> Result<(), ChannelError> {
        let mut buf = BytesMut::with_capacity(self.window);
        let mut finished = false;

        while !finished {
            wait_running(&mut self.gate).await?;

            let mut window = SinkWindow::new(&mut buf, self.window, &mut finished);
            follower.on_ready(&mut window)?;

            if !buf.is_empty() {
                let chunk = buf.split().freeze();
                self.sink.push(chunk).await?;
            } else if !finished {
                // No progress this round; let a pause or close get a word in.
                tokio::task::yield_now().await;
            }
        }

        Ok(())
    }
}
