//! Drivers for blocking resources.
//!
//! A blocking `Read` or `Write` cannot be polled, so the loop has to live on
//! a thread that is allowed to block. Neither variant spawns that thread
//! itself: the caller supplies a [`tokio::runtime::Handle`] and the loop
//! runs under `spawn_blocking` on that runtime.
//!
//! The gate is the one piece of shared mutable state, a mutex plus condition
//! variable. The loop re-checks it before every read and every `on_ready`,
//! so a paused transfer delivers nothing until resumed.

use std::io::{Read, Write};
use std::sync::{Arc, Condvar, Mutex};

use bytes::{Bytes, BytesMut};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::{ChannelError, Driver, ReadFollower, SinkWindow, SourceChunk, WriteFollower};

const DEFAULT_CHUNK: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Running,
    Paused,
    Closed,
}

struct Flag {
    state: Mutex<Gate>,
    cv: Condvar,
}

/// Control handle shared between the blocking loop and the outside world.
#[derive(Clone)]
pub struct PassiveHandle {
    flag: Arc<Flag>,
}

impl PassiveHandle {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(Flag {
                state: Mutex::new(Gate::Running),
                cv: Condvar::new(),
            }),
        }
    }

    /// Blocks until the gate is open. `false` means the transfer was closed
    /// instead.
    fn wait_running(&self) -> bool {
        let guard = self
            .flag
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let guard = self
            .flag
            .cv
            .wait_while(guard, |state| *state == Gate::Paused)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard != Gate::Closed
    }

    fn set(&self, next: Gate) {
        let mut guard = self
            .flag
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *guard != Gate::Closed {
            *guard = next;
        }
        drop(guard);
        self.flag.cv.notify_all();
    }
}

impl Default for PassiveHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for PassiveHandle {
    fn pause(&self) -> Result<(), ChannelError> {
        self.set(Gate::Paused);
        Ok(())
    }

    fn resume(&self) -> Result<(), ChannelError> {
        self.set(Gate::Running);
        Ok(())
    }

    fn close(&self) {
        let mut guard = self
            .flag
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Gate::Closed;
        drop(guard);
        self.flag.cv.notify_all();
    }
}

/// Read driver around a blocking source.
pub struct PassiveReader<R> {
    source: R,
    chunk: usize,
}

impl<R> PassiveReader<R>
where
    R: Read + Send + 'static,
{
    pub fn new(source: R) -> Self {
        Self {
            source,
            chunk: DEFAULT_CHUNK,
        }
    }

    pub fn chunk_size(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    /// Starts the blocking loop on `runtime`. The join handle carries the
    /// follower's output.
    pub fn spawn<F>(
        self,
        runtime: &Handle,
        follower: F,
    ) -> (PassiveHandle, JoinHandle<Result<F::Output, ChannelError>>)
    where
        F: ReadFollower + Send + 'static,
        F::Output: Send + 'static,
    {
        let handle = PassiveHandle::new();
        let join = self.spawn_with(handle.clone(), runtime, follower);
        (handle, join)
    }

    /// Like [`spawn`](Self::spawn), with a caller-built handle. Pausing the
    /// handle before spawning means the loop starts gated.
    pub fn spawn_with<F>(
        self,
        handle: PassiveHandle,
        runtime: &Handle,
        follower: F,
    ) -> JoinHandle<Result<F::Output, ChannelError>>
    where
        F: ReadFollower + Send + 'static,
        F::Output: Send + 'static,
    {
        runtime.spawn_blocking(move || read_loop(self, handle, follower))
    }
}

fn read_loop<R, F>(
    mut reader: PassiveReader<R>,
    handle: PassiveHandle,
    mut follower: F,
) -> Result<F::Output, ChannelError>
where
    R: Read + Send + 'static,
    F: ReadFollower,
{
    let outcome = read_pump(&mut reader, &handle, &mut follower);
    follower.on_completed(outcome)
}

fn read_pump<R, F>(
    reader: &mut PassiveReader<R>,
    handle: &PassiveHandle,
    follower: &mut F,
) -> Result<(), ChannelError>
where
    R: Read + Send + 'static,
    F: ReadFollower,
{
    let mut buf = vec![0u8; reader.chunk];
    loop {
        if !handle.wait_running() {
            return Err(ChannelError::Closed);
        }

        let n = reader.source.read(&mut buf)?;
        if n == 0 {
            return Ok(());
        }

        let mut pending = Bytes::copy_from_slice(&buf[..n]);
        while !pending.is_empty() {
            if !handle.wait_running() {
                return Err(ChannelError::Closed);
            }
            let before = pending.len();
            let mut chunk = SourceChunk::new(&mut pending);
            follower.on_ready(&mut chunk)?;
            if pending.len() == before {
                std::thread::yield_now();
            }
        }
    }
}

/// Write driver around a blocking sink.
pub struct PassiveWriter<W> {
    sink: W,
    window: usize,
}

impl<W> PassiveWriter<W>
where
    W: Write + Send + 'static,
{
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            window: DEFAULT_CHUNK,
        }
    }

    pub fn window_size(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }

    /// Starts the blocking loop on `runtime`. The join handle yields the
    /// sink back so the caller can reclaim the written resource.
    pub fn spawn<F>(
        self,
        runtime: &Handle,
        follower: F,
    ) -> (PassiveHandle, JoinHandle<Result<W, ChannelError>>)
    where
        F: WriteFollower + 'static,
    {
        let handle = PassiveHandle::new();
        let join = self.spawn_with(handle.clone(), runtime, follower);
        (handle, join)
    }

    /// Like [`spawn`](Self::spawn), with a caller-built handle.
    pub fn spawn_with<F>(
        self,
        handle: PassiveHandle,
        runtime: &Handle,
        follower: F,
    ) -> JoinHandle<Result<W, ChannelError>>
    where
        F: WriteFollower + 'static,
    {
        runtime.spawn_blocking(move || write_loop(self, handle, follower))
    }
}

fn write_loop<W, F>(
    mut writer: PassiveWriter<W>,
    handle: PassiveHandle,
    mut follower: F,
) -> Result<W, ChannelError>
where
    W: Write + Send + 'static,
    F: WriteFollower,
{
    let outcome = write_pump(&mut writer, &handle, &mut follower);
    follower.on_completed(outcome.clone());
    outcome.map(|()| writer.sink)
}

fn write_pump<W, F>(
    writer: &mut PassiveWriter<W>,
    handle: &PassiveHandle,
    follower: &mut F,
) -> Result<(), ChannelError>
where
    W: Write + Send + 'static,
    F: WriteFollower,
{
    let mut buf = BytesMut::with_capacity(writer.window);
    let mut finished = false;

    while !finished {
        if !handle.wait_running() {
            return Err(ChannelError::Closed);
        }

        let mut window = SinkWindow::new(&mut buf, writer.window, &mut finished);
        follower.on_ready(&mut window)?;

        if !buf.is_empty() {
            writer.sink.write_all(&buf)?;
            buf.clear();
        } else if !finished {
            std::thread::yield_now();
        }
    }

    writer.sink.flush()?;
    Ok(())
}
