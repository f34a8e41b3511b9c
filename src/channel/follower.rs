//! Ready-made followers for whole-payload transfers.

use bytes::{Buf, Bytes, BytesMut};

use super::{ChannelError, ReadFollower, SinkWindow, SourceChunk, WriteFollower};

/// Buffers every offered byte and completes with the collected payload.
#[derive(Debug, Default)]
pub struct Collect {
    buf: BytesMut,
}

impl Collect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-sizes the buffer, typically from a Content-Length hint.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }
}

impl ReadFollower for Collect {
    type Output = Bytes;

    fn on_ready(&mut self, chunk: &mut SourceChunk<'_>) -> Result<(), ChannelError> {
        self.buf.extend_from_slice(&chunk.take_all());
        Ok(())
    }

    fn on_completed(self, result: Result<(), ChannelError>) -> Result<Bytes, ChannelError> {
        result.map(|()| self.buf.freeze())
    }
}

/// Emits a fixed payload across however many windows the driver offers.
#[derive(Debug, Clone)]
pub struct BytesBody {
    remaining: Bytes,
}

impl BytesBody {
    pub fn new(payload: Bytes) -> Self {
        Self { remaining: payload }
    }
}

impl WriteFollower for BytesBody {
    fn on_ready(&mut self, sink: &mut SinkWindow<'_>) -> Result<(), ChannelError> {
        if !self.remaining.is_empty() {
            let taken = sink.write(&self.remaining);
            self.remaining.advance(taken);
        }
        if self.remaining.is_empty() {
            sink.finish();
        }
        Ok(())
    }

    fn on_completed(&mut self, _result: Result<(), ChannelError>) {}
}
