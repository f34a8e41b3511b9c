//! Byte layout of a suspended call.
//!
//! ```text
//! call      = action uri *segment terminator
//! action    = u8                        ; verb code, 1..=6
//! uri       = string
//! segment   = header / body
//! header    = 0x0A string i32 *string   ; name, value count, values
//! body      = 0x0B i32 *u8             ; length, raw bytes
//! terminator = 0x7F
//! string    = u16 *u8                   ; byte length, utf-8 bytes
//! ```
//!
//! All integers are big-endian. Strings cap at 65535 bytes.

use bytes::{BufMut, Bytes, BytesMut};

use crate::transport::Method;

use super::SuspendError;

const SEGMENT_HEADER: u8 = 10;
const SEGMENT_BODY: u8 = 11;
const TERMINATOR: u8 = 0x7F;
const MAX_STRING: usize = u16::MAX as usize;

/// A decoded suspended call, ready to be replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCall {
    pub method: Method,
    pub uri: String,
    pub headers: Vec<(String, Vec<String>)>,
    pub body: Option<Bytes>,
}

pub(crate) fn encode(
    method: Method,
    uri: &str,
    headers: &[(String, Vec<String>)],
    body: Option<&Bytes>,
) -> Result<Bytes, SuspendError> {
    let mut buf = BytesMut::new();
    buf.put_u8(method.action());
    put_utf8(&mut buf, uri)?;
    for (name, values) in headers {
        buf.put_u8(SEGMENT_HEADER);
        put_utf8(&mut buf, name)?;
        let count =
            i32::try_from(values.len()).map_err(|_| SuspendError::TooManyValues(values.len()))?;
        buf.put_i32(count);
        for value in values {
            put_utf8(&mut buf, value)?;
        }
    }
    if let Some(body) = body {
        buf.put_u8(SEGMENT_BODY);
        let len = i32::try_from(body.len()).map_err(|_| SuspendError::BodyTooLarge(body.len()))?;
        buf.put_i32(len);
        buf.put_slice(body);
    }
    buf.put_u8(TERMINATOR);
    Ok(buf.freeze())
}

fn put_utf8(buf: &mut BytesMut, s: &str) -> Result<(), SuspendError> {
    if s.len() > MAX_STRING {
        return Err(SuspendError::StringTooLong(s.len()));
    }
    buf.put_u16(s.len() as u16);
    buf.put_slice(s.as_bytes());
    Ok(())
}

pub(crate) fn decode(bytes: &[u8]) -> Result<DecodedCall, SuspendError> {
    if bytes.is_empty() {
        return Err(SuspendError::Empty);
    }
    let mut reader = Reader::new(bytes);

    let action = reader.u8()?;
    let method = Method::from_action(action).ok_or(SuspendError::UnknownAction(action))?;
    let uri = reader.utf8()?;

    let mut headers = Vec::new();
    let mut body = None;
    loop {
        match reader.u8()? {
            TERMINATOR => break,
            SEGMENT_HEADER => {
                let name = reader.utf8()?;
                let count = reader.i32()?;
                let count =
                    usize::try_from(count).map_err(|_| SuspendError::NegativeLength(count))?;
                let mut values = Vec::with_capacity(count.min(64));
                for _ in 0..count {
                    values.push(reader.utf8()?);
                }
                headers.push((name, values));
            }
            SEGMENT_BODY => {
                if body.is_some() {
                    return Err(SuspendError::DuplicateBody);
                }
                let len = reader.i32()?;
                let len = usize::try_from(len).map_err(|_| SuspendError::NegativeLength(len))?;
                body = Some(Bytes::copy_from_slice(reader.take(len)?));
            }
            other => return Err(SuspendError::UnknownSegment(other)),
        }
    }

    if reader.remaining() > 0 {
        return Err(SuspendError::TrailingBytes(reader.remaining()));
    }

    Ok(DecodedCall {
        method,
        uri,
        headers,
        body,
    })
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], SuspendError> {
        if self.remaining() < n {
            return Err(SuspendError::Truncated);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, SuspendError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, SuspendError> {
        let raw = self.take(2)?;
        Ok(u16::from_be_bytes([raw[0], raw[1]]))
    }

    fn i32(&mut self) -> Result<i32, SuspendError> {
        let raw = self.take(4)?;
        Ok(i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn utf8(&mut self) -> Result<String, SuspendError> {
        let len = self.u16()? as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| SuspendError::InvalidUtf8)
    }
}
