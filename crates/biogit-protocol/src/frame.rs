//! Length-prefixed binary framing.
//!
//! Header layout: `u16 msg_id` then `u32 body_length`, both big-endian.
//! There is no magic prefix or version byte; both sides must agree on id
//! semantics.

use std::io::{Read, Write};

use crate::ProtocolError;

/// Bytes in a frame header.
pub const FRAME_HEADER_LEN: usize = 6;

/// Maximum accepted body length (64 MiB). A peer declaring more is
/// protocol-broken and the connection is closed.
pub const MAX_BODY_LEN: u32 = 64 * 1024 * 1024;

/// An undecoded frame: message id plus raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub id: u16,
    pub body: Vec<u8>,
}

impl RawFrame {
    /// Encode header + body into a single buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FRAME_HEADER_LEN + self.body.len());
        out.extend_from_slice(&self.id.to_be_bytes());
        out.extend_from_slice(&(self.body.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.body);
        out
    }

    /// Parse a frame header. Returns `(msg_id, body_length)`.
    pub fn parse_header(header: &[u8; FRAME_HEADER_LEN]) -> Result<(u16, u32), ProtocolError> {
        let id = u16::from_be_bytes([header[0], header[1]]);
        let len = u32::from_be_bytes([header[2], header[3], header[4], header[5]]);
        if len > MAX_BODY_LEN {
            return Err(ProtocolError::BodyTooLarge(len));
        }
        Ok((id, len))
    }
}

/// Blocking frame reader for client connections.
pub struct FrameReader<R> {
    reader: R,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read one frame, tolerating partial reads of header and body.
    pub fn read_frame(&mut self) -> Result<RawFrame, ProtocolError> {
        let mut header = [0u8; FRAME_HEADER_LEN];
        self.reader.read_exact(&mut header).map_err(eof_is_truncated)?;

        let (id, len) = RawFrame::parse_header(&header)?;
        let mut body = vec![0u8; len as usize];
        self.reader.read_exact(&mut body).map_err(eof_is_truncated)?;

        Ok(RawFrame { id, body })
    }
}

/// Blocking frame writer for client connections.
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write one frame and flush it.
    pub fn write_frame(&mut self, frame: &RawFrame) -> Result<(), ProtocolError> {
        self.writer.write_all(&frame.encode())?;
        self.writer.flush()?;
        Ok(())
    }
}

fn eof_is_truncated(e: std::io::Error) -> ProtocolError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        ProtocolError::Truncated
    } else {
        ProtocolError::Io(e)
    }
}
