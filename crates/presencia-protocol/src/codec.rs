//! Tokio codec for scanner wire framing.
//!
//! The scanner speaks one JSON object per line. `WireCodec` handles the
//! framing only:
//!
//! - [`Decoder`]: splits the byte stream on newlines and yields [`RawFrame`]s
//!   without parsing them. Parsing belongs to the message router, so a
//!   malformed frame is a routing concern (logged, dropped) and can never
//!   poison the stream state.
//! - [`Encoder`]: serializes any `Serialize` value to compact JSON plus a
//!   trailing newline, so commands and checkout replies share one encoder.
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use tokio::net::TcpStream;
//! use tokio_util::codec::Framed;
//! use presencia_core::UserId;
//! use presencia_protocol::{DeviceCommand, WireCodec};
//!
//! # async fn example() -> presencia_core::Result<()> {
//! let stream = TcpStream::connect("127.0.0.1:3000").await?;
//! let mut framed = Framed::new(stream, WireCodec::new());
//!
//! let cmd = DeviceCommand::RegisterFingerprint {
//!     uid: UserId::new("u-1")?,
//!     name: "Ada".to_string(),
//!     email: "ada@example.org".to_string(),
//! };
//! framed.send(cmd).await?;
//!
//! if let Some(Ok(frame)) = framed.next().await {
//!     println!("Received {} bytes", frame.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # DoS Protection
//!
//! Buffered bytes without a newline are bounded by the maximum frame size
//! (default 64 KB); exceeding it fails the connection rather than growing
//! the buffer without limit.

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use tokio_util::codec::{Decoder, Encoder};

use presencia_core::constants::MAX_FRAME_SIZE;
use presencia_core::{Error, Result};

/// One undecoded wire frame: the bytes of a single line, newline stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame(Bytes);

impl RawFrame {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for RawFrame {
    fn from(bytes: &[u8]) -> Self {
        RawFrame(Bytes::copy_from_slice(bytes))
    }
}

impl AsRef<[u8]> for RawFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Newline-delimited JSON codec for the scanner connection.
#[derive(Debug)]
pub struct WireCodec {
    /// Maximum allowed frame size in bytes.
    max_frame_size: usize,
}

impl WireCodec {
    /// Create a codec with the default maximum frame size (64 KB).
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    /// Create a codec with a custom maximum frame size.
    #[must_use]
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for WireCodec {
    type Item = RawFrame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<RawFrame>> {
        loop {
            let Some(pos) = src.iter().position(|b| *b == b'\n') else {
                // No complete line yet; bound the buffer while waiting.
                if src.len() > self.max_frame_size {
                    return Err(Error::FrameTooLarge {
                        size: src.len(),
                        max: self.max_frame_size,
                    });
                }
                return Ok(None);
            };

            let mut line = src.split_to(pos + 1);
            line.truncate(pos);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }

            // Blank lines are keepalive noise, not frames.
            if line.is_empty() {
                continue;
            }

            if line.len() > self.max_frame_size {
                return Err(Error::FrameTooLarge {
                    size: line.len(),
                    max: self.max_frame_size,
                });
            }

            return Ok(Some(RawFrame(line.freeze())));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<RawFrame>> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }

        // A peer that closes without a trailing newline still gets its last
        // frame delivered.
        if src.is_empty() {
            Ok(None)
        } else {
            let line = src.split();
            Ok(Some(RawFrame(line.freeze())))
        }
    }
}

impl<T: Serialize> Encoder<T> for WireCodec {
    type Error = Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<()> {
        let json =
            serde_json::to_vec(&item).map_err(|e| Error::Codec(format!("serialize: {e}")))?;

        if json.len() > self.max_frame_size {
            return Err(Error::FrameTooLarge {
                size: json.len(),
                max: self.max_frame_size,
            });
        }

        dst.reserve(json.len() + 1);
        dst.extend_from_slice(&json);
        dst.put_u8(b'\n');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceCommand;
    use presencia_core::UserId;

    fn decode_all(codec: &mut WireCodec, bytes: &[u8]) -> Vec<RawFrame> {
        let mut src = BytesMut::from(bytes);
        let mut frames = Vec::new();
        while let Some(frame) = codec.decode(&mut src).unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_decode_single_frame() {
        let mut codec = WireCodec::new();
        let frames = decode_all(&mut codec, b"{\"action\":\"x\"}\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_bytes(), b"{\"action\":\"x\"}");
    }

    #[test]
    fn test_decode_multiple_frames_one_buffer() {
        let mut codec = WireCodec::new();
        let frames = decode_all(&mut codec, b"{\"a\":1}\n{\"a\":2}\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].as_bytes(), b"{\"a\":2}");
    }

    #[test]
    fn test_decode_partial_frame_waits() {
        let mut codec = WireCodec::new();
        let mut src = BytesMut::from(&b"{\"a\":"[..]);
        assert!(codec.decode(&mut src).unwrap().is_none());

        src.extend_from_slice(b"1}\n");
        let frame = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(frame.as_bytes(), b"{\"a\":1}");
    }

    #[test]
    fn test_decode_strips_crlf() {
        let mut codec = WireCodec::new();
        let frames = decode_all(&mut codec, b"{\"a\":1}\r\n");
        assert_eq!(frames[0].as_bytes(), b"{\"a\":1}");
    }

    #[test]
    fn test_decode_skips_blank_lines() {
        let mut codec = WireCodec::new();
        let frames = decode_all(&mut codec, b"\n\r\n{\"a\":1}\n\n");
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_decode_oversize_buffer_rejected() {
        let mut codec = WireCodec::with_max_frame_size(16);
        let mut src = BytesMut::from(&b"0123456789abcdef0"[..]);
        assert!(matches!(
            codec.decode(&mut src),
            Err(Error::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_decode_eof_flushes_unterminated_frame() {
        let mut codec = WireCodec::new();
        let mut src = BytesMut::from(&b"{\"a\":1}"[..]);
        let frame = codec.decode_eof(&mut src).unwrap().unwrap();
        assert_eq!(frame.as_bytes(), b"{\"a\":1}");
        assert!(codec.decode_eof(&mut src).unwrap().is_none());
    }

    #[test]
    fn test_encode_appends_newline() {
        let mut codec = WireCodec::new();
        let mut dst = BytesMut::new();
        let cmd = DeviceCommand::CloseNotice {
            reason: "shutdown".to_string(),
        };
        Encoder::encode(&mut codec, &cmd, &mut dst).unwrap();

        assert_eq!(dst.last(), Some(&b'\n'));
        let frame = codec.decode(&mut dst).unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(frame.as_bytes()).unwrap();
        assert_eq!(parsed["action"], "close_notice");
    }

    #[tokio::test]
    async fn test_encode_decode_round_trip_over_duplex() {
        use futures::{SinkExt, StreamExt};
        use tokio_util::codec::Framed;

        let (a, b) = tokio::io::duplex(1024);
        let mut tx = Framed::new(a, WireCodec::new());
        let mut rx = Framed::new(b, WireCodec::new());

        let cmd = DeviceCommand::VerifyAttendance {
            uid: UserId::new("u-1").unwrap(),
            name: "Ada".to_string(),
            template_id: presencia_core::TemplateId::new("7").unwrap(),
        };
        tx.send(&cmd).await.unwrap();

        let frame = rx.next().await.unwrap().unwrap();
        let parsed: DeviceCommand = serde_json::from_slice(frame.as_bytes()).unwrap();
        assert_eq!(parsed, cmd);
    }
}
