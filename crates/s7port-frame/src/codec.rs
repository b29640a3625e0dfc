use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: big-endian payload length (2 bytes).
pub const HEADER_SIZE: usize = 2;

/// Largest payload the 2-byte length prefix can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// One length-delimited unit of the port protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The frame payload, without the length prefix.
    pub payload: Bytes,
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────┐
/// │ Length (2B)  │ Payload          │
/// │ big-endian   │ (Length bytes)   │
/// └──────────────┴──────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u16(payload.len() as u16);
    dst.put_slice(payload);
    Ok(())
}

/// Encode a tagged frame: the tag byte is the first payload byte and is
/// included in the length prefix.
pub fn encode_tagged(tag: u8, body: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = body.len() + 1;
    if len > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: len,
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + len);
    dst.put_u16(len as u16);
    dst.put_u8(tag);
    dst.put_slice(body);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let payload_len = u16::from_be_bytes([src[0], src[1]]) as usize;
    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame { payload }))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum accepted payload size in bytes. Default: 65535.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let payload = b"\x83d\x00\x02ok";

        encode_frame(payload, &mut buf).unwrap();
        assert_eq!(&buf[..2], &[0x00, payload.len() as u8]);
        assert_eq!(buf.len(), HEADER_SIZE + payload.len());

        let frame = decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(frame.payload.as_ref(), payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_length_prefix_is_big_endian() {
        let mut buf = BytesMut::new();
        let payload = vec![7u8; 0x0102];
        encode_frame(&payload, &mut buf).unwrap();
        assert_eq!(&buf[..2], &[0x01, 0x02]);
    }

    #[test]
    fn test_tagged_frame_counts_tag_in_length() {
        let mut buf = BytesMut::new();
        encode_tagged(b'r', b"abc", &mut buf).unwrap();
        assert_eq!(buf.as_ref(), b"\x00\x04rabc");
    }

    #[test]
    fn test_decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x00][..]);
        assert!(decode_frame(&mut buf, MAX_PAYLOAD).unwrap().is_none());
    }

    #[test]
    fn test_decode_incomplete_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);

        assert!(decode_frame(&mut buf, MAX_PAYLOAD).unwrap().is_none());
    }

    #[test]
    fn test_decode_over_configured_limit() {
        let mut buf = BytesMut::from(&[0x01, 0x00][..]);
        let result = decode_frame(&mut buf, 16);
        assert!(matches!(
            result,
            Err(FrameError::PayloadTooLarge { size: 256, max: 16 })
        ));
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let mut buf = BytesMut::new();
        let payload = vec![0u8; MAX_PAYLOAD + 1];
        assert!(matches!(
            encode_frame(&payload, &mut buf),
            Err(FrameError::PayloadTooLarge { .. })
        ));

        let body = vec![0u8; MAX_PAYLOAD];
        assert!(matches!(
            encode_tagged(b'r', &body, &mut buf),
            Err(FrameError::PayloadTooLarge { .. })
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = BytesMut::new();
        encode_frame(b"first", &mut buf).unwrap();
        encode_frame(b"second", &mut buf).unwrap();

        let f1 = decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(f1.payload.as_ref(), b"first");

        let f2 = decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(f2.payload.as_ref(), b"second");

        assert!(buf.is_empty());
    }

    #[test]
    fn test_empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"", &mut buf).unwrap();

        let frame = decode_frame(&mut buf, MAX_PAYLOAD).unwrap().unwrap();
        assert!(frame.payload.is_empty());
    }
}
