use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::encode_tagged;
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes tagged frames to any `Write` stream.
///
/// Each frame is encoded into one buffer (prefix, tag, body) before the first
/// byte hits the stream, so a body that cannot be framed writes nothing.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Send `body` behind `tag` and flush (blocking).
    ///
    /// A tag plus body over [`MAX_PAYLOAD`](crate::MAX_PAYLOAD) bytes is
    /// [`FrameError::PayloadTooLarge`].
    pub fn send(&mut self, tag: u8, body: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_tagged(tag, body, &mut self.buf)?;
        self.write_buffered()
    }

    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        trace!(size = self.buf.len(), tag = self.buf[2], "frame written");

        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::{decode_frame, MAX_PAYLOAD};
    use crate::tag::RESPONSE;

    #[test]
    fn write_tagged_frame() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = FrameWriter::new(cursor);

        writer.send(RESPONSE, b"hello").unwrap();

        let inner = writer.into_inner();
        let mut wire = BytesMut::from(inner.into_inner().as_slice());
        let frame = decode_frame(&mut wire, MAX_PAYLOAD).unwrap().unwrap();
        assert_eq!(frame.payload.as_ref(), b"rhello");
    }

    #[test]
    fn write_multiple_frames() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = FrameWriter::new(cursor);

        writer.send(RESPONSE, b"one").unwrap();
        writer.send(RESPONSE, b"two").unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.into_inner(), b"\x00\x04rone\x00\x04rtwo".to_vec());
    }

    #[test]
    fn largest_body_fills_prefix() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(RESPONSE, &vec![1u8; MAX_PAYLOAD - 1]).unwrap();
        let wire = writer.into_inner().into_inner();
        assert_eq!(&wire[..3], &[0xFF, 0xFF, RESPONSE]);
        assert_eq!(wire.len(), 2 + MAX_PAYLOAD);
    }

    #[test]
    fn body_past_prefix_limit_writes_nothing() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(RESPONSE, b"kept").unwrap();
        let body = vec![0u8; MAX_PAYLOAD];
        let err = writer.send(RESPONSE, &body).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size, .. } if size == MAX_PAYLOAD + 1));
        assert_eq!(writer.into_inner().into_inner(), b"\x00\x05rkept".to_vec());
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = FrameWriter::new(sink);

        writer.send(RESPONSE, b"x").unwrap();

        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let writer_impl = FlakyWriter {
            kind: ErrorKind::Interrupted,
            wrote_once: false,
            flush_failed: false,
            data: Vec::new(),
        };

        let mut writer = FrameWriter::new(writer_impl);
        writer.send(RESPONSE, b"retry").unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data, b"\x00\x06rretry".to_vec());
    }

    #[test]
    fn handles_would_block_write_and_flush() {
        let writer_impl = FlakyWriter {
            kind: ErrorKind::WouldBlock,
            wrote_once: false,
            flush_failed: false,
            data: Vec::new(),
        };

        let mut writer = FrameWriter::new(writer_impl);
        writer.send(RESPONSE, b"retry").unwrap();

        let inner = writer.into_inner();
        assert!(!inner.data.is_empty());
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(RESPONSE, b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FlakyWriter {
        kind: ErrorKind,
        wrote_once: bool,
        flush_failed: bool,
        data: Vec<u8>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.wrote_once {
                self.wrote_once = true;
                return Err(std::io::Error::from(self.kind));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_failed {
                self.flush_failed = true;
                return Err(std::io::Error::from(self.kind));
            }
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn written_bytes_decode() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut writer = FrameWriter::new(cursor);

        writer.send(RESPONSE, b"z").unwrap();

        let wire = writer.into_inner().into_inner();
        let mut framed = crate::reader::FrameReader::new(Cursor::new(wire));
        let frame = framed.read_frame().unwrap();
        assert_eq!(frame.payload.as_ref(), b"rz");
    }
}
