use std::io::{Read, Write};

use s7port_client::PlcClient;
use s7port_frame::{FrameConfig, FrameError, FrameReader, FrameWriter, RESPONSE};
use tracing::{debug, error, info};

use crate::dispatch::dispatch;
use crate::error::{CommandError, PortError};

/// Request/response loop over a pair of byte streams.
///
/// One frame in, exactly one tagged response frame out. The loop ends
/// cleanly when the input closes on a frame boundary.
pub struct Port<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    handled: u64,
}

impl<R: Read, W: Write> Port<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self::with_config(input, output, FrameConfig::default())
    }

    /// `config` bounds incoming requests; responses may use the full frame size.
    pub fn with_config(input: R, output: W, config: FrameConfig) -> Self {
        Self {
            reader: FrameReader::with_config(input, config),
            writer: FrameWriter::new(output),
            handled: 0,
        }
    }

    /// Handle one request. Returns `Ok(false)` once the input is closed.
    pub fn handle_one(&mut self, client: &mut dyn PlcClient) -> Result<bool, PortError> {
        let frame = match self.reader.read_frame() {
            Ok(frame) => frame,
            Err(FrameError::ConnectionClosed) => return Ok(false),
            Err(err) => return Err(err.into()),
        };

        let response = match dispatch(client, &frame.payload) {
            Ok(response) => response,
            Err(err) => {
                if matches!(err, CommandError::ProtocolDesync(_)) {
                    error!(error = %err, "request does not match its command");
                } else {
                    error!(error = %err, "cannot handle request");
                }
                return Err(err.into());
            }
        };

        self.writer.send(RESPONSE, &response.encode())?;
        self.handled += 1;
        Ok(true)
    }

    /// Serve until the input closes. Returns the number of requests handled.
    pub fn serve(&mut self, client: &mut dyn PlcClient) -> Result<u64, PortError> {
        info!("port ready");
        while self.handle_one(client)? {}
        debug!(requests = self.handled, "input closed");
        Ok(self.handled)
    }

    /// Requests answered so far.
    pub fn handled(&self) -> u64 {
        self.handled
    }

    /// Consume the port and return its streams.
    pub fn into_inner(self) -> (R, W) {
        (self.reader.into_inner(), self.writer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;
    use s7port_frame::{decode_frame, encode_frame, MAX_PAYLOAD};
    use s7port_term::Term;

    use super::*;
    use crate::mock::MockClient;

    fn wire(requests: &[Term]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for request in requests {
            encode_frame(&request.to_bytes(), &mut buf).unwrap();
        }
        buf.to_vec()
    }

    fn responses(output: Vec<u8>) -> Vec<Term> {
        let mut buf = BytesMut::from(output.as_slice());
        let mut terms = Vec::new();
        while let Some(frame) = decode_frame(&mut buf, MAX_PAYLOAD).unwrap() {
            assert_eq!(frame.payload[0], RESPONSE);
            terms.push(Term::from_bytes(&frame.payload[1..]).unwrap());
        }
        terms
    }

    fn command(name: &str) -> Term {
        Term::Tuple(vec![Term::atom(name), Term::nil()])
    }

    #[test]
    fn one_response_per_request() {
        let input = wire(&[command("test"), command("connect"), command("get_connected")]);
        let mut port = Port::new(Cursor::new(input), Vec::new());
        let mut client = MockClient::default();

        assert_eq!(port.serve(&mut client).unwrap(), 3);

        let (_, output) = port.into_inner();
        let replies = responses(output);
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0], Term::atom("ok"));
        assert_eq!(replies[1], Term::atom("ok"));
        assert_eq!(
            replies[2],
            Term::Tuple(vec![Term::atom("ok"), Term::atom("true")])
        );
    }

    #[test]
    fn empty_input_is_clean_shutdown() {
        let mut port = Port::new(Cursor::new(Vec::new()), Vec::new());
        assert_eq!(port.serve(&mut MockClient::default()).unwrap(), 0);
    }

    #[test]
    fn truncated_frame_is_error() {
        let mut input = wire(&[command("test")]);
        input.truncate(input.len() - 1);
        let mut port = Port::new(Cursor::new(input), Vec::new());
        let err = port.serve(&mut MockClient::default()).unwrap_err();
        assert!(matches!(err, PortError::Frame(FrameError::UnexpectedEof { .. })));
    }

    #[test]
    fn desync_stops_without_reply() {
        let input = wire(&[command("test"), command("no_such_command"), command("test")]);
        let mut port = Port::new(Cursor::new(input), Vec::new());
        let err = port.serve(&mut MockClient::default()).unwrap_err();
        assert!(matches!(
            err,
            PortError::Command(CommandError::UnknownCommand(_))
        ));
        assert_eq!(port.handled(), 1);
        let (_, output) = port.into_inner();
        assert_eq!(responses(output).len(), 1);
    }

    #[test]
    fn oversized_request_rejected_by_config() {
        let input = wire(&[Term::Tuple(vec![
            Term::atom("iso_exchange_buffer"),
            Term::binary(vec![0u8; 64]),
        ])]);
        let config = FrameConfig {
            max_payload_size: 32,
        };
        let mut port = Port::with_config(Cursor::new(input), Vec::new(), config);
        let err = port.serve(&mut MockClient::default()).unwrap_err();
        assert!(matches!(err, PortError::Frame(FrameError::PayloadTooLarge { .. })));
    }
}
