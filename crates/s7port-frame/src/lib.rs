//! Length-prefixed framing for a `{packet, 2}` port.
//!
//! Every message on the wire is a 2-byte big-endian payload length followed by
//! the payload. Frames sent back to the VM carry a one-byte tag in front of the
//! body (`'r'` for responses), counted in the length.
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod reader;
pub mod tag;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, encode_tagged, Frame, FrameConfig, HEADER_SIZE, MAX_PAYLOAD,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use tag::{NOTIFICATION, RESPONSE};
pub use writer::FrameWriter;
