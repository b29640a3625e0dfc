//! External term format codec.
//!
//! The VM on the other end of the port speaks its own self-describing binary
//! term format. This crate decodes it with a cursor ([`Decoder`]) the way a
//! command handler needs it (one typed element at a time, nothing consumed on
//! a mismatch) and encodes replies into a growable buffer ([`Encoder`]).
//! [`Term`] is the owned value tree used when a whole term is needed at once.

pub mod decode;
pub mod encode;
pub mod error;
pub mod tag;
pub mod term;

pub use decode::Decoder;
pub use encode::Encoder;
pub use error::{DecodeError, Result};
pub use term::Term;
