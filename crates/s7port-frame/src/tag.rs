//! Frame tags for outgoing frames.
//!
//! The VM side routes on the first byte of every frame it receives.

/// Reply to a request.
pub const RESPONSE: u8 = b'r';

/// Unsolicited message. Reserved; no command emits one.
pub const NOTIFICATION: u8 = b'n';
