//! Erlang port bridging term-encoded commands to Siemens S7 PLCs.
//!
//! The `s7port` binary reads `{packet, 2}` frames from stdin, runs each
//! `{command, argument}` request against a Snap7 client and writes one
//! `'r'`-tagged reply per request to stdout.
//!
//! # Crate Structure
//!
//! - [`frame`]: length-prefixed framing
//! - [`term`]: external term format codec
//! - [`client`]: PLC client capability, status codes, Snap7 backend
//! - [`command`]: dispatch table, handlers and the port loop

/// Re-export frame types.
pub mod frame {
    pub use s7port_frame::*;
}

/// Re-export term codec types.
pub mod term {
    pub use s7port_term::*;
}

/// Re-export client types.
pub mod client {
    pub use s7port_client::*;
}

/// Re-export command types.
pub mod command {
    pub use s7port_command::*;
}
