//! Request handling for the s7port bridge.
//!
//! A request is one frame holding the term `{command, argument}`. The
//! [`dispatch`] table resolves the command to a handler, the handler decodes
//! its argument, makes exactly one [`PlcClient`](s7port_client::PlcClient)
//! call and turns the outcome into a [`Response`]. [`Port`] wraps this in the
//! read/dispatch/write loop that runs on stdin and stdout.
//!
//! Malformed requests are fatal ([`CommandError`]); bad values inside a
//! well-formed request are answered with `{error, einval}` or
//! `{error, enoent}`; PLC failures with `{error, %{es7, eiso, etcp}}`.

mod args;
pub mod dispatch;
pub mod error;
mod handlers;
pub mod port;
pub mod response;

#[cfg(test)]
mod mock;

pub use dispatch::{command_names, dispatch, Command, COMMANDS};
pub use error::{CommandError, PortError};
pub use port::Port;
pub use response::{Reason, Reply, Response};
