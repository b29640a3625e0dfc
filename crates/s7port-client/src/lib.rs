//! S7 client capability.
//!
//! The command layer never talks to a PLC directly. It drives a
//! [`PlcClient`], an object-safe trait with one method per client operation,
//! each returning the operation's packed [`Status`] on failure.
//!
//! - [`status`]: packed status codes and their three-way breakdown
//! - [`types`]: areas, word lengths, block and CPU records
//! - [`snap7`]: [`PlcClient`] over the Snap7 shared library, loaded at runtime

pub mod error;
pub mod status;
pub mod traits;
pub mod types;

#[cfg(unix)]
pub mod snap7;

pub use error::{ClientError, Result};
pub use status::{Breakdown, ErrorName, S7Result, Status};
pub use traits::PlcClient;
pub use types::{
    Area, BlockInfo, BlockType, BlocksList, ConnectionType, CpInfo, CpuInfo, CpuStatus, DataItem,
    OrderCode, Param, PduLength, PlcDateTime, Protection, Szl, WordLen,
};

#[cfg(unix)]
pub use snap7::Snap7Client;
