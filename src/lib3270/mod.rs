//! IBM 3270 data-stream controller: buffer model, field & attribute
//! engine, order decoder, inbound encoder, and DBCS post-processor. This
//! module owns the `ScreenBuffer` the sibling [`crate::nvt`] processor
//! shares when a connection is running in NVT/ANSI mode instead.

pub mod buffer;
pub mod callbacks;
pub mod cell;
pub mod codes;
pub mod config;
pub mod controller;
pub mod dbcs;
pub mod error;
pub mod field;
pub mod inbound;
pub mod order_decoder;

pub use buffer::{ReplyMode, ScreenBuffer, ScreenSize};
pub use callbacks::{Callbacks, NullCallbacks, VStatus};
pub use cell::Cell;
pub use config::CoreConfig;
pub use controller::Controller;
pub use error::{CoreError, CoreResult, DbcsError, ProtocolError};

// Re-export EBCDIC conversion, kept from the original protocol layer.
pub use crate::protocol_common::ebcdic::{ascii_to_ebcdic, ebcdic_to_ascii};
