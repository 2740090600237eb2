//! 3270 data-stream controller and NVT (ANSI/VT100) stream processor
//! sharing one screen buffer.

/// PROTOCOL COMMON: EBCDIC conversion tables, reused by the 3270 side.
pub mod protocol_common;

/// LIB3270: buffer model, field & attribute engine, order decoder,
/// inbound encoder, DBCS post-processor, and the owning `Controller`.
pub mod lib3270;

/// NVT: the ANSI/VT100 stream processor sharing `lib3270`'s buffer.
pub mod nvt;

pub use lib3270::{Cell, Controller, CoreConfig, ScreenBuffer, ScreenSize};
