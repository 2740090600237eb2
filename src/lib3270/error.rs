//! Hand-rolled error hierarchy for the core, in the style of the
//! top-level `error.rs`: one `Display`/`std::error::Error` impl per
//! family, no external error crate.

use std::error::Error as StdError;
use std::fmt;

/// What an aborted Order Decoder write should report to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pds {
    OkayNoOutput,
    OkayOutput,
    BadCmd,
    BadAddr,
}

/// A malformed order, over-length address, or unsupported command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    pub message: String,
    pub outcome: Pds,
}

impl ProtocolError {
    pub fn bad_cmd(message: impl Into<String>) -> Self {
        ProtocolError { message: message.into(), outcome: Pds::BadCmd }
    }

    pub fn bad_addr(message: impl Into<String>) -> Self {
        ProtocolError { message: message.into(), outcome: Pds::BadAddr }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "protocol error: {}", self.message)
    }
}

impl StdError for ProtocolError {}

/// A DBCS post-processing violation: either aborts the write (when
/// detected during decode) or is recorded while the buffer is still
/// normalized (when detected in post-processing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbcsError {
    UnpairedSo { addr: usize },
    UnpairedSi { addr: usize },
    SoInDbcsField { addr: usize },
    SiInDbcsField { addr: usize },
    OddLengthRepeatToAddress,
    InvalidDbcsControlCharacter { byte: u8 },
    InvalidDbcsCharacter { byte: u8 },
    OverwriteRightHalf { addr: usize },
    OverwriteLeftHalf { addr: usize },
}

impl fmt::Display for DbcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbcsError::UnpairedSo { addr } => write!(f, "unpaired SO at {addr}"),
            DbcsError::UnpairedSi { addr } => write!(f, "SI without matching SO at {addr}"),
            DbcsError::SoInDbcsField { addr } => write!(f, "SO inside a DBCS field at {addr}"),
            DbcsError::SiInDbcsField { addr } => write!(f, "SI inside a DBCS field at {addr}"),
            DbcsError::OddLengthRepeatToAddress => write!(f, "DBCS RA with odd length"),
            DbcsError::InvalidDbcsControlCharacter { byte } => {
                write!(f, "invalid DBCS RA control character 0x{byte:02X}")
            }
            DbcsError::InvalidDbcsCharacter { byte } => {
                write!(f, "invalid DBCS character 0x{byte:02X}")
            }
            DbcsError::OverwriteRightHalf { addr } => write!(f, "overwriting right half at {addr}"),
            DbcsError::OverwriteLeftHalf { addr } => write!(f, "overwriting left half at {addr}"),
        }
    }
}

impl StdError for DbcsError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    Protocol(ProtocolError),
    Dbcs(DbcsError),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Protocol(e) => write!(f, "{e}"),
            CoreError::Dbcs(e) => write!(f, "{e}"),
        }
    }
}

impl StdError for CoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            CoreError::Protocol(e) => Some(e),
            CoreError::Dbcs(e) => Some(e),
        }
    }
}

impl From<ProtocolError> for CoreError {
    fn from(e: ProtocolError) -> Self {
        CoreError::Protocol(e)
    }
}

impl From<DbcsError> for CoreError {
    fn from(e: DbcsError) -> Self {
        CoreError::Dbcs(e)
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
