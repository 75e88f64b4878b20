//! Error taxonomy for the transcoder core.
//!
//! `TempoOutOfRange` is deliberately absent here: it is a CLI-layer check
//! (the facade accepts whatever tempo it is given), so it lives on the CLI
//! crate's argument parser instead.

use std::fmt;

use crate::vgm::parser::VgmError;

/// Errors the transcoder core can return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeError {
    /// Failure while decoding the input VGM stream.
    Vgm(VgmError),
    /// More than 65535 unique instruments were interned (BNK directory
    /// indices are `u16`).
    InstrumentOverflow,
    /// Two distinct instruments produced the same `inst_NN` name after
    /// suffixing. Unreachable given the sequential naming scheme, but
    /// guarded against anyway.
    NameCollision { name: String },
}

impl fmt::Display for TranscodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscodeError::Vgm(e) => write!(f, "{e}"),
            TranscodeError::InstrumentOverflow => {
                write!(f, "more than 65535 unique instruments interned")
            }
            TranscodeError::NameCollision { name } => {
                write!(f, "instrument name collision: {name}")
            }
        }
    }
}

impl std::error::Error for TranscodeError {}

impl From<VgmError> for TranscodeError {
    fn from(e: VgmError) -> Self {
        TranscodeError::Vgm(e)
    }
}
