// src/error.rs

//! Error kinds surfaced by the terminal session and the text buffer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by `chisel`.
///
/// `Device` and `Io` come from the operating system. `NoNextLine` and
/// `StaleCursor` reject a single edit and leave the buffer untouched.
/// `InvariantViolation` is an internal defect and should never be produced by
/// a valid sequence of operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A termios, ioctl or signal registration call failed.
    #[error("terminal device error during {op}: {source}")]
    Device {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// A file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `LineJoin` was asked to join the last line of the buffer.
    #[error("no line follows the cursor line")]
    NoNextLine,

    /// The cursor refers to a line that has been deleted.
    #[error("cursor refers to a deleted line")]
    StaleCursor,

    #[error("buffer invariant violated: {0}")]
    InvariantViolation(String),
}

impl Error {
    pub(crate) fn device(op: &'static str, source: impl Into<io::Error>) -> Self {
        Error::Device {
            op,
            source: source.into(),
        }
    }

    /// Whether the error rejects a single edit without any lasting damage.
    pub fn is_rejected_edit(&self) -> bool {
        matches!(self, Error::NoNextLine | Error::StaleCursor)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
