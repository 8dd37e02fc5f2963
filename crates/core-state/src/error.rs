//! User-facing error conditions raised by the editor core (as opposed to
//! internal invariant violations, which stay as `anyhow::Error`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid pattern: {0}")]
    BadPattern(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("buffer is read-only")]
    ReadOnly,

    #[error("no file name")]
    NoFileName,

    #[error("{0}: not part of this core")]
    Unsupported(&'static str),
}
