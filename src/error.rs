//! Error taxonomy for the engine's fallible boundaries.
//!
//! Per the error handling design, most failures (decode errors, command
//! argument errors, transition denials) are log-level only and never reach
//! a `Result` — see [`crate::coordinator`] and [`crate::input`]. Only the
//! renderer's TTY writes and terminal setup/teardown propagate `Err`.

use std::io;

/// Errors that cross a propagating boundary (terminal I/O, rendering).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("render attempt failed: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
