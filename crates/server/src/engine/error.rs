//! Engine adapter error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Stockfish executable not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Stockfish executable at {} is not executable. Error: {reason}", .path.display())]
    NotExecutable { path: PathBuf, reason: String },

    #[error("Failed to spawn Stockfish: {0}")]
    Spawn(String),

    #[error("Stockfish I/O error: {0}")]
    Io(String),

    #[error("Stockfish engine terminated: {0}")]
    Terminated(String),

    #[error("Stockfish did not answer '{0}' in time")]
    Timeout(&'static str),

    #[error("Stockfish returned an unusable best move: {0}")]
    BadMove(#[from] chess_core::MoveError),
}

impl EngineError {
    /// Missing or non-executable binary, as opposed to a failure while the
    /// engine was running.
    pub fn is_environment(&self) -> bool {
        matches!(self, EngineError::NotFound(_) | EngineError::NotExecutable { .. })
    }
}
