//! Error types for session setup and the interactive expect loop.
//!
//! Most failure modes of this crate are deliberately *not* errors: an
//! unsupported protocol aborts setup through the log sink, a read timeout is
//! "no new prompt yet", and end-of-output is a normal termination. The
//! variants below cover what remains.

use thiserror::Error;

/// Errors that can occur during session setup and the expect loop.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A prompt-catalog or host-parameter record failed to parse.
    ///
    /// Record load failures are logged and then re-raised, since a missing
    /// definition is unrecoverable locally.
    #[error("cannot load definition record: {0}")]
    DefinitionLoad(#[from] serde_json::Error),

    /// A prompt fragment in the catalog is not a valid regular expression.
    #[error("invalid prompt pattern: {0}")]
    InvalidPromptPattern(String),

    /// A write was attempted while no spawned process is attached.
    ///
    /// This happens when `send` is called before `spawn`, or after the
    /// session reached its closed phase.
    #[error("session is not open")]
    NotSpawned,

    /// The pseudo-terminal layer failed to open, spawn, or hand out handles.
    #[error(transparent)]
    Pty(#[from] anyhow::Error),

    /// Writing to the spawned process's input stream failed.
    #[error("write to spawned process failed: {0}")]
    Io(#[from] std::io::Error),
}
