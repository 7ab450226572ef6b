//! Error types for compilation and pipeline configuration

use thiserror::Error;

/// Fatal compilation failure. No partial document is produced.
#[derive(Debug, Error)]
pub enum CompileError {
    /// An opening code fence with no matching closing fence before
    /// end of input.
    #[error("unterminated code fence opened on line {line}")]
    UnterminatedFence { line: usize },
}

/// Invalid pipeline configuration, raised before compilation starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineConfigError {
    #[error("unknown plugin identifier `{0}`")]
    UnknownPlugin(String),

    #[error("plugin `{id}` is a {actual}-phase plugin, listed under {listed} plugins")]
    WrongPhase {
        id: String,
        actual: &'static str,
        listed: &'static str,
    },

    #[error("plugin `{0}` listed more than once")]
    Duplicate(String),

    #[error("plugin `{before}` must run before `{after}`")]
    InvalidOrder {
        before: &'static str,
        after: &'static str,
    },
}
