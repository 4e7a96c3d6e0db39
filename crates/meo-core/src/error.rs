//! Unified error taxonomy for the meo pipeline.
//!
//! Pixel-level errors propagate through the chunk runner unchanged; chunk
//! failures propagate through the dispatcher, which cancels sibling workers
//! before re-raising. No error is ever converted into a placeholder numeric
//! result except the explicit land/sea sentinel.

use thiserror::Error;

/// Errors raised anywhere in the pipeline.
#[derive(Error, Debug)]
pub enum MeoError {
    /// Invalid chunk/range/solver parameters. Caught before any work starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// Missing or corrupt input time series or mask. Fatal for the affected
    /// chunk; no partial output is written.
    #[error("input data unavailable: {0}")]
    DataUnavailable(String),

    /// Coordinate outside the land/sea mask's covered extent.
    #[error("coordinate {lon}/{lat} outside land-sea mask extent")]
    MaskLookup { lon: f64, lat: f64 },

    /// Precondition violation on optimizer inputs (mismatched or non-finite
    /// flows).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Solver infeasibility, crash, or internal error for one pixel. Fatal
    /// for the containing chunk.
    #[error("solver failed: {0}")]
    Solve(String),

    /// Failure to launch or communicate with a worker process or cluster
    /// job. Triggers cancellation of sibling work.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// Serialization errors (config files, run manifests).
    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the workspace.
pub type MeoResult<T> = Result<T, MeoError>;

impl MeoError {
    /// Stable process exit code for this error kind.
    ///
    /// Chunk workers run as separate OS processes; the dispatcher classifies
    /// a worker failure from its exit status alone, so the mapping must stay
    /// stable across both sides.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            MeoError::Config(_) => ExitCode::Config,
            MeoError::DataUnavailable(_) | MeoError::MaskLookup { .. } => ExitCode::Data,
            MeoError::InvalidInput(_) | MeoError::Solve(_) => ExitCode::Solve,
            MeoError::Dispatch(_) => ExitCode::Dispatch,
            MeoError::Parse(_) | MeoError::Io(_) => ExitCode::Failure,
        }
    }
}

/// Exit codes for chunk worker processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    /// Unclassified failure (I/O, panic, signal).
    Failure = 1,
    Config = 2,
    Data = 3,
    Solve = 4,
    Dispatch = 5,
}

impl ExitCode {
    /// Convert a raw process exit code back to an `ExitCode`.
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => ExitCode::Success,
            2 => ExitCode::Config,
            3 => ExitCode::Data,
            4 => ExitCode::Solve,
            5 => ExitCode::Dispatch,
            _ => ExitCode::Failure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }
}

impl From<toml::de::Error> for MeoError {
    fn from(err: toml::de::Error) -> Self {
        MeoError::Parse(err.to_string())
    }
}
