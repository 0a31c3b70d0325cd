//! Error taxonomy for `blast`.
//!
//! `ValidationError` covers pre-run failures: the CLI prints the message and a
//! usage block, then exits with code 1, before any connection is opened.
//! `EngineError` tags the per-event faults the engine can hit once it is
//! running; these are never propagated as `Result`s across task boundaries,
//! they are folded into a `LoadEvent`/`ResponseEvent` at the point of failure
//! (see the propagation policy in the design notes).

use std::fmt;

/// A pre-run validation failure. The CLI layer maps every variant to exit
/// code 1 after printing `usage` (whatever that prints is decided by the
/// caller, not by this type).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("URL cannot be blank. URL is of the form host:port.")]
    BlankUrl,
    #[error("-f cannot be blank.")]
    BlankPayloadFilePath,
    #[error("file path: {0} does not exist.")]
    PayloadFileNotFound(String),
    #[error("-t cannot be smaller than or equal to zero.")]
    NonPositiveDialTimeout,
    #[error("-rps cannot be smaller than or equal to zero.")]
    NonPositiveRequestsPerSecond,
    #[error("-z cannot be smaller than or equal to zero.")]
    NonPositiveMaxDuration,
    #[error("-conn cannot be smaller than 1.")]
    NonPositiveConnections,
    #[error("-c cannot be smaller than 1.")]
    NonPositiveConcurrency,
    #[error("-conn cannot be greater than -c.")]
    ConnectionsExceedConcurrency,
    #[error("-c modulo -conn must be equal to zero.")]
    ConcurrencyNotDivisibleByConnections,
    #[error("-Rrs cannot be smaller than 0.")]
    NegativeResponsePayloadSize,
    #[error("both -Rtr and -Rsr cannot be specified.")]
    BothResponseGoalsSpecified,
    #[error("either of -Rtr or -Rsr must be specified.")]
    NoResponseGoalSpecified,
    #[error("-cpus cannot be smaller than 1.")]
    NonPositiveCpus,
}

/// Per-event engine faults. These are kept as a stable, small key space so
/// the report's error-kind histogram groups like failures together instead
/// of keying off raw, unbounded `Display` strings of I/O errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The worker's bound connection slot failed to dial.
    NoConnection,
    /// The write call returned an I/O error. Carries a short description.
    WriteFailed(String),
    /// The write call returned fewer bytes than the payload length.
    WriteIncomplete,
    /// The read call returned an I/O error. Carries a short description.
    ReadFailed(String),
    /// The read deadline elapsed before a full response was read.
    DeadlineExceeded,
    /// The connection closed before a full response was read.
    ShortRead,
}

impl EngineError {
    /// Stable key used to group events by kind in the report histogram.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::NoConnection => "NoConnection",
            EngineError::WriteFailed(_) => "WriteFailed",
            EngineError::WriteIncomplete => "WriteIncomplete",
            EngineError::ReadFailed(_) => "ReadFailed",
            EngineError::DeadlineExceeded => "DeadlineExceeded",
            EngineError::ShortRead => "ShortRead",
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NoConnection => write!(f, "no connection available"),
            EngineError::WriteFailed(detail) => write!(f, "write failed: {detail}"),
            EngineError::WriteIncomplete => write!(f, "write incomplete"),
            EngineError::ReadFailed(detail) => write!(f, "read failed: {detail}"),
            EngineError::DeadlineExceeded => write!(f, "read deadline exceeded"),
            EngineError::ShortRead => write!(f, "connection closed before full response"),
        }
    }
}
