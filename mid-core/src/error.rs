use thiserror::Error;

/// Session-level error taxonomy. Every failure either terminates the session
/// or is an expected control-flow signal; there are no retries.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The scanner counter device could not be queried. Fatal in hardware
    /// mode; falling back to emulation would silently desynchronize from the
    /// scanner, so no fallback exists.
    #[error("scanner hardware unavailable: {0}")]
    HardwareUnavailable(String),

    /// A trial referenced an accuracy level outside the fixed three.
    #[error("accuracy level {0}% is not one of 80/50/20")]
    InvalidLevel(u8),

    /// A trial spec failed validation. Surfaced before any trial begins.
    #[error("malformed trial spec at row {row}: {reason}")]
    MalformedTrialSpec { row: usize, reason: String },

    /// The operator requested termination. Expected control flow, not a
    /// fault; records gathered so far are preserved.
    #[error("quit signal received")]
    UserQuit,
}

pub type Result<T> = std::result::Result<T, TaskError>;
