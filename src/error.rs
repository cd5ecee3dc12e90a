use crate::domain::{SeriesId, SeriesKind};

/// Application-level error: a process exit code plus a human-readable message.
///
/// Exit codes:
/// - `2`: input/config/I-O problems
/// - `3`: structurally unusable data (see [`FitError`])
/// - `4`: internal/runtime failures
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Errors raised by the fit selector and point assigner.
///
/// `InvalidValue` is recoverable (the series is excluded and reported);
/// every other variant aborts the run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("{kind} series {label} (#{id}) is not sampled at the shared x domain")]
    DomainMismatch {
        kind: SeriesKind,
        id: SeriesId,
        label: String,
    },

    #[error("candidate set is empty")]
    EmptyCandidateSet,

    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("shared x domain has no samples")]
    EmptyDomain,

    #[error("training series #{training_id}: {reason}")]
    InvalidValue { training_id: SeriesId, reason: String },

    #[error("fit references unknown candidate #{candidate_id}")]
    UnknownCandidate { candidate_id: SeriesId },
}

impl FitError {
    /// Whether the run can continue after this error (by excluding one series).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FitError::InvalidValue { .. })
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        AppError::new(3, err.to_string())
    }
}
