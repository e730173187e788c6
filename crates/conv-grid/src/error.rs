//! Error surface shared with external compute routines.

use thiserror::Error;

/// Failure reported across the compute-routine boundary.
///
/// The partitioning and address arithmetic itself has no failure mode; the
/// only errors the driver can surface come from the routine it invokes.
#[derive(Debug, Error)]
pub enum RoutineError {
    #[error("compute routine rejected {stage}: {message}")]
    Rejected { stage: &'static str, message: String },
    #[error("compute routine execution failure: {message}")]
    Execution { message: String },
}

impl RoutineError {
    pub fn rejected(stage: &'static str, message: impl Into<String>) -> Self {
        RoutineError::Rejected {
            stage,
            message: message.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        RoutineError::Execution {
            message: message.into(),
        }
    }
}

/// Convenience alias for results crossing the routine boundary.
pub type RoutineResult<T> = Result<T, RoutineError>;
