//! Error types for Prooflow.

use thiserror::Error;
use uuid::Uuid;

use crate::types::BatchStatus;

/// Main error type for Prooflow operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Splitting failed
    #[error("split error: {0}")]
    Split(#[from] SplitError),

    /// Batch lifecycle operation failed
    #[error("batch error: {0}")]
    Batch(#[from] BatchError),

    /// Correction collaborator failed
    #[error("correction error: {0}")]
    Correct(#[from] CorrectError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Splitting errors. All map to invalid input or configuration; the splitter
/// itself has no runtime failure modes.
#[derive(Error, Debug)]
pub enum SplitError {
    #[error("input is empty or contains only whitespace")]
    EmptyInput,

    #[error("input too large: {chars} characters, max {max}")]
    InputTooLarge { chars: usize, max: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Batch lifecycle errors.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("capacity exceeded: {active} active batches, max {max}")]
    CapacityExceeded { active: usize, max: usize },

    #[error("batch not found: {0}")]
    NotFound(Uuid),

    #[error("batch {batch_id} is {status}, operation not valid in this state")]
    InvalidState { batch_id: Uuid, status: BatchStatus },
}

/// Correction collaborator errors, recorded per chunk as terminal facts.
#[derive(Error, Debug)]
pub enum CorrectError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("correction canceled")]
    Canceled,
}

/// Result type alias for Prooflow operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_error_display() {
        let err = SplitError::EmptyInput;
        assert_eq!(
            err.to_string(),
            "input is empty or contains only whitespace"
        );

        let err = SplitError::InputTooLarge {
            chars: 120_000,
            max: 100_000,
        };
        assert_eq!(
            err.to_string(),
            "input too large: 120000 characters, max 100000"
        );

        let err = SplitError::InvalidConfig("overlap too large".to_string());
        assert_eq!(err.to_string(), "invalid configuration: overlap too large");
    }

    #[test]
    fn test_batch_error_display() {
        let err = BatchError::CapacityExceeded { active: 5, max: 5 };
        assert_eq!(
            err.to_string(),
            "capacity exceeded: 5 active batches, max 5"
        );

        let id = Uuid::nil();
        let err = BatchError::NotFound(id);
        assert!(err.to_string().contains(&id.to_string()));

        let err = BatchError::InvalidState {
            batch_id: id,
            status: BatchStatus::Processing,
        };
        assert!(err.to_string().contains("processing"));
    }

    #[test]
    fn test_correct_error_display() {
        let err = CorrectError::Provider("rate limited".to_string());
        assert_eq!(err.to_string(), "provider error: rate limited");
        assert_eq!(CorrectError::Canceled.to_string(), "correction canceled");
    }

    #[test]
    fn test_error_from_split_error() {
        let err: Error = SplitError::EmptyInput.into();
        assert!(matches!(err, Error::Split(_)));
        assert!(err.to_string().contains("split error"));
    }

    #[test]
    fn test_error_from_batch_error() {
        let err: Error = BatchError::NotFound(Uuid::nil()).into();
        assert!(matches!(err, Error::Batch(_)));
    }

    #[test]
    fn test_error_from_correct_error() {
        let err: Error = CorrectError::Canceled.into();
        assert!(matches!(err, Error::Correct(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn ok() -> Result<u32> {
            Ok(7)
        }
        fn fail() -> Result<u32> {
            Err(Error::Other("nope".to_string()))
        }

        assert!(ok().is_ok());
        assert!(fail().is_err());
    }
}
