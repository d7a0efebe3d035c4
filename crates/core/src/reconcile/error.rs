//! Errors for the consolidation pipeline.

use thiserror::Error;

/// Batch-level errors raised before any row is processed.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The batch exceeds the configured row limit.
    #[error("Batch of {actual} rows exceeds the maximum of {max}")]
    BatchTooLarge {
        /// Rows in the submitted batch.
        actual: usize,
        /// Configured maximum.
        max: usize,
    },
}

impl ReconcileError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BatchTooLarge { .. } => 400,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_too_large() {
        let err = ReconcileError::BatchTooLarge {
            actual: 1500,
            max: 1000,
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "BATCH_TOO_LARGE");
        assert!(err.to_string().contains("1500"));
    }
}
