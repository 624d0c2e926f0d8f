use thiserror::Error;

/// Main error type for the claimer
#[derive(Error, Debug)]
pub enum ClaimerError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Chain interaction errors
    #[error("Chain query failed: {0}")]
    Query(String),

    #[error("Claim submission failed: {0}")]
    Submit(String),

    #[error("Reward estimation failed: {0}")]
    Estimation(#[from] EstimationError),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Result type alias for ClaimerError
pub type Result<T> = std::result::Result<T, ClaimerError>;

/// Failures of the pure reward computation.
///
/// These come from an inconsistent chain snapshot and are retried like any
/// other transient failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EstimationError {
    #[error("Division undefined: {field} is zero")]
    DivisionUndefined { field: &'static str },

    #[error("Arithmetic overflow while computing {field}")]
    Overflow { field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimation_error_converts_into_claimer_error() {
        let err: ClaimerError = EstimationError::DivisionUndefined {
            field: "total_unpaid_blocks",
        }
        .into();

        assert!(matches!(err, ClaimerError::Estimation(_)));
        assert_eq!(
            err.to_string(),
            "Reward estimation failed: Division undefined: total_unpaid_blocks is zero"
        );
    }
}
