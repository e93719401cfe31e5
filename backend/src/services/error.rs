//! Errors raised by the service layer.

use thiserror::Error;

use crate::access::Denial;
use crate::db::RepositoryError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Business-level failure; each variant maps to one HTTP status.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or invalid input, or a broken business rule.
    #[error("{0}")]
    Validation(String),
    /// Bad credentials or token.
    #[error("{0}")]
    Unauthorized(String),
    /// The caller's role may not do this.
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    /// No technician could be picked for the requested slot.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        if err.is_not_found() {
            ServiceError::NotFound(err.message().to_string())
        } else if err.is_validation() {
            ServiceError::Validation(err.message().to_string())
        } else {
            ServiceError::Repository(err)
        }
    }
}

impl From<Denial> for ServiceError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Forbidden(message) => ServiceError::Forbidden(message),
            Denial::Invalid(message) => ServiceError::Validation(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_keep_their_class() {
        let err: ServiceError = RepositoryError::missing("get_team", "team", 9).into();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err: ServiceError = RepositoryError::validation("serial taken").into();
        assert!(matches!(err, ServiceError::Validation(ref m) if m == "serial taken"));

        let err: ServiceError = RepositoryError::connection("pool exhausted").into();
        assert!(matches!(err, ServiceError::Repository(_)));
    }

    #[test]
    fn test_denials_map_to_forbidden_or_validation() {
        let err: ServiceError = Denial::Forbidden("no".to_string()).into();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let err: ServiceError = Denial::Invalid("wrong tech".to_string()).into();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
