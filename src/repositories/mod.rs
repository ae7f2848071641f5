pub mod community_repository;
pub mod thread_repository;
pub mod user_repository;

mod populate;

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Attach the failing operation's message to a store error.
pub(crate) trait StoreContext<T> {
    fn context(self, context: &'static str) -> RepositoryResult<T>;
}

impl<T> StoreContext<T> for Result<T, StoreError> {
    fn context(self, context: &'static str) -> RepositoryResult<T> {
        self.map_err(|source| match source {
            StoreError::Conflict(message) => RepositoryError::Conflict(message),
            source => RepositoryError::Store { context, source },
        })
    }
}

/// Trimmed text, rejected when empty or longer than `max` characters.
pub(crate) fn validate_text(field: &str, value: &str, max: usize) -> RepositoryResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RepositoryError::Validation(format!("{} cannot be empty", field)));
    }
    if value.chars().count() > max {
        return Err(RepositoryError::Validation(format!(
            "{} exceeds maximum length of {} characters",
            field, max
        )));
    }
    Ok(value.to_string())
}
