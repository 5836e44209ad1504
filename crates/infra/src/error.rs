use thiserror::Error;

use bims_core::DomainError;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository-level error: deterministic domain failures pass through,
/// everything the driver throws is wrapped as `Storage`.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::Domain(DomainError::NotFound),
            sqlx::Error::Database(db)
                if db.kind() == sqlx::error::ErrorKind::UniqueViolation =>
            {
                Self::Domain(DomainError::conflict("record already exists"))
            }
            _ => Self::Storage(err.to_string()),
        }
    }
}

impl RepoError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
