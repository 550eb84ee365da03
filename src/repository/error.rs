// ==========================================
// MES Core - repository layer errors
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{entity} not found (id={id})")]
    NotFound { entity: String, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("lock acquisition failed: {0}")]
    LockError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(ref msg)) if msg.contains("UNIQUE") => {
                RepositoryError::Conflict(msg.clone())
            }
            rusqlite::Error::SqliteFailure(_, Some(ref msg)) if msg.contains("FOREIGN KEY") => {
                RepositoryError::InvariantViolation(msg.clone())
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "row".to_string(),
                id: "unknown".to_string(),
            },
            other => RepositoryError::DatabaseError(other.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for RepositoryError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        RepositoryError::LockError(err.to_string())
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
