use thiserror::Error;

use crate::validation::ValidationErrors;

/// Every failure a service can signal. The HTTP layer maps each variant to
/// exactly one status code.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),
    /// Absent or owned by another user; callers cannot tell which.
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("unauthorized")]
    Unauthorized,
    /// Unknown share token or workspace not public.
    #[error("workspace not found or is not public")]
    ShareAccess,
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// True for failures the caller caused (bad input, missing rows, no session).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::NotFound(_) | Error::Unauthorized | Error::ShareAccess
        )
    }
}
