use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No such user: {0}")]
    NotFound(String),

    #[error("Username already taken: {0}")]
    Conflict(String),

    /// Underlying store failure (connection, constraint, corrupt row).
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
