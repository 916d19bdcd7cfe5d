pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Not owner of {0}")]
    NotOwner(String),
}

impl Error {
    /// True when the underlying database rejected a duplicate key.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::DatabaseError(sqlx::Error::Database(e)) => e.is_unique_violation(),
            _ => false,
        }
    }
}
