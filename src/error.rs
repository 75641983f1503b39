use rusqlite::ErrorCode;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A foreign key or NOT NULL constraint rejected the write
    #[error("Integrity error: {0}")]
    Integrity(String),

    #[error("Database error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    #[error("Unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: &'static str, column: String },

    #[error("Row {id} in '{table}' is already persisted")]
    AlreadyPersisted { table: &'static str, id: i64 },

    /// A review was linked to a parent that has no id yet
    #[error("Cannot link to a {table} that has not been added to a session")]
    TransientParent { table: &'static str },

    /// The connection is held by an open session
    #[error("A session is open on this database; drop it first")]
    SessionOpen,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }
}

// Constraint failures get their own variant so callers can tell a rejected
// commit apart from a broken connection.
impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref code, ref message)
                if code.code == ErrorCode::ConstraintViolation =>
            {
                let detail = message
                    .clone()
                    .unwrap_or_else(|| "constraint failed".to_string());
                Error::Integrity(detail)
            }
            other => Error::Sqlite(other),
        }
    }
}
