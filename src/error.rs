//! Error types for prisma-bench.

use thiserror::Error;

/// The main error type for benchmark operations.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The engine rejected a rendered statement.
    #[error("Query caused error: {message}")]
    Statement { message: String },

    /// A connection could not be opened or closed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Batch planning was given inputs it cannot partition.
    #[error("Plan error: {0}")]
    Plan(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration file.
    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BenchError {
    /// Create a statement error from the engine's message.
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement {
            message: message.into(),
        }
    }

    /// Whether the engine refused a CREATE because the table is already there.
    ///
    /// Matches the MySQL wording (`Table 't1' already exists`) as well as
    /// Postgres (`relation "t1" already exists`).
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::Statement { message } => message.contains("already exists"),
            _ => false,
        }
    }
}

impl From<sqlx::Error> for BenchError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) => Self::statement(db.message()),
            sqlx::Error::Io(e) => Self::Connection(e.to_string()),
            sqlx::Error::Tls(e) => Self::Connection(e.to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => Self::Connection(e.to_string()),
            other => Self::statement(other.to_string()),
        }
    }
}

/// Result type alias for benchmark operations.
pub type BenchResult<T> = Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BenchError::statement("Table 't1' already exists");
        assert_eq!(err.to_string(), "Query caused error: Table 't1' already exists");
    }

    #[test]
    fn test_already_exists_detection() {
        assert!(BenchError::statement("Table 't1' already exists").is_already_exists());
        assert!(BenchError::statement("relation \"t1\" already exists").is_already_exists());
        assert!(!BenchError::statement("Unknown column 'z'").is_already_exists());
        assert!(!BenchError::Connection("already exists".into()).is_already_exists());
    }
}
