//! The data layer's single error type.

/// Failure of a store operation.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Query, connection or pool failure.
    #[error("postgres: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Applying `migrations/` failed.
    #[error("migration: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value does not fit the domain type.
    #[error("invalid {column} value: {value}")]
    OutOfRange {
        /// Column the value was read from or written to.
        column: &'static str,
        /// The offending value.
        value: i64,
    },

    /// Pool settings are unusable.
    #[error("pool config: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_names_column() {
        let err = DbError::OutOfRange {
            column: "mystic",
            value: -4,
        };
        let msg = err.to_string();
        assert!(msg.contains("mystic"));
        assert!(msg.contains("-4"));
    }
}
