//! Error types for the collector binary.
//!
//! [`CollectorAppError`] wraps every failure mode of a single invocation so
//! `main` can propagate with `?` and exit non-zero.

/// Top-level error for one collector invocation.
#[derive(Debug, thiserror::Error)]
pub enum CollectorAppError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: gymwatch_core::ConfigError,
    },

    /// The tracing subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },

    /// Connecting or migrating failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying store error.
        #[from]
        source: gymwatch_db::DbError,
    },

    /// The collection run failed; nothing was committed.
    #[error("collection error: {source}")]
    Collection {
        /// The underlying collector error.
        #[from]
        source: gymwatch_core::CollectorError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_run_surfaces_as_collection_error() {
        let err = CollectorAppError::from(gymwatch_core::CollectorError::Busy { lock_key: 5 });
        assert!(matches!(err, CollectorAppError::Collection { .. }));
        assert!(err.to_string().starts_with("collection error"));
    }

    #[test]
    fn invalid_region_surfaces_as_config_error() {
        let region = gymwatch_core::config::RegionConfig::default();
        let err = region.geofence().map(|_| ()).map_err(CollectorAppError::from);
        assert!(matches!(err, Err(CollectorAppError::Config { .. })));
    }
}
