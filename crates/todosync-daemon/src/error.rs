//! Error types for the todosync binary.
//!
//! [`DaemonError`] is the top-level error type that wraps all possible
//! failure modes during startup and serving.

/// Top-level error for the todosync binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: todosync_server::ConfigError,
    },

    /// The item store could not be opened or migrated.
    #[error("store error: {source}")]
    Store {
        /// The underlying database error.
        #[from]
        source: todosync_db::DbError,
    },

    /// The server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: todosync_server::ServerError,
    },

    /// The log subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
