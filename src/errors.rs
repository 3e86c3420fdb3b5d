//! Typed error surfaces for the bridge.
//!
//! Component boundaries use `thiserror` enums so callers can match on a
//! closed set of outcomes (HTTP status mapping, retry decisions). Most
//! internal async functions still return `anyhow::Result` and get wrapped
//! into one of these at the boundary.

use thiserror::Error;

/// Fatal at startup; the process exits before binding a socket.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{field} must be set")]
    MissingRequired { field: &'static str },

    #[error("port {0} is out of range (must be 1-65535)")]
    InvalidPort(u32),

    #[error("project root '{0}' does not exist")]
    ProjectRootMissing(String),

    #[error("session timeout must be greater than zero")]
    InvalidTimeout,

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Git worktree/branch failures. Surfaces as a FAILED session, executor
/// never invoked.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("branch '{0}' already exists")]
    BranchExists(String),

    #[error("base branch '{0}' not found")]
    BaseBranchMissing(String),

    #[error("git command failed: {0}")]
    CommandFailed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Session store I/O failures. Retried once with backoff by the manager
/// during a status transition before being surfaced.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("session '{0}' not found")]
    NotFound(String),

    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raised by an `Executor::execute` call. Caught by the session manager,
/// never escapes the session task.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("executor failed: {0}")]
    Failed(String),

    #[error("execution cancelled")]
    Cancelled,
}

/// Raised by the boss agent. The session manager treats any variant as
/// "delegation declined" and falls through to the direct executor.
#[derive(Error, Debug)]
pub enum DelegationError {
    #[error("strategy '{0}' is not implemented")]
    UnsupportedStrategy(String),

    #[error("task runner error: {0}")]
    Runner(String),

    #[error("delegation timed out")]
    Timeout,
}

/// Outbound calls to the issue tracker or task runner.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{provider}: unauthorized")]
    Unauthorized { provider: &'static str },

    #[error("{provider}: not configured")]
    NotConfigured { provider: &'static str },

    #[error("{provider}: network error: {message}")]
    Network { provider: &'static str, message: String },

    #[error("{provider}: http {status}: {message}")]
    Http {
        provider: &'static str,
        status: u16,
        message: String,
    },
}
