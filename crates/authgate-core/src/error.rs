//! Shared error type across authgate crates.

use thiserror::Error;

/// Coarse error category (stable label for logs and metrics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or inconsistent configuration.
    Config,
    /// Remote decision service unreachable or the connection failed.
    Transport,
    /// Remote decision service answered with something we cannot use.
    Protocol,
    /// Remote call exceeded its deadline.
    Timeout,
    /// Startup could not complete.
    Startup,
    /// Principal/session lookup failed.
    Lookup,
    /// Internal error.
    Internal,
}

impl ErrorKind {
    /// String representation used in metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Transport => "transport",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Startup => "startup",
            ErrorKind::Lookup => "lookup",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, AuthGateError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum AuthGateError {
    #[error("invalid config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("remote call timed out after {0} ms")]
    Timeout(u64),
    #[error("startup failed: {0}")]
    Startup(String),
    #[error("lookup failed: {0}")]
    Lookup(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl AuthGateError {
    /// Map the error to its category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthGateError::Config(_) | AuthGateError::UnsupportedVersion => ErrorKind::Config,
            AuthGateError::Transport(_) => ErrorKind::Transport,
            AuthGateError::Protocol(_) => ErrorKind::Protocol,
            AuthGateError::Timeout(_) => ErrorKind::Timeout,
            AuthGateError::Startup(_) => ErrorKind::Startup,
            AuthGateError::Lookup(_) => ErrorKind::Lookup,
            AuthGateError::Internal(_) => ErrorKind::Internal,
        }
    }
}
