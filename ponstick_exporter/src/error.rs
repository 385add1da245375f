//! Error types for startup configuration and the scrape pipeline.

use std::time::Duration;

/// Fatal startup problems. The process exits before serving when one occurs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SSH_PASSWORD environment variable is required")]
    MissingPassword,

    #[error("invalid {name} value {value:?}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read Lua script {path}: {source}")]
    Script {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Arity violations in the diagnostic script output.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected} lines from Lua script, got {got}")]
    MissingLines { expected: usize, got: usize },

    #[error("unexpected number of {record} values from Lua script: {got} (need at least {expected})")]
    ShortRecord {
        record: &'static str,
        expected: usize,
        got: usize,
    },
}

/// Anything that aborts a scrape cycle after the reset phase.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("failed to dial SSH {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("SSH handshake failed: {0}")]
    Handshake(#[source] ssh2::Error),

    #[error("SSH authentication failed for user {user}: {reason}")]
    Auth { user: String, reason: String },

    #[error("failed to create SSH session: {0}")]
    Channel(#[source] ssh2::Error),

    #[error("failed to read command output: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to execute command: exit status {status}, stderr: {stderr}")]
    Command { status: i32, stderr: String },

    #[error("failed to execute command: killed by signal {signal}, stderr: {stderr}")]
    Signaled { signal: String, stderr: String },

    #[error("failed to collect command exit status: {0}")]
    Exit(#[source] ssh2::Error),

    #[error("remote execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("remote execution worker failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
