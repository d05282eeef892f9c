//! Error types
//!
//! Proxy and static-file failures are converted into responses at the handler
//! boundary; `StartupError` is the only error that can stop the process.

use hyper::StatusCode;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which proxy endpoint produced an error, used in client-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    Html,
    Image,
}

impl fmt::Display for ProxyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Html => f.write_str("URL"),
            Self::Image => f.write_str("image"),
        }
    }
}

/// Failures of `/proxy/html` and `/proxy/image`
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Missing url parameter")]
    MissingParameter,

    /// Network failure, timeout or non-2xx upstream status
    #[error("Failed to fetch {kind}: {source}")]
    UpstreamFetch {
        kind: ProxyKind,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch {kind}: response body exceeds {limit} bytes")]
    UpstreamTooLarge { kind: ProxyKind, limit: u64 },

    #[error("Server error: {0}")]
    Unhandled(#[from] hyper::http::Error),
}

impl ProxyError {
    pub fn upstream(kind: ProxyKind, source: reqwest::Error) -> Self {
        Self::UpstreamFetch { kind, source }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter => StatusCode::BAD_REQUEST,
            Self::UpstreamFetch { .. } | Self::UpstreamTooLarge { .. } | Self::Unhandled(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Failures resolving a request path under the static root
#[derive(Debug, Error)]
pub enum StaticFileError {
    #[error("Forbidden")]
    Forbidden,

    #[error("File not found")]
    NotFound,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StaticFileError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound | Self::Io(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Text sent to the client; I/O details stay in the error log
    pub const fn client_message(&self) -> &'static str {
        match self {
            Self::Forbidden => "Forbidden",
            Self::NotFound | Self::Io(_) => "File not found",
        }
    }
}

/// Errors that abort startup
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Static root '{}' is not accessible: {source}", .path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Static root '{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
