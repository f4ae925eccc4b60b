use thiserror::Error;

/// Top-level error type for the `agrisage-api` crate.
///
/// Every failure mode of a single request lands in exactly one variant:
/// transport, authentication, server-side validation, not-found, other
/// non-success statuses, and body decoding. `agrisage-core` maps these
/// into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The server rejected the bearer token (HTTP 401). The session has
    /// already been expired by the time the caller sees this.
    #[error("Not authenticated: {message}")]
    Unauthorized { message: String },

    /// Login rejected (wrong email or password).
    #[error("Login failed: {message}")]
    LoginRejected { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Server responses ────────────────────────────────────────────
    /// The server refused the payload (HTTP 400 / 422). `message` is the
    /// server's `detail`, surfaced verbatim.
    #[error("Validation failed (HTTP {status}): {message}")]
    Validation { status: u16, message: String },

    /// The addressed entity does not exist (HTTP 404).
    #[error("Not found: {message}")]
    NotFound { path: String, message: String },

    /// Any other non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The token could not be persisted or removed.
    #[error(transparent)]
    TokenStore(#[from] crate::session::TokenStoreError),

    /// Local I/O failure (reading an image before upload).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if the server rejected our credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns `true` if this is a transient error worth a manual retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::NotFound { .. } => true,
            _ => false,
        }
    }

    /// The HTTP status behind this error, when there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } | Self::LoginRejected { .. } => Some(401),
            Self::Validation { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
