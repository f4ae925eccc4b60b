// ── Core error types ──
//
// User-facing errors from agrisage-core. Consumers never see raw HTTP
// plumbing; the `From<agrisage_api::Error>` impl translates transport
// errors into domain categories. `CoreError` is `Clone` because a single
// in-flight request may be awaited by many readers at once.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    // ── Authentication ───────────────────────────────────────────────
    /// The server rejected the session token. Credentials are gone.
    #[error("Not signed in: {message}")]
    Unauthorized { message: String },

    #[error("Login failed: {message}")]
    LoginRejected { message: String },

    #[error("Credential storage failed: {message}")]
    TokenStore { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    /// Rejected input, either by a local check before sending or by the
    /// server (message verbatim).
    #[error("Validation failed: {message}")]
    Validation {
        field: Option<String>,
        message: String,
    },

    #[error("Cannot change recommendation status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration / local errors ─────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Local validation failure for a named field.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field.to_owned()),
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<agrisage_api::Error> for CoreError {
    fn from(err: agrisage_api::Error) -> Self {
        use agrisage_api::Error as Api;

        match err {
            Api::Unauthorized { message } => CoreError::Unauthorized { message },
            Api::LoginRejected { message } => CoreError::LoginRejected { message },
            Api::Transport(ref e) => {
                let url = e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string);
                if e.is_timeout() {
                    CoreError::Timeout { url }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url,
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            Api::Validation { message, .. } => CoreError::Validation {
                field: None,
                message,
            },
            Api::NotFound { path, .. } => {
                let (entity, identifier) = entity_from_path(&path);
                CoreError::NotFound { entity, identifier }
            }
            Api::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            Api::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            Api::TokenStore(e) => CoreError::TokenStore {
                message: e.to_string(),
            },
            Api::Io(e) => CoreError::Io {
                message: e.to_string(),
            },
        }
    }
}

impl From<agrisage_api::TokenStoreError> for CoreError {
    fn from(err: agrisage_api::TokenStoreError) -> Self {
        CoreError::TokenStore {
            message: err.to_string(),
        }
    }
}

/// Name the entity behind a 404 from its request path: the segment before
/// the last numeric id, singularized (`/farms/1/crops/7/irrigation` is
/// crop `7`).
fn entity_from_path(path: &str) -> (String, String) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let id_pos = segments
        .iter()
        .rposition(|s| s.parse::<i64>().is_ok());

    match id_pos {
        Some(pos) if pos > 0 => {
            let entity = segments[pos - 1];
            let entity = entity.strip_suffix('s').unwrap_or(entity);
            (entity.to_owned(), segments[pos].to_owned())
        }
        _ => ("resource".into(), path.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_entity_from_path() {
        assert_eq!(
            entity_from_path("/farms/99"),
            ("farm".to_owned(), "99".to_owned())
        );
        assert_eq!(
            entity_from_path("/farms/1/crops/7/irrigation"),
            ("crop".to_owned(), "7".to_owned())
        );
        assert_eq!(
            entity_from_path("/auth/me"),
            ("resource".to_owned(), "/auth/me".to_owned())
        );
    }

    #[test]
    fn server_validation_keeps_detail() {
        let err = CoreError::from(agrisage_api::Error::Validation {
            status: 400,
            message: "Email already registered".into(),
        });
        assert_eq!(err.to_string(), "Validation failed: Email already registered");
    }

    #[test]
    fn unauthorized_maps_through() {
        let err = CoreError::from(agrisage_api::Error::Unauthorized {
            message: "expired".into(),
        });
        assert!(err.is_unauthorized());
    }
}
