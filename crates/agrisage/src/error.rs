//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use agrisage_config::ConfigError;
use agrisage_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to server at {url}")]
    #[diagnostic(
        code(agrisage::connection_failed),
        help(
            "Check that the advisory server is running and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request to {url} timed out")]
    #[diagnostic(
        code(agrisage::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout { url: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not signed in")]
    #[diagnostic(
        code(agrisage::not_signed_in),
        help(
            "The server rejected the session ({message}).\n\
             Run: agrisage login"
        )
    )]
    NotSignedIn { message: String },

    #[error("Login failed: {message}")]
    #[diagnostic(
        code(agrisage::login_rejected),
        help("Check the email and password, or create an account with: agrisage register")
    )]
    LoginRejected { message: String },

    #[error("Could not access stored credentials: {message}")]
    #[diagnostic(
        code(agrisage::token_store),
        help("Use --token-store file on machines without a system keyring.")
    )]
    TokenStore { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(agrisage::not_found),
        help("Run: agrisage {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Server error: {message}")]
    #[diagnostic(code(agrisage::api_error), help("HTTP status: {status:?}"))]
    Api { status: Option<u16>, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(agrisage::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(agrisage::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: agrisage config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No server configured")]
    #[diagnostic(
        code(agrisage::no_config),
        help(
            "Create a profile with: agrisage config init\n\
             Or pass --server (AGRISAGE_SERVER).\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(agrisage::config))]
    Config(Box<ConfigError>),

    // ── IO / Internal ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(agrisage::io))]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(agrisage::render))]
    Render(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(agrisage::internal))]
    Internal(String),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotSignedIn { .. } | Self::LoginRejected { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::ProfileNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }

    /// Wrap an interactive prompt failure.
    pub fn prompt(e: impl std::fmt::Display) -> Self {
        Self::Validation {
            field: "interactive".into(),
            reason: format!("prompt failed: {e}"),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

fn list_command(entity: &str) -> String {
    match entity {
        "crop" => "crops list <farm>".into(),
        "farm" => "farms list".into(),
        "detection" => "disease history <farm>".into(),
        other => format!("{other}s list"),
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout { url } => Self::Timeout { url },
            CoreError::Unauthorized { message } => Self::NotSignedIn { message },
            CoreError::LoginRejected { message } => Self::LoginRejected { message },
            CoreError::TokenStore { message } => Self::TokenStore { message },
            CoreError::NotFound { entity, identifier } => Self::NotFound {
                list_command: list_command(&entity),
                resource_type: entity,
                identifier,
            },
            CoreError::Validation { field, message } => Self::Validation {
                field: field.unwrap_or_else(|| "input".into()),
                reason: message,
            },
            CoreError::InvalidTransition { from, to } => Self::Validation {
                field: "status".into(),
                reason: format!("cannot move from {from} to {to}"),
            },
            CoreError::Api { message, status } => Self::Api { status, message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Io { message } => Self::Io(std::io::Error::other(message)),
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_categories() {
        let auth: CliError = CoreError::Unauthorized {
            message: "expired".into(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let missing: CliError = CoreError::NotFound {
            entity: "crop".into(),
            identifier: "7".into(),
        }
        .into();
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);

        let invalid: CliError = CoreError::invalid("latitude", "out of range").into();
        assert_eq!(invalid.exit_code(), exit_code::USAGE);

        let down: CliError = CoreError::ConnectionFailed {
            url: "http://localhost:8000".into(),
            reason: "refused".into(),
        }
        .into();
        assert_eq!(down.exit_code(), exit_code::CONNECTION);

        let slow: CliError = CoreError::Timeout {
            url: "http://localhost:8000".into(),
        }
        .into();
        assert_eq!(slow.exit_code(), exit_code::TIMEOUT);
    }

    #[test]
    fn not_found_points_at_list_command() {
        let err: CliError = CoreError::NotFound {
            entity: "crop".into(),
            identifier: "7".into(),
        }
        .into();
        match err {
            CliError::NotFound { list_command, .. } => assert_eq!(list_command, "crops list <farm>"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
