//! Shared configuration for the agrisage CLI.
//!
//! TOML profiles, token-store selection (keyring or file), and translation
//! to `agrisage_core::AdvisorConfig`. The CLI layers its flag overrides on
//! top.

mod token_store;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use agrisage_core::{AdvisorConfig, MemoryTokenStore, TlsVerification, TokenStore};

pub use token_store::{FileTokenStore, KeyringTokenStore};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use when none is given on the command line.
    pub fn default_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// How long cached reads stay fresh, e.g. `"30s"`.
    #[serde(default = "default_stale_time")]
    pub stale_time: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            stale_time: default_stale_time(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_stale_time() -> String {
    "30s".into()
}

/// Where a profile keeps its session token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    /// System keyring (default).
    #[default]
    Keyring,
    /// File under the data directory.
    File,
    /// Nothing persisted; every run starts signed out.
    Memory,
}

/// A named server profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Server base URL (e.g., "http://localhost:8000").
    pub server: String,

    /// Email used by the last `login`, offered as the default next time.
    pub email: Option<String>,

    #[serde(default)]
    pub token_store: TokenStoreKind,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept invalid TLS certificates.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Override cache stale time (humantime, e.g. "1m").
    pub stale_time: Option<String>,
}

impl Profile {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            email: None,
            token_store: TokenStoreKind::default(),
            ca_cert: None,
            insecure: None,
            timeout: None,
            stale_time: None,
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "agrisage", "agrisage")
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("agrisage");
    p
}

/// Resolve the config file path via XDG / platform conventions.
/// `AGRISAGE_CONFIG` overrides it.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("AGRISAGE_CONFIG") {
        return PathBuf::from(path);
    }
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// File used by [`TokenStoreKind::File`] for `profile_name`.
pub fn token_path(profile_name: &str) -> PathBuf {
    let dir = project_dirs().map_or_else(
        || dirs_fallback().join("tokens"),
        |dirs| dirs.data_dir().join("tokens"),
    );
    dir.join(format!("{profile_name}.token"))
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + `AGRISAGE_` environment (`__` separates nesting,
/// e.g. `AGRISAGE_DEFAULTS__TIMEOUT=60`). A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("AGRISAGE_").split("__").ignore(&["config", "server", "profile"]));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation to runtime config ───────────────────────────────────

/// Parse a humantime duration such as `"45s"` or `"2m"`.
pub fn parse_duration(field: &str, raw: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("'{raw}': {e}"),
    })
}

/// Build the token store a profile asks for.
pub fn token_store_for(profile: &Profile, profile_name: &str) -> Arc<dyn TokenStore> {
    match profile.token_store {
        TokenStoreKind::Keyring => Arc::new(KeyringTokenStore::new(profile_name)),
        TokenStoreKind::File => Arc::new(FileTokenStore::new(token_path(profile_name))),
        TokenStoreKind::Memory => Arc::new(MemoryTokenStore::new()),
    }
}

/// Build an `AdvisorConfig` from a profile and the global defaults.
pub fn profile_to_advisor_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<AdvisorConfig, ConfigError> {
    let url: url::Url = profile
        .server
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "server".into(),
            reason: format!("invalid URL: {}", profile.server),
        })?;

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    let stale_time = parse_duration(
        "stale_time",
        profile.stale_time.as_deref().unwrap_or(&defaults.stale_time),
    )?;

    let mut config = AdvisorConfig::new(url);
    config.tls = tls;
    config.timeout = timeout;
    config.stale_time = stale_time;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile_name(), "default");
        assert_eq!(cfg.defaults.timeout, 30);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn profiles_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "field"

[defaults]
stale_time = "1m"

[profiles.field]
server = "https://advisor.example.org"
token_store = "file"
timeout = 10
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        let profile = cfg.profile("field").unwrap();
        assert_eq!(profile.token_store, TokenStoreKind::File);

        let advisor = profile_to_advisor_config(profile, &cfg.defaults).unwrap();
        assert_eq!(advisor.url.as_str(), "https://advisor.example.org/");
        assert_eq!(advisor.timeout, Duration::from_secs(10));
        assert_eq!(advisor.stale_time, Duration::from_secs(60));
        assert_eq!(advisor.tls, TlsVerification::SystemDefaults);
        assert!(matches!(cfg.profile("nope"), Err(ConfigError::UnknownProfile { .. })));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        let mut profile = Profile::new("http://localhost:8000");
        profile.email = Some("grace@example.com".into());
        profile.insecure = Some(true);
        cfg.profiles.insert("default".into(), profile);
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let profile = loaded.profile("default").unwrap();
        assert_eq!(profile.email.as_deref(), Some("grace@example.com"));
        let advisor = profile_to_advisor_config(profile, &loaded.defaults).unwrap();
        assert_eq!(advisor.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn bad_values_are_validation_errors() {
        let defaults = Defaults::default();
        let mut profile = Profile::new("not a url");
        assert!(matches!(
            profile_to_advisor_config(&profile, &defaults),
            Err(ConfigError::Validation { ref field, .. }) if field == "server"
        ));

        profile.server = "http://localhost:8000".into();
        profile.stale_time = Some("soon".into());
        assert!(matches!(
            profile_to_advisor_config(&profile, &defaults),
            Err(ConfigError::Validation { ref field, .. }) if field == "stale_time"
        ));
    }

    #[test]
    fn token_path_is_per_profile() {
        assert!(token_path("farm-a").ends_with("tokens/farm-a.token"));
    }
}
