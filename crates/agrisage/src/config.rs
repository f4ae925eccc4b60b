//! Profile resolution: config file + global flags → `AdvisorConfig` and a
//! token store.
//!
//! Core never sees profiles; it receives a pre-built `AdvisorConfig`.

use std::sync::Arc;
use std::time::Duration;

use agrisage_config::{Config, Profile, TokenStoreKind};
use agrisage_core::{AdvisorConfig, TlsVerification, TokenStore};

use crate::cli::{GlobalOpts, TokenStoreArg};
use crate::error::CliError;

/// Everything a server-bound command needs.
pub struct Resolved {
    pub profile_name: String,
    pub advisor: AdvisorConfig,
    pub store: Arc<dyn TokenStore>,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// Comma-separated profile names for diagnostics.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build the runtime configuration for a server-bound command.
///
/// Precedence: flag / env > profile > defaults. Without a profile, a
/// `--server` flag alone is enough.
pub fn resolve(global: &GlobalOpts, config: &Config) -> Result<Resolved, CliError> {
    let profile_name = active_profile_name(global, config);

    let mut profile = match (config.profiles.get(&profile_name), &global.server) {
        (Some(profile), _) => profile.clone(),
        (None, Some(server)) if global.profile.is_none() => Profile::new(server.clone()),
        (None, _) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(config),
            });
        }
        (None, _) => {
            return Err(CliError::NoConfig {
                path: agrisage_config::config_path().display().to_string(),
            });
        }
    };

    if let Some(ref server) = global.server {
        profile.server.clone_from(server);
    }
    if let Some(kind) = global.token_store {
        profile.token_store = match kind {
            TokenStoreArg::Keyring => TokenStoreKind::Keyring,
            TokenStoreArg::File => TokenStoreKind::File,
            TokenStoreArg::Memory => TokenStoreKind::Memory,
        };
    }

    let mut advisor = agrisage_config::profile_to_advisor_config(&profile, &config.defaults)?;
    if global.insecure {
        advisor.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        advisor.timeout = Duration::from_secs(secs);
    }

    tracing::debug!(
        profile = %profile_name,
        server = %advisor.url,
        store = ?profile.token_store,
        "resolved profile"
    );

    Ok(Resolved {
        store: agrisage_config::token_store_for(&profile, &profile_name),
        profile_name,
        advisor,
    })
}
