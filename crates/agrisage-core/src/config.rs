// ── Runtime connection configuration ──
//
// Describes how to reach the advisory server and how long cached reads
// stay fresh. The CLI builds an `AdvisorConfig` from its profile and
// hands it in; core never reads config files.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use agrisage_api::{TlsMode, TransportConfig};

use crate::cache::DEFAULT_STALE_TIME;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed development servers).
    DangerAcceptInvalid,
}

/// Configuration for talking to one advisory server.
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    /// Server base URL (e.g., `http://localhost:8000`).
    pub url: Url,
    pub tls: TlsVerification,
    /// Upper bound on a single request.
    pub timeout: Duration,
    /// How long a cached read counts as fresh.
    pub stale_time: Duration,
}

impl AdvisorConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            stale_time: DEFAULT_STALE_TIME,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_transport_defaults() {
        let cfg = AdvisorConfig::new("http://localhost:8000".parse().unwrap());
        let transport = cfg.transport();
        assert_eq!(transport.tls, TlsMode::System);
        assert_eq!(transport.timeout, TransportConfig::default().timeout);
        assert_eq!(cfg.stale_time, Duration::from_secs(30));
    }
}
