use std::net::SocketAddr;

use serde::Deserialize;
use authgate_core::error::{AuthGateError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub ledger: LedgerSection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            engine: EngineConfig::default(),
            ledger: LedgerSection::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(AuthGateError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.engine.validate()?;
        self.ledger.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Requests under this prefix are static assets and never reach the traffic ledger.
    #[serde(default = "default_static_prefix")]
    pub static_prefix: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            static_prefix: default_static_prefix(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen.parse::<SocketAddr>().map_err(|_| {
            AuthGateError::Config(format!("gateway.listen is not a socket address: {}", self.listen))
        })?;
        if !self.static_prefix.starts_with('/') {
            return Err(AuthGateError::Config(
                "gateway.static_prefix must start with '/'".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| AuthGateError::Config(format!("gateway.listen: {e}")))
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_static_prefix() -> String {
    "/static/".into()
}

/// Remote decision service settings. Loaded once at startup, immutable afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub workspace_id: String,

    #[serde(default)]
    pub policy_store_id: String,

    /// Continue with local rules when the remote service cannot be reached at startup.
    #[serde(default = "default_true")]
    pub fallback_allowed: bool,

    /// Deadline for a single remote decision.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            port: default_port(),
            workspace_id: String::new(),
            policy_store_id: String::new(),
            fallback_allowed: true,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(AuthGateError::Config("engine.endpoint must not be empty".into()));
        }
        if self.port == 0 {
            return Err(AuthGateError::Config("engine.port must not be 0".into()));
        }
        if !(10..=60000).contains(&self.timeout_ms) {
            return Err(AuthGateError::Config(
                "engine.timeout_ms must be between 10 and 60000".into(),
            ));
        }
        Ok(())
    }

    /// `host:port` of the remote decision service.
    pub fn address(&self) -> String {
        format!("{}:{}", self.endpoint, self.port)
    }
}

fn default_endpoint() -> String {
    "localhost".into()
}
fn default_port() -> u16 {
    9094
}
fn default_true() -> bool {
    true
}
fn default_timeout_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerSection {
    #[serde(default = "default_capacity")]
    pub audit_capacity: usize,

    #[serde(default = "default_capacity")]
    pub traffic_capacity: usize,

    /// Seed the traffic ledger with sample entries at startup.
    #[serde(default)]
    pub demo_traffic: bool,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            audit_capacity: default_capacity(),
            traffic_capacity: default_capacity(),
            demo_traffic: false,
        }
    }
}

impl LedgerSection {
    pub fn validate(&self) -> Result<()> {
        for (name, cap) in [
            ("ledger.audit_capacity", self.audit_capacity),
            ("ledger.traffic_capacity", self.traffic_capacity),
        ] {
            if !(1..=100_000).contains(&cap) {
                return Err(AuthGateError::Config(format!(
                    "{name} must be between 1 and 100000"
                )));
            }
        }
        Ok(())
    }
}

fn default_capacity() -> usize {
    crate::ledger::DEFAULT_CAPACITY
}
