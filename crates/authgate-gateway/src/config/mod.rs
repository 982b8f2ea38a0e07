//! Gateway config loader (strict YAML file + environment overrides).

pub mod schema;

use std::{env, fs, path::Path};

use authgate_core::error::{AuthGateError, Result};

pub use schema::{EngineConfig, GatewayConfig, GatewaySection, LedgerSection};

/// Config file path override.
pub const CONFIG_PATH_VAR: &str = "AUTHGATE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "authgate.yaml";

pub const ENDPOINT_VAR: &str = "AUTHGATE_ENDPOINT";
pub const PORT_VAR: &str = "AUTHGATE_PORT";
pub const WORKSPACE_VAR: &str = "AUTHGATE_WORKSPACE_ID";
pub const POLICY_STORE_VAR: &str = "AUTHGATE_POLICY_STORE_ID";
pub const FALLBACK_VAR: &str = "AUTHGATE_FALLBACK_ALLOWED";
pub const LISTEN_VAR: &str = "AUTHGATE_LISTEN";
/// Optional path of the debug-level detail log.
pub const DETAIL_LOG_VAR: &str = "AUTHGATE_DETAIL_LOG";

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| AuthGateError::Config(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg = parse_yaml(s)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Startup entry point: optional file, then process environment, then validation.
pub fn load_from_env() -> Result<GatewayConfig> {
    let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut cfg = if Path::new(&path).exists() {
        let s = fs::read_to_string(&path)
            .map_err(|e| AuthGateError::Config(format!("read config failed: {e}")))?;
        parse_yaml(&s)?
    } else {
        tracing::info!(%path, "config file not found, using defaults");
        GatewayConfig::default()
    };

    apply_env_overrides(&mut cfg, |k| env::var(k).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

/// Overlay environment values onto `cfg`. `lookup` abstracts the environment.
pub fn apply_env_overrides<F>(cfg: &mut GatewayConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup(ENDPOINT_VAR) {
        cfg.engine.endpoint = v;
    }
    if let Some(v) = lookup(PORT_VAR) {
        cfg.engine.port = v
            .trim()
            .parse()
            .map_err(|_| AuthGateError::Config(format!("{PORT_VAR} is not a port: {v}")))?;
    }
    if let Some(v) = lookup(WORKSPACE_VAR) {
        cfg.engine.workspace_id = v;
    }
    if let Some(v) = lookup(POLICY_STORE_VAR) {
        cfg.engine.policy_store_id = v;
    }
    if let Some(v) = lookup(FALLBACK_VAR) {
        cfg.engine.fallback_allowed = parse_bool(FALLBACK_VAR, &v)?;
    }
    if let Some(v) = lookup(LISTEN_VAR) {
        cfg.gateway.listen = v;
    }
    Ok(())
}

fn parse_yaml(s: &str) -> Result<GatewayConfig> {
    serde_yaml::from_str(s).map_err(|e| AuthGateError::Config(format!("invalid yaml: {e}")))
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AuthGateError::Config(format!("{name} is not a boolean: {raw}"))),
    }
}
