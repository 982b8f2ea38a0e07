#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;

use authgate_core::ErrorKind;
use authgate_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
engine:
  endpoint: "pdp.internal"
  prot: 9094 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.engine.endpoint, "localhost");
    assert_eq!(cfg.engine.port, 9094);
    assert!(cfg.engine.fallback_allowed);
    assert_eq!(cfg.ledger.audit_capacity, 1000);
    assert_eq!(cfg.ledger.traffic_capacity, 1000);
    assert_eq!(cfg.gateway.static_prefix, "/static/");
}

#[test]
fn rejects_unsupported_version_and_bad_ranges() {
    assert!(config::load_from_str("version: 2\n").is_err());

    let bad_timeout = "version: 1\nengine:\n  timeout_ms: 0\n";
    assert!(config::load_from_str(bad_timeout).is_err());

    let bad_listen = "version: 1\ngateway:\n  listen: \"not-an-addr\"\n";
    assert!(config::load_from_str(bad_listen).is_err());

    let zero_capacity = "version: 1\nledger:\n  audit_capacity: 0\n";
    assert!(config::load_from_str(zero_capacity).is_err());
}

#[test]
fn env_overrides_engine_settings() {
    let env: HashMap<&str, &str> = HashMap::from([
        (config::ENDPOINT_VAR, "pdp.internal"),
        (config::PORT_VAR, "9100"),
        (config::WORKSPACE_VAR, "875986860059"),
        (config::POLICY_STORE_VAR, "store-1"),
        (config::FALLBACK_VAR, "false"),
    ]);

    let mut cfg = config::load_from_str("version: 1\n").unwrap();
    config::apply_env_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string())).unwrap();

    assert_eq!(cfg.engine.address(), "pdp.internal:9100");
    assert_eq!(cfg.engine.workspace_id, "875986860059");
    assert_eq!(cfg.engine.policy_store_id, "store-1");
    assert!(!cfg.engine.fallback_allowed);
}

#[test]
fn env_overrides_reject_garbage() {
    let mut cfg = config::load_from_str("version: 1\n").unwrap();
    let err = config::apply_env_overrides(&mut cfg, |k| {
        (k == config::FALLBACK_VAR).then(|| "maybe".to_string())
    })
    .expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::Config);

    let err = config::apply_env_overrides(&mut cfg, |k| {
        (k == config::PORT_VAR).then(|| "99999".to_string())
    })
    .expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::Config);
}
