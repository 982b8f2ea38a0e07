#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use authgate_core::context::keys;
use authgate_core::error::{AuthGateError, ErrorKind, Result};
use authgate_core::{AuthContext, AuthorizationRequest, Verdict};
use authgate_gateway::config::EngineConfig;
use authgate_gateway::context::RequestOrigin;
use authgate_gateway::engine::AuthEngine;
use authgate_gateway::ledger::{AuditFilter, AuditLedger};
use authgate_gateway::obs::GatewayMetrics;
use authgate_gateway::remote::{
    AuthorizationClient, DecisionTransport, RemoteDecision, RemoteReply, RemoteRequest,
};

const PROBE_ACTION: &str = "test::action";

#[derive(Clone, Copy)]
enum Mode {
    Allow,
    Deny,
    Fail,
    Hang,
    Panic,
}

/// Answers the startup probe as configured, then behaves per `mode`.
struct Scripted {
    probe_ok: bool,
    mode: Mode,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(probe_ok: bool, mode: Mode) -> Arc<Self> {
        Arc::new(Self {
            probe_ok,
            mode,
            calls: AtomicUsize::new(0),
        })
    }
}

fn reply(decision: bool) -> RemoteReply {
    RemoteReply {
        decision: RemoteDecision {
            decision,
            request_id: "req-42".to_string(),
        },
        raw: format!(r#"{{"decision":{decision},"request_id":"req-42"}}"#),
    }
}

#[async_trait]
impl DecisionTransport for Scripted {
    async fn check(&self, req: &RemoteRequest) -> Result<RemoteReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if req.action.id == PROBE_ACTION {
            return if self.probe_ok {
                Ok(reply(true))
            } else {
                Err(AuthGateError::Transport("connection refused".into()))
            };
        }
        match self.mode {
            Mode::Allow => Ok(reply(true)),
            Mode::Deny => Ok(reply(false)),
            Mode::Fail => Err(AuthGateError::Transport("connection reset".into())),
            Mode::Hang => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(reply(true))
            }
            Mode::Panic => panic!("decoder exploded"),
        }
    }
}

fn cfg(fallback_allowed: bool, timeout_ms: u64) -> EngineConfig {
    EngineConfig {
        workspace_id: "ws-1".into(),
        policy_store_id: "ps-1".into(),
        fallback_allowed,
        timeout_ms,
        ..EngineConfig::default()
    }
}

async fn engine(mode: Mode) -> (AuthEngine, Arc<GatewayMetrics>) {
    let metrics = Arc::new(GatewayMetrics::default());
    let engine = AuthEngine::connect(
        cfg(true, 50),
        Scripted::new(true, mode),
        Arc::new(AuditLedger::new(100)),
        Arc::clone(&metrics),
    )
    .await
    .unwrap();
    (engine, metrics)
}

fn purchase() -> AuthorizationRequest {
    AuthorizationRequest::new("player@example.com", "game::purchase", "game::g1")
        .with_context(AuthContext::new().with("age", 20).with("account_balance", 5).with("game_price", 10))
}

#[tokio::test]
async fn remote_allow_carries_request_id() {
    let (engine, _) = engine(Mode::Allow).await;
    assert!(engine.is_connected());

    let r = engine.decide(purchase(), None).await;
    assert!(r.allowed);
    assert!(!r.fallback);
    assert_eq!(r.request_id.as_deref(), Some("req-42"));
    assert_eq!(r.reason, "Policy evaluation completed (RequestID: req-42)");
    assert!(r.response.unwrap().contains("req-42"));
}

#[tokio::test]
async fn remote_deny_is_not_a_fallback() {
    let (engine, _) = engine(Mode::Deny).await;
    let r = engine.decide(purchase(), None).await;
    assert!(!r.allowed);
    assert!(!r.fallback);
}

#[tokio::test]
async fn remote_error_denies_without_fallback() {
    let (engine, metrics) = engine(Mode::Fail).await;
    let r = engine.decide(purchase(), None).await;
    assert!(!r.allowed);
    assert!(!r.fallback);
    assert!(r.reason.contains("connection reset"), "{}", r.reason);
    assert_eq!(metrics.remote_errors.get(&[("kind", "transport")]), 1);
}

#[tokio::test]
async fn remote_timeout_denies_without_fallback() {
    let (engine, metrics) = engine(Mode::Hang).await;

    let started = std::time::Instant::now();
    let r = engine.decide(purchase(), None).await;
    assert!(started.elapsed() < Duration::from_secs(2));

    assert!(!r.allowed);
    assert!(!r.fallback);
    assert!(r.reason.contains("50"), "{}", r.reason);
    assert_eq!(metrics.remote_errors.get(&[("kind", "timeout")]), 1);
}

#[tokio::test]
async fn panic_during_evaluation_becomes_system_error() {
    let (engine, _) = engine(Mode::Panic).await;
    let r = engine.decide(purchase(), None).await;
    assert!(!r.allowed);
    assert!(r.fallback);
    assert!(r.reason.starts_with("Authorization system error"), "{}", r.reason);
    assert!(r.reason.contains("decoder exploded"));

    // the failure is still audited
    let logs = engine.audit().query(10, &AuditFilter::default());
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].result, Verdict::Deny);
}

#[tokio::test]
async fn probe_failure_with_fallback_runs_local_rules() {
    let transport = Scripted::new(false, Mode::Allow);
    let engine = AuthEngine::connect(
        cfg(true, 50),
        Arc::clone(&transport) as Arc<dyn DecisionTransport>,
        Arc::new(AuditLedger::new(100)),
        Arc::new(GatewayMetrics::default()),
    )
    .await
    .unwrap();
    assert!(!engine.is_connected());
    assert!(!engine.status().connected);

    let r = engine.decide(purchase(), None).await;
    assert!(!r.allowed);
    assert!(r.fallback);
    assert_eq!(r.reason, "Insufficient account balance");

    // only the probe hit the transport
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn probe_failure_without_fallback_is_fatal() {
    let err = AuthEngine::connect(
        cfg(false, 50),
        Scripted::new(false, Mode::Allow),
        Arc::new(AuditLedger::new(100)),
        Arc::new(GatewayMetrics::default()),
    )
    .await
    .err()
    .unwrap();
    assert_eq!(err.kind(), ErrorKind::Startup);
}

#[tokio::test]
async fn probe_timeout_counts_as_unavailable() {
    struct Silent;
    #[async_trait]
    impl DecisionTransport for Silent {
        async fn check(&self, _: &RemoteRequest) -> Result<RemoteReply> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(reply(true))
        }
    }

    let engine = AuthEngine::connect(
        cfg(true, 20),
        Arc::new(Silent),
        Arc::new(AuditLedger::new(10)),
        Arc::new(GatewayMetrics::default()),
    )
    .await
    .unwrap();
    assert!(!engine.is_connected());
}

#[tokio::test]
async fn every_decision_is_audited_once() {
    let metrics = Arc::new(GatewayMetrics::default());
    let engine = AuthEngine::fallback_only(
        cfg(true, 50),
        Arc::new(AuditLedger::new(100)),
        Arc::clone(&metrics),
    );

    let a = engine
        .check_permission("alice@example.com", "game::view", "game::g1", AuthContext::new())
        .await;
    let b = engine
        .check_permission("admin@example.com", "admin::access", "route::/admin", AuthContext::new())
        .await;
    let c = engine
        .check_permission("bob@example.com", "profile::view", "profile::carol@example.com", AuthContext::new())
        .await;
    assert!(a.allowed && b.allowed && !c.allowed);

    let logs = engine.audit().query(10, &AuditFilter::default());
    assert_eq!(logs.len(), 3);
    let bob = logs.iter().find(|e| e.principal == "bob@example.com").unwrap();
    assert_eq!(bob.result, Verdict::Deny);
    assert_eq!(bob.reason, "Can only access own profile");
    assert!(bob.fallback);
    assert!(bob.duration_ms >= 0.0);

    assert_eq!(metrics.authz_decisions.get(&[("result", "allow"), ("path", "fallback")]), 2);
    assert_eq!(metrics.authz_decisions.get(&[("result", "deny"), ("path", "fallback")]), 1);
}

#[tokio::test]
async fn context_is_enriched_with_origin() {
    let engine = AuthEngine::fallback_only(
        cfg(true, 50),
        Arc::new(AuditLedger::new(10)),
        Arc::new(GatewayMetrics::default()),
    );

    engine
        .check_permission("a@example.com", "game::view", "game::g1", AuthContext::new())
        .await;
    let origin = RequestOrigin {
        ip_address: "10.0.0.7".into(),
        user_agent: "curl/8".into(),
    };
    let req = AuthorizationRequest::new("b@example.com", "game::view", "game::g1");
    engine.decide(req, Some(&origin)).await;

    let logs = engine.audit().query(10, &AuditFilter::default());
    let a = logs.iter().find(|e| e.principal == "a@example.com").unwrap();
    assert_eq!(a.context.text(keys::IP_ADDRESS), Some("unknown"));
    assert_eq!(a.context.text(keys::USER_AGENT), Some("unknown"));
    assert!(a.context.contains_key(keys::TIMESTAMP));

    let b = logs.iter().find(|e| e.principal == "b@example.com").unwrap();
    assert_eq!(b.context.text(keys::IP_ADDRESS), Some("10.0.0.7"));
    assert_eq!(b.context.text(keys::USER_AGENT), Some("curl/8"));
}

#[tokio::test]
async fn test_authorization_echoes_request() {
    let engine = AuthEngine::fallback_only(
        cfg(true, 50),
        Arc::new(AuditLedger::new(10)),
        Arc::new(GatewayMetrics::default()),
    );
    let req = AuthorizationRequest::new("kid@example.com", "game::purchase", "game::g9")
        .with_context(AuthContext::new().with("age", 12).with("game_rating", "M"));

    let out = engine.test_authorization(req.clone(), None).await;
    assert!(out.success);
    assert!(!out.allowed);
    assert!(out.fallback);
    assert_eq!(out.reason, "Age restriction: User too young for mature content");
    assert_eq!(out.request, req);
}

#[tokio::test]
async fn status_reports_configuration() {
    let (engine, _) = engine(Mode::Allow).await;
    let s = engine.status();
    assert!(s.connected);
    assert_eq!(s.endpoint, "localhost:9094");
    assert_eq!(s.workspace_id, "ws-1");
    assert_eq!(s.policy_store_id, "ps-1");
    assert!(s.fallback_enabled);
}

#[test]
fn remote_request_carries_workspace_and_context() {
    let client = AuthorizationClient::new(
        cfg(true, 50),
        Scripted::new(true, Mode::Allow),
        Arc::new(GatewayMetrics::default()),
    );
    let remote = client.build_request(&purchase());
    assert_eq!(remote.subject.id, "player@example.com");
    assert_eq!(remote.action.id, "game::purchase");
    assert_eq!(remote.resource.id, "game::g1");
    assert_eq!(remote.context.workspace_id, "ws-1");
    assert_eq!(remote.context.policy_store_id, "ps-1");
    assert_eq!(remote.context.attributes.number("game_price"), Some(10.0));
}

/// Holds decisions for `slow` long enough that faster ones overtake it.
struct Staggered;

#[async_trait]
impl DecisionTransport for Staggered {
    async fn check(&self, req: &RemoteRequest) -> Result<RemoteReply> {
        if req.subject.id == "slow" {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        Ok(reply(true))
    }
}

#[tokio::test]
async fn audit_order_follows_completion_under_overlap() {
    let engine = AuthEngine::connect(
        cfg(true, 1000),
        Arc::new(Staggered),
        Arc::new(AuditLedger::new(2)),
        Arc::new(GatewayMetrics::default()),
    )
    .await
    .unwrap();

    let slow = engine.decide(AuthorizationRequest::new("slow", "game::view", "game::g1"), None);
    let fast = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        engine
            .decide(AuthorizationRequest::new("fast1", "game::view", "game::g1"), None)
            .await;
        engine
            .decide(AuthorizationRequest::new("fast2", "game::view", "game::g1"), None)
            .await;
    };
    tokio::join!(slow, fast);

    // fast1 was appended first, so it is the one evicted
    let logs = engine.audit().query(10, &AuditFilter::default());
    let order: Vec<&str> = logs.iter().map(|e| e.principal.as_str()).collect();
    assert_eq!(order, ["slow", "fast2"]);
    assert!(logs[0].timestamp >= logs[1].timestamp);

    // the context still carries the decision start time
    let started = logs[0].context.text(keys::TIMESTAMP).unwrap();
    let started = chrono::DateTime::parse_from_rfc3339(started).unwrap();
    assert!(started < logs[1].timestamp);
}
