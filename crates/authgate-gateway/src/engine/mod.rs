//! Authorization decision point.
//!
//! Picks the remote or fallback path, measures latency, and appends exactly
//! one audit entry per decision. `decide` never fails: every breakdown is
//! folded into a deny result.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::FutureExt;
use serde::Serialize;

use authgate_core::context::keys;
use authgate_core::error::{AuthGateError, Result};
use authgate_core::{fallback, AuthContext, AuthorizationRequest, AuthorizationResult};

use crate::config::EngineConfig;
use crate::context::RequestOrigin;
use crate::ledger::{round2, AuditLedger, AuditLogEntry};
use crate::obs::GatewayMetrics;
use crate::remote::{AuthorizationClient, DecisionTransport};

/// Connection snapshot for operators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub connected: bool,
    pub endpoint: String,
    pub workspace_id: String,
    pub policy_store_id: String,
    pub fallback_enabled: bool,
}

/// Diagnostic echo returned by [`AuthEngine::test_authorization`].
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationTest {
    pub success: bool,
    pub allowed: bool,
    pub reason: String,
    pub fallback: bool,
    pub request: AuthorizationRequest,
}

pub struct AuthEngine {
    cfg: EngineConfig,
    /// Present only when the startup probe succeeded.
    client: Option<AuthorizationClient>,
    audit: Arc<AuditLedger>,
    metrics: Arc<GatewayMetrics>,
}

impl AuthEngine {
    /// Probe the remote service once. A failed probe is fatal unless
    /// `fallback_allowed`, in which case the engine runs on local rules for
    /// the lifetime of the process.
    pub async fn connect(
        cfg: EngineConfig,
        transport: Arc<dyn DecisionTransport>,
        audit: Arc<AuditLedger>,
        metrics: Arc<GatewayMetrics>,
    ) -> Result<Self> {
        tracing::info!(
            endpoint = %cfg.address(),
            workspace_id = %cfg.workspace_id,
            policy_store_id = %cfg.policy_store_id,
            "connecting to remote decision service"
        );

        let client = AuthorizationClient::new(cfg.clone(), transport, Arc::clone(&metrics));
        match client.probe().await {
            Ok(()) => Ok(Self {
                cfg,
                client: Some(client),
                audit,
                metrics,
            }),
            Err(e) if cfg.fallback_allowed => {
                tracing::warn!(error = %e, "remote decision service unavailable, continuing with fallback rules");
                Ok(Self::fallback_only(cfg, audit, metrics))
            }
            Err(e) => Err(AuthGateError::Startup(format!(
                "remote decision service unavailable at {}: {e}",
                cfg.address()
            ))),
        }
    }

    /// Engine that never contacts the remote service.
    pub fn fallback_only(
        cfg: EngineConfig,
        audit: Arc<AuditLedger>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            cfg,
            client: None,
            audit,
            metrics,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    pub fn audit(&self) -> &AuditLedger {
        &self.audit
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            connected: self.is_connected(),
            endpoint: self.cfg.address(),
            workspace_id: self.cfg.workspace_id.clone(),
            policy_store_id: self.cfg.policy_store_id.clone(),
            fallback_enabled: self.cfg.fallback_allowed,
        }
    }

    /// Convenience for callers outside a request scope.
    pub async fn check_permission(
        &self,
        principal: &str,
        action: &str,
        resource: &str,
        context: AuthContext,
    ) -> AuthorizationResult {
        let req = AuthorizationRequest::new(principal, action, resource).with_context(context);
        self.decide(req, None).await
    }

    /// Decide and return the result alongside an echo of the request.
    pub async fn test_authorization(
        &self,
        req: AuthorizationRequest,
        origin: Option<&RequestOrigin>,
    ) -> AuthorizationTest {
        let echo = req.clone();
        let result = self.decide(req, origin).await;
        AuthorizationTest {
            success: true,
            allowed: result.allowed,
            reason: result.reason,
            fallback: result.fallback,
            request: echo,
        }
    }

    pub async fn decide(
        &self,
        mut req: AuthorizationRequest,
        origin: Option<&RequestOrigin>,
    ) -> AuthorizationResult {
        let started = Instant::now();
        let started_at = Utc::now();

        let default_origin = RequestOrigin::default();
        let origin = origin.unwrap_or(&default_origin);
        req.context.insert(keys::TIMESTAMP, started_at.to_rfc3339());
        req.context.insert(keys::IP_ADDRESS, origin.ip_address.as_str());
        req.context.insert(keys::USER_AGENT, origin.user_agent.as_str());

        tracing::info!(principal = %req.principal, action = %req.action, resource = %req.resource, "authorization request");
        tracing::debug!(context = ?req.context, "authorization context");

        let path = if self.is_connected() { "remote" } else { "fallback" };
        let result = match AssertUnwindSafe(self.evaluate(&req)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let detail = panic_detail(panic.as_ref());
                tracing::error!(principal = %req.principal, action = %req.action, error = %detail, "authorization evaluation failed");
                AuthorizationResult::system_error(detail)
            }
        };

        let elapsed = started.elapsed();
        self.observe(&req, &result, path, elapsed);

        // the context keeps the start time; the entry is stamped when appended
        let reason = result.reason.clone();
        let (verdict, fallback) = (result.verdict(), result.fallback);
        let duration_ms = round2(elapsed.as_secs_f64() * 1000.0);
        self.audit.record_now(|id, timestamp| AuditLogEntry {
            id,
            timestamp,
            principal: req.principal,
            action: req.action,
            resource: req.resource,
            context: req.context,
            result: verdict,
            reason,
            duration_ms,
            fallback,
        });

        result
    }

    async fn evaluate(&self, req: &AuthorizationRequest) -> AuthorizationResult {
        match &self.client {
            Some(client) => client.remote_check(req).await,
            None => fallback::evaluate(req),
        }
    }

    fn observe(
        &self,
        req: &AuthorizationRequest,
        result: &AuthorizationResult,
        path: &str,
        elapsed: Duration,
    ) {
        let verdict = if result.allowed { "allow" } else { "deny" };
        self.metrics
            .authz_decisions
            .inc(&[("result", verdict), ("path", path)]);
        self.metrics.authz_duration.observe(&[("path", path)], elapsed);

        tracing::info!(
            principal = %req.principal,
            action = %req.action,
            resource = %req.resource,
            result = %result.verdict(),
            fallback = result.fallback,
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            "authorization result"
        );
        if !result.allowed {
            tracing::warn!(principal = %req.principal, action = %req.action, reason = %result.reason, "access denied");
        }
    }
}

fn panic_detail(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "evaluation panicked".to_string()
    }
}
