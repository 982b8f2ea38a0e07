use std::sync::Arc;
use std::time::Duration;

use authgate_core::error::{AuthGateError, Result};
use authgate_core::{AuthorizationRequest, AuthorizationResult};

use super::{DecisionTransport, EntityRef, RemoteContext, RemoteRequest};
use crate::config::EngineConfig;
use crate::obs::GatewayMetrics;

const PROBE_PRINCIPAL: &str = "test@example.com";
const PROBE_ACTION: &str = "test::action";
const PROBE_RESOURCE: &str = "test::resource";

/// Adapter between decision requests and the remote service.
/// Never lets a transport failure escape [`AuthorizationClient::remote_check`].
pub struct AuthorizationClient {
    cfg: EngineConfig,
    transport: Arc<dyn DecisionTransport>,
    timeout: Duration,
    metrics: Arc<GatewayMetrics>,
}

impl AuthorizationClient {
    pub fn new(
        cfg: EngineConfig,
        transport: Arc<dyn DecisionTransport>,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        let timeout = Duration::from_millis(cfg.timeout_ms);
        Self {
            cfg,
            transport,
            timeout,
            metrics,
        }
    }

    pub fn build_request(&self, req: &AuthorizationRequest) -> RemoteRequest {
        RemoteRequest {
            subject: EntityRef { id: req.principal.clone() },
            resource: EntityRef { id: req.resource.clone() },
            action: EntityRef { id: req.action.clone() },
            context: RemoteContext {
                workspace_id: self.cfg.workspace_id.clone(),
                policy_store_id: self.cfg.policy_store_id.clone(),
                attributes: req.context.clone(),
            },
        }
    }

    /// Remote decision; any failure becomes a deny with `fallback=false`.
    pub async fn remote_check(&self, req: &AuthorizationRequest) -> AuthorizationResult {
        match self.try_check(req).await {
            Ok(result) => result,
            Err(e) => {
                self.metrics.remote_errors.inc(&[("kind", e.kind().as_str())]);
                tracing::error!(
                    principal = %req.principal,
                    action = %req.action,
                    kind = e.kind().as_str(),
                    error = %e,
                    "remote decision failed"
                );
                AuthorizationResult::remote_failure(format!("Remote decision error: {e}"))
            }
        }
    }

    pub async fn try_check(&self, req: &AuthorizationRequest) -> Result<AuthorizationResult> {
        let remote = self.build_request(req);
        tracing::debug!(endpoint = %self.cfg.address(), principal = %req.principal, "remote decision request");

        let reply = tokio::time::timeout(self.timeout, self.transport.check(&remote))
            .await
            .map_err(|_| AuthGateError::Timeout(self.cfg.timeout_ms))??;

        tracing::debug!(response = %reply.raw, "remote decision response");
        Ok(AuthorizationResult::remote(
            reply.decision.decision,
            reply.decision.request_id,
            reply.raw,
        ))
    }

    /// Startup connectivity check with a fixed synthetic request.
    pub async fn probe(&self) -> Result<()> {
        let req = AuthorizationRequest::new(PROBE_PRINCIPAL, PROBE_ACTION, PROBE_RESOURCE);
        let result = self.try_check(&req).await?;
        tracing::info!(
            endpoint = %self.cfg.address(),
            allowed = result.allowed,
            request_id = result.request_id.as_deref().unwrap_or(""),
            "remote decision service reachable"
        );
        Ok(())
    }
}
