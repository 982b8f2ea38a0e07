//! Shared application state.
//!
//! Built once at startup (after the remote probe) and handed to every
//! handler and middleware by cheap `Clone`.

use std::sync::Arc;

use axum::http::HeaderMap;

use authgate_core::error::Result;

use crate::config::GatewayConfig;
use crate::context::{PrincipalResolver, SessionPrincipal};
use crate::engine::AuthEngine;
use crate::ledger::{demo, AuditLedger, TrafficLedger};
use crate::obs::GatewayMetrics;
use crate::remote::DecisionTransport;

const DEMO_TRAFFIC_ENTRIES: usize = 25;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    engine: AuthEngine,
    traffic: TrafficLedger,
    metrics: Arc<GatewayMetrics>,
    resolver: Arc<dyn PrincipalResolver>,
}

impl AppState {
    /// Probe the remote decision service and assemble state.
    /// Fails only when the probe fails and fallback is disabled.
    pub async fn connect(
        cfg: GatewayConfig,
        transport: Arc<dyn DecisionTransport>,
        resolver: Arc<dyn PrincipalResolver>,
    ) -> Result<Self> {
        let metrics = Arc::new(GatewayMetrics::default());
        let audit = Arc::new(AuditLedger::new(cfg.ledger.audit_capacity));
        let engine =
            AuthEngine::connect(cfg.engine.clone(), transport, audit, Arc::clone(&metrics)).await?;
        Ok(Self::assemble(cfg, engine, metrics, resolver))
    }

    /// State whose engine only uses the local fallback rules.
    pub fn offline(cfg: GatewayConfig, resolver: Arc<dyn PrincipalResolver>) -> Self {
        let metrics = Arc::new(GatewayMetrics::default());
        let audit = Arc::new(AuditLedger::new(cfg.ledger.audit_capacity));
        let engine = AuthEngine::fallback_only(cfg.engine.clone(), audit, Arc::clone(&metrics));
        Self::assemble(cfg, engine, metrics, resolver)
    }

    fn assemble(
        cfg: GatewayConfig,
        engine: AuthEngine,
        metrics: Arc<GatewayMetrics>,
        resolver: Arc<dyn PrincipalResolver>,
    ) -> Self {
        let traffic = TrafficLedger::new(cfg.ledger.traffic_capacity);
        if cfg.ledger.demo_traffic {
            demo::seed_traffic(&traffic, DEMO_TRAFFIC_ENTRIES);
        }

        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                engine,
                traffic,
                metrics,
                resolver,
            }),
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn engine(&self) -> &AuthEngine {
        &self.inner.engine
    }

    pub fn audit(&self) -> &AuditLedger {
        self.inner.engine.audit()
    }

    pub fn traffic(&self) -> &TrafficLedger {
        &self.inner.traffic
    }

    pub fn metrics(&self) -> &GatewayMetrics {
        &self.inner.metrics
    }

    /// Principal for the request, `None` when anonymous.
    /// Lookup failures are logged and treated as anonymous.
    pub fn resolve_principal(&self, headers: &HeaderMap) -> Option<SessionPrincipal> {
        match self.inner.resolver.resolve(headers) {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!(error = %e, "principal lookup failed, treating as anonymous");
                None
            }
        }
    }

    /// Static assets are served by the host application and are not tracked.
    pub fn is_static(&self, path: &str, route: Option<&str>) -> bool {
        let prefix = &self.inner.cfg.gateway.static_prefix;
        path.starts_with(prefix.as_str()) || route.is_some_and(|r| r.starts_with(prefix.as_str()))
    }

    /// Gauge lines for `/metrics`.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("authgate_remote_connected", u64::from(self.engine().is_connected())),
            ("authgate_audit_entries", self.audit().len() as u64),
            ("authgate_traffic_entries", self.traffic().len() as u64),
            ("authgate_audit_capacity", self.audit().capacity() as u64),
            ("authgate_traffic_capacity", self.traffic().capacity() as u64),
        ]
    }
}
