//! Operational and operator HTTP endpoints.
//!
//! - `/healthz`                      : liveness
//! - `/metrics`                      : Prometheus text format
//! - `/api/admin/status`             : remote connection status
//! - `/api/admin/auth/logs|stats`    : audit ledger
//! - `/api/admin/traffic/logs|stats` : traffic ledger
//! - `/api/admin/auth/test`          : run a decision and echo the request

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_with::{serde_as, NoneAsEmptyString};

use authgate_core::AuthorizationRequest;

use crate::app_state::AppState;
use crate::context::RequestOrigin;
use crate::engine::{AuthorizationTest, EngineStatus};
use crate::ledger::{
    AuditFilter, AuditLogEntry, AuditStats, TrafficFilter, TrafficLogEntry, TrafficStats,
};

const DEFAULT_LIMIT: usize = 100;

/// `?limit=`; absent or empty means the default.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct Page {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Page {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics().render(&state.metrics_extra());

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}

pub async fn status(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.engine().status())
}

pub async fn auth_logs(
    State(state): State<AppState>,
    Query(page): Query<Page>,
    Query(filter): Query<AuditFilter>,
) -> Json<Vec<AuditLogEntry>> {
    Json(state.audit().query(page.limit(), &filter))
}

pub async fn auth_stats(State(state): State<AppState>) -> Json<AuditStats> {
    Json(state.audit().stats())
}

pub async fn traffic_logs(
    State(state): State<AppState>,
    Query(page): Query<Page>,
    Query(filter): Query<TrafficFilter>,
) -> Json<Vec<TrafficLogEntry>> {
    Json(state.traffic().query(page.limit(), &filter))
}

pub async fn traffic_stats(State(state): State<AppState>) -> Json<TrafficStats> {
    Json(state.traffic().stats())
}

/// Run a decision for an arbitrary request, attributed to the caller's origin.
pub async fn auth_test(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(request): Json<AuthorizationRequest>,
) -> Json<AuthorizationTest> {
    let origin = RequestOrigin::from_parts(&headers, peer.map(|ConnectInfo(addr)| addr));
    Json(state.engine().test_authorization(request, Some(&origin)).await)
}
