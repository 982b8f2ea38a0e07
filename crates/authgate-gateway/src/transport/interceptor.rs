use std::collections::BTreeMap;
use std::time::Instant;

use axum::{
    body::HttpBody,
    extract::{MatchedPath, Query, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::app_state::AppState;
use crate::context::RequestOrigin;
use crate::ledger::traffic::{TrafficLogEntry, ANONYMOUS};
use crate::ledger::round2;

const UNKNOWN_ENDPOINT: &str = "unknown";

/// Traffic middleware. Passes the response through untouched.
pub async fn record_traffic(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let started = Instant::now();

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let route = req.extensions().get::<MatchedPath>().map(|m| m.as_str().to_string());

    if state.is_static(&path, route.as_deref()) {
        return next.run(req).await;
    }

    let origin = RequestOrigin::from_request(&req);
    let referrer = req
        .headers()
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let args = Query::<BTreeMap<String, String>>::try_from_uri(req.uri())
        .map(|Query(a)| a)
        .unwrap_or_default();
    let principal = state
        .resolve_principal(req.headers())
        .map(|p| p.id)
        .unwrap_or_else(|| ANONYMOUS.to_string());

    let response = next.run(req).await;

    let elapsed = started.elapsed();
    let duration_ms = round2(elapsed.as_secs_f64() * 1000.0);
    let status = response.status().as_u16();
    let content_length = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .or_else(|| response.body().size_hint().exact())
        .unwrap_or(0);

    let status_label = status.to_string();
    let metrics = state.metrics();
    metrics
        .http_requests
        .inc(&[("method", method.as_str()), ("status", status_label.as_str())]);
    metrics
        .http_duration
        .observe(&[("method", method.as_str())], elapsed);

    tracing::debug!(%method, %path, status, duration_ms, %principal, ip = %origin.ip_address, "traffic");
    if path.starts_with("/admin") || path.starts_with("/api/admin") {
        tracing::info!(%principal, %method, %path, status, duration_ms, "admin access");
    }

    state.traffic().record_now(|id, timestamp| TrafficLogEntry {
        id,
        timestamp,
        method,
        path,
        endpoint: route.unwrap_or_else(|| UNKNOWN_ENDPOINT.to_string()),
        status_code: status,
        duration_ms,
        ip_address: origin.ip_address,
        user_agent: origin.user_agent,
        principal,
        content_length,
        referrer,
        args,
    });

    response
}
