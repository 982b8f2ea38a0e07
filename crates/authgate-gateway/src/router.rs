//! Axum router wiring.
//!
//! Operator endpoints sit behind the `admin::access` permission; every routed
//! request passes through the traffic interceptor.

use axum::{middleware, routing::get, routing::post, Router};

use crate::{app_state::AppState, ops, policy::require_permission, transport};

/// Action required for operator endpoints.
pub const ADMIN_ACTION: &str = "admin::access";

pub fn build_router(state: AppState) -> Router {
    let admin = require_permission(state.clone(), ADMIN_ACTION);

    let router = Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .route("/api/admin/status", admin.clone().wrap(get(ops::status)))
        .route("/api/admin/auth/logs", admin.clone().wrap(get(ops::auth_logs)))
        .route("/api/admin/auth/stats", admin.clone().wrap(get(ops::auth_stats)))
        .route("/api/admin/auth/test", admin.clone().wrap(post(ops::auth_test)))
        .route("/api/admin/traffic/logs", admin.clone().wrap(get(ops::traffic_logs)))
        .route("/api/admin/traffic/stats", admin.wrap(get(ops::traffic_stats)));

    instrument(router, state.clone()).with_state(state)
}

/// Attach the traffic interceptor to any router (host applications mount
/// their own routes through this).
pub fn instrument<S>(router: Router<S>, state: AppState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(state, transport::record_traffic))
}
