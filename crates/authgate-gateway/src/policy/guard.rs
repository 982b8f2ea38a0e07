use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
    Json,
};
use serde_json::json;

use authgate_core::context::keys;
use authgate_core::{AuthContext, AuthorizationRequest};

use crate::app_state::AppState;
use crate::context::RequestOrigin;

/// Derives the resource id from the inbound request.
pub type ResourceFn = Arc<dyn Fn(&Request) -> String + Send + Sync>;

/// Permission check bound to one action (and optionally a resource resolver).
#[derive(Clone)]
pub struct PermissionGuard {
    state: AppState,
    action: Arc<str>,
    resource: Option<ResourceFn>,
}

/// Guard requiring `action`. The resource defaults to `route::<matched route>`.
pub fn require_permission(state: AppState, action: impl Into<String>) -> PermissionGuard {
    PermissionGuard::new(state, action)
}

impl PermissionGuard {
    pub fn new(state: AppState, action: impl Into<String>) -> Self {
        Self {
            state,
            action: Arc::from(action.into()),
            resource: None,
        }
    }

    pub fn with_resource<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request) -> String + Send + Sync + 'static,
    {
        self.resource = Some(Arc::new(f));
        self
    }

    /// Wrap a handler so it only runs when the check allows.
    pub fn wrap<S>(self, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        route.route_layer(middleware::from_fn_with_state(self, enforce))
    }

    fn resource_for(&self, req: &Request, route: &str) -> String {
        match &self.resource {
            Some(f) => f(req),
            None => format!("route::{route}"),
        }
    }
}

async fn enforce(State(guard): State<PermissionGuard>, mut req: Request, next: Next) -> Response {
    let state = &guard.state;

    let Some(principal) = state.resolve_principal(req.headers()) else {
        state.metrics().guard_rejections.inc(&[("status", "401")]);
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Authentication required" })),
        )
            .into_response();
    };

    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let resource = guard.resource_for(&req, &route);

    let mut context = AuthContext::new()
        .with(keys::ROUTE, route)
        .with(keys::METHOD, req.method().as_str());
    if let Ok(Query(args)) = Query::<BTreeMap<String, String>>::try_from_uri(req.uri()) {
        for (k, v) in args {
            context.insert(format!("{}{k}", keys::ARGS_PREFIX), v);
        }
    }
    if let Some(age) = principal.age {
        context.insert(keys::AGE, age);
    }
    if let Some(balance) = principal.account_balance {
        context.insert(keys::ACCOUNT_BALANCE, balance);
    }

    let origin = RequestOrigin::from_request(&req);
    let request = AuthorizationRequest::new(principal.id, &*guard.action, resource)
        .with_context(context);
    let result = state.engine().decide(request, Some(&origin)).await;

    if !result.allowed {
        state.metrics().guard_rejections.inc(&[("status", "403")]);
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Permission denied", "reason": result.reason })),
        )
            .into_response();
    }

    req.extensions_mut().insert(result);
    next.run(req).await
}
