//! Remote decision service adapter.
//!
//! The wire protocol sits behind [`DecisionTransport`]; the adapter in
//! [`client`] bounds each call with a timeout and folds every failure into a
//! uniform deny result.

pub mod client;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use authgate_core::{AuthContext, Result};

pub use client::AuthorizationClient;
pub use http::HttpDecisionTransport;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteContext {
    pub workspace_id: String,
    pub policy_store_id: String,
    #[serde(skip_serializing_if = "AuthContext::is_empty")]
    pub attributes: AuthContext,
}

/// Structured request sent to the remote decision service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteRequest {
    pub subject: EntityRef,
    pub resource: EntityRef,
    pub action: EntityRef,
    pub context: RemoteContext,
}

/// Decision body returned by the remote service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteDecision {
    pub decision: bool,
    #[serde(default)]
    pub request_id: String,
}

/// Decision plus the raw body it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteReply {
    pub decision: RemoteDecision,
    pub raw: String,
}

/// One round trip to the remote decision service.
#[async_trait]
pub trait DecisionTransport: Send + Sync {
    async fn check(&self, req: &RemoteRequest) -> Result<RemoteReply>;
}
