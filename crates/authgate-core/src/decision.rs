//! Authorization request and result shapes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::AuthContext;
use crate::error::{AuthGateError, Result};

/// One authorization question: may `principal` perform `action` on `resource`?
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Identity the action is requested for (e.g. an account email).
    pub principal: String,
    /// Namespaced verb, `domain::verb`.
    pub action: String,
    /// Namespaced target, `domain::id`.
    pub resource: String,
    #[serde(default)]
    pub context: AuthContext,
}

impl AuthorizationRequest {
    pub fn new(
        principal: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            principal: principal.into(),
            action: action.into(),
            resource: resource.into(),
            context: AuthContext::new(),
        }
    }

    pub fn with_context(mut self, context: AuthContext) -> Self {
        self.context = context;
        self
    }
}

/// Outcome of an authorization decision. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationResult {
    pub allowed: bool,
    pub reason: String,
    /// True when decided by the local fallback policy.
    pub fallback: bool,
    /// Opaque request identifier assigned by the remote service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Raw remote response, kept for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl AuthorizationResult {
    pub fn fallback_allow(reason: impl Into<String>) -> Self {
        Self::local(true, reason)
    }

    pub fn fallback_deny(reason: impl Into<String>) -> Self {
        Self::local(false, reason)
    }

    fn local(allowed: bool, reason: impl Into<String>) -> Self {
        Self {
            allowed,
            reason: reason.into(),
            fallback: true,
            request_id: None,
            response: None,
        }
    }

    /// Decision returned by the remote service.
    pub fn remote(allowed: bool, request_id: String, response: String) -> Self {
        Self {
            allowed,
            reason: format!("Policy evaluation completed (RequestID: {request_id})"),
            fallback: false,
            request_id: Some(request_id),
            response: Some(response),
        }
    }

    /// Remote path failed; deny without claiming a local decision.
    pub fn remote_failure(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            fallback: false,
            request_id: None,
            response: None,
        }
    }

    /// Evaluation itself broke down.
    pub fn system_error(detail: impl fmt::Display) -> Self {
        Self::fallback_deny(format!("Authorization system error: {detail}"))
    }

    pub fn verdict(&self) -> Verdict {
        if self.allowed {
            Verdict::Allow
        } else {
            Verdict::Deny
        }
    }
}

/// Audit label of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    #[serde(alias = "allow")]
    Allow,
    #[serde(alias = "deny")]
    Deny,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Allow => "ALLOW",
            Verdict::Deny => "DENY",
        }
    }
}

/// Case-insensitive, for query strings and operator input.
impl FromStr for Verdict {
    type Err = AuthGateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALLOW" => Ok(Verdict::Allow),
            "DENY" => Ok(Verdict::Deny),
            _ => Err(AuthGateError::Protocol(format!("unknown verdict: {s}"))),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
