use async_trait::async_trait;

use authgate_core::error::{AuthGateError, Result};

use super::{DecisionTransport, RemoteDecision, RemoteReply, RemoteRequest};
use crate::config::EngineConfig;

const CHECK_PATH: &str = "/v1/authorization/check";

/// JSON-over-HTTP transport.
pub struct HttpDecisionTransport {
    http: reqwest::Client,
    url: String,
}

impl HttpDecisionTransport {
    pub fn new(cfg: &EngineConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AuthGateError::Startup(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            url: format!("http://{}{}", cfg.address(), CHECK_PATH),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DecisionTransport for HttpDecisionTransport {
    async fn check(&self, req: &RemoteRequest) -> Result<RemoteReply> {
        let resp = self
            .http
            .post(&self.url)
            .json(req)
            .send()
            .await
            .map_err(|e| AuthGateError::Transport(e.to_string()))?;

        let status = resp.status();
        let raw = resp
            .text()
            .await
            .map_err(|e| AuthGateError::Transport(format!("read body failed: {e}")))?;

        if !status.is_success() {
            return Err(AuthGateError::Protocol(format!("unexpected status {status}: {raw}")));
        }

        let decision: RemoteDecision = serde_json::from_str(&raw)
            .map_err(|e| AuthGateError::Protocol(format!("invalid decision body: {e}")))?;

        Ok(RemoteReply { decision, raw })
    }
}
