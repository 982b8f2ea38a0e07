use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::http::{header, HeaderMap};

const UNKNOWN: &str = "unknown";

/// Where a request came from. Outside a request scope both fields are `"unknown"`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOrigin {
    pub ip_address: String,
    pub user_agent: String,
}

impl Default for RequestOrigin {
    fn default() -> Self {
        Self {
            ip_address: UNKNOWN.to_string(),
            user_agent: UNKNOWN.to_string(),
        }
    }
}

impl RequestOrigin {
    pub fn from_request(req: &Request) -> Self {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0);
        Self::from_parts(req.headers(), peer)
    }

    pub fn from_parts(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(UNKNOWN)
            .to_string();
        let ip_address = peer
            .map(|p| p.ip().to_string())
            .unwrap_or_else(|| UNKNOWN.to_string());
        Self {
            ip_address,
            user_agent,
        }
    }
}
