//! authgate server
//!
//! - Config: optional `authgate.yaml` plus `AUTHGATE_*` environment overrides
//! - Logs: console at `RUST_LOG` (default info); `AUTHGATE_DETAIL_LOG` adds a debug file
//! - Remote decision service probed once before the listener binds
//! - Operator endpoints under `/api/admin`, traffic recorded for every route

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use authgate_core::error::{AuthGateError, Result};
use authgate_gateway::{app_state, config, context, obs, remote, router};

#[tokio::main]
async fn main() -> Result<()> {
    let detail_log = std::env::var_os(config::DETAIL_LOG_VAR).map(PathBuf::from);
    obs::logging::init(detail_log.as_deref())?;

    let cfg = config::load_from_env()?;
    let listen = cfg.gateway.listen_addr()?;

    let transport = Arc::new(remote::HttpDecisionTransport::new(&cfg.engine)?);
    let resolver = Arc::new(context::HeaderPrincipalResolver);
    let state = app_state::AppState::connect(cfg, transport, resolver).await?;
    tracing::info!(connected = state.engine().is_connected(), "decision engine ready");

    let app = router::build_router(state);

    tracing::info!(%listen, "authgate starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| AuthGateError::Startup(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|e| AuthGateError::Internal(format!("server failed: {e}")))
}
