//! Server Implementation
//!
//! HTTP 服务器启动和管理

use std::sync::Arc;
use std::time::Duration;

use crate::catalog::SessionRegistry;
use crate::core::{Config, Result, ServerError, ServerState};

/// 空闲会话扫描间隔
const SESSION_SWEEP_INTERVAL_SECS: u64 = 60;

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<()> {
        self.config.validate()?;

        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config)?,
        };

        let sweeper = spawn_session_sweeper(
            state.sessions.clone(),
            self.config.session_idle_timeout_ms,
        );
        let app = crate::api::build_app(&self.config).with_state(state);

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(ServerError::Bind)?;
        tracing::info!("Menu server listening on {}", addr);

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;
        sweeper.abort();
        served.map_err(|e| ServerError::Internal(e.into()))?;

        Ok(())
    }
}

/// 定时回收长时间未使用的编辑会话
fn spawn_session_sweeper(
    sessions: Arc<SessionRegistry>,
    idle_timeout_ms: u64,
) -> tokio::task::JoinHandle<()> {
    let max_idle_ms = i64::try_from(idle_timeout_ms).unwrap_or(i64::MAX);
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(SESSION_SWEEP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            let expired = sessions.sweep_idle(max_idle_ms);
            if expired > 0 {
                tracing::info!(expired, open_sessions = sessions.len(), "Idle sessions swept");
            }
        }
    })
}
