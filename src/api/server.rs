//! API server lifecycle.
//!
//! bind → spawn background task → return handle with shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::router::api_router;
use crate::core_state::CoreState;

/// Metadata for a running server.
#[derive(Debug, Clone, Serialize)]
pub struct ApiSession {
    pub session_id: String,
    pub server_addr: String,
    pub port: u16,
    pub started_at: String,
}

/// Handle to a running API server.
pub struct ApiServer {
    pub session: ApiSession,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ApiServer {
    /// Signal a graceful shutdown. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait for the server task to finish.
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("API server task failed: {e}");
            }
        }
    }
}

/// Bind `addr` (port 0 picks an ephemeral port) and serve the API.
pub async fn start_api_server(
    core: Arc<CoreState>,
    addr: SocketAddr,
    api_keys: &[String],
) -> Result<ApiServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind API server on {addr}: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    if api_keys.is_empty() {
        tracing::warn!("No API keys configured; every protected request will be rejected");
    }

    let app = api_router(core.clone(), api_keys);

    let session = ApiSession {
        session_id: Uuid::new_v4().to_string(),
        server_addr: addr.to_string(),
        port: addr.port(),
        started_at: chrono::Utc::now().to_rfc3339(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        if let Err(e) = core.flush_audit() {
            tracing::warn!(error = %e, "Failed to flush audit log on shutdown");
        }
        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        session,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    use crate::pipeline::knowledge::InMemoryKnowledgeStore;
    use crate::pipeline::report::ReportSettings;

    fn test_core(dir: &tempfile::TempDir) -> Arc<CoreState> {
        Arc::new(CoreState::new(
            dir.path().join("clinic.db"),
            Arc::new(InMemoryKnowledgeStore::new()),
            false,
            None,
            ReportSettings::default(),
        ))
    }

    fn localhost() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    #[tokio::test]
    async fn start_and_stop_server() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = start_api_server(test_core(&dir), localhost(), &["k".into()])
            .await
            .expect("server should start");

        assert!(!server.session.session_id.is_empty());
        assert!(server.session.port > 0);

        let url = format!("http://127.0.0.1:{}/api/health", server.session.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let url = format!("http://127.0.0.1:{}/api/patients", server.session.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

        server.shutdown();
        server.wait().await;
    }

    #[tokio::test]
    async fn authorized_request_over_http() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = start_api_server(test_core(&dir), localhost(), &["secret".into()])
            .await
            .unwrap();

        let resp = reqwest::Client::new()
            .get(format!("http://{}/api/patients", server.session.server_addr))
            .bearer_auth("secret")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["total"], 0);

        server.shutdown();
        server.wait().await;
    }

    #[tokio::test]
    async fn shutdown_flushes_audit_log() {
        let dir = tempfile::tempdir().unwrap();
        let core = test_core(&dir);
        let mut server = start_api_server(core.clone(), localhost(), &["secret".into()])
            .await
            .unwrap();

        reqwest::Client::new()
            .get(format!("http://{}/api/patients", server.session.server_addr))
            .bearer_auth("secret")
            .send()
            .await
            .unwrap();

        server.shutdown();
        server.wait().await;

        let conn = core.open_db().unwrap();
        assert_eq!(crate::db::count_audit_entries(&conn).unwrap(), 1);
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let taken = tokio::net::TcpListener::bind(localhost()).await.unwrap();
        let addr = taken.local_addr().unwrap();
        let result = start_api_server(test_core(&dir), addr, &[]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = start_api_server(test_core(&dir), localhost(), &[])
            .await
            .unwrap();

        server.shutdown();
        server.shutdown();
        server.wait().await;
        server.wait().await;
    }
}
