//! Shared application state for the HTTP layer.
//!
//! `CoreState` owns the database location, the knowledge store and the
//! optional chat model. Handlers open a fresh SQLite connection per
//! request via `open_db()`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::ServerConfig;
use crate::db;
use crate::pipeline::knowledge::{InMemoryKnowledgeStore, KnowledgeStore, WeaviateStore};
use crate::pipeline::report::{ChatModel, DeepSeekClient, ReportError, ReportSettings};

/// Maximum audit buffer size before flush.
const AUDIT_BUFFER_CAPACITY: usize = 50;

pub struct CoreState {
    db_path: PathBuf,
    knowledge: Arc<dyn KnowledgeStore>,
    /// True when an external vector service backs `knowledge`.
    knowledge_configured: bool,
    chat_model: Option<Arc<dyn ChatModel>>,
    report_settings: ReportSettings,
    audit: AuditLogger,
}

impl CoreState {
    /// Build state from configuration: migrate the database and set up
    /// the upstream clients. Missing upstream credentials are logged, not
    /// fatal.
    pub fn from_config(config: &ServerConfig) -> Result<Self, CoreError> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CoreError::Setup(format!("data dir: {e}")))?;
            }
        }
        // Opening runs migrations.
        db::open_database(&config.database_path)?;

        let (knowledge, knowledge_configured): (Arc<dyn KnowledgeStore>, bool) =
            match config.knowledge.url.as_deref().filter(|u| !u.trim().is_empty()) {
                Some(url) => {
                    let store = WeaviateStore::new(&config.knowledge, url)
                        .map_err(|e| CoreError::Setup(e.to_string()))?;
                    tracing::info!(
                        url,
                        class = store.class_name(),
                        "Using Weaviate knowledge store"
                    );
                    (Arc::new(store), true)
                }
                None => {
                    tracing::warn!("No vector store URL configured, knowledge is kept in memory");
                    (Arc::new(InMemoryKnowledgeStore::new()), false)
                }
            };

        let chat_model: Option<Arc<dyn ChatModel>> = match DeepSeekClient::new(&config.llm) {
            Ok(client) => Some(Arc::new(client)),
            Err(ReportError::NotConfigured(what)) => {
                tracing::warn!("{what} missing, report generation disabled");
                None
            }
            Err(e) => return Err(CoreError::Setup(e.to_string())),
        };

        Ok(Self::new(
            config.database_path.clone(),
            knowledge,
            knowledge_configured,
            chat_model,
            config.report.clone(),
        ))
    }

    pub fn new(
        db_path: PathBuf,
        knowledge: Arc<dyn KnowledgeStore>,
        knowledge_configured: bool,
        chat_model: Option<Arc<dyn ChatModel>>,
        report_settings: ReportSettings,
    ) -> Self {
        Self {
            db_path,
            knowledge,
            knowledge_configured,
            chat_model,
            report_settings,
            audit: AuditLogger::new(),
        }
    }

    /// Open a database connection. Most common operation in handlers.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn knowledge(&self) -> &dyn KnowledgeStore {
        self.knowledge.as_ref()
    }

    pub fn knowledge_configured(&self) -> bool {
        self.knowledge_configured
    }

    pub fn chat_model(&self) -> Option<&dyn ChatModel> {
        self.chat_model.as_deref()
    }

    pub fn report_settings(&self) -> &ReportSettings {
        &self.report_settings
    }

    // ── Audit ───────────────────────────────────────────────

    /// Record an API access. Flushes to SQLite once the buffer fills.
    pub fn log_access(&self, client_id: &str, action: &str, status: u16) {
        tracing::info!(client_id, action, status, "api_access");
        if self.audit.log(client_id, action, status) {
            if let Err(e) = self.flush_audit() {
                tracing::warn!(error = %e, "Failed to flush audit log");
            }
        }
    }

    /// Write all buffered audit entries to the database.
    pub fn flush_audit(&self) -> Result<usize, CoreError> {
        let conn = self.open_db()?;
        self.audit.flush_to_db(&conn)
    }

    pub fn pending_audit_entries(&self) -> usize {
        self.audit.buffer_len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Setup failed: {0}")]
    Setup(String),
}

// ═══════════════════════════════════════════════════════════
// Audit buffer
// ═══════════════════════════════════════════════════════════

/// In-memory buffer of API access events, flushed to `audit_log`.
pub struct AuditLogger {
    buffer: Mutex<Vec<AuditEntry>>,
}

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub client_id: String,
    pub action: String,
    pub status: u16,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::with_capacity(AUDIT_BUFFER_CAPACITY)),
        }
    }

    /// Buffer an event. Returns `true` once the flush threshold is reached.
    pub fn log(&self, client_id: &str, action: &str, status: u16) -> bool {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.push(AuditEntry {
                timestamp: chrono::Utc::now(),
                client_id: client_id.to_string(),
                action: action.to_string(),
                status,
            });
            buf.len() >= AUDIT_BUFFER_CAPACITY
        } else {
            false
        }
    }

    pub fn drain(&self) -> Vec<AuditEntry> {
        self.buffer
            .lock()
            .map(|mut buf| buf.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.lock().map(|buf| buf.len()).unwrap_or(0)
    }

    pub fn flush_to_db(&self, conn: &rusqlite::Connection) -> Result<usize, CoreError> {
        let entries = self.drain();
        for e in &entries {
            db::insert_audit_entry(
                conn,
                &e.timestamp.to_rfc3339(),
                &e.client_id,
                &e.action,
                e.status,
            )?;
        }
        if !entries.is_empty() {
            tracing::debug!(count = entries.len(), "Flushed audit entries to database");
        }
        Ok(entries.len())
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}
