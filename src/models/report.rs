use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A generated diagnostic report kept for the patient's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReport {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub content: String,
    pub model: String,
    /// Titles (or leading text) of the knowledge passages fed to the prompt.
    pub knowledge_titles: Vec<String>,
    pub created_at: DateTime<Utc>,
}
