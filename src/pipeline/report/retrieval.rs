use super::types::ReportSettings;
use super::ReportError;
use crate::models::Patient;
use crate::pipeline::knowledge::{KnowledgeMatch, KnowledgeStore};

/// Search string for a patient: chief complaint followed by tongue color.
pub fn build_search_query(patient: &Patient) -> String {
    let tongue = patient.effective_tongue_color().unwrap_or_default();
    format!("{} {}", patient.chief_complaint, tongue)
        .trim()
        .to_string()
}

/// Fetch knowledge for `query`. A blank query yields no passages and makes
/// no call to the store.
pub async fn retrieve(
    store: &dyn KnowledgeStore,
    query: &str,
    settings: &ReportSettings,
) -> Result<Vec<KnowledgeMatch>, ReportError> {
    if query.trim().is_empty() {
        tracing::debug!("Empty knowledge query, skipping retrieval");
        return Ok(Vec::new());
    }
    let matches = store
        .search(query, settings.knowledge_limit, settings.search_mode)
        .await?;
    tracing::info!(count = matches.len(), "Retrieved knowledge for report");
    Ok(matches)
}
