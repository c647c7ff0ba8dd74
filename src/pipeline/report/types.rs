use async_trait::async_trait;
use serde::Serialize;

use super::ReportError;
use crate::pipeline::knowledge::{KnowledgeMatch, SearchMode};

pub const DEFAULT_KNOWLEDGE_LIMIT: usize = 3;

/// Retrieval knobs for report generation.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub knowledge_limit: usize,
    pub search_mode: SearchMode,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            knowledge_limit: DEFAULT_KNOWLEDGE_LIMIT,
            search_mode: SearchMode::NearText,
        }
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct TcmReport {
    pub content: String,
    pub model: String,
    pub search_query: String,
    pub knowledge: Vec<KnowledgeMatch>,
}

/// Hosted chat-completion model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ReportError>;

    fn model_name(&self) -> &str;
}
