//! Test doubles for the report pipeline.

use std::sync::Mutex;

use async_trait::async_trait;

use super::types::ChatModel;
use super::ReportError;
use crate::pipeline::knowledge::{
    KnowledgeEntry, KnowledgeError, KnowledgeMatch, KnowledgeStore, SearchMode,
};

/// Chat model returning a canned reply and recording every prompt it saw.
pub struct MockChatModel {
    reply: Result<String, u16>,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl MockChatModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always fails with an upstream error carrying `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().map(|(_, p)| p.clone())
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ReportError> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(ReportError::Upstream {
                status: *status,
                body: "mock failure".into(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }
}

/// Knowledge store whose every operation fails.
pub struct FailingKnowledgeStore;

#[async_trait]
impl KnowledgeStore for FailingKnowledgeStore {
    async fn ensure_schema(&self) -> Result<(), KnowledgeError> {
        Err(KnowledgeError::Unavailable("store offline".into()))
    }

    async fn index(&self, _entry: &KnowledgeEntry) -> Result<String, KnowledgeError> {
        Err(KnowledgeError::Unavailable("store offline".into()))
    }

    async fn search(
        &self,
        _query: &str,
        _limit: usize,
        _mode: SearchMode,
    ) -> Result<Vec<KnowledgeMatch>, KnowledgeError> {
        Err(KnowledgeError::Connection("connection refused".into()))
    }

    fn backend(&self) -> &'static str {
        "failing"
    }
}
