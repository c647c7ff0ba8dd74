use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::types::{KnowledgeEntry, KnowledgeMatch, KnowledgeStore, SearchMode};
use super::KnowledgeError;

/// Process-local knowledge store.
///
/// Scores passages by the fraction of query terms they contain. Used in
/// tests and when no vector service is configured; contents are lost on
/// restart.
pub struct InMemoryKnowledgeStore {
    entries: Mutex<Vec<StoredEntry>>,
}

#[derive(Debug, Clone)]
struct StoredEntry {
    id: String,
    entry: KnowledgeEntry,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    #[cfg(test)]
    pub fn count(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }
}

impl Default for InMemoryKnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn haystack(entry: &KnowledgeEntry) -> String {
    match &entry.title {
        Some(title) => format!("{title} {}", entry.text),
        None => entry.text.clone(),
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn ensure_schema(&self) -> Result<(), KnowledgeError> {
        Ok(())
    }

    async fn index(&self, entry: &KnowledgeEntry) -> Result<String, KnowledgeError> {
        if entry.text.trim().is_empty() {
            return Err(KnowledgeError::EmptyText);
        }
        let id = Uuid::new_v4().to_string();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| KnowledgeError::Unavailable("lock poisoned".into()))?;
        entries.push(StoredEntry {
            id: id.clone(),
            entry: entry.clone(),
        });
        Ok(id)
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        mode: SearchMode,
    ) -> Result<Vec<KnowledgeMatch>, KnowledgeError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let entries = self
            .entries
            .lock()
            .map_err(|_| KnowledgeError::Unavailable("lock poisoned".into()))?;

        let mut scored: Vec<(f64, &StoredEntry)> = match mode {
            SearchMode::NearText => {
                let wanted = terms(query);
                entries
                    .iter()
                    .filter_map(|stored| {
                        let have = terms(&haystack(&stored.entry));
                        let hits = wanted.iter().filter(|t| have.contains(*t)).count();
                        (hits > 0).then(|| (hits as f64 / wanted.len() as f64, stored))
                    })
                    .collect()
            }
            SearchMode::Keyword => {
                let needle = query.to_lowercase();
                entries
                    .iter()
                    .filter(|stored| haystack(&stored.entry).to_lowercase().contains(&needle))
                    .map(|stored| (1.0, stored))
                    .collect()
            }
        };

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(score, stored)| KnowledgeMatch {
                id: Some(stored.id.clone()),
                text: stored.entry.text.clone(),
                title: stored.entry.title.clone(),
                certainty: (mode == SearchMode::NearText).then_some(score),
            })
            .collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
