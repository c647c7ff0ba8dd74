//! Weaviate REST + GraphQL client.
//!
//! Schema: one class with `text` and `title` text properties, vectorized
//! by `text2vec-transformers`. Objects are created through `/v1/objects`;
//! retrieval goes through `/v1/graphql` `Get` queries.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::OnceCell;

use super::types::{KnowledgeEntry, KnowledgeMatch, KnowledgeStore, SearchMode};
use super::KnowledgeError;
use crate::config::KnowledgeConfig;

const VECTORIZER: &str = "text2vec-transformers";

pub struct WeaviateStore {
    base_url: String,
    api_key: Option<String>,
    class_name: String,
    client: reqwest::Client,
    schema_ready: OnceCell<()>,
}

impl WeaviateStore {
    pub fn new(config: &KnowledgeConfig, url: &str) -> Result<Self, KnowledgeError> {
        validate_class_name(&config.class_name)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KnowledgeError::Connection(e.to_string()))?;

        Ok(Self {
            base_url: normalize_base_url(url),
            api_key: config.api_key.clone(),
            class_name: config.class_name.clone(),
            client,
            schema_ready: OnceCell::new(),
        })
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, KnowledgeError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                KnowledgeError::Connection(format!("request to {} timed out", self.base_url))
            } else {
                KnowledgeError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KnowledgeError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| KnowledgeError::ResponseParsing(e.to_string()))
    }

    async fn class_exists(&self) -> Result<bool, KnowledgeError> {
        let schema: SchemaResponse = self
            .send_json(self.request(reqwest::Method::GET, "/v1/schema"))
            .await?;
        Ok(schema
            .classes
            .unwrap_or_default()
            .iter()
            .any(|c| c.class == self.class_name))
    }

    async fn create_class(&self) -> Result<(), KnowledgeError> {
        let definition = class_definition(&self.class_name);
        let _: serde_json::Value = self
            .send_json(
                self.request(reqwest::Method::POST, "/v1/schema")
                    .json(&definition),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl KnowledgeStore for WeaviateStore {
    async fn ensure_schema(&self) -> Result<(), KnowledgeError> {
        self.schema_ready
            .get_or_try_init(|| async {
                if !self.class_exists().await? {
                    tracing::info!(class = %self.class_name, "Creating knowledge class");
                    self.create_class().await?;
                    tracing::info!(class = %self.class_name, "Knowledge class created");
                }
                Ok::<(), KnowledgeError>(())
            })
            .await
            .map(|_| ())
            .map_err(|e| match e {
                KnowledgeError::Schema(_) => e,
                other => KnowledgeError::Schema(other.to_string()),
            })
    }

    async fn index(&self, entry: &KnowledgeEntry) -> Result<String, KnowledgeError> {
        if entry.text.trim().is_empty() {
            return Err(KnowledgeError::EmptyText);
        }
        self.ensure_schema().await?;

        let body = CreateObject {
            class: &self.class_name,
            properties: ObjectProperties {
                text: &entry.text,
                title: entry.title.as_deref().unwrap_or_default(),
            },
        };
        let created: CreatedObject = self
            .send_json(self.request(reqwest::Method::POST, "/v1/objects").json(&body))
            .await?;

        tracing::debug!(id = %created.id, class = %self.class_name, "Indexed knowledge passage");
        Ok(created.id)
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
        self.ensure_schema().await?;

        let graphql = build_get_query(&self.class_name, query, limit, mode);
        let response: GraphQlResponse = self
            .send_json(
                self.request(reqwest::Method::POST, "/v1/graphql")
                    .json(&json!({ "query": graphql })),
            )
            .await?;

        if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
            let joined = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(KnowledgeError::GraphQl(joined));
        }

        let hits = response
            .data
            .and_then(|mut d| d.get.remove(&self.class_name))
            .flatten()
            .unwrap_or_default();

        tracing::debug!(count = hits.len(), ?mode, "Knowledge search complete");

        Ok(hits.into_iter().map(WeaviateHit::into_match).collect())
    }

    fn backend(&self) -> &'static str {
        "weaviate"
    }
}

/// Accepts bare hosts (`xyz.weaviate.cloud`) as well as full URLs.
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Class names are interpolated into GraphQL, so they must be plain names.
fn validate_class_name(name: &str) -> Result<(), KnowledgeError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(KnowledgeError::InvalidClassName(name.to_string()))
    }
}

fn class_definition(class_name: &str) -> serde_json::Value {
    let property = |name: &str, description: &str| {
        json!({
            "name": name,
            "dataType": ["text"],
            "description": description,
            "moduleConfig": {
                VECTORIZER: { "skip": false, "vectorizePropertyName": false }
            }
        })
    };
    json!({
        "class": class_name,
        "description": "Traditional Chinese Medicine knowledge base",
        "vectorizer": VECTORIZER,
        "moduleConfig": {
            VECTORIZER: { "vectorizeClassName": true }
        },
        "properties": [
            property("text", "The content of the TCM knowledge"),
            property("title", "The title or category of the TCM knowledge"),
        ]
    })
}

fn build_get_query(class_name: &str, query: &str, limit: usize, mode: SearchMode) -> String {
    // JSON string escaping is valid GraphQL string escaping.
    match mode {
        SearchMode::NearText => {
            let concept = serde_json::Value::String(query.to_string()).to_string();
            format!(
                "{{ Get {{ {class_name}(nearText: {{concepts: [{concept}]}}, limit: {limit}) \
                 {{ text title _additional {{ id certainty }} }} }} }}"
            )
        }
        SearchMode::Keyword => {
            let pattern = serde_json::Value::String(format!("*{query}*")).to_string();
            format!(
                "{{ Get {{ {class_name}(where: {{operator: Or, operands: [\
                 {{path: [\"text\"], operator: Like, valueText: {pattern}}}, \
                 {{path: [\"title\"], operator: Like, valueText: {pattern}}}]}}, limit: {limit}) \
                 {{ text title _additional {{ id }} }} }} }}"
            )
        }
    }
}

#[derive(Deserialize)]
struct SchemaResponse {
    classes: Option<Vec<SchemaClass>>,
}

#[derive(Deserialize)]
struct SchemaClass {
    class: String,
}

#[derive(Serialize)]
struct CreateObject<'a> {
    class: &'a str,
    properties: ObjectProperties<'a>,
}

#[derive(Serialize)]
struct ObjectProperties<'a> {
    text: &'a str,
    title: &'a str,
}

#[derive(Deserialize)]
struct CreatedObject {
    id: String,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<GraphQlData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlData {
    #[serde(rename = "Get")]
    get: HashMap<String, Option<Vec<WeaviateHit>>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct WeaviateHit {
    text: Option<String>,
    title: Option<String>,
    #[serde(rename = "_additional")]
    additional: Option<Additional>,
}

#[derive(Deserialize)]
struct Additional {
    id: Option<String>,
    certainty: Option<f64>,
}

impl WeaviateHit {
    fn into_match(self) -> KnowledgeMatch {
        let (id, certainty) = self
            .additional
            .map(|a| (a.id, a.certainty))
            .unwrap_or((None, None));
        KnowledgeMatch {
            id,
            text: self.text.unwrap_or_default(),
            title: self.title.filter(|t| !t.trim().is_empty()),
            certainty,
        }
    }
}
