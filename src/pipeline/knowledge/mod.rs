//! Vector knowledge store: indexing and retrieval of free-text TCM
//! reference material through an external vector-search service.

pub mod memory;
pub mod types;
pub mod weaviate;

pub use memory::InMemoryKnowledgeStore;
pub use types::*;
pub use weaviate::WeaviateStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Knowledge text must not be empty")]
    EmptyText,

    #[error("Invalid class name: {0}")]
    InvalidClassName(String),

    #[error("Vector store connection failed: {0}")]
    Connection(String),

    #[error("Vector store returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("GraphQL query failed: {0}")]
    GraphQl(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Failed to set up schema: {0}")]
    Schema(String),

    #[error("Knowledge store unavailable: {0}")]
    Unavailable(String),
}
