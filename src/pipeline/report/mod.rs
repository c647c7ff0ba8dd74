//! Diagnostic report generation: patient record → knowledge retrieval →
//! prompt assembly → hosted chat completion.

pub mod context;
pub mod deepseek;
pub mod orchestrator;
pub mod prompt;
pub mod retrieval;
pub mod types;

#[cfg(test)]
pub mod mock;

pub use deepseek::DeepSeekClient;
pub use orchestrator::ReportPipeline;
pub use types::*;

use thiserror::Error;

use crate::pipeline::knowledge::KnowledgeError;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to query TCM knowledge: {0}")]
    Knowledge(#[from] KnowledgeError),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("Completion API connection failed: {0}")]
    Connection(String),

    #[error("Completion API error: {status} - {body}")]
    Upstream { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Completion API returned no choices")]
    EmptyCompletion,
}
