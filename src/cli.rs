//! Command-line interface. Every option can also come from the
//! environment (or a `.env` file loaded by the binary).

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::config::{
    self, parse_api_keys, KnowledgeConfig, LlmConfig, ServerConfig, DEFAULT_BIND,
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_LLM_API_URL, DEFAULT_LLM_MODEL,
};
use crate::pipeline::knowledge::{SearchMode, DEFAULT_CLASS_NAME};
use crate::pipeline::report::{ReportSettings, DEFAULT_KNOWLEDGE_LIMIT};

#[derive(Parser, Debug)]
#[command(name = "tcm-clinic")]
#[command(version)]
#[command(about = "Patient records, TCM knowledge search and diagnostic report generation", long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "TCM_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// SQLite database file (defaults to ~/TcmClinic/clinic.db)
    #[arg(long, env = "TCM_DATABASE_PATH")]
    pub database_path: Option<PathBuf>,

    /// Comma-separated bearer keys accepted by the API
    #[arg(long, env = "TCM_API_KEYS", hide_env_values = true)]
    pub api_keys: Option<String>,

    /// Weaviate host or URL; without it knowledge is kept in memory
    #[arg(long, env = "WEAVIATE_URL")]
    pub weaviate_url: Option<String>,

    #[arg(long, env = "WEAVIATE_API_KEY", hide_env_values = true)]
    pub weaviate_api_key: Option<String>,

    /// Weaviate class holding knowledge passages
    #[arg(long, env = "WEAVIATE_CLASS", default_value = DEFAULT_CLASS_NAME)]
    pub weaviate_class: String,

    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub deepseek_api_key: Option<String>,

    /// Full chat-completions endpoint
    #[arg(long, env = "DEEPSEEK_API_URL", default_value = DEFAULT_LLM_API_URL)]
    pub deepseek_api_url: String,

    #[arg(long, env = "DEEPSEEK_MODEL", default_value = DEFAULT_LLM_MODEL)]
    pub deepseek_model: String,

    /// Passages retrieved per report
    #[arg(long, env = "TCM_KNOWLEDGE_LIMIT", default_value_t = DEFAULT_KNOWLEDGE_LIMIT)]
    pub knowledge_limit: usize,

    /// Use keyword matching instead of near-text search for reports
    #[arg(long)]
    pub keyword_search: bool,

    /// Upstream HTTP timeout in seconds
    #[arg(long, env = "TCM_HTTP_TIMEOUT", default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Print a freshly generated API key and exit
    #[arg(long)]
    pub generate_key: bool,
}

impl Cli {
    pub fn into_config(self) -> ServerConfig {
        ServerConfig {
            bind: self.bind,
            database_path: self
                .database_path
                .unwrap_or_else(config::default_database_path),
            api_keys: self
                .api_keys
                .as_deref()
                .map(parse_api_keys)
                .unwrap_or_default(),
            knowledge: KnowledgeConfig {
                url: self.weaviate_url,
                api_key: self.weaviate_api_key,
                class_name: self.weaviate_class,
                timeout_secs: self.timeout_secs,
            },
            llm: LlmConfig {
                api_url: self.deepseek_api_url,
                api_key: self.deepseek_api_key,
                model: self.deepseek_model,
                timeout_secs: self.timeout_secs,
                ..LlmConfig::default()
            },
            report: ReportSettings {
                knowledge_limit: self.knowledge_limit.max(1),
                search_mode: if self.keyword_search {
                    SearchMode::Keyword
                } else {
                    SearchMode::NearText
                },
            },
        }
    }
}
