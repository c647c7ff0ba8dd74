use std::net::SocketAddr;
use std::path::PathBuf;

use crate::pipeline::knowledge::DEFAULT_CLASS_NAME;
use crate::pipeline::report::ReportSettings;

/// Application-level constants
pub const APP_NAME: &str = "TCM Clinic";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_LLM_API_URL: &str = "https://api.deepseek.com/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "deepseek-chat";
pub const DEFAULT_LLM_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Get the application data directory
/// ~/TcmClinic/, or ./TcmClinic when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("TcmClinic")
}

pub fn default_database_path() -> PathBuf {
    app_data_dir().join("clinic.db")
}

/// Filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "tcm_clinic_lib=debug,tower_http=info,info"
    } else {
        "tcm_clinic_lib=info,warn"
    }
}

/// Vector-store connection. No `url` means the in-memory store is used.
#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub class_name: String,
    pub timeout_secs: u64,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            class_name: DEFAULT_CLASS_NAME.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Chat-completion endpoint settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_LLM_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: DEFAULT_LLM_TEMPERATURE,
            max_tokens: DEFAULT_LLM_MAX_TOKENS,
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub database_path: PathBuf,
    /// Plaintext bearer keys accepted by the API. Hashed before use.
    pub api_keys: Vec<String>,
    pub knowledge: KnowledgeConfig,
    pub llm: LlmConfig,
    pub report: ReportSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8787)),
            database_path: default_database_path(),
            api_keys: Vec::new(),
            knowledge: KnowledgeConfig::default(),
            llm: LlmConfig::default(),
            report: ReportSettings::default(),
        }
    }
}

/// Split a comma-separated key list, dropping blanks.
pub fn parse_api_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}
