//! Runtime configuration read from the environment.
//!
//! Nothing here is mandatory. A missing value is logged and the matching
//! feature runs in a degraded mode instead of failing startup.

use std::path::PathBuf;

use halaltrack_core::Database;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub ai: AiConfig,
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_URL.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let db_path = match get("HALALTRACK_DB") {
            Some(path) => PathBuf::from(path),
            None => Database::default_path().unwrap_or_else(|| {
                tracing::warn!("Could not determine data directory; using ./halaltrack.db");
                PathBuf::from("halaltrack.db")
            }),
        };

        let api_key = get("GEMINI_API_KEY");
        if api_key.is_none() {
            tracing::warn!("GEMINI_API_KEY is not set; AI analysis is disabled");
        }

        Self {
            db_path,
            ai: AiConfig {
                api_key,
                model: get("HALALTRACK_GEMINI_MODEL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: get("HALALTRACK_GEMINI_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_GEMINI_URL.to_string()),
            },
        }
    }
}
