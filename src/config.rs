use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "pypolish";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upper bound for a single upload request (files or ZIP archive).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("{APP_NAME}=info,tower_http=warn")
}

/// Root data directory for job state.
/// `PYPOLISH_DATA_DIR` overrides; defaults to `~/.pypolish/`.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PYPOLISH_DATA_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".pypolish")
}

/// Listen address, `PYPOLISH_BIND` overrides.
pub fn bind_addr() -> SocketAddr {
    std::env::var("PYPOLISH_BIND")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8000)))
}

pub const DEFAULT_MODEL: &str = "llama3.2:3b";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// LLM backend selection.
///
/// When both `LLM_API_URL` and `LLM_API_TOKEN` are set, the remote
/// OpenAI-compatible API is used with `LLM_MODEL`. Otherwise generation
/// goes to a local Ollama instance (`OLLAMA_URL`, default localhost:11434)
/// with the same model name.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub model: String,
    pub ollama_url: String,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: non_empty_env("LLM_API_URL"),
            api_token: non_empty_env("LLM_API_TOKEN"),
            model: non_empty_env("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            ollama_url: non_empty_env("OLLAMA_URL")
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
        }
    }

    /// Remote API requires both a URL and a token.
    pub fn is_api_configured(&self) -> bool {
        self.api_url.is_some() && self.api_token.is_some()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: Option<&str>, token: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_url: url.map(String::from),
            api_token: token.map(String::from),
            model: DEFAULT_MODEL.to_string(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
        }
    }

    #[test]
    fn api_configured_requires_url_and_token() {
        assert!(config(Some("https://api.example/v1/chat"), Some("sk-x")).is_api_configured());
        assert!(!config(Some("https://api.example/v1/chat"), None).is_api_configured());
        assert!(!config(None, Some("sk-x")).is_api_configured());
        assert!(!config(None, None).is_api_configured());
    }

    #[test]
    fn default_model_is_local_llama() {
        assert_eq!(DEFAULT_MODEL, "llama3.2:3b");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
