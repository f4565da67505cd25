//! LLM backend for docstring generation.
//!
//! Two real backends behind one enum: an OpenAI-compatible remote API
//! (used when both `LLM_API_URL` and `LLM_API_TOKEN` are configured) and a
//! local Ollama instance. `Mock` returns a canned response for tests.

use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;

/// Generation timeout. LLM calls on large files are slow and the request
/// handler waits for them.
const REQUEST_TIMEOUT_SECS: u64 = 180;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Cannot reach LLM backend at {0}")]
    Connection(String),
    #[error("LLM request timed out after {0}s")]
    Timeout(u64),
    #[error("LLM backend returned {status}: {body}")]
    Backend { status: u16, body: String },
    #[error("Unexpected LLM response: {0}")]
    ResponseParsing(String),
}

/// Serializable backend description for `GET /api/status`.
#[derive(Debug, Clone, Serialize)]
pub struct LlmInfo {
    pub backend: &'static str,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

pub enum LlmBackend {
    /// OpenAI-compatible chat-completions API (OpenRouter, OpenAI, ...).
    Api {
        url: String,
        token: String,
        model: String,
        client: reqwest::Client,
    },
    /// Local Ollama `/api/generate`.
    Ollama {
        base_url: String,
        model: String,
        client: reqwest::Client,
    },
    /// Test double: always returns the configured response.
    Mock { response: String },
    /// Test double: every request fails with a connection error.
    MockFailure { message: String },
}

impl LlmBackend {
    pub fn from_config(cfg: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        match (&cfg.api_url, &cfg.api_token) {
            (Some(url), Some(token)) => Self::Api {
                url: url.clone(),
                token: token.clone(),
                model: cfg.model.clone(),
                client,
            },
            _ => Self::Ollama {
                base_url: cfg.ollama_url.trim_end_matches('/').to_string(),
                model: cfg.model.clone(),
                client,
            },
        }
    }

    pub fn mock(response: &str) -> Self {
        Self::Mock {
            response: response.to_string(),
        }
    }

    pub fn failing_mock(message: &str) -> Self {
        Self::MockFailure {
            message: message.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::Api { model, .. } | Self::Ollama { model, .. } => model,
            Self::Mock { .. } | Self::MockFailure { .. } => "mock",
        }
    }

    /// Backend description with the token masked.
    pub fn info(&self) -> LlmInfo {
        match self {
            Self::Api {
                url, token, model, ..
            } => LlmInfo {
                backend: "api",
                model: model.clone(),
                url: Some(url.clone()),
                token: Some(mask_token(token)),
            },
            Self::Ollama { model, .. } => LlmInfo {
                backend: "ollama",
                model: model.clone(),
                url: None,
                token: None,
            },
            Self::Mock { .. } | Self::MockFailure { .. } => LlmInfo {
                backend: "mock",
                model: "mock".to_string(),
                url: None,
                token: None,
            },
        }
    }

    /// Send one generation request and return the raw completion text.
    pub async fn generate(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        match self {
            Self::Api {
                url,
                token,
                model,
                client,
            } => generate_api(client, url, token, model, system, prompt).await,
            Self::Ollama {
                base_url,
                model,
                client,
            } => generate_ollama(client, base_url, model, system, prompt).await,
            Self::Mock { response } => Ok(response.clone()),
            Self::MockFailure { message } => Err(LlmError::Connection(message.clone())),
        }
    }
}

fn mask_token(token: &str) -> String {
    if token.chars().count() > 10 {
        let prefix: String = token.chars().take(10).collect();
        format!("{prefix}...")
    } else {
        "***".to_string()
    }
}

fn map_send_error(err: reqwest::Error, target: &str) -> LlmError {
    if err.is_connect() {
        LlmError::Connection(target.to_string())
    } else if err.is_timeout() {
        LlmError::Timeout(REQUEST_TIMEOUT_SECS)
    } else {
        LlmError::ResponseParsing(err.to_string())
    }
}

// ── OpenAI-compatible API ───────────────────────────────────

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

async fn generate_api(
    client: &reqwest::Client,
    url: &str,
    token: &str,
    model: &str,
    system: &str,
    prompt: &str,
) -> Result<String, LlmError> {
    let body = ChatRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: prompt,
            },
        ],
        temperature: 0.2,
        max_tokens: 8192,
    };

    let mut request = client.post(url).bearer_auth(token).json(&body);
    // OpenRouter rejects requests without an origin identity.
    if url.to_lowercase().contains("openrouter") {
        request = request
            .header("HTTP-Referer", "http://localhost:8000")
            .header("X-Title", crate::config::APP_NAME);
    }

    tracing::debug!(url, model, "calling remote LLM API");
    let response = request.send().await.map_err(|e| map_send_error(e, url))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Backend {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: ChatResponse = response
        .json()
        .await
        .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| LlmError::ResponseParsing("response has no choices".to_string()))
}

// ── Ollama ──────────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

async fn generate_ollama(
    client: &reqwest::Client,
    base_url: &str,
    model: &str,
    system: &str,
    prompt: &str,
) -> Result<String, LlmError> {
    let url = format!("{base_url}/api/generate");
    let body = OllamaGenerateRequest {
        model,
        prompt,
        system,
        stream: false,
    };

    tracing::debug!(url, model, "calling local Ollama");
    let response = client
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| map_send_error(e, base_url))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Backend {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: OllamaGenerateResponse = response
        .json()
        .await
        .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

    Ok(parsed.response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;

    fn config(url: Option<&str>, token: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_url: url.map(String::from),
            api_token: token.map(String::from),
            model: "llama3.2:3b".to_string(),
            ollama_url: "http://localhost:11434/".to_string(),
        }
    }

    #[test]
    fn selects_api_when_fully_configured() {
        let backend =
            LlmBackend::from_config(&config(Some("https://api.example/v1"), Some("sk-12345678901")));
        let info = backend.info();
        assert_eq!(info.backend, "api");
        assert_eq!(info.url.as_deref(), Some("https://api.example/v1"));
        // Token is masked to its first 10 chars
        assert_eq!(info.token.as_deref(), Some("sk-1234567..."));
    }

    #[test]
    fn falls_back_to_ollama_without_token() {
        let backend = LlmBackend::from_config(&config(Some("https://api.example/v1"), None));
        let info = backend.info();
        assert_eq!(info.backend, "ollama");
        assert!(info.url.is_none());
        assert!(info.token.is_none());
    }

    #[test]
    fn ollama_base_url_is_trimmed() {
        let backend = LlmBackend::from_config(&config(None, None));
        match backend {
            LlmBackend::Ollama { base_url, .. } => {
                assert_eq!(base_url, "http://localhost:11434")
            }
            _ => panic!("expected Ollama backend"),
        }
    }

    #[test]
    fn short_tokens_are_fully_masked() {
        assert_eq!(mask_token("short"), "***");
        assert_eq!(mask_token("0123456789AB"), "0123456789...");
    }

    #[test]
    fn multibyte_tokens_are_masked_on_char_boundaries() {
        let masked = mask_token("sk-héllo-wörld-123456");
        assert!(masked.ends_with("..."));
        assert_eq!(masked.chars().count(), 13);
        assert_eq!(mask_token("héllöwörld"), "***");
    }

    #[tokio::test]
    async fn mock_returns_configured_response() {
        let backend = LlmBackend::mock("def f():\n    pass\n");
        let out = backend.generate("system", "prompt").await.unwrap();
        assert_eq!(out, "def f():\n    pass\n");
        assert_eq!(backend.model(), "mock");
    }

    #[tokio::test]
    async fn failing_mock_always_errors() {
        let backend = LlmBackend::failing_mock("connection refused");
        let err = backend.generate("system", "prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::Connection(_)));
        assert_eq!(backend.info().backend, "mock");
    }
}
