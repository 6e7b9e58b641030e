//! Remote text-generation backends behind one async contract.
//!
//! Each vendor module only knows its endpoint and JSON shapes; sending,
//! status handling and text extraction are shared here. Calls are never
//! retried.

pub mod cloudflare;
pub mod gemini;
pub mod openrouter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::config::{CloudflareConfig, GenerationConfig};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Credentials and model selection for whichever backend `provider` names.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: String,
    pub api_key: String,
    pub model: String,
    pub cloudflare: CloudflareConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub system_prompt: String,
    pub user_text: String,
    pub config: ProviderConfig,
}

/// Why a provider call produced no text. `Display` is the message shown
/// to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("{code}: {message}")]
    Status { code: u16, message: String },
    #[error("{0}")]
    Transport(String),
    #[error("Unreadable response: {0}")]
    Malformed(String),
    #[error("Empty response")]
    Empty,
}

pub type ProviderResult = Result<String, ProviderError>;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Returns the generated text, trimmed.
    async fn dispatch(&self, request: ProviderRequest) -> ProviderResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Gemini,
    Cloudflare,
    OpenRouter,
}

impl Backend {
    /// Unknown identifiers fall back to Gemini.
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "cloudflare" => Backend::Cloudflare,
            "openrouter" => Backend::OpenRouter,
            _ => Backend::Gemini,
        }
    }

    fn vendor(self) -> &'static dyn Vendor {
        match self {
            Backend::Gemini => &gemini::Gemini,
            Backend::Cloudflare => &cloudflare::Cloudflare,
            Backend::OpenRouter => &openrouter::OpenRouter,
        }
    }
}

/// The vendor-specific half of a backend.
pub(crate) trait Vendor: Send + Sync {
    fn endpoint(&self, config: &ProviderConfig) -> String;

    fn bearer_token<'c>(&self, config: &'c ProviderConfig) -> Option<&'c str>;

    /// Query parameters appended to the endpoint; the HTTP client encodes them.
    fn query<'c>(&self, _config: &'c ProviderConfig) -> Vec<(&'static str, &'c str)> {
        Vec::new()
    }

    fn body(&self, request: &ProviderRequest) -> Value;

    /// The generated text in a successful response.
    fn extract_text<'v>(&self, response: &'v Value) -> Option<&'v str>;

    /// The provider's own error message in a failed response.
    fn error_message<'v>(&self, response: &'v Value) -> Option<&'v str>;

    fn status_reason(&self, code: u16) -> &'static str {
        status_reason(code)
    }
}

pub(crate) fn status_reason(code: u16) -> &'static str {
    match code {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unexpected error",
    }
}

/// Turns a raw HTTP status and body into a provider result.
pub(crate) fn interpret(vendor: &dyn Vendor, status: u16, body: &str) -> ProviderResult {
    if !(200..300).contains(&status) {
        let json = serde_json::from_str::<Value>(body).ok();
        let message = json
            .as_ref()
            .and_then(|j| vendor.error_message(j))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| vendor.status_reason(status));
        return Err(ProviderError::Status {
            code: status,
            message: message.to_string(),
        });
    }
    let json: Value =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    let text = vendor
        .extract_text(&json)
        .ok_or_else(|| ProviderError::Malformed("no generated text in response".into()))?
        .trim();
    if text.is_empty() {
        return Err(ProviderError::Empty);
    }
    Ok(text.to_string())
}

/// Talks to the real vendor APIs over HTTP.
#[derive(Clone)]
pub struct HttpProvider {
    agent: ureq::Agent,
}

impl Default for HttpProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpProvider {
    pub fn new() -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();
        Self { agent }
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn dispatch(&self, request: ProviderRequest) -> ProviderResult {
        let backend = Backend::from_id(&request.config.provider);
        let agent = self.agent.clone();
        let start = Instant::now();
        tracing::info!("Calling {:?} ({} chars of input)", backend, request.user_text.len());

        let result = tokio::task::spawn_blocking(move || send(&agent, backend.vendor(), &request))
            .await
            .map_err(|e| ProviderError::Transport(format!("dispatch task failed: {e}")))?;

        match &result {
            Ok(text) => tracing::info!("{:?} replied in {:?} ({} chars)", backend, start.elapsed(), text.len()),
            Err(e) => tracing::warn!("{:?} failed after {:?}: {}", backend, start.elapsed(), e),
        }
        result
    }
}

fn send(agent: &ureq::Agent, vendor: &dyn Vendor, request: &ProviderRequest) -> ProviderResult {
    let url = vendor.endpoint(&request.config);
    let body = serde_json::to_vec(&vendor.body(request))
        .map_err(|e| ProviderError::Malformed(e.to_string()))?;

    let mut call = agent.post(&url).header("Content-Type", "application/json");
    for (name, value) in vendor.query(&request.config) {
        call = call.query(name, value);
    }
    if let Some(token) = vendor.bearer_token(&request.config) {
        call = call.header("Authorization", format!("Bearer {token}"));
    }
    let mut resp = call
        .send(&body)
        .map_err(|e| ProviderError::Transport(e.to_string()))?;

    let status = resp.status().as_u16();
    let text = match resp.body_mut().read_to_string() {
        Ok(text) => text,
        Err(e) if (200..300).contains(&status) => return Err(ProviderError::Transport(e.to_string())),
        Err(_) => String::new(),
    };
    interpret(vendor, status, &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_selection_falls_back_to_gemini() {
        assert_eq!(Backend::from_id("cloudflare"), Backend::Cloudflare);
        assert_eq!(Backend::from_id(" OpenRouter "), Backend::OpenRouter);
        assert_eq!(Backend::from_id("gemini"), Backend::Gemini);
        assert_eq!(Backend::from_id("something-else"), Backend::Gemini);
        assert_eq!(Backend::from_id(""), Backend::Gemini);
    }

    #[test]
    fn success_text_is_trimmed() {
        let body = r#"{"choices":[{"message":{"content":"  I went home yesterday.\n"}}]}"#;
        assert_eq!(
            interpret(&openrouter::OpenRouter, 200, body),
            Ok("I went home yesterday.".to_string())
        );
    }

    #[test]
    fn failure_prefers_provider_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid."}}"#;
        let err = interpret(&gemini::Gemini, 400, body).unwrap_err();
        assert_eq!(err.to_string(), "400: API key not valid.");
    }

    #[test]
    fn failure_falls_back_to_status_table() {
        assert_eq!(
            interpret(&gemini::Gemini, 429, "").unwrap_err().to_string(),
            "429: Too Many Requests"
        );
        assert_eq!(
            interpret(&gemini::Gemini, 418, "<html>teapot</html>").unwrap_err().to_string(),
            "418: Unexpected error"
        );
    }

    #[test]
    fn unparsable_or_empty_success_is_a_failure() {
        assert!(matches!(
            interpret(&gemini::Gemini, 200, "not json"),
            Err(ProviderError::Malformed(_))
        ));
        assert!(matches!(
            interpret(&gemini::Gemini, 200, r#"{"candidates":[]}"#),
            Err(ProviderError::Malformed(_))
        ));
        let blank = r#"{"result":{"response":"   "}}"#;
        assert_eq!(interpret(&cloudflare::Cloudflare, 200, blank), Err(ProviderError::Empty));
    }
}
