use serde_json::{json, Value};

use super::{ProviderConfig, ProviderRequest, Vendor};

const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct";
const MAX_TOKENS: u32 = 256;
const TEMPERATURE: f64 = 0.2;

/// OpenAI-compatible chat completions, bearer-token auth.
pub struct OpenRouter;

impl OpenRouter {
    fn model(config: &ProviderConfig) -> &str {
        let model = config.model.trim();
        if model.is_empty() {
            DEFAULT_MODEL
        } else {
            model
        }
    }
}

impl Vendor for OpenRouter {
    fn endpoint(&self, _config: &ProviderConfig) -> String {
        "https://openrouter.ai/api/v1/chat/completions".to_string()
    }

    fn bearer_token<'c>(&self, config: &'c ProviderConfig) -> Option<&'c str> {
        Some(&config.api_key)
    }

    fn body(&self, request: &ProviderRequest) -> Value {
        json!({
            "model": Self::model(&request.config),
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_text },
            ],
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "stream": false,
        })
    }

    fn extract_text<'v>(&self, response: &'v Value) -> Option<&'v str> {
        response["choices"][0]["message"]["content"].as_str()
    }

    fn error_message<'v>(&self, response: &'v Value) -> Option<&'v str> {
        response["error"]["message"].as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(model: &str) -> ProviderRequest {
        let mut config = ProviderConfig::default();
        config.provider = "openrouter".into();
        config.api_key = "sk-or".into();
        config.model = model.into();
        ProviderRequest {
            system_prompt: "Say \"hi\" back.".into(),
            user_text: "line one\nline \"two\"".into(),
            config,
        }
    }

    #[test]
    fn blank_model_uses_default() {
        assert_eq!(OpenRouter.body(&request("  "))["model"], DEFAULT_MODEL);
        assert_eq!(OpenRouter.body(&request("openai/gpt-4o-mini"))["model"], "openai/gpt-4o-mini");
    }

    #[test]
    fn prompts_are_escaped_json() {
        let body = OpenRouter.body(&request(""));
        let wire = serde_json::to_string(&body).unwrap();
        let back: Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(back["messages"][0]["content"], "Say \"hi\" back.");
        assert_eq!(back["messages"][1]["content"], "line one\nline \"two\"");
        assert_eq!(back["max_tokens"], 256);
        assert_eq!(OpenRouter.bearer_token(&request("").config), Some("sk-or"));
    }
}
