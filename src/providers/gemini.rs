use serde_json::{json, Value};

use super::{ProviderConfig, ProviderRequest, Vendor};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Google generateContent API. The key travels as the `key` query parameter
/// and the system prompt is folded into the single user turn.
pub struct Gemini;

impl Vendor for Gemini {
    fn endpoint(&self, config: &ProviderConfig) -> String {
        format!("{}/{}:generateContent", BASE_URL, config.model.trim())
    }

    fn bearer_token<'c>(&self, _config: &'c ProviderConfig) -> Option<&'c str> {
        None
    }

    fn query<'c>(&self, config: &'c ProviderConfig) -> Vec<(&'static str, &'c str)> {
        vec![("key", config.api_key.as_str())]
    }

    fn body(&self, request: &ProviderRequest) -> Value {
        json!({
            "contents": [{
                "parts": [{
                    "text": format!("{}\n\nInput: {}", request.system_prompt, request.user_text)
                }]
            }],
            "generationConfig": {
                "temperature": request.config.generation.temperature,
                "topP": request.config.generation.top_p,
            }
        })
    }

    fn extract_text<'v>(&self, response: &'v Value) -> Option<&'v str> {
        response["candidates"][0]["content"]["parts"][0]["text"].as_str()
    }

    fn error_message<'v>(&self, response: &'v Value) -> Option<&'v str> {
        response["error"]["message"].as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProviderRequest {
        let mut config = ProviderConfig::default();
        config.model = "gemini-2.5-flash-lite".into();
        config.api_key = "k3y".into();
        config.generation.temperature = 0.2;
        config.generation.top_p = 0.95;
        ProviderRequest {
            system_prompt: "Fix grammar.".into(),
            user_text: "i go home yestarday".into(),
            config,
        }
    }

    #[test]
    fn folds_prompt_into_one_part() {
        let req = request();
        let body = Gemini.body(&req);
        assert_eq!(
            body["contents"][0]["parts"][0]["text"],
            "Fix grammar.\n\nInput: i go home yestarday"
        );
        assert_eq!(body["generationConfig"]["topP"], 0.95);
        assert_eq!(
            Gemini.endpoint(&req.config),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-lite:generateContent"
        );
        assert_eq!(Gemini.bearer_token(&req.config), None);
        assert_eq!(Gemini.query(&req.config), vec![("key", "k3y")]);
    }

    #[test]
    fn key_stays_out_of_the_url() {
        let mut config = ProviderConfig::default();
        config.model = "gemini-2.5-flash-lite".into();
        config.api_key = "a&b=c#d".into();
        let url = Gemini.endpoint(&config);
        assert!(!url.contains('?'));
        assert!(!url.contains("a&b"));
        assert_eq!(Gemini.query(&config), vec![("key", "a&b=c#d")]);
    }

    #[test]
    fn reads_first_candidate() {
        let response: Value = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"I went home yesterday."}]}}]}"#,
        )
        .unwrap();
        assert_eq!(Gemini.extract_text(&response), Some("I went home yesterday."));
    }
}
