use serde_json::{json, Value};

use super::{ProviderConfig, ProviderRequest, Vendor};

/// Workers AI `ai/run` endpoint, keyed by account id and API token.
pub struct Cloudflare;

impl Vendor for Cloudflare {
    fn endpoint(&self, config: &ProviderConfig) -> String {
        format!(
            "https://api.cloudflare.com/client/v4/accounts/{}/ai/run/{}",
            config.cloudflare.account_id, config.cloudflare.model
        )
    }

    fn bearer_token<'c>(&self, config: &'c ProviderConfig) -> Option<&'c str> {
        Some(&config.cloudflare.api_token)
    }

    fn body(&self, request: &ProviderRequest) -> Value {
        json!({
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_text },
            ]
        })
    }

    fn extract_text<'v>(&self, response: &'v Value) -> Option<&'v str> {
        response["result"]["response"].as_str()
    }

    fn error_message<'v>(&self, response: &'v Value) -> Option<&'v str> {
        response["errors"][0]["message"].as_str()
    }

    fn status_reason(&self, code: u16) -> &'static str {
        match code {
            401 => "Unauthorized (Check API Token)",
            403 => "Forbidden (Check Account ID or Permissions)",
            404 => "Not Found (Check Model ID)",
            _ => super::status_reason(code),
        }
    }
}
