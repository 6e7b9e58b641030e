use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::providers::ProviderConfig;

/// Where the assistant keeps its on-disk state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    /// Optional JSON document imported over the stored configuration at startup.
    pub import_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("typeassist");
        Self {
            db_path: base.join("typeassist.db"),
            data_dir: base,
            import_path: None,
        }
    }
}

impl AppConfig {
    /// Defaults, overridden by `TYPEASSIST_DB` and `TYPEASSIST_CONFIG`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(db) = std::env::var_os("TYPEASSIST_DB") {
            config.db_path = PathBuf::from(db);
        }
        config.import_path = std::env::var_os("TYPEASSIST_CONFIG").map(PathBuf::from);
        config
    }
}

/// A trailing trigger: `pattern` must be the suffix of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRule {
    pub pattern: String,
    pub prompt: String,
}

/// A command that can sit anywhere in the text, e.g. `(.g:%)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineCommand {
    pub pattern: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub trigger: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CloudflareConfig {
    pub account_id: String,
    pub api_token: String,
    pub model: String,
}

impl Default for CloudflareConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            api_token: String::new(),
            model: "@cf/meta/llama-3-8b-instruct".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { temperature: 0.2, top_p: 0.95 }
    }
}

/// Literals for the offline utility belt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilityCommands {
    pub date: String,
    pub time: String,
    pub password: String,
    /// Wrapper pattern with one `%` around the expression.
    pub calculator: String,
}

impl Default for UtilityCommands {
    fn default() -> Self {
        Self {
            date: ".date".into(),
            time: ".now".into(),
            password: ".pass".into(),
            calculator: "(.c:%)".into(),
        }
    }
}

/// The user-editable command configuration. Field names follow the JSON
/// export format of the mobile app so documents can be moved between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistConfig {
    pub is_app_enabled: bool,
    pub provider: String,
    pub api_key: String,
    pub model: String,
    pub cloudflare_config: CloudflareConfig,
    pub generation_config: GenerationConfig,
    pub triggers: Vec<TriggerRule>,
    pub inline_commands: Vec<InlineCommand>,
    pub snippets: Vec<Snippet>,
    pub undo_command_pattern: String,
    pub snippet_trigger_prefix: String,
    pub save_snippet_pattern: String,
    pub utilities: UtilityCommands,
}

const ANSWER_PROMPT: &str = "Give only the most relevant and complete answer to the query. Do not explain, do not add introductions, disclaimers, or extra text. Output only the answer.";
const GRAMMAR_PROMPT: &str = "Fix grammar, spelling, and punctuation. Return only the corrected text.";
const POLITE_PROMPT: &str = "Rewrite the text in a polite and professional tone. Return only the rewritten text.";

impl Default for AssistConfig {
    fn default() -> Self {
        let trigger = |pattern: &str, prompt: &str| TriggerRule {
            pattern: pattern.into(),
            prompt: prompt.into(),
        };
        let inline = |pattern: &str, prompt: &str| InlineCommand {
            pattern: pattern.into(),
            prompt: prompt.into(),
        };
        Self {
            is_app_enabled: false,
            provider: "gemini".into(),
            api_key: String::new(),
            model: "gemini-2.5-flash-lite".into(),
            cloudflare_config: CloudflareConfig::default(),
            generation_config: GenerationConfig::default(),
            triggers: vec![
                trigger(".ta", ANSWER_PROMPT),
                trigger(".g", GRAMMAR_PROMPT),
                trigger(".polite", POLITE_PROMPT),
                trigger(".casual", "Rewrite in a casual, friendly tone. Return only the rewritten text."),
                trigger(".improve", "Improve the writing quality and clarity. Return only the improved text."),
                trigger(".tr", "Translate to English. Return only the translated text."),
            ],
            inline_commands: vec![
                inline("(.ta:%)", ANSWER_PROMPT),
                inline("(.g:%)", GRAMMAR_PROMPT),
                inline("(.polite:%)", POLITE_PROMPT),
            ],
            snippets: vec![
                Snippet { trigger: "email".into(), content: "user@example.com".into() },
                Snippet { trigger: "sign".into(), content: "Best regards,\nUser".into() },
            ],
            undo_command_pattern: ".undo".into(),
            snippet_trigger_prefix: "..".into(),
            save_snippet_pattern: "(.save:%:%)".into(),
            utilities: UtilityCommands::default(),
        }
    }
}

impl AssistConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Collapses duplicate keys and drops commands that could never match.
    ///
    /// Duplicate trigger patterns keep the first position with the last
    /// prompt; duplicate snippet keys keep the last content.
    pub fn normalized(mut self) -> Self {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut triggers: Vec<TriggerRule> = Vec::with_capacity(self.triggers.len());
        for rule in self.triggers.drain(..) {
            if rule.pattern.is_empty() {
                tracing::warn!("dropping trigger with an empty pattern");
                continue;
            }
            match seen.get(&rule.pattern) {
                Some(&i) => triggers[i].prompt = rule.prompt,
                None => {
                    seen.insert(rule.pattern.clone(), triggers.len());
                    triggers.push(rule);
                }
            }
        }
        self.triggers = triggers;

        self.inline_commands.retain(|cmd| {
            let keep = cmd.pattern.chars().any(|c| c != crate::commands::pattern::PLACEHOLDER);
            if !keep {
                tracing::warn!("dropping inline command {:?} with no literal text", cmd.pattern);
            }
            keep
        });

        let mut by_key: HashMap<String, usize> = HashMap::new();
        let mut snippets: Vec<Snippet> = Vec::with_capacity(self.snippets.len());
        for snippet in self.snippets.drain(..) {
            match by_key.get(&snippet.trigger) {
                Some(&i) => snippets[i].content = snippet.content,
                None => {
                    by_key.insert(snippet.trigger.clone(), snippets.len());
                    snippets.push(snippet);
                }
            }
        }
        self.snippets = snippets;
        self
    }

    /// Inserts or overwrites the snippet keyed by `snippet.trigger`.
    pub fn upsert_snippet(&mut self, snippet: Snippet) {
        match self.snippets.iter_mut().find(|s| s.trigger == snippet.trigger) {
            Some(existing) => existing.content = snippet.content,
            None => self.snippets.push(snippet),
        }
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.provider.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            cloudflare: self.cloudflare_config.clone(),
            generation: self.generation_config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_mobile_app() {
        let config = AssistConfig::default();
        assert!(!config.is_app_enabled);
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.snippet_trigger_prefix, "..");
        assert_eq!(config.save_snippet_pattern, "(.save:%:%)");
        assert_eq!(config.triggers.len(), 6);
        assert_eq!(config.inline_commands[1].pattern, "(.g:%)");
    }

    #[test]
    fn parses_exported_json_with_missing_fields() {
        let json = r#"{
            "isAppEnabled": true,
            "provider": "cloudflare",
            "cloudflareConfig": { "accountId": "acc", "apiToken": "tok" },
            "triggers": [ { "pattern": ".fix", "prompt": "Fix it." } ]
        }"#;
        let config = AssistConfig::from_json(json).unwrap();
        assert!(config.is_app_enabled);
        assert_eq!(config.cloudflare_config.account_id, "acc");
        assert_eq!(config.cloudflare_config.model, "@cf/meta/llama-3-8b-instruct");
        assert_eq!(config.triggers.len(), 1);
        assert_eq!(config.undo_command_pattern, ".undo");
        assert_eq!(config.generation_config.top_p, 0.95);
    }

    #[test]
    fn duplicate_triggers_keep_position_and_last_prompt() {
        let mut config = AssistConfig::default();
        config.triggers = vec![
            TriggerRule { pattern: ".a".into(), prompt: "first".into() },
            TriggerRule { pattern: ".b".into(), prompt: "b".into() },
            TriggerRule { pattern: ".a".into(), prompt: "second".into() },
            TriggerRule { pattern: String::new(), prompt: "never".into() },
        ];
        let config = config.normalized();
        assert_eq!(config.triggers.len(), 2);
        assert_eq!(config.triggers[0].pattern, ".a");
        assert_eq!(config.triggers[0].prompt, "second");
    }

    #[test]
    fn drops_inline_commands_without_literals() {
        let mut config = AssistConfig::default();
        config.inline_commands.push(InlineCommand { pattern: "%".into(), prompt: "x".into() });
        config.inline_commands.push(InlineCommand { pattern: String::new(), prompt: "x".into() });
        assert_eq!(config.normalized().inline_commands.len(), 3);
    }

    #[test]
    fn upsert_overwrites_by_trigger() {
        let mut config = AssistConfig::default();
        config.upsert_snippet(Snippet { trigger: "email".into(), content: "me@work.example".into() });
        config.upsert_snippet(Snippet { trigger: "addr".into(), content: "123 Main St".into() });
        assert_eq!(config.snippets.len(), 3);
        assert_eq!(config.snippets[0].content, "me@work.example");
    }
}
