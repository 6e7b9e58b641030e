use super::{Action, Pattern, Utility};
use crate::config::{AssistConfig, TriggerRule};

/// Trailing-trigger operands shorter than this (in chars, after trimming)
/// are treated as accidental and ignored.
pub const MIN_TRIGGER_OPERAND: usize = 2;

/// Scans a snapshot against the configured command tables.
///
/// Precedence, first hit wins: save-snippet, inline commands, snippet
/// expansion, trailing triggers, undo, offline utilities.
pub struct CommandMatcher<'c> {
    config: &'c AssistConfig,
    save: Option<Pattern>,
    inline: Vec<(Pattern, &'c str)>,
    calculator: Option<Pattern>,
}

impl<'c> CommandMatcher<'c> {
    pub fn new(config: &'c AssistConfig) -> Self {
        let inline = config
            .inline_commands
            .iter()
            .filter_map(|cmd| compile(&cmd.pattern, 1).map(|p| (p, cmd.prompt.as_str())))
            .collect();
        Self {
            config,
            save: compile(&config.save_snippet_pattern, 2),
            inline,
            calculator: compile(&config.utilities.calculator, 1),
        }
    }

    pub fn classify(&self, snapshot: &str) -> Option<Action> {
        if snapshot.is_empty() {
            return None;
        }
        if let Some(action) = self.save_snippet(snapshot) {
            return Some(action);
        }
        if let Some(action) = self.inline(snapshot) {
            return Some(action);
        }
        if let Some(action) = self.snippet(snapshot) {
            return Some(action);
        }
        if let Some(rule) = self.trailing_rule(snapshot) {
            let operand = snapshot[..snapshot.len() - rule.pattern.len()].trim();
            if operand.chars().count() < MIN_TRIGGER_OPERAND {
                tracing::debug!("trigger {:?} with too little text, ignoring", rule.pattern);
                return None;
            }
            return Some(Action::Trailing {
                prompt: rule.prompt.clone(),
                operand: operand.to_string(),
            });
        }
        if self.is_undo(snapshot) {
            return Some(Action::Undo);
        }
        self.utility(snapshot)
    }

    fn save_snippet(&self, snapshot: &str) -> Option<Action> {
        let found = self.save.as_ref()?.find(snapshot)?;
        let name = found.captures[0].trim();
        if name.is_empty() {
            return None;
        }
        Some(Action::SaveSnippet {
            name: name.to_string(),
            content: found.captures[1].trim().to_string(),
            span: found.span,
        })
    }

    fn inline(&self, snapshot: &str) -> Option<Action> {
        self.inline.iter().find_map(|(pattern, prompt)| {
            pattern.find(snapshot).map(|found| Action::Inline {
                prompt: prompt.to_string(),
                operand: found.operand().to_string(),
                span: found.span,
            })
        })
    }

    /// Longest snippet key wins when several keys end the snapshot.
    fn snippet(&self, snapshot: &str) -> Option<Action> {
        let prefix = self.config.snippet_trigger_prefix.as_str();
        if prefix.is_empty() {
            return None;
        }
        let key = self
            .config
            .snippets
            .iter()
            .map(|s| s.trigger.as_str())
            .filter(|key| !key.is_empty())
            .filter(|key| {
                snapshot
                    .strip_suffix(key)
                    .is_some_and(|rest| rest.ends_with(prefix))
            })
            .max_by_key(|key| key.len())?;
        let start = snapshot.len() - key.len() - prefix.len();
        Some(Action::ExpandSnippet {
            key: key.to_string(),
            span: start..snapshot.len(),
        })
    }

    fn trailing_rule(&self, snapshot: &str) -> Option<&'c TriggerRule> {
        self.config
            .triggers
            .iter()
            .find(|rule| !rule.pattern.is_empty() && snapshot.ends_with(&rule.pattern))
    }

    fn is_undo(&self, snapshot: &str) -> bool {
        let undo = self.config.undo_command_pattern.as_str();
        !undo.is_empty() && snapshot.trim() == undo
    }

    fn utility(&self, snapshot: &str) -> Option<Action> {
        let utilities = &self.config.utilities;
        let suffixes = [
            (&utilities.date, Utility::Date),
            (&utilities.time, Utility::Time),
            (&utilities.password, Utility::Password),
        ];
        for (literal, utility) in suffixes {
            if !literal.is_empty() && snapshot.ends_with(literal.as_str()) {
                return Some(Action::Utility {
                    utility,
                    span: snapshot.len() - literal.len()..snapshot.len(),
                });
            }
        }
        let found = self.calculator.as_ref()?.find(snapshot)?;
        Some(Action::Utility {
            utility: Utility::Calculate(found.operand().to_string()),
            span: found.span,
        })
    }
}

fn compile(source: &str, captures: usize) -> Option<Pattern> {
    if source.is_empty() {
        return None;
    }
    match Pattern::with_captures(source, captures) {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            tracing::debug!("skipping pattern: {}", e);
            None
        }
    }
}
