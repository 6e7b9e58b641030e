//! Command detection: what, if anything, a text snapshot asks for.

pub mod matcher;
pub mod pattern;

use std::ops::Range;

pub use matcher::CommandMatcher;
pub use pattern::{Pattern, PatternError, PatternMatch};

/// Offline utility commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Utility {
    Date,
    Time,
    Password,
    Calculate(String),
}

/// The single command selected for a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `(.save:NAME:CONTENT)`: store a snippet and delete the command text.
    SaveSnippet {
        name: String,
        content: String,
        span: Range<usize>,
    },
    /// Inline command; the provider's answer replaces `span`.
    Inline {
        prompt: String,
        operand: String,
        span: Range<usize>,
    },
    /// Snippet prefix plus key at the end of the text.
    ExpandSnippet { key: String, span: Range<usize> },
    /// Trailing trigger; the provider's answer replaces the whole text.
    Trailing { prompt: String, operand: String },
    Undo,
    Utility { utility: Utility, span: Range<usize> },
}

impl Action {
    pub fn is_remote(&self) -> bool {
        matches!(self, Action::Inline { .. } | Action::Trailing { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::SaveSnippet { .. } => "save-snippet",
            Action::Inline { .. } => "inline",
            Action::ExpandSnippet { .. } => "snippet",
            Action::Trailing { .. } => "trigger",
            Action::Undo => "undo",
            Action::Utility { utility, .. } => match utility {
                Utility::Date => "date",
                Utility::Time => "time",
                Utility::Password => "password",
                Utility::Calculate(_) => "calculator",
            },
        }
    }

    /// The surface text once this action resolved to `result`.
    pub fn splice(&self, snapshot: &str, result: &str) -> String {
        let span = match self {
            Action::Trailing { .. } | Action::Undo => return result.to_string(),
            Action::SaveSnippet { span, .. }
            | Action::Inline { span, .. }
            | Action::ExpandSnippet { span, .. }
            | Action::Utility { span, .. } => span,
        };
        let mut out = String::with_capacity(snapshot.len() - span.len() + result.len());
        out.push_str(&snapshot[..span.start]);
        out.push_str(result);
        out.push_str(&snapshot[span.end..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splice_replaces_only_the_span() {
        let action = Action::Utility {
            utility: Utility::Calculate(" 2+2".into()),
            span: 4..13,
        };
        assert_eq!(action.splice("sum (.c: 2+2) ok", "4"), "sum 4 ok");
    }

    #[test]
    fn trailing_replaces_everything() {
        let action = Action::Trailing {
            prompt: "p".into(),
            operand: "i go home".into(),
        };
        assert_eq!(action.splice("i go home .g", "I went home."), "I went home.");
        assert!(action.is_remote());
    }
}
