//! Literal-plus-placeholder patterns such as `(.g:%)`.
//!
//! Everything except `%` is matched literally. Each placeholder captures
//! one or more characters, as few as possible, and never crosses a line
//! break. Matching is leftmost-first.

use std::ops::Range;
use thiserror::Error;

pub const PLACEHOLDER: char = '%';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern {0:?} has no `%` placeholder")]
    MissingPlaceholder(String),
    #[error("pattern {pattern:?} has {found} placeholders, expected {expected}")]
    PlaceholderCount {
        pattern: String,
        expected: usize,
        found: usize,
    },
    #[error("pattern {0:?} has no literal text")]
    EmptySkeleton(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    /// Literal text around the placeholders, one more entry than captures.
    literals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch<'t> {
    /// Byte range of the whole match in the searched text.
    pub span: Range<usize>,
    pub captures: Vec<&'t str>,
}

impl<'t> PatternMatch<'t> {
    pub fn operand(&self) -> &'t str {
        self.captures[0]
    }
}

impl Pattern {
    /// Compiles an inline command pattern, which takes exactly one placeholder.
    pub fn inline(source: &str) -> Result<Self, PatternError> {
        Self::with_captures(source, 1)
    }

    pub fn with_captures(source: &str, expected: usize) -> Result<Self, PatternError> {
        let literals: Vec<String> = source.split(PLACEHOLDER).map(String::from).collect();
        let found = literals.len() - 1;
        if found == 0 {
            return Err(PatternError::MissingPlaceholder(source.to_string()));
        }
        if found != expected {
            return Err(PatternError::PlaceholderCount {
                pattern: source.to_string(),
                expected,
                found,
            });
        }
        if literals.iter().all(String::is_empty) {
            return Err(PatternError::EmptySkeleton(source.to_string()));
        }
        Ok(Self {
            source: source.to_string(),
            literals,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the leftmost match in `text`, if any.
    pub fn find<'t>(&self, text: &'t str) -> Option<PatternMatch<'t>> {
        let prefix = self.literals[0].as_str();
        let mut captures = Vec::with_capacity(self.literals.len() - 1);
        for start in occurrences(text, prefix) {
            captures.clear();
            if let Some(end) = self.match_from(text, start + prefix.len(), 0, &mut captures) {
                return Some(PatternMatch {
                    span: start..end,
                    captures: captures.iter().map(|r| &text[r.clone()]).collect(),
                });
            }
        }
        None
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// Matches capture `index` starting at `at`, followed by the rest of the
    /// pattern. Returns the end of the whole match.
    fn match_from(
        &self,
        text: &str,
        at: usize,
        index: usize,
        captures: &mut Vec<Range<usize>>,
    ) -> Option<usize> {
        if index + 1 == self.literals.len() {
            return Some(at);
        }
        let next = self.literals[index + 1].as_str();
        for (offset, ch) in text[at..].char_indices() {
            if is_line_break(ch) {
                return None;
            }
            let end = at + offset + ch.len_utf8();
            if text[end..].starts_with(next) {
                captures.push(at..end);
                if let Some(done) = self.match_from(text, end + next.len(), index + 1, captures) {
                    return Some(done);
                }
                captures.pop();
            }
        }
        None
    }
}

fn is_line_break(ch: char) -> bool {
    ch == '\n' || ch == '\r'
}

/// Start offsets of `needle` in `haystack`, overlapping ones included.
/// An empty needle occurs at every char boundary.
fn occurrences<'a>(haystack: &'a str, needle: &'a str) -> impl Iterator<Item = usize> + 'a {
    let mut from = Some(0);
    std::iter::from_fn(move || {
        let start = from?;
        let found = if needle.is_empty() {
            Some(start).filter(|&s| s < haystack.len())
        } else {
            haystack[start..].find(needle).map(|i| start + i)
        };
        from = found.and_then(|pos| {
            haystack[pos..]
                .chars()
                .next()
                .map(|ch| pos + ch.len_utf8())
        });
        found
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(pattern: &str, text: &str) -> Option<String> {
        Pattern::inline(pattern)
            .unwrap()
            .find(text)
            .map(|m| m.operand().to_string())
    }

    #[test]
    fn captures_operand_between_literals() {
        let pattern = "(.g:%)";
        for (pre, op, suf) in [
            ("", "i go home", ""),
            ("before ", "x", " after"),
            ("Tomorrow I am visiting ", " capital of Japan", " next week."),
            ("émoji 🙂 ", "naïve café", " ✓"),
        ] {
            let text = format!("{pre}{}{suf}", pattern.replace('%', op));
            let m = Pattern::inline(pattern).unwrap().find(&text).unwrap();
            assert_eq!(m.operand(), op);
            assert_eq!(&text[m.span.clone()], pattern.replace('%', op));
        }
    }

    #[test]
    fn capture_is_non_greedy() {
        assert_eq!(capture("[%]", "[a] and [b]").as_deref(), Some("a"));
        assert_eq!(capture("<%>", "<a>b>").as_deref(), Some("a"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert_eq!(capture("$.*(%)+?", "x $.*(hi)+? y").as_deref(), Some("hi"));
        assert_eq!(capture("a.%", "abc"), None);
    }

    #[test]
    fn placeholder_at_either_end() {
        assert_eq!(capture("%!!", "shout this!!").as_deref(), Some("shout this"));
        // Nothing after the placeholder: the shortest capture is one char.
        assert_eq!(capture("fix:%", "fix:teh").as_deref(), Some("t"));
    }

    #[test]
    fn capture_needs_at_least_one_char() {
        assert_eq!(capture("(.g:%)", "(.g:)"), None);
        assert_eq!(capture("(.g:%)", "(.g:))").as_deref(), Some(")"));
    }

    #[test]
    fn capture_stops_at_line_breaks() {
        assert_eq!(capture("(.g:%)", "(.g:one\ntwo)"), None);
        assert_eq!(capture("(.g:%)", "(.g:one\n(.g:two)").as_deref(), Some("two"));
    }

    #[test]
    fn leftmost_match_wins() {
        let m = Pattern::inline("[%]").unwrap().find("x [first] [second]").unwrap();
        assert_eq!(m.span, 2..9);
        assert_eq!(m.operand(), "first");
    }

    #[test]
    fn repeated_prefix_characters() {
        assert_eq!(capture("aa%b", "aaab").as_deref(), Some("a"));
        assert_eq!(capture("aa%b", "aa\naaxb").as_deref(), Some("x"));
    }

    #[test]
    fn rejects_bad_placeholder_counts() {
        assert_eq!(
            Pattern::inline("(.g:)"),
            Err(PatternError::MissingPlaceholder("(.g:)".into()))
        );
        assert!(matches!(
            Pattern::inline("(%:%)"),
            Err(PatternError::PlaceholderCount { found: 2, .. })
        ));
        assert_eq!(Pattern::inline("%"), Err(PatternError::EmptySkeleton("%".into())));
    }

    #[test]
    fn two_captures_for_save_skeleton() {
        let pattern = Pattern::with_captures("(.save:%:%)", 2).unwrap();
        let text = "note (.save:addr:123 Main St) done";
        let m = pattern.find(text).unwrap();
        assert_eq!(m.captures, vec!["addr", "123 Main St"]);
        assert_eq!(&text[m.span], "(.save:addr:123 Main St)");
    }

    #[test]
    fn second_capture_may_contain_the_separator() {
        let pattern = Pattern::with_captures("(.save:%:%)", 2).unwrap();
        let m = pattern.find("(.save:time:9:30 am)").unwrap();
        assert_eq!(m.captures, vec!["time", "9:30 am"]);
    }
}
