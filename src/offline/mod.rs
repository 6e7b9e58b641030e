//! Commands that resolve locally without a provider call.

pub mod expr;

use chrono::{DateTime, Local};
use rand::Rng;

use crate::commands::Utility;
use crate::config::Snippet;

pub const PASSWORD_LEN: usize = 12;
const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

/// Shown in place of the expression when the calculator cannot evaluate it.
pub const CALC_ERROR: &str = "Error";

pub fn resolve_utility(utility: &Utility) -> String {
    match utility {
        Utility::Date => date_stamp(Local::now()),
        Utility::Time => time_stamp(Local::now()),
        Utility::Password => generate_password(&mut rand::rng()),
        Utility::Calculate(expression) => calculate(expression),
    }
}

pub fn expand_snippet<'s>(snippets: &'s [Snippet], key: &str) -> Option<&'s str> {
    snippets
        .iter()
        .find(|s| s.trigger == key)
        .map(|s| s.content.as_str())
}

/// e.g. `Friday, Dec 19`
pub fn date_stamp(now: DateTime<Local>) -> String {
    now.format("%A, %b %-d").to_string()
}

/// e.g. `2025-12-19 14:30`
pub fn time_stamp(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d %H:%M").to_string()
}

pub fn generate_password<R: Rng>(rng: &mut R) -> String {
    (0..PASSWORD_LEN)
        .map(|_| PASSWORD_ALPHABET[rng.random_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect()
}

pub fn calculate(expression: &str) -> String {
    match expr::evaluate(expression) {
        Ok(value) => format_number(value),
        Err(e) => {
            tracing::debug!("calculator rejected {:?}: {}", expression, e);
            CALC_ERROR.to_string()
        }
    }
}

/// Whole numbers print without a fraction; anything else is rounded to four
/// places with trailing zeros dropped.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let fixed = format!("{value:.4}");
    if !fixed.contains('.') {
        return fixed;
    }
    match fixed.trim_end_matches('0').trim_end_matches('.') {
        "-0" => "0".to_string(),
        trimmed => trimmed.to_string(),
    }
}
