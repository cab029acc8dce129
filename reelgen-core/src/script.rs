use crate::types::StyleId;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

pub const MIN_SCRIPT_CHARS: usize = 10;
pub const MAX_SCRIPT_CHARS: usize = 2000;

// How many leading words a derived title keeps.
const TITLE_WORDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("script is empty")]
    Empty,
    #[error("script too short ({len} chars, minimum {min})")]
    TooShort { len: usize, min: usize },
    #[error("script too long ({len} chars, maximum {max})")]
    TooLong { len: usize, max: usize },
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Checks the script against the submit bounds.
///
/// Length is counted in chars after trimming, so trailing whitespace can't
/// sneak a too-short script past the minimum.
pub fn validate_script(script: &str) -> Result<(), ScriptError> {
    let trimmed = script.trim();
    if trimmed.is_empty() {
        return Err(ScriptError::Empty);
    }

    let len = trimmed.chars().count();
    if len < MIN_SCRIPT_CHARS {
        return Err(ScriptError::TooShort {
            len,
            min: MIN_SCRIPT_CHARS,
        });
    }
    if len > MAX_SCRIPT_CHARS {
        return Err(ScriptError::TooLong {
            len,
            max: MAX_SCRIPT_CHARS,
        });
    }

    Ok(())
}

/// Collapses runs of whitespace (including newlines) into single spaces.
pub fn normalize_script(script: &str) -> String {
    whitespace_re()
        .replace_all(script.trim(), " ")
        .to_string()
}

/// Derives a display title from the opening words of the script.
///
/// Never empty for a script that passed validation.
pub fn derive_title(script: &str) -> String {
    let normalized = normalize_script(script);
    let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();

    if words.len() <= TITLE_WORDS {
        return words.join(" ");
    }

    words[..TITLE_WORDS].join(" ") + "…"
}

/// Deterministic placeholder thumbnail for a style.
///
/// Real artwork comes from the provider; these stand in for records that
/// predate it or were generated without one.
pub fn thumbnail_for_style(style: &StyleId) -> String {
    match style.as_str() {
        "corporate" => "🏢",
        "education" | "tutorial" => "🎓",
        "training" => "📚",
        "marketing" => "📱",
        "social" => "📺",
        _ => "🎬",
    }
    .to_string()
}
