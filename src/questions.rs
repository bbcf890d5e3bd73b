//! Question detection over scrubbed record text.
//!
//! A record counts as a question when its text contains an interrogative
//! pronoun as a whole word, a literal question mark, or one of the
//! configured action keywords as a substring.

use regex::Regex;

use crate::config::QuestionPatterns;

/// Errors raised when constructing a detector.
#[derive(Debug, thiserror::Error)]
pub enum QuestionError {
    #[error("interrogative pronoun list is empty")]
    NoPronouns,

    #[error("action keyword list is empty")]
    NoActionKeywords,

    #[error("malformed question pattern: {0}")]
    BadPattern(#[from] regex::Error),
}

/// Flags interrogative or domain-actionable records.
///
/// The configured pattern sets compile into a single case-insensitive
/// regex at construction; detection itself is pure and total.
pub struct QuestionDetector {
    pattern: Regex,
}

impl QuestionDetector {
    pub fn new(patterns: &QuestionPatterns) -> Result<Self, QuestionError> {
        if patterns.pronouns.is_empty() {
            return Err(QuestionError::NoPronouns);
        }
        if patterns.action_keywords.is_empty() {
            return Err(QuestionError::NoActionKeywords);
        }

        let pronouns = patterns
            .pronouns
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");
        let actions = patterns
            .action_keywords
            .iter()
            .map(|a| regex::escape(a))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = Regex::new(&format!(r"(?i)\b({pronouns})\b|[?]|{actions}"))?;

        Ok(Self { pattern })
    }

    /// True iff the text matches any configured question pattern.
    /// Empty text is never a question.
    pub fn is_question(&self, text: &str) -> bool {
        !text.is_empty() && self.pattern.is_match(text)
    }
}
