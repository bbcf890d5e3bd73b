//! Text cleaning and domain filtering.
//!
//! Mirrors the ingest side of the pipeline: every record gets a
//! `processed_text` (scrubbed body) and a domain-relevance flag derived
//! from a configured keyword list.

use crate::records::{NormalizedRecord, Record};

/// Errors raised when constructing a normalizer.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("domain keyword list is empty")]
    NoKeywords,
}

/// Cleans record bodies and flags domain-relevant records.
///
/// Normalization is a pure function of the record and the keyword list:
/// no I/O, never fails, an absent body is a valid input.
pub struct TextNormalizer {
    keywords: Vec<String>,
}

impl TextNormalizer {
    /// Create a normalizer from a keyword list. Keywords are matched as
    /// case-insensitive substrings of the scrubbed body.
    pub fn new(keywords: &[String]) -> Result<Self, NormalizeError> {
        if keywords.is_empty() {
            return Err(NormalizeError::NoKeywords);
        }
        Ok(Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        })
    }

    /// Normalize a single record.
    ///
    /// Absent or empty body yields `processed_text = ""` and
    /// `is_domain_relevant = false`.
    pub fn normalize(&self, record: Record) -> NormalizedRecord {
        let processed_text = match &record.body {
            Some(body) if !body.is_empty() => scrub(body),
            _ => String::new(),
        };

        let is_domain_relevant = !processed_text.is_empty()
            && self
                .keywords
                .iter()
                .any(|keyword| processed_text.contains(keyword));

        NormalizedRecord {
            record,
            processed_text,
            is_domain_relevant,
        }
    }
}

/// Lower-case ASCII letters, keep whitespace, and turn every other
/// character into exactly one space. No collapsing of repeated spaces:
/// each scrubbed character maps to exactly one output character.
// TODO: fold accents before matching so keywords like "asesoría" can
// actually hit the scrubbed text.
fn scrub(body: &str) -> String {
    body.chars()
        .map(|c| {
            if c.is_ascii_alphabetic() {
                c.to_ascii_lowercase()
            } else if c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords() -> Vec<String> {
        vec!["invertir".to_string(), "broker".to_string()]
    }

    fn record(body: Option<&str>) -> Record {
        Record {
            id: 1,
            subject: "asunto".to_string(),
            body: body.map(|b| b.to_string()),
        }
    }

    #[test]
    fn test_empty_keyword_list_rejected() {
        assert!(matches!(
            TextNormalizer::new(&[]),
            Err(NormalizeError::NoKeywords)
        ));
    }

    #[test]
    fn test_absent_body() {
        let normalizer = TextNormalizer::new(&keywords()).unwrap();
        let normalized = normalizer.normalize(record(None));

        assert_eq!(normalized.processed_text, "");
        assert!(!normalized.is_domain_relevant);
    }

    #[test]
    fn test_empty_body() {
        let normalizer = TextNormalizer::new(&keywords()).unwrap();
        let normalized = normalizer.normalize(record(Some("")));

        assert_eq!(normalized.processed_text, "");
        assert!(!normalized.is_domain_relevant);
    }

    #[test]
    fn test_scrub_replaces_each_non_letter_with_one_space() {
        let normalizer = TextNormalizer::new(&keywords()).unwrap();
        let normalized = normalizer.normalize(record(Some("Quiero invertir: 100%!")));

        // Each of ':', '1', '0', '0', '%', '!' becomes exactly one space,
        // and the original space survives: 7 trailing spaces total.
        assert_eq!(normalized.processed_text, "quiero invertir       ");
        assert!(normalized.is_domain_relevant);
    }

    #[test]
    fn test_scrub_keeps_whitespace_without_collapsing() {
        let normalizer = TextNormalizer::new(&keywords()).unwrap();
        let normalized = normalizer.normalize(record(Some("a  b\tc\nd")));

        assert_eq!(normalized.processed_text, "a  b\tc\nd");
    }

    #[test]
    fn test_non_ascii_letters_become_spaces() {
        let normalizer = TextNormalizer::new(&keywords()).unwrap();
        let normalized = normalizer.normalize(record(Some("qué índice")));

        // 'é' and 'í' each map to one space; the middle space survives.
        assert_eq!(normalized.processed_text, "qu   ndice");
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let normalizer = TextNormalizer::new(&keywords()).unwrap();
        let normalized = normalizer.normalize(record(Some("Mi BROKER favorito")));

        assert!(normalized.is_domain_relevant);
    }

    #[test]
    fn test_no_keyword_no_relevance() {
        let normalizer = TextNormalizer::new(&keywords()).unwrap();
        let normalized = normalizer.normalize(record(Some("nada que ver aqui")));

        assert!(!normalized.is_domain_relevant);
    }

    #[test]
    fn test_keyword_inside_larger_word_still_matches() {
        // Substring semantics, not word-boundary semantics.
        let normalizer = TextNormalizer::new(&keywords()).unwrap();
        let normalized = normalizer.normalize(record(Some("reinvertiremos todo")));

        assert!(normalized.is_domain_relevant);
    }
}
