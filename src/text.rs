// SPDX-License-Identifier: MIT

//! Normalized utterance representation
//!
//! `TextAnalysis` is the product of the external NLP pipeline: the raw
//! utterance plus its normalized form and token stream. The pipeline
//! itself is out of scope; this type is the consumed interface.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Token type for numeric tokens
pub const NUM_TOKEN: &str = "num";
/// Token type for phone-number tokens
pub const PHONE_NUMBER_TOKEN: &str = "phone_number";

/// A single token produced by the NLP pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub lemma: String,
    #[serde(default)]
    pub token_type: String,
    /// Typed value for tokens like numbers and phone numbers
    #[serde(default)]
    pub value: Option<Value>,
}

/// NLP-normalized view of one utterance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextAnalysis {
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub normalized_text: String,
    #[serde(default)]
    pub tokens: Vec<Token>,
}

impl TextAnalysis {
    /// An empty analysis, for turns with no utterance
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set of lemmas over all tokens
    pub fn lemma_set(&self) -> HashSet<&str> {
        self.tokens.iter().map(|t| t.lemma.as_str()).collect()
    }

    /// Typed values of all tokens of the given type, in utterance order
    pub fn token_values_by_type(&self, kind: &str) -> Vec<&Value> {
        self.tokens
            .iter()
            .filter(|t| t.token_type == kind)
            .filter_map(|t| t.value.as_ref())
            .collect()
    }

    /// Number of numeric tokens in the utterance
    pub fn number_of_numbers(&self) -> usize {
        self.tokens.iter().filter(|t| t.token_type == NUM_TOKEN).count()
    }

    /// Value of the first numeric token, if any
    pub fn first_number(&self) -> Option<f64> {
        self.token_values_by_type(NUM_TOKEN)
            .first()
            .and_then(|v| v.as_f64())
    }

    /// Normalized text with a trailing punctuation-only token stripped
    pub fn normalized_text_stripped(&self) -> String {
        let mut words: Vec<&str> = self.normalized_text.split_whitespace().collect();
        if let Some(last) = words.last() {
            if !last.is_empty() && last.chars().all(|c| c.is_ascii_punctuation()) {
                words.pop();
            }
        }
        words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token(text: &str, lemma: &str, token_type: &str, value: Option<Value>) -> Token {
        Token {
            text: text.to_string(),
            lemma: lemma.to_string(),
            token_type: token_type.to_string(),
            value,
        }
    }

    #[test]
    fn test_lemma_set() {
        let analysis = TextAnalysis {
            tokens: vec![
                token("погоды", "погода", "word", None),
                token("прогноз", "прогноз", "word", None),
            ],
            ..Default::default()
        };
        let lemmas = analysis.lemma_set();
        assert!(lemmas.contains("погода"));
        assert!(lemmas.contains("прогноз"));
        assert!(!lemmas.contains("погоды"));
    }

    #[test]
    fn test_first_number() {
        let analysis = TextAnalysis {
            tokens: vec![
                token("хочу", "хотеть", "word", None),
                token("7", "7", NUM_TOKEN, Some(json!(7))),
            ],
            ..Default::default()
        };
        assert_eq!(analysis.first_number(), Some(7.0));
        assert_eq!(analysis.number_of_numbers(), 1);
    }

    #[test]
    fn test_first_number_missing() {
        assert_eq!(TextAnalysis::empty().first_number(), None);
    }

    #[test]
    fn test_token_values_by_type() {
        let analysis = TextAnalysis {
            tokens: vec![
                token("89030478799", "89030478799", PHONE_NUMBER_TOKEN, Some(json!("89030478799"))),
                token("и", "и", "word", None),
                token("89092534523", "89092534523", PHONE_NUMBER_TOKEN, Some(json!("89092534523"))),
            ],
            ..Default::default()
        };
        assert_eq!(analysis.token_values_by_type(PHONE_NUMBER_TOKEN).len(), 2);
        assert!(analysis.token_values_by_type("num").is_empty());
    }

    #[test]
    fn test_normalized_text_stripped() {
        let analysis = TextAnalysis {
            normalized_text: "погода .".to_string(),
            ..Default::default()
        };
        assert_eq!(analysis.normalized_text_stripped(), "погода");

        let analysis = TextAnalysis {
            normalized_text: "хотеть узнать".to_string(),
            ..Default::default()
        };
        assert_eq!(analysis.normalized_text_stripped(), "хотеть узнать");
    }
}
