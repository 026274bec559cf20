// SPDX-License-Identifier: MIT

//! Requirements over the analyzed text of the current turn

use super::base::{CheckParams, Requirement, RequirementBase};
use crate::error::GateError;
use crate::operators::Operator;
use crate::session::Session;
use crate::text::{TextAnalysis, PHONE_NUMBER_TOKEN};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

fn parse_config<T: serde::de::DeserializeOwned>(config: &Value) -> Result<T, GateError> {
    serde_json::from_value(config.clone())
        .map_err(|e| GateError::config(format!("invalid requirement config {config}: {e}")))
}

#[derive(Deserialize)]
struct InputWordsConfig {
    input_words: Vec<String>,
}

/// True iff any configured substring occurs in the lowercased raw text
pub struct AnySubstringInLoweredTextRequirement {
    base: RequirementBase,
    substrings: Vec<String>,
}

#[derive(Deserialize)]
struct SubstringsConfig {
    substrings: Vec<String>,
}

impl AnySubstringInLoweredTextRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: SubstringsConfig = parse_config(config)?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            substrings: parsed.substrings.iter().map(|s| s.to_lowercase()).collect(),
        })
    }
}

impl Requirement for AnySubstringInLoweredTextRequirement {
    fn type_name(&self) -> &'static str {
        "any_substring_in_lowered_text"
    }

    fn base(&self) -> &RequirementBase {
        &self.base
    }

    fn evaluate(
        &self,
        text: &TextAnalysis,
        _session: &mut Session,
        _params: Option<&CheckParams>,
    ) -> Result<bool, GateError> {
        let lowered = text.original_text.to_lowercase();
        Ok(self.substrings.iter().any(|s| lowered.contains(s)))
    }
}

/// True iff the first numeric token falls inside the inclusive range.
/// Bounds may be given as numbers or numeric strings; a turn without a
/// numeric token never passes.
pub struct NumInRangeRequirement {
    base: RequirementBase,
    min_num: f64,
    max_num: f64,
}

#[derive(Deserialize)]
struct RangeConfig {
    min_num: Value,
    max_num: Value,
}

fn bound_from_value(value: &Value, name: &str) -> Result<f64, GateError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| GateError::config(format!("{name} is not a finite number: {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| GateError::config(format!("{name} is not numeric: '{s}'"))),
        other => Err(GateError::config(format!("{name} must be a number, got {other}"))),
    }
}

impl NumInRangeRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: RangeConfig = parse_config(config)?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            min_num: bound_from_value(&parsed.min_num, "min_num")?,
            max_num: bound_from_value(&parsed.max_num, "max_num")?,
        })
    }
}

impl Requirement for NumInRangeRequirement {
    fn type_name(&self) -> &'static str {
        "num_in_range"
    }

    fn base(&self) -> &RequirementBase {
        &self.base
    }

    fn evaluate(
        &self,
        text: &TextAnalysis,
        _session: &mut Session,
        _params: Option<&CheckParams>,
    ) -> Result<bool, GateError> {
        Ok(text
            .first_number()
            .is_some_and(|n| n >= self.min_num && n <= self.max_num))
    }
}

/// Compares the count of phone-number tokens against a threshold
pub struct PhoneNumberNumberRequirement {
    base: RequirementBase,
    operator: Operator,
}

#[derive(Deserialize)]
struct OperatorOnlyConfig {
    operator: Value,
}

impl PhoneNumberNumberRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: OperatorOnlyConfig = parse_config(config)?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            operator: Operator::from_config(&parsed.operator)?,
        })
    }
}

impl Requirement for PhoneNumberNumberRequirement {
    fn type_name(&self) -> &'static str {
        "phone_number_number"
    }

    fn base(&self) -> &RequirementBase {
        &self.base
    }

    fn evaluate(
        &self,
        text: &TextAnalysis,
        _session: &mut Session,
        _params: Option<&CheckParams>,
    ) -> Result<bool, GateError> {
        let count = text.token_values_by_type(PHONE_NUMBER_TOKEN).len();
        Ok(self.operator.compare_number(count as f64))
    }
}

/// True iff the turn's lemma set shares at least one word with the
/// configured set
pub struct IntersectionWithTokensSetRequirement {
    base: RequirementBase,
    input_words: HashSet<String>,
}

impl IntersectionWithTokensSetRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: InputWordsConfig = parse_config(config)?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            input_words: parsed.input_words.into_iter().collect(),
        })
    }
}

impl Requirement for IntersectionWithTokensSetRequirement {
    fn type_name(&self) -> &'static str {
        "intersection_with_tokens_set"
    }

    fn base(&self) -> &RequirementBase {
        &self.base
    }

    fn evaluate(
        &self,
        text: &TextAnalysis,
        _session: &mut Session,
        _params: Option<&CheckParams>,
    ) -> Result<bool, GateError> {
        Ok(text
            .lemma_set()
            .iter()
            .any(|lemma| self.input_words.contains(*lemma)))
    }
}

/// True iff the normalized text, with any trailing punctuation token
/// dropped, is exactly one of the configured phrases
pub struct NormalizedTextInSetRequirement {
    base: RequirementBase,
    input_words: HashSet<String>,
}

impl NormalizedTextInSetRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: InputWordsConfig = parse_config(config)?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            input_words: parsed.input_words.into_iter().collect(),
        })
    }
}

impl Requirement for NormalizedTextInSetRequirement {
    fn type_name(&self) -> &'static str {
        "normalized_text_in_set"
    }

    fn base(&self) -> &RequirementBase {
        &self.base
    }

    fn evaluate(
        &self,
        text: &TextAnalysis,
        _session: &mut Session,
        _params: Option<&CheckParams>,
    ) -> Result<bool, GateError> {
        Ok(self.input_words.contains(&text.normalized_text_stripped()))
    }
}

/// True iff any word from any configured phrase occurs in the turn's
/// lemma set. Phrases are split on whitespace at construction.
pub struct IntersectionRequirement {
    base: RequirementBase,
    words: HashSet<String>,
}

#[derive(Deserialize)]
struct PhrasesConfig {
    phrases: Vec<String>,
}

impl IntersectionRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: PhrasesConfig = parse_config(config)?;
        let words = parsed
            .phrases
            .iter()
            .flat_map(|phrase| phrase.split_whitespace().map(str::to_string))
            .collect();
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            words,
        })
    }
}

impl Requirement for IntersectionRequirement {
    fn type_name(&self) -> &'static str {
        "intersection"
    }

    fn base(&self) -> &RequirementBase {
        &self.base
    }

    fn evaluate(
        &self,
        text: &TextAnalysis,
        _session: &mut Session,
        _params: Option<&CheckParams>,
    ) -> Result<bool, GateError> {
        Ok(text
            .lemma_set()
            .iter()
            .any(|lemma| self.words.contains(*lemma)))
    }
}
