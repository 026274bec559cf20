// SPDX-License-Identifier: MIT

//! Requirements over per-session counters

use super::base::{CheckParams, Requirement, RequirementBase};
use crate::error::GateError;
use crate::operators::Operator;
use crate::session::{Counter, Session};
use crate::text::TextAnalysis;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct CounterConfig {
    key: String,
    operator: Value,
}

fn parse_counter_config(config: &Value) -> Result<(String, Operator), GateError> {
    let parsed: CounterConfig = serde_json::from_value(config.clone())
        .map_err(|e| GateError::config(format!("invalid counter requirement config {config}: {e}")))?;
    Ok((parsed.key, Operator::from_config(&parsed.operator)?))
}

fn lookup_counter<'a>(session: &'a Session, key: &str) -> Result<&'a Counter, GateError> {
    session
        .counters
        .get(key)
        .ok_or_else(|| GateError::evaluation(format!("counter '{key}' not found in session")))
}

/// Compares the named counter's accumulated value against a threshold
pub struct CounterValueRequirement {
    base: RequirementBase,
    key: String,
    operator: Operator,
}

impl CounterValueRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let (key, operator) = parse_counter_config(config)?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            key,
            operator,
        })
    }
}

impl Requirement for CounterValueRequirement {
    fn type_name(&self) -> &'static str {
        "counter_value"
    }

    fn base(&self) -> &RequirementBase {
        &self.base
    }

    fn evaluate(
        &self,
        _text: &TextAnalysis,
        session: &mut Session,
        _params: Option<&CheckParams>,
    ) -> Result<bool, GateError> {
        let counter = lookup_counter(session, &self.key)?;
        Ok(self.operator.compare_number(counter.value))
    }
}

/// Compares the seconds elapsed since the named counter's last update
/// against a threshold
pub struct CounterUpdateTimeRequirement {
    base: RequirementBase,
    key: String,
    operator: Operator,
}

impl CounterUpdateTimeRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let (key, operator) = parse_counter_config(config)?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            key,
            operator,
        })
    }
}

impl Requirement for CounterUpdateTimeRequirement {
    fn type_name(&self) -> &'static str {
        "counter_update_time"
    }

    fn base(&self) -> &RequirementBase {
        &self.base
    }

    fn evaluate(
        &self,
        _text: &TextAnalysis,
        session: &mut Session,
        _params: Option<&CheckParams>,
    ) -> Result<bool, GateError> {
        let counter = lookup_counter(session, &self.key)?;
        let elapsed = Utc::now().timestamp() - counter.update_time;
        Ok(self.operator.compare_number(elapsed as f64))
    }
}
