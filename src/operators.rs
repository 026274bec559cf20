// SPDX-License-Identifier: MIT

//! Comparator abstraction for numeric and time-of-day values
//!
//! An operator is constructed from `{type, amount}` and exposes
//! `compare(value)`. Operands are either numbers or `HH:MM:SS` values;
//! both normalize to seconds for comparison, so a time-of-day threshold
//! can gate a timestamp-derived value and a duration threshold can gate
//! an elapsed-seconds value. Operators carry no other state and are
//! reusable across evaluations.

use crate::error::GateError;
use chrono::{NaiveTime, Timelike};
use serde_json::Value;

/// Comparison selected by the declarative `type` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    More,
    Less,
    Equal,
    MoreOrEqual,
    LessOrEqual,
    NotEqual,
}

impl OperatorKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "more" => Some(Self::More),
            "less" => Some(Self::Less),
            "equal" => Some(Self::Equal),
            "more_or_equal" => Some(Self::MoreOrEqual),
            "less_or_equal" => Some(Self::LessOrEqual),
            "not_equal" => Some(Self::NotEqual),
            _ => None,
        }
    }
}

/// A comparison operand: a number, or a time-of-day/duration value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Number(f64),
    Time(NaiveTime),
}

impl Operand {
    /// Parse an operand from a config value: a JSON number, or a string
    /// in the fixed `HH:MM:SS` format.
    pub fn from_config(value: &Value) -> Result<Self, GateError> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(Operand::Number)
                .ok_or_else(|| GateError::config(format!("amount is not a finite number: {n}"))),
            Value::String(s) => NaiveTime::parse_from_str(s, "%H:%M:%S")
                .map(Operand::Time)
                .map_err(|e| GateError::config(format!("amount '{s}' is not HH:MM:SS: {e}"))),
            other => Err(GateError::config(format!(
                "amount must be a number or HH:MM:SS string, got {other}"
            ))),
        }
    }

    fn as_seconds(&self) -> f64 {
        match self {
            Operand::Number(n) => *n,
            Operand::Time(t) => f64::from(t.num_seconds_from_midnight()),
        }
    }
}

/// A reusable comparator built from `{type, amount}`
#[derive(Debug, Clone)]
pub struct Operator {
    kind: OperatorKind,
    amount: Operand,
}

impl Operator {
    pub fn new(kind: OperatorKind, amount: Operand) -> Self {
        Self { kind, amount }
    }

    /// Build from a declarative `{type, amount}` mapping. An
    /// unrecognized comparator name is its own error kind, like an
    /// unknown requirement type.
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let name = config
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| GateError::config(format!("missing 'type' in operator config {config}")))?;
        let kind = OperatorKind::from_name(name).ok_or_else(|| GateError::UnknownOperator {
            name: name.to_string(),
        })?;
        let amount = config
            .get("amount")
            .ok_or_else(|| GateError::config(format!("missing 'amount' in operator config {config}")))?;
        Ok(Self {
            kind,
            amount: Operand::from_config(amount)?,
        })
    }

    /// Compare a runtime value against the configured threshold
    pub fn compare(&self, value: Operand) -> bool {
        let (v, amount) = (value.as_seconds(), self.amount.as_seconds());
        match self.kind {
            OperatorKind::More => v > amount,
            OperatorKind::Less => v < amount,
            OperatorKind::Equal => (v - amount).abs() < f64::EPSILON,
            OperatorKind::MoreOrEqual => v >= amount,
            OperatorKind::LessOrEqual => v <= amount,
            OperatorKind::NotEqual => (v - amount).abs() >= f64::EPSILON,
        }
    }

    /// Compare a plain numeric value
    pub fn compare_number(&self, value: f64) -> bool {
        self.compare(Operand::Number(value))
    }

    /// Compare a time-of-day value
    pub fn compare_time(&self, value: NaiveTime) -> bool {
        self.compare(Operand::Time(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_comparisons() {
        let op = Operator::from_config(&json!({"type": "more", "amount": 5})).unwrap();
        assert!(op.compare_number(7.0));
        assert!(!op.compare_number(5.0));

        let op = Operator::from_config(&json!({"type": "less", "amount": 5})).unwrap();
        assert!(op.compare_number(4.0));
        assert!(!op.compare_number(5.0));

        let op = Operator::from_config(&json!({"type": "equal", "amount": 2})).unwrap();
        assert!(op.compare_number(2.0));
        assert!(!op.compare_number(2.5));

        let op = Operator::from_config(&json!({"type": "not_equal", "amount": 2})).unwrap();
        assert!(op.compare_number(3.0));
        assert!(!op.compare_number(2.0));

        let op = Operator::from_config(&json!({"type": "more_or_equal", "amount": 5})).unwrap();
        assert!(op.compare_number(5.0));
        assert!(op.compare_number(6.0));
        assert!(!op.compare_number(4.9));

        let op = Operator::from_config(&json!({"type": "less_or_equal", "amount": 5})).unwrap();
        assert!(op.compare_number(5.0));
        assert!(!op.compare_number(5.1));
    }

    #[test]
    fn test_time_threshold() {
        let op = Operator::from_config(&json!({"type": "more", "amount": "17:00:00"})).unwrap();
        let afternoon = NaiveTime::from_hms_opt(17, 17, 35).unwrap();
        let morning = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert!(op.compare_time(afternoon));
        assert!(!op.compare_time(morning));
    }

    #[test]
    fn test_duration_threshold_against_elapsed_seconds() {
        // "00:05:00" as a duration threshold, compared with elapsed seconds
        let op = Operator::from_config(&json!({"type": "more_or_equal", "amount": "00:05:00"})).unwrap();
        assert!(op.compare_number(300.0));
        assert!(!op.compare_number(299.0));
    }

    #[test]
    fn test_malformed_amount_is_config_error() {
        assert!(matches!(
            Operator::from_config(&json!({"type": "more", "amount": "17:00"})),
            Err(GateError::Config(_))
        ));
        assert!(matches!(
            Operator::from_config(&json!({"type": "more", "amount": [1]})),
            Err(GateError::Config(_))
        ));
        assert!(matches!(
            Operator::from_config(&json!({"type": "more"})),
            Err(GateError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_comparator_name() {
        let err = Operator::from_config(&json!({"type": "bigger", "amount": 1})).err().unwrap();
        assert!(matches!(err, GateError::UnknownOperator { name } if name == "bigger"));
    }
}
