//! Template expression evaluator
//!
//! Evaluates a parsed expression against a rendering context. Missing
//! context paths evaluate to null; whitelisted methods on null are an
//! evaluation error, since they indicate a template/config mismatch.

use super::ast::{CompareOp, Expression, Literal, Method, PathSegment};
use crate::error::GateError;
use serde_json::{Map, Number, Value};

/// Evaluate an expression against a rendering context
pub fn evaluate(expr: &Expression, context: &Map<String, Value>) -> Result<Value, GateError> {
    match expr {
        Expression::Literal(literal) => Ok(literal_value(literal)),
        Expression::Path(segments) => evaluate_path(segments, context),
        Expression::Compare { left, op, right } => {
            let left = evaluate(left, context)?;
            let right = evaluate(right, context)?;
            Ok(Value::Bool(evaluate_compare(&left, *op, &right)))
        }
        Expression::And(left, right) => {
            let result = is_truthy(&evaluate(left, context)?) && is_truthy(&evaluate(right, context)?);
            Ok(Value::Bool(result))
        }
        Expression::Or(left, right) => {
            let result = is_truthy(&evaluate(left, context)?) || is_truthy(&evaluate(right, context)?);
            Ok(Value::Bool(result))
        }
        Expression::Not(inner) => Ok(Value::Bool(!is_truthy(&evaluate(inner, context)?))),
    }
}

/// Truthiness of a rendered value: null, false, zero and empty
/// containers are false, everything else true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Render a value into injected text
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::String(s) => Value::String(s.clone()),
        Literal::Number(n) => Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    }
}

fn evaluate_path(segments: &[PathSegment], context: &Map<String, Value>) -> Result<Value, GateError> {
    let mut current = match segments.first() {
        Some(PathSegment::Member(root)) => context.get(root).cloned().unwrap_or(Value::Null),
        _ => return Err(GateError::evaluation("path must start with an identifier")),
    };

    for segment in &segments[1..] {
        current = match segment {
            PathSegment::Member(name) => current.get(name).cloned().unwrap_or(Value::Null),
            PathSegment::Index(Literal::String(key)) => {
                current.get(key).cloned().unwrap_or(Value::Null)
            }
            PathSegment::Index(Literal::Number(n)) => current
                .get(*n as usize)
                .cloned()
                .unwrap_or(Value::Null),
            PathSegment::Index(other) => {
                return Err(GateError::evaluation(format!(
                    "unsupported index literal {other:?}"
                )))
            }
            PathSegment::Method(method) => apply_method(*method, &current)?,
        };
    }
    Ok(current)
}

fn apply_method(method: Method, value: &Value) -> Result<Value, GateError> {
    match (method, value) {
        (Method::Strip, Value::String(s)) => Ok(Value::String(s.trim().to_string())),
        (Method::Lower, Value::String(s)) => Ok(Value::String(s.to_lowercase())),
        (Method::Upper, Value::String(s)) => Ok(Value::String(s.to_uppercase())),
        (Method::Length, Value::String(s)) => Ok(Value::from(s.chars().count())),
        (Method::Length, Value::Array(a)) => Ok(Value::from(a.len())),
        (Method::Length, Value::Object(o)) => Ok(Value::from(o.len())),
        (method, other) => Err(GateError::evaluation(format!(
            "method {method:?} is not applicable to {other}"
        ))),
    }
}

fn evaluate_compare(left: &Value, op: CompareOp, right: &Value) -> bool {
    match op {
        CompareOp::Eq => values_equal(left, right),
        CompareOp::NotEq => !values_equal(left, right),
        CompareOp::Gt => compare_numbers(left, right, |a, b| a > b),
        CompareOp::Gte => compare_numbers(left, right, |a, b| a >= b),
        CompareOp::Lt => compare_numbers(left, right, |a, b| a < b),
        CompareOp::Lte => compare_numbers(left, right, |a, b| a <= b),
        CompareOp::In => check_contains(left, right),
        CompareOp::NotIn => !check_contains(left, right),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
            _ => false,
        },
        _ => left == right,
    }
}

fn compare_numbers<F>(left: &Value, right: &Value, cmp: F) -> bool
where
    F: Fn(f64, f64) -> bool,
{
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn check_contains(needle: &Value, haystack: &Value) -> bool {
    match haystack {
        Value::String(s) => match needle {
            Value::String(sub) => s.contains(sub.as_str()),
            _ => false,
        },
        Value::Array(items) => items.iter().any(|item| values_equal(needle, item)),
        Value::Object(map) => match needle {
            Value::String(key) => map.contains_key(key),
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::parser::parse;
    use serde_json::json;

    fn context_with(pairs: Vec<(&str, Value)>) -> Map<String, Value> {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn eval(input: &str, context: &Map<String, Value>) -> Value {
        evaluate(&parse(input).unwrap(), context).unwrap()
    }

    #[test]
    fn test_string_equality() {
        let context = context_with(vec![("intent", json!("search"))]);
        assert_eq!(eval("intent == 'search'", &context), json!(true));
        assert_eq!(eval("intent == 'code'", &context), json!(false));
        assert_eq!(eval("intent != 'code'", &context), json!(true));
    }

    #[test]
    fn test_number_comparison() {
        let context = context_with(vec![("score", json!(7.5))]);
        assert_eq!(eval("score > 5", &context), json!(true));
        assert_eq!(eval("score > 10", &context), json!(false));
        assert_eq!(eval("score >= 7.5", &context), json!(true));
        assert_eq!(eval("score < 10", &context), json!(true));
        assert_eq!(eval("score <= 7", &context), json!(false));
    }

    #[test]
    fn test_nested_path() {
        let context = context_with(vec![("payload", json!({"data": {"intent": "search"}}))]);
        assert_eq!(eval("payload.data.intent == 'search'", &context), json!(true));
        assert_eq!(eval("payload.data.intent == 'code'", &context), json!(false));
    }

    #[test]
    fn test_missing_field_is_null() {
        let context = Map::new();
        assert_eq!(eval("missing == null", &context), json!(true));
        assert_eq!(eval("missing == 'value'", &context), json!(false));
        assert_eq!(eval("missing.deeper == null", &context), json!(true));
    }

    #[test]
    fn test_membership() {
        let context = context_with(vec![
            ("tags", json!(["bug", "urgent"])),
            ("message", json!("hello world")),
            ("meta", json!({"kind": "chat"})),
        ]);
        assert_eq!(eval("'bug' in tags", &context), json!(true));
        assert_eq!(eval("'frontend' in tags", &context), json!(false));
        assert_eq!(eval("'world' in message", &context), json!(true));
        assert_eq!(eval("'kind' in meta", &context), json!(true));
        assert_eq!(eval("'bug' not in tags", &context), json!(false));
    }

    #[test]
    fn test_strip_then_membership() {
        let context = context_with(vec![(
            "payload",
            json!({"murexIds": ["AAA", "BBB"], "message": " BBB    "}),
        )]);
        assert_eq!(
            eval("payload.message.strip() in payload.murexIds", &context),
            json!(true)
        );
    }

    #[test]
    fn test_methods() {
        let context = context_with(vec![("name", json!("  Mixed Case  "))]);
        assert_eq!(eval("name.strip().lower() == 'mixed case'", &context), json!(true));
        assert_eq!(eval("name.strip().upper() == 'MIXED CASE'", &context), json!(true));
        assert_eq!(eval("name.strip().length() == 10", &context), json!(true));
    }

    #[test]
    fn test_method_on_null_is_error() {
        let context = Map::new();
        let expr = parse("missing.strip() == ''").unwrap();
        assert!(evaluate(&expr, &context).is_err());
    }

    #[test]
    fn test_boolean_connectives() {
        let context = context_with(vec![("intent", json!("code")), ("confidence", json!(0.9))]);
        assert_eq!(
            eval("intent == 'code' and confidence > 0.8", &context),
            json!(true)
        );
        assert_eq!(
            eval("intent == 'search' or confidence > 0.8", &context),
            json!(true)
        );
        assert_eq!(
            eval("not (intent == 'code' and confidence > 0.8)", &context),
            json!(false)
        );
    }

    #[test]
    fn test_index_access() {
        let context = context_with(vec![("items", json!(["first", "second"]))]);
        assert_eq!(eval("items[0] == 'first'", &context), json!(true));
        assert_eq!(eval("items[1] == 'first'", &context), json!(false));
        assert_eq!(eval("items[9] == null", &context), json!(true));
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!([0])));
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!(null)), "");
        assert_eq!(value_to_string(&json!(true)), "true");
        assert_eq!(value_to_string(&json!(3)), "3");
        assert_eq!(value_to_string(&json!("text")), "text");
        assert_eq!(value_to_string(&json!([1, 2])), "[1,2]");
    }
}
