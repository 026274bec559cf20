// SPDX-License-Identifier: MIT

//! Requirement evaluation contract and turn-scoped caching wrapper

use crate::cache::CacheKey;
use crate::error::GateError;
use crate::metrics;
use crate::session::Session;
use crate::text::TextAnalysis;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Extra call parameters overlaid on template rendering contexts
pub type CheckParams = Map<String, Value>;

/// Common construction state shared by every requirement variant:
/// the raw declarative config, an optional id and the caching flag.
#[derive(Debug, Clone)]
pub struct RequirementBase {
    config: Value,
    id: Option<String>,
    cache_result: bool,
}

#[derive(Deserialize)]
struct BaseConfig {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    cache_result: Option<bool>,
}

impl RequirementBase {
    /// Parse the common fields out of a variant config. `cache_result`
    /// defaults to true unless the config overrides it.
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: BaseConfig = serde_json::from_value(config.clone())
            .map_err(|e| GateError::config(format!("invalid requirement config {config}: {e}")))?;
        Ok(Self {
            config: config.clone(),
            id: parsed.id,
            cache_result: parsed.cache_result.unwrap_or(true),
        })
    }

    pub fn config(&self) -> &Value {
        &self.config
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn cache_result(&self) -> bool {
        self.cache_result
    }
}

/// A named boolean predicate evaluated once per conversational turn.
///
/// `check` is the only call surface the dialog engine uses; `evaluate`
/// is the variant's internal decision rule. The default `check` wraps
/// `evaluate` with turn-scoped memoization keyed by the structural
/// fingerprint of the configuration, so two instances of the same type
/// built from structurally equal configs share one cached result.
pub trait Requirement: Send + Sync {
    /// Concrete type identifier, the first half of the cache key
    fn type_name(&self) -> &'static str;

    /// Shared construction state
    fn base(&self) -> &RequirementBase;

    /// Variant decision rule. Never called on a cache hit.
    fn evaluate(
        &self,
        text: &TextAnalysis,
        session: &mut Session,
        params: Option<&CheckParams>,
    ) -> Result<bool, GateError>;

    /// Evaluate with turn-scoped memoization.
    ///
    /// Errors from the variant logic propagate unchanged; they are
    /// logged with the predicate configuration, counted, and never
    /// converted into a default boolean. A cache hit has no side effect
    /// beyond the lookup itself.
    fn check(
        &self,
        text: &TextAnalysis,
        session: &mut Session,
        params: Option<&CheckParams>,
    ) -> Result<bool, GateError> {
        if !self.base().cache_result() {
            return self.evaluate(text, session, params).map_err(|err| {
                log_evaluation_failure(self.type_name(), self.base().config(), params, &err);
                err
            });
        }

        let key = CacheKey::new(self.type_name(), self.base().config());
        if let Some(hit) = session.cache.get(&key) {
            return Ok(hit);
        }
        match self.evaluate(text, session, params) {
            Ok(result) => {
                session.cache.insert(key, result);
                Ok(result)
            }
            Err(err) => {
                log_evaluation_failure(self.type_name(), self.base().config(), params, &err);
                Err(err)
            }
        }
    }
}

fn log_evaluation_failure(
    type_name: &str,
    config: &Value,
    params: Option<&CheckParams>,
    err: &GateError,
) {
    log::error!(
        "requirement '{type_name}' failed with config {config}, params {}: {err}",
        params.map_or_else(|| "{}".to_string(), |p| Value::Object(p.clone()).to_string())
    );
    metrics::count_evaluation_error();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Evaluates to its configured `cond` and counts invocations
    pub(crate) struct MockRequirement {
        base: RequirementBase,
        cond: bool,
        calls: AtomicUsize,
    }

    impl MockRequirement {
        pub(crate) fn new(config: Value) -> Self {
            let cond = config
                .get("cond")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            Self {
                base: RequirementBase::from_config(&config).unwrap(),
                cond,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Requirement for MockRequirement {
        fn type_name(&self) -> &'static str {
            "mock"
        }

        fn base(&self) -> &RequirementBase {
            &self.base
        }

        fn evaluate(
            &self,
            _text: &TextAnalysis,
            _session: &mut Session,
            _params: Option<&CheckParams>,
        ) -> Result<bool, GateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.cond)
        }
    }

    /// Alternates true/false on every underlying evaluation
    struct TrueFalseRequirement {
        base: RequirementBase,
        counter: AtomicUsize,
    }

    impl TrueFalseRequirement {
        fn new(config: Value) -> Self {
            Self {
                base: RequirementBase::from_config(&config).unwrap(),
                counter: AtomicUsize::new(0),
            }
        }
    }

    impl Requirement for TrueFalseRequirement {
        fn type_name(&self) -> &'static str {
            "true_false"
        }

        fn base(&self) -> &RequirementBase {
            &self.base
        }

        fn evaluate(
            &self,
            _text: &TextAnalysis,
            _session: &mut Session,
            _params: Option<&CheckParams>,
        ) -> Result<bool, GateError> {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            Ok(n % 2 == 0)
        }
    }

    fn turn() -> (TextAnalysis, Session) {
        (TextAnalysis::empty(), Session::new("353454"))
    }

    #[test]
    fn test_cache_disabled_reevaluates_every_call() {
        let (text, mut session) = turn();
        let requirement = TrueFalseRequirement::new(json!({"cache_result": false}));
        let first = requirement.check(&text, &mut session, None).unwrap();
        let second = requirement.check(&text, &mut session, None).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_cache_enabled_memoizes_within_turn() {
        let (text, mut session) = turn();
        let requirement = TrueFalseRequirement::new(json!({}));
        let first = requirement.check(&text, &mut session, None).unwrap();
        let second = requirement.check(&text, &mut session, None).unwrap();
        assert_eq!(first, second);
        assert!(first);
    }

    #[test]
    fn test_structurally_equal_instances_share_one_evaluation() {
        let (text, mut session) = turn();
        let requirement = MockRequirement::new(json!({"cond": true}));
        let requirement2 = MockRequirement::new(json!({"cond": true}));

        assert!(requirement.check(&text, &mut session, None).unwrap());
        assert!(requirement2.check(&text, &mut session, None).unwrap());
        assert_eq!(requirement.calls(), 1);
        assert_eq!(requirement2.calls(), 0);
    }

    #[test]
    fn test_different_configs_evaluate_independently() {
        let (text, mut session) = turn();
        let requirement = MockRequirement::new(json!({"cond": true}));
        let requirement2 = MockRequirement::new(json!({"cond": true, "a": 1}));

        requirement.check(&text, &mut session, None).unwrap();
        requirement2.check(&text, &mut session, None).unwrap();
        assert_eq!(requirement.calls(), 1);
        assert_eq!(requirement2.calls(), 1);
        assert_eq!(session.cache.len(), 2);
    }

    #[test]
    fn test_mixed_caching_flags_do_not_interfere() {
        let (text, mut session) = turn();
        let cached = TrueFalseRequirement::new(json!({}));
        let uncached = TrueFalseRequirement::new(json!({"cache_result": false}));

        // Uncached instance alternates regardless of the cached one
        assert!(cached.check(&text, &mut session, None).unwrap());
        assert!(uncached.check(&text, &mut session, None).unwrap());
        assert!(cached.check(&text, &mut session, None).unwrap());
        assert!(!uncached.check(&text, &mut session, None).unwrap());
    }

    #[test]
    fn test_fresh_turn_cache_reevaluates() {
        let text = TextAnalysis::empty();
        let requirement = TrueFalseRequirement::new(json!({}));

        let mut session = Session::new("u1");
        assert!(requirement.check(&text, &mut session, None).unwrap());

        // A new turn owns a fresh cache, so evaluation runs again
        let mut next_turn = Session::new("u1");
        assert!(!requirement.check(&text, &mut next_turn, None).unwrap());
    }

    #[test]
    fn test_base_parses_id_and_cache_flag() {
        let base =
            RequirementBase::from_config(&json!({"id": "r1", "cache_result": false})).unwrap();
        assert_eq!(base.id(), Some("r1"));
        assert!(!base.cache_result());

        let base = RequirementBase::from_config(&json!({})).unwrap();
        assert_eq!(base.id(), None);
        assert!(base.cache_result());
    }
}
