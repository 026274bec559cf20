// SPDX-License-Identifier: MIT

//! Core requirement variants: bucketing, time, classifier, template,
//! form, environment, persona and feature-toggle predicates

use super::base::{CheckParams, Requirement, RequirementBase};
use crate::classifier::ClassifierAnswer;
use crate::cron::CronSchedule;
use crate::error::GateError;
use crate::operators::Operator;
use crate::session::Session;
use crate::template::{LoaderKind, TemplateRenderer, TemplateSpec};
use crate::text::TextAnalysis;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

fn parse_config<T: serde::de::DeserializeOwned>(config: &Value) -> Result<T, GateError> {
    serde_json::from_value(config.clone())
        .map_err(|e| GateError::config(format!("invalid requirement config {config}: {e}")))
}

fn message_instant(session: &Session) -> Result<DateTime<Utc>, GateError> {
    DateTime::from_timestamp_millis(session.message.timestamp).ok_or_else(|| {
        GateError::evaluation(format!(
            "message timestamp {} is out of range",
            session.message.timestamp
        ))
    })
}

/// True iff a fresh uniform draw in [0,100) is below `percent`
pub struct RandomRequirement {
    base: RequirementBase,
    percent: f64,
}

#[derive(Deserialize)]
struct PercentConfig {
    percent: f64,
}

impl RandomRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: PercentConfig = parse_config(config)?;
        if !(0.0..=100.0).contains(&parsed.percent) {
            return Err(GateError::config(format!(
                "percent must be in [0, 100], got {}",
                parsed.percent
            )));
        }
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            percent: parsed.percent,
        })
    }
}

impl Requirement for RandomRequirement {
    fn type_name(&self) -> &'static str {
        "random"
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
        let draw = rand::thread_rng().gen_range(0.0..100.0);
        Ok(draw < self.percent)
    }
}

/// Deterministic rollout bucketing: the session id hashes into a stable
/// bucket in [0,100), so the same user lands on the same side of the
/// rollout on every turn.
pub struct RollingRequirement {
    base: RequirementBase,
    percent: f64,
}

impl RollingRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: PercentConfig = parse_config(config)?;
        if !(0.0..=100.0).contains(&parsed.percent) {
            return Err(GateError::config(format!(
                "percent must be in [0, 100], got {}",
                parsed.percent
            )));
        }
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            percent: parsed.percent,
        })
    }

    fn bucket(user_id: &str) -> f64 {
        let digest = Sha256::digest(user_id.as_bytes());
        let head = digest
            .iter()
            .take(8)
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte));
        (head % 100) as f64
    }
}

impl Requirement for RollingRequirement {
    fn type_name(&self) -> &'static str {
        "rolling"
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
        Ok(Self::bucket(&session.id) < self.percent)
    }
}

/// True iff the message's routing topic key is in the configured set
pub struct TopicRequirement {
    base: RequirementBase,
    topics: Vec<String>,
}

#[derive(Deserialize)]
struct TopicsConfig {
    topics: Vec<String>,
}

impl TopicRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: TopicsConfig = parse_config(config)?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            topics: parsed.topics,
        })
    }
}

impl Requirement for TopicRequirement {
    fn type_name(&self) -> &'static str {
        "topic"
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
        Ok(self.topics.iter().any(|t| *t == session.message.topic_key))
    }
}

/// Compares the time-of-day of the message instant against a threshold.
/// The client timezone metadata on the message is never consulted; the
/// instant is taken as UTC.
pub struct TimeRequirement {
    base: RequirementBase,
    operator: Operator,
}

#[derive(Deserialize)]
struct OperatorOnlyConfig {
    operator: Value,
}

impl TimeRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: OperatorOnlyConfig = parse_config(config)?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            operator: Operator::from_config(&parsed.operator)?,
        })
    }
}

impl Requirement for TimeRequirement {
    fn type_name(&self) -> &'static str {
        "time"
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
        let instant = message_instant(session)?;
        Ok(self.operator.compare_time(instant.time()))
    }
}

/// True iff the message instant matches a five-field cron schedule
pub struct DateTimeRequirement {
    base: RequirementBase,
    schedule: CronSchedule,
}

#[derive(Deserialize)]
struct MatchCronConfig {
    match_cron: String,
}

impl DateTimeRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: MatchCronConfig = parse_config(config)?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            schedule: CronSchedule::parse(&parsed.match_cron)?,
        })
    }
}

impl Requirement for DateTimeRequirement {
    fn type_name(&self) -> &'static str {
        "datetime"
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
        Ok(self.schedule.matches(message_instant(session)?))
    }
}

/// Gates on the external classifier's top-ranked answer: false when the
/// classifier returns no candidates or when the top candidate is the
/// designated fallback class; an optional allow-list restricts the
/// accepted labels.
pub struct ClassifierRequirement {
    base: RequirementBase,
    classifier: String,
    intents: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct ClassifierConfig {
    classifier: String,
    #[serde(default)]
    intents: Option<Vec<String>>,
}

impl ClassifierRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: ClassifierConfig = parse_config(config)?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            classifier: parsed.classifier,
            intents: parsed.intents,
        })
    }

    fn accepts(&self, answer: &ClassifierAnswer) -> bool {
        if answer.is_other {
            return false;
        }
        match &self.intents {
            Some(intents) => intents.iter().any(|i| *i == answer.answer),
            None => true,
        }
    }
}

impl Requirement for ClassifierRequirement {
    fn type_name(&self) -> &'static str {
        "classifier"
    }

    fn base(&self) -> &RequirementBase {
        &self.base
    }

    fn evaluate(
        &self,
        text: &TextAnalysis,
        session: &mut Session,
        _params: Option<&CheckParams>,
    ) -> Result<bool, GateError> {
        let capability = session.classifiers.get(&self.classifier).cloned().ok_or_else(|| {
            GateError::evaluation(format!("classifier '{}' is not available", self.classifier))
        })?;
        let answers = capability.find_best_answer(text)?;
        Ok(answers.first().is_some_and(|best| self.accepts(best)))
    }
}

/// Boolean-coerced result of rendering an expression template against
/// the session's collected parametrization context
pub struct TemplateRequirement {
    base: RequirementBase,
    renderer: TemplateRenderer,
}

#[derive(Deserialize)]
struct TemplateConfig {
    template: TemplateSpec,
}

impl TemplateRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: TemplateConfig = parse_config(config)?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            renderer: TemplateRenderer::compile(&parsed.template)?,
        })
    }
}

impl Requirement for TemplateRequirement {
    fn type_name(&self) -> &'static str {
        "template"
    }

    fn base(&self) -> &RequirementBase {
        &self.base
    }

    fn evaluate(
        &self,
        _text: &TextAnalysis,
        session: &mut Session,
        params: Option<&CheckParams>,
    ) -> Result<bool, GateError> {
        let mut context = session.template_context();
        if let Some(params) = params {
            for (key, value) in params {
                context.insert(key.clone(), value.clone());
            }
        }
        match self.renderer.render(&context)? {
            Value::Bool(b) => Ok(b),
            Value::String(s) => Ok(LoaderKind::Bool.load(&s)?.as_bool().unwrap_or(false)),
            other => Err(GateError::evaluation(format!(
                "template rendered non-boolean value {other}"
            ))),
        }
    }
}

/// True iff the named form exists, the field exists and its stored
/// value equals the configured one exactly
pub struct FormFieldValueRequirement {
    base: RequirementBase,
    form_name: String,
    field_name: String,
    value: Value,
}

#[derive(Deserialize)]
struct FormFieldValueConfig {
    form_name: String,
    field_name: String,
    value: Value,
}

impl FormFieldValueRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: FormFieldValueConfig = parse_config(config)?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            form_name: parsed.form_name,
            field_name: parsed.field_name,
            value: parsed.value,
        })
    }
}

impl Requirement for FormFieldValueRequirement {
    fn type_name(&self) -> &'static str {
        "form_field_value"
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
        let stored = session
            .forms
            .get(&self.form_name)
            .and_then(|form| form.fields.get(&self.field_name));
        Ok(stored.is_some_and(|field| field.value == self.value))
    }
}

/// True iff the deployment environment id is in the configured set
pub struct EnvironmentRequirement {
    base: RequirementBase,
    values: Vec<String>,
}

#[derive(Deserialize)]
struct ValuesConfig {
    values: Vec<String>,
}

impl EnvironmentRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: ValuesConfig = parse_config(config)?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            values: parsed.values,
        })
    }
}

impl Requirement for EnvironmentRequirement {
    fn type_name(&self) -> &'static str {
        "environment"
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
        match &session.settings.environment {
            Some(environment) => Ok(self.values.iter().any(|v| v == environment)),
            None => {
                log::warn!("environment requirement checked but no environment is configured");
                Ok(false)
            }
        }
    }
}

/// True iff the persona/character id in the message payload is in the
/// configured set. A payload without a character id is an evaluation
/// error, consistent with missing-key handling elsewhere.
pub struct CharacterIdRequirement {
    base: RequirementBase,
    values: Vec<String>,
}

impl CharacterIdRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: ValuesConfig = parse_config(config)?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            values: parsed.values,
        })
    }
}

impl Requirement for CharacterIdRequirement {
    fn type_name(&self) -> &'static str {
        "character_id"
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
        let character_id = session
            .message
            .character_id()
            .ok_or_else(|| GateError::evaluation("message payload has no character id"))?;
        Ok(self.values.iter().any(|v| v == character_id))
    }
}

/// True iff the named boolean flag in session settings is enabled
pub struct FeatureToggleRequirement {
    base: RequirementBase,
    toggle_name: String,
}

#[derive(Deserialize)]
struct ToggleConfig {
    toggle_name: String,
}

impl FeatureToggleRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: ToggleConfig = parse_config(config)?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            toggle_name: parsed.toggle_name,
        })
    }
}

impl Requirement for FeatureToggleRequirement {
    fn type_name(&self) -> &'static str {
        "feature_toggle"
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
        Ok(session
            .settings
            .toggles
            .get(&self.toggle_name)
            .copied()
            .unwrap_or(false))
    }
}
