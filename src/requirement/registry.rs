// SPDX-License-Identifier: MIT

//! Declarative type-name to requirement-constructor mapping
//!
//! The registry is an explicit, injectable table rather than a
//! process-wide global: tests can substitute and restore entries
//! hermetically, and multiple engine instances can hold independent
//! registries. Unrecognized `type` values fail at construction time,
//! before the turn is processed.

use super::base::Requirement;
use super::basic::{
    CharacterIdRequirement, ClassifierRequirement, DateTimeRequirement, EnvironmentRequirement,
    FeatureToggleRequirement, FormFieldValueRequirement, RandomRequirement, RollingRequirement,
    TemplateRequirement, TimeRequirement, TopicRequirement,
};
use super::combinators::{
    AndRequirement, CompositeRequirement, NotRequirement, OrRequirement,
};
use super::counters::{CounterUpdateTimeRequirement, CounterValueRequirement};
use super::device::ChannelRequirement;
use super::text::{
    AnySubstringInLoweredTextRequirement, IntersectionRequirement,
    IntersectionWithTokensSetRequirement, NumInRangeRequirement, NormalizedTextInSetRequirement,
    PhoneNumberNumberRequirement,
};
use crate::error::GateError;
use serde_json::Value;
use std::collections::HashMap;

/// Constructor for one requirement type. The registry is passed through
/// so combinators can build their children recursively.
pub type RequirementBuilder =
    fn(&RequirementRegistry, &Value) -> Result<Box<dyn Requirement>, GateError>;

/// Maps the declarative `type` field to concrete constructors
#[derive(Clone, Default)]
pub struct RequirementRegistry {
    builders: HashMap<String, RequirementBuilder>,
}

impl RequirementRegistry {
    /// An empty registry with no types registered
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the full variant catalogue
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("and", |r, c| Ok(Box::new(AndRequirement::from_config(r, c)?)));
        registry.register("or", |r, c| Ok(Box::new(OrRequirement::from_config(r, c)?)));
        registry.register("not", |r, c| Ok(Box::new(NotRequirement::from_config(r, c)?)));
        registry.register("composite", |r, c| {
            Ok(Box::new(CompositeRequirement::from_config(r, c)?))
        });
        registry.register("random", |_, c| Ok(Box::new(RandomRequirement::from_config(c)?)));
        registry.register("rolling", |_, c| Ok(Box::new(RollingRequirement::from_config(c)?)));
        registry.register("topic", |_, c| Ok(Box::new(TopicRequirement::from_config(c)?)));
        registry.register("channel", |_, c| Ok(Box::new(ChannelRequirement::from_config(c)?)));
        registry.register("counter_value", |_, c| {
            Ok(Box::new(CounterValueRequirement::from_config(c)?))
        });
        registry.register("counter_update_time", |_, c| {
            Ok(Box::new(CounterUpdateTimeRequirement::from_config(c)?))
        });
        registry.register("time", |_, c| Ok(Box::new(TimeRequirement::from_config(c)?)));
        registry.register("datetime", |_, c| Ok(Box::new(DateTimeRequirement::from_config(c)?)));
        registry.register("classifier", |_, c| {
            Ok(Box::new(ClassifierRequirement::from_config(c)?))
        });
        registry.register("template", |_, c| {
            Ok(Box::new(TemplateRequirement::from_config(c)?))
        });
        registry.register("form_field_value", |_, c| {
            Ok(Box::new(FormFieldValueRequirement::from_config(c)?))
        });
        registry.register("environment", |_, c| {
            Ok(Box::new(EnvironmentRequirement::from_config(c)?))
        });
        registry.register("character_id", |_, c| {
            Ok(Box::new(CharacterIdRequirement::from_config(c)?))
        });
        registry.register("feature_toggle", |_, c| {
            Ok(Box::new(FeatureToggleRequirement::from_config(c)?))
        });
        registry.register("any_substring_in_lowered_text", |_, c| {
            Ok(Box::new(AnySubstringInLoweredTextRequirement::from_config(c)?))
        });
        registry.register("num_in_range", |_, c| {
            Ok(Box::new(NumInRangeRequirement::from_config(c)?))
        });
        registry.register("phone_number_number", |_, c| {
            Ok(Box::new(PhoneNumberNumberRequirement::from_config(c)?))
        });
        registry.register("intersection_with_tokens_set", |_, c| {
            Ok(Box::new(IntersectionWithTokensSetRequirement::from_config(c)?))
        });
        registry.register("normalized_text_in_set", |_, c| {
            Ok(Box::new(NormalizedTextInSetRequirement::from_config(c)?))
        });
        registry.register("intersection", |_, c| {
            Ok(Box::new(IntersectionRequirement::from_config(c)?))
        });
        registry
    }

    /// Register or replace a type. Returns the previous builder when the
    /// name was already taken, so tests can restore it afterwards.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        builder: RequirementBuilder,
    ) -> Option<RequirementBuilder> {
        self.builders.insert(type_name.into(), builder)
    }

    /// Remove a type from the registry
    pub fn unregister(&mut self, type_name: &str) -> Option<RequirementBuilder> {
        self.builders.remove(type_name)
    }

    /// Build a requirement tree from a declarative config
    pub fn build(&self, config: &Value) -> Result<Box<dyn Requirement>, GateError> {
        let type_name = config
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| GateError::config(format!("missing 'type' in {config}")))?;
        let builder = self
            .builders
            .get(type_name)
            .ok_or_else(|| GateError::UnknownRequirement {
                name: type_name.to_string(),
            })?;
        builder(self, config)
    }
}
