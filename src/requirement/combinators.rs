// SPDX-License-Identifier: MIT

//! Logical combinators over the requirement contract
//!
//! Combinators never mutate a child's internal state; they only call
//! `check()`, in declaration order. Each combinator's own `check()` runs
//! through the same caching wrapper as any leaf, and its cache entry
//! stores only the final boolean, not any intermediate child result.

use super::base::{CheckParams, Requirement, RequirementBase};
use super::registry::RequirementRegistry;
use crate::error::GateError;
use crate::session::Session;
use crate::text::TextAnalysis;
use serde_json::Value;

fn child_configs(config: &Value) -> Result<&Vec<Value>, GateError> {
    config
        .get("requirements")
        .and_then(Value::as_array)
        .ok_or_else(|| GateError::config(format!("missing 'requirements' list in {config}")))
}

fn build_children(
    registry: &RequirementRegistry,
    config: &Value,
) -> Result<Vec<Box<dyn Requirement>>, GateError> {
    child_configs(config)?
        .iter()
        .map(|child| registry.build(child))
        .collect()
}

/// True only if every child is true; short-circuits at the first false
/// child. An empty child list is vacuously true.
pub struct AndRequirement {
    base: RequirementBase,
    children: Vec<Box<dyn Requirement>>,
}

impl AndRequirement {
    pub fn from_config(registry: &RequirementRegistry, config: &Value) -> Result<Self, GateError> {
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            children: build_children(registry, config)?,
        })
    }
}

impl Requirement for AndRequirement {
    fn type_name(&self) -> &'static str {
        "and"
    }

    fn base(&self) -> &RequirementBase {
        &self.base
    }

    fn evaluate(
        &self,
        text: &TextAnalysis,
        session: &mut Session,
        params: Option<&CheckParams>,
    ) -> Result<bool, GateError> {
        for child in &self.children {
            if !child.check(text, session, params)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// True at the first true child; false only if all children are false.
/// An empty child list is false.
pub struct OrRequirement {
    base: RequirementBase,
    children: Vec<Box<dyn Requirement>>,
}

impl OrRequirement {
    pub fn from_config(registry: &RequirementRegistry, config: &Value) -> Result<Self, GateError> {
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            children: build_children(registry, config)?,
        })
    }
}

impl Requirement for OrRequirement {
    fn type_name(&self) -> &'static str {
        "or"
    }

    fn base(&self) -> &RequirementBase {
        &self.base
    }

    fn evaluate(
        &self,
        text: &TextAnalysis,
        session: &mut Session,
        params: Option<&CheckParams>,
    ) -> Result<bool, GateError> {
        for child in &self.children {
            if child.check(text, session, params)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Logical negation of exactly one child
pub struct NotRequirement {
    base: RequirementBase,
    child: Box<dyn Requirement>,
}

impl NotRequirement {
    pub fn from_config(registry: &RequirementRegistry, config: &Value) -> Result<Self, GateError> {
        let child = config
            .get("requirement")
            .ok_or_else(|| GateError::config(format!("missing 'requirement' in {config}")))?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            child: registry.build(child)?,
        })
    }
}

impl Requirement for NotRequirement {
    fn type_name(&self) -> &'static str {
        "not"
    }

    fn base(&self) -> &RequirementBase {
        &self.base
    }

    fn evaluate(
        &self,
        text: &TextAnalysis,
        session: &mut Session,
        params: Option<&CheckParams>,
    ) -> Result<bool, GateError> {
        Ok(!self.child.check(text, session, params)?)
    }
}

/// A flat container for composing sub-requirements. Aggregation is
/// conjunctive, externally indistinguishable from AND, but the distinct
/// type identifier keeps its cache entries separate.
pub struct CompositeRequirement {
    base: RequirementBase,
    children: Vec<Box<dyn Requirement>>,
}

impl CompositeRequirement {
    pub fn from_config(registry: &RequirementRegistry, config: &Value) -> Result<Self, GateError> {
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            children: build_children(registry, config)?,
        })
    }
}

impl Requirement for CompositeRequirement {
    fn type_name(&self) -> &'static str {
        "composite"
    }

    fn base(&self) -> &RequirementBase {
        &self.base
    }

    fn evaluate(
        &self,
        text: &TextAnalysis,
        session: &mut Session,
        params: Option<&CheckParams>,
    ) -> Result<bool, GateError> {
        for child in &self.children {
            if !child.check(text, session, params)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
