// SPDX-License-Identifier: MIT

//! Config loader - YAML file loading and parsing
//!
//! Requirement trees are declared in YAML and built through a
//! [`RequirementRegistry`]. Turn fixtures bundle a session snapshot
//! with the analyzed text of the incoming message so a gate can be
//! evaluated offline.

use crate::error::GateError;
use crate::requirement::base::CheckParams;
use crate::requirement::{Requirement, RequirementRegistry};
use crate::session::Session;
use crate::text::TextAnalysis;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// A session snapshot plus the analyzed message for one turn
#[derive(Debug, Default, Deserialize)]
pub struct TurnFixture {
    pub session: Session,
    #[serde(default)]
    pub text: TextAnalysis,
    #[serde(default)]
    pub params: Option<CheckParams>,
}

/// Loads requirement configs and turn fixtures from YAML files
pub struct ConfigLoader {
    registry: RequirementRegistry,
}

impl ConfigLoader {
    pub fn new(registry: RequirementRegistry) -> Self {
        Self { registry }
    }

    /// Load a requirement tree from a YAML file
    pub fn load_requirement<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<Box<dyn Requirement>, GateError> {
        let content = fs::read_to_string(path)?;
        self.parse_requirement(&content)
    }

    /// Parse a requirement tree from a YAML string
    pub fn parse_requirement(&self, content: &str) -> Result<Box<dyn Requirement>, GateError> {
        let config: Value = serde_yaml::from_str(content)?;
        self.registry.build(&config)
    }

    /// Load a turn fixture from a YAML file
    pub fn load_turn<P: AsRef<Path>>(&self, path: P) -> Result<TurnFixture, GateError> {
        let content = fs::read_to_string(path)?;
        Self::parse_turn(&content)
    }

    /// Parse a turn fixture from a YAML string
    pub fn parse_turn(content: &str) -> Result<TurnFixture, GateError> {
        let fixture: TurnFixture = serde_yaml::from_str(content)?;
        Ok(fixture)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(RequirementRegistry::standard())
    }
}
