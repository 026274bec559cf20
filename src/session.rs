// SPDX-License-Identifier: MIT

//! Turn context consumed by requirement evaluation
//!
//! These are the explicit collaborator contracts of the dialog engine:
//! session counters, collected forms, the incoming message envelope,
//! settings and the turn-scoped cache slot. The message-broker transport
//! that delivers the envelope is out of scope; the core only reads
//! channel, topic key and payload from it.

use crate::cache::TurnCache;
use crate::classifier::ClassifierCapability;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A named session counter
#[derive(Debug, Clone, Deserialize)]
pub struct Counter {
    pub value: f64,
    /// Unix seconds of the last counter update
    #[serde(default)]
    pub update_time: i64,
}

/// A single collected form field
#[derive(Debug, Clone, Deserialize)]
pub struct FormField {
    pub value: Value,
}

/// A collected form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Form {
    #[serde(default)]
    pub fields: HashMap<String, FormField>,
}

/// Incoming message envelope, as read off the broker transport
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub topic_key: String,
    #[serde(default)]
    pub payload: Value,
    /// Message instant, unix epoch milliseconds
    #[serde(default)]
    pub timestamp: i64,
    /// Client timezone metadata; never consulted by time predicates
    #[serde(default)]
    pub timezone_offset_sec: Option<i64>,
}

impl Message {
    /// Persona/character id carried in the payload, if present
    pub fn character_id(&self) -> Option<&str> {
        self.payload.get("character")?.get("id")?.as_str()
    }
}

/// Deployment environment id and feature toggles
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub toggles: HashMap<String, bool>,
}

/// One user's conversation session for the current turn
#[derive(Default, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub counters: HashMap<String, Counter>,
    #[serde(default)]
    pub forms: HashMap<String, Form>,
    #[serde(default)]
    pub message: Message,
    #[serde(default)]
    pub settings: Settings,
    /// Parametrization context collected for template rendering
    #[serde(default)]
    pub variables: Map<String, Value>,
    /// Classifier capabilities injected by the hosting engine
    #[serde(skip)]
    pub classifiers: HashMap<String, Arc<dyn ClassifierCapability>>,
    /// Turn-scoped cache slot; fresh each turn
    #[serde(skip)]
    pub cache: TurnCache,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Collect the rendering context for template-driven predicates:
    /// session variables plus the message payload under `payload`.
    pub fn template_context(&self) -> Map<String, Value> {
        let mut context = self.variables.clone();
        context.insert("payload".to_string(), self.message.payload.clone());
        context
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("counters", &self.counters)
            .field("forms", &self.forms)
            .field("message", &self.message)
            .field("settings", &self.settings)
            .field("classifiers", &self.classifiers.keys())
            .finish_non_exhaustive()
    }
}
