// SPDX-License-Identifier: MIT

//! Turn-scoped memoization of requirement results
//!
//! Keys are derived from the concrete requirement type plus a canonical
//! serialization of its configuration, so two distinct instances built
//! from structurally equal configs share one cached result. Identity is
//! irrelevant; structural equality is the invariant.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Cache key: (concrete type identifier, config fingerprint)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    type_name: String,
    config_digest: [u8; 32],
}

impl CacheKey {
    /// Fingerprint a requirement configuration.
    ///
    /// serde_json objects are BTreeMap-backed (the `preserve_order`
    /// feature must stay off), so `to_string` yields a stably ordered,
    /// canonical serialization.
    pub fn new(type_name: &str, config: &Value) -> Self {
        let canonical = config.to_string();
        let digest = Sha256::digest(canonical.as_bytes());
        Self {
            type_name: type_name.to_string(),
            config_digest: digest.into(),
        }
    }
}

/// Mapping of fingerprints to evaluation results, owned by the session.
///
/// Created fresh per turn, discarded at turn end, never shared across
/// concurrent turns. Plain and non-thread-safe on purpose.
#[derive(Debug, Clone, Default)]
pub struct TurnCache {
    entries: HashMap<CacheKey, bool>,
}

impl TurnCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<bool> {
        self.entries.get(key).copied()
    }

    pub fn insert(&mut self, key: CacheKey, result: bool) {
        self.entries.insert(key, result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
