// SPDX-License-Identifier: MIT

//! Consumed interface of the external classifier inference service

use crate::error::GateError;
use crate::text::TextAnalysis;
use serde::{Deserialize, Serialize};

/// One ranked classification candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierAnswer {
    pub answer: String,
    pub score: f64,
    /// Whether this candidate is the designated fallback/"other" class
    #[serde(default)]
    pub is_other: bool,
}

/// Trait for classifier capabilities injected by the hosting engine.
///
/// The core applies no retry or timeout policy; an empty candidate list
/// is a valid response and the consuming requirement treats it as false.
pub trait ClassifierCapability: Send + Sync {
    /// Rank candidate answers for the utterance, best first
    fn find_best_answer(&self, text: &TextAnalysis) -> Result<Vec<ClassifierAnswer>, GateError>;
}
