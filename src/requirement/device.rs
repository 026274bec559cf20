// SPDX-License-Identifier: MIT

//! Requirements over the presenting surface of the current message

use super::base::{CheckParams, Requirement, RequirementBase};
use crate::error::GateError;
use crate::session::Session;
use crate::text::TextAnalysis;
use serde::Deserialize;
use serde_json::Value;

/// True iff the message arrived through one of the configured channels
pub struct ChannelRequirement {
    base: RequirementBase,
    channels: Vec<String>,
}

#[derive(Deserialize)]
struct ChannelsConfig {
    channels: Vec<String>,
}

impl ChannelRequirement {
    pub fn from_config(config: &Value) -> Result<Self, GateError> {
        let parsed: ChannelsConfig = serde_json::from_value(config.clone())
            .map_err(|e| GateError::config(format!("invalid channel requirement config {config}: {e}")))?;
        Ok(Self {
            base: RequirementBase::from_config(config)?,
            channels: parsed.channels,
        })
    }
}

impl Requirement for ChannelRequirement {
    fn type_name(&self) -> &'static str {
        "channel"
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
        Ok(self.channels.iter().any(|c| *c == session.message.channel))
    }
}
