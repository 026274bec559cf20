// SPDX-License-Identifier: MIT

//! turnstile-rs - requirement evaluation for conversational dialog
//! engines.
//!
//! A requirement is a named, configurable predicate over the current
//! turn: the analyzed user message, the session state and optional
//! call-site parameters. Requirement trees are declared in config,
//! built through a [`requirement::RequirementRegistry`] and combined
//! with boolean combinators; results are memoized per turn keyed by
//! requirement type and config fingerprint.
//!
//! The [`template`] module carries the sandboxed expression-template
//! engine used by template requirements and available on its own for
//! rendering message content.

pub mod cache;
pub mod classifier;
pub mod cron;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod operators;
pub mod requirement;
pub mod session;
pub mod template;
pub mod text;

pub use cache::{CacheKey, TurnCache};
pub use error::GateError;
pub use loader::{ConfigLoader, TurnFixture};
pub use requirement::{CheckParams, Requirement, RequirementRegistry};
pub use session::Session;
pub use text::TextAnalysis;
