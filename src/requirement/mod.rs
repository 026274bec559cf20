// SPDX-License-Identifier: MIT

//! Requirement hierarchy: the polymorphic predicates that gate
//! transitions, their combinators and the type registry that builds
//! them from declarative config.

pub mod base;
pub mod basic;
pub mod combinators;
pub mod counters;
pub mod device;
pub mod registry;
pub mod text;

pub use base::{CheckParams, Requirement, RequirementBase};
pub use combinators::{AndRequirement, CompositeRequirement, NotRequirement, OrRequirement};
pub use registry::{RequirementBuilder, RequirementRegistry};
