// SPDX-License-Identifier: MIT

//! Expression-template rendering subsystem
//!
//! Used by template-driven predicates and standalone for text
//! generation. A template is literal text with `{{ expression }}`
//! blocks over a sandboxed, fixed grammar:
//! - `{{ payload.groupCode == 'BROKER' }}`
//! - `{{ payload.message.strip() in payload.murexIds }}`
//!
//! Output coercion (`str`/`int`/`float`/`bool`/`json`) applies to the
//! top-level rendered string only.

mod ast;
mod evaluator;
mod parser;
mod renderer;

pub use ast::{CompareOp, Expression, Literal, Method, PathSegment};
pub use evaluator::{evaluate, is_truthy, value_to_string};
pub use parser::parse;
pub use renderer::{LoaderKind, TemplateRenderer, TemplateSpec};
