// SPDX-License-Identifier: MIT

//! Template compilation and rendering
//!
//! A template is literal text with embedded `{{ expression }}` blocks.
//! Compilation happens once at construction; rendering is a pure
//! function of (template, context). Support templates are rendered
//! first and injected into the context as strings under their own keys;
//! the configured output loader applies only to the top-level result.

use super::ast::Expression;
use super::evaluator::{evaluate, value_to_string};
use super::parser::parse;
use crate::error::GateError;
use crate::metrics;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Typed coercion applied to the rendered top-level string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderKind {
    #[default]
    Str,
    Int,
    Float,
    Bool,
    Json,
}

impl LoaderKind {
    /// Coerce a rendered string into the loader's output type
    pub fn load(&self, rendered: &str) -> Result<Value, GateError> {
        match self {
            LoaderKind::Str => Ok(Value::String(rendered.to_string())),
            LoaderKind::Int => rendered
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| GateError::evaluation(format!("'{rendered}' is not an int: {e}"))),
            LoaderKind::Float => rendered
                .trim()
                .parse::<f64>()
                .map(Value::from)
                .map_err(|e| GateError::evaluation(format!("'{rendered}' is not a float: {e}"))),
            LoaderKind::Bool => match rendered.trim().to_lowercase().as_str() {
                "y" | "yes" | "t" | "true" | "on" | "1" => Ok(Value::Bool(true)),
                "n" | "no" | "f" | "false" | "off" | "0" => Ok(Value::Bool(false)),
                other => Err(GateError::evaluation(format!(
                    "'{other}' is not a truthy or falsy string"
                ))),
            },
            LoaderKind::Json => {
                serde_json::from_str(rendered).map_err(|e| {
                    GateError::evaluation(format!("rendered text is not valid JSON: {e}"))
                })
            }
        }
    }
}

/// Declarative template spec: a bare expression template string, or a
/// structured spec with loader and named support templates.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TemplateSpec {
    Expression(String),
    Structured {
        template: String,
        #[serde(default)]
        loader: LoaderKind,
        #[serde(default)]
        support_templates: HashMap<String, TemplateSpec>,
    },
}

impl TemplateSpec {
    /// Shorthand for a bare expression spec
    pub fn expression(template: impl Into<String>) -> Self {
        TemplateSpec::Expression(template.into())
    }
}

/// One compiled segment of a template body
#[derive(Debug, Clone)]
enum Segment {
    Text(String),
    Expr(Expression),
}

/// A compiled template with its loader and support templates
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    source: String,
    segments: Vec<Segment>,
    loader: LoaderKind,
    support: Vec<(String, TemplateRenderer)>,
}

impl TemplateRenderer {
    /// Compile a template spec. Parse failures are configuration errors
    /// and surface here, before any turn is evaluated.
    pub fn compile(spec: &TemplateSpec) -> Result<Self, GateError> {
        let (template, loader, support_templates) = match spec {
            TemplateSpec::Expression(template) => (template.as_str(), LoaderKind::Str, None),
            TemplateSpec::Structured {
                template,
                loader,
                support_templates,
            } => (template.as_str(), *loader, Some(support_templates)),
        };

        let mut support = Vec::new();
        if let Some(supports) = support_templates {
            // BTreeMap-style ordering keeps sibling render order stable,
            // though no ordering is guaranteed between independent
            // sub-templates.
            let mut names: Vec<&String> = supports.keys().collect();
            names.sort();
            for name in names {
                support.push((name.clone(), TemplateRenderer::compile(&supports[name])?));
            }
        }

        Ok(Self {
            source: template.to_string(),
            segments: compile_segments(template)?,
            loader,
            support,
        })
    }

    /// Render against a context and apply the output loader.
    ///
    /// Failures are logged with the template source and the parameter
    /// snapshot, counted, then re-raised.
    pub fn render(&self, context: &Map<String, Value>) -> Result<Value, GateError> {
        match self.render_inner(context) {
            Ok(result) => {
                if log::log_enabled!(log::Level::Debug) {
                    log::debug!(
                        "rendered template '{}' to '{}'",
                        self.source,
                        value_to_string(&result)
                    );
                }
                Ok(result)
            }
            Err(err) => {
                log::error!(
                    "failed to render template: {} with params {}",
                    self.source,
                    Value::Object(context.clone())
                );
                metrics::count_template_error();
                Err(err)
            }
        }
    }

    fn render_inner(&self, context: &Map<String, Value>) -> Result<Value, GateError> {
        let text = self.render_text(context)?;
        self.loader.load(&text)
    }

    /// Render to plain text: inject support templates, then evaluate the
    /// segments. Used for support-template injection, where the child's
    /// own loader never applies.
    fn render_text(&self, context: &Map<String, Value>) -> Result<String, GateError> {
        let context = self.augmented_context(context)?;
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Expr(expr) => out.push_str(&value_to_string(&evaluate(expr, &context)?)),
            }
        }
        Ok(out)
    }

    fn augmented_context(
        &self,
        context: &Map<String, Value>,
    ) -> Result<Map<String, Value>, GateError> {
        if self.support.is_empty() {
            return Ok(context.clone());
        }
        let mut augmented = context.clone();
        for (name, renderer) in &self.support {
            let injected = renderer.render_text(&augmented)?;
            augmented.insert(name.clone(), Value::String(injected));
        }
        Ok(augmented)
    }
}

fn compile_segments(template: &str) -> Result<Vec<Segment>, GateError> {
    let mut segments = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        if open > 0 {
            segments.push(Segment::Text(rest[..open].to_string()));
        }
        let after = &rest[open + 2..];
        let close = after.find("}}").ok_or_else(|| {
            GateError::config(format!("unclosed '{{{{' in template '{template}'"))
        })?;
        segments.push(Segment::Expr(parse(&after[..close])?));
        rest = &after[close + 2..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context_with(pairs: Vec<(&str, Value)>) -> Map<String, Value> {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_render_plain_text() {
        let renderer = TemplateRenderer::compile(&TemplateSpec::expression("hello")).unwrap();
        assert_eq!(renderer.render(&Map::new()).unwrap(), json!("hello"));
    }

    #[test]
    fn test_render_interpolation() {
        let renderer =
            TemplateRenderer::compile(&TemplateSpec::expression("hello {{ name }}!")).unwrap();
        let context = context_with(vec![("name", json!("world"))]);
        assert_eq!(renderer.render(&context).unwrap(), json!("hello world!"));
    }

    #[test]
    fn test_bool_loader_on_literal_true() {
        let spec: TemplateSpec = serde_json::from_value(json!({
            "template": "true",
            "loader": "bool"
        }))
        .unwrap();
        let renderer = TemplateRenderer::compile(&spec).unwrap();
        assert_eq!(renderer.render(&Map::new()).unwrap(), json!(true));
    }

    #[test]
    fn test_json_loader_yields_sequence() {
        let spec: TemplateSpec = serde_json::from_value(json!({
            "template": "[1,2,3]",
            "loader": "json"
        }))
        .unwrap();
        let renderer = TemplateRenderer::compile(&spec).unwrap();
        assert_eq!(renderer.render(&Map::new()).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn test_int_and_float_loaders() {
        let spec: TemplateSpec =
            serde_json::from_value(json!({"template": "{{ n }}", "loader": "int"})).unwrap();
        let renderer = TemplateRenderer::compile(&spec).unwrap();
        let context = context_with(vec![("n", json!(42))]);
        assert_eq!(renderer.render(&context).unwrap(), json!(42));

        let spec: TemplateSpec =
            serde_json::from_value(json!({"template": "3.5", "loader": "float"})).unwrap();
        let renderer = TemplateRenderer::compile(&spec).unwrap();
        assert_eq!(renderer.render(&Map::new()).unwrap(), json!(3.5));
    }

    #[test]
    fn test_bool_loader_permissive_tokens() {
        for token in ["y", "yes", "t", "TRUE", "on", "1"] {
            assert_eq!(LoaderKind::Bool.load(token).unwrap(), json!(true), "{token}");
        }
        for token in ["n", "no", "f", "False", "off", "0"] {
            assert_eq!(LoaderKind::Bool.load(token).unwrap(), json!(false), "{token}");
        }
        assert!(LoaderKind::Bool.load("BROKER1").is_err());
        assert!(LoaderKind::Bool.load("").is_err());
    }

    #[test]
    fn test_support_templates_injected_as_strings() {
        let spec: TemplateSpec = serde_json::from_value(json!({
            "template": "{{ greeting }} {{ name }}",
            "support_templates": {
                "greeting": "Hello",
                "name": {"template": "{{ payload.user }}"}
            }
        }))
        .unwrap();
        let renderer = TemplateRenderer::compile(&spec).unwrap();
        let context = context_with(vec![("payload", json!({"user": "Ada"}))]);
        assert_eq!(renderer.render(&context).unwrap(), json!("Hello Ada"));
    }

    #[test]
    fn test_support_template_loader_never_applies() {
        // The sub-template declares a json loader; injection still sees
        // the raw rendered text.
        let spec: TemplateSpec = serde_json::from_value(json!({
            "template": "{{ items }}",
            "support_templates": {
                "items": {"template": "[1,2]", "loader": "json"}
            }
        }))
        .unwrap();
        let renderer = TemplateRenderer::compile(&spec).unwrap();
        assert_eq!(renderer.render(&Map::new()).unwrap(), json!("[1,2]"));
    }

    #[test]
    fn test_support_template_sees_earlier_sibling() {
        let spec: TemplateSpec = serde_json::from_value(json!({
            "template": "{{ b }}",
            "support_templates": {
                "a": "base",
                "b": "{{ a }}-suffix"
            }
        }))
        .unwrap();
        let renderer = TemplateRenderer::compile(&spec).unwrap();
        assert_eq!(renderer.render(&Map::new()).unwrap(), json!("base-suffix"));
    }

    #[test]
    fn test_unclosed_block_is_config_error() {
        assert!(TemplateRenderer::compile(&TemplateSpec::expression("{{ a")).is_err());
    }

    #[test]
    fn test_coercion_failure_propagates_and_counts() {
        let spec: TemplateSpec = serde_json::from_value(json!({
            "template": "{{ payload.groupCode }}",
            "loader": "bool"
        }))
        .unwrap();
        let renderer = TemplateRenderer::compile(&spec).unwrap();
        let context = context_with(vec![("payload", json!({"groupCode": "BROKER1"}))]);

        let before = crate::metrics::template_errors();
        assert!(renderer.render(&context).is_err());
        assert!(crate::metrics::template_errors() > before);
    }

    #[test]
    fn test_spec_deserializes_from_bare_string() {
        let spec: TemplateSpec = serde_json::from_value(json!("{{ a }}")).unwrap();
        assert!(matches!(spec, TemplateSpec::Expression(_)));
    }
}
