use serde_json::{Map, Value};
use std::error::Error as _;
use tera::{Context, Tera};

use crate::models::Template;

const TEMPLATE_KEY: &str = "configuration";

/// Result of expanding a template's configuration.
/// Failures carry a readable message instead of an error so previews never break.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Rendered(String),
    Failed(String),
}

impl RenderOutcome {
    /// Text to show the caller: the configuration, or the failure as a message
    pub fn into_text(self) -> String {
        match self {
            RenderOutcome::Rendered(text) => text,
            RenderOutcome::Failed(msg) => format!("Error rendering template: {}", msg),
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RenderOutcome::Rendered(_) => None,
            RenderOutcome::Failed(msg) => Some(msg),
        }
    }
}

/// Render a template's configuration lines with `parameters` as the variable namespace
pub fn render_template(template: &Template, parameters: &Map<String, Value>) -> RenderOutcome {
    let outcome = render_text(&template.configuration_text(), parameters);
    if let RenderOutcome::Failed(msg) = &outcome {
        tracing::warn!(
            "Render failed for {}/{}: {}",
            template.category,
            template.filename,
            msg
        );
    }
    outcome
}

/// Render raw configuration text. Undefined variables and syntax errors are failures.
pub fn render_text(text: &str, parameters: &Map<String, Value>) -> RenderOutcome {
    let mut tera = Tera::default();
    if let Err(e) = tera.add_raw_template(TEMPLATE_KEY, text) {
        return RenderOutcome::Failed(error_chain(&e));
    }

    let context = match Context::from_value(Value::Object(parameters.clone())) {
        Ok(context) => context,
        Err(e) => return RenderOutcome::Failed(error_chain(&e)),
    };

    match tera.render(TEMPLATE_KEY, &context) {
        Ok(rendered) => RenderOutcome::Rendered(rendered),
        Err(e) => RenderOutcome::Failed(error_chain(&e)),
    }
}

// Tera wraps the useful detail ("Variable `x` not found") in the error source
fn error_chain(e: &tera::Error) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        msg.push_str(": ");
        msg.push_str(&inner.to_string());
        source = inner.source();
    }
    msg
}
