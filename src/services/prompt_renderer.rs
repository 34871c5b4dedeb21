use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::errors::{AppError, AppResult};

/// A prompt template together with the arguments it is rendered with.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    template: String,
    arguments: BTreeMap<String, serde_json::Value>,
}

impl PromptSpec {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            arguments: BTreeMap::new(),
        }
    }

    /// Adds a string argument.
    pub fn with_arg(mut self, name: &str, value: impl Into<String>) -> Self {
        self.arguments
            .insert(name.to_string(), serde_json::Value::String(value.into()));
        self
    }

    /// Adds an argument rendered as JSON text, for lists and objects embedded in prompts.
    pub fn with_json_arg<T: Serialize>(mut self, name: &str, value: &T) -> AppResult<Self> {
        let text = serde_json::to_string(value).map_err(|e| {
            AppError::TemplateError(format!("argument '{}' is not serializable: {}", name, e))
        })?;
        self.arguments
            .insert(name.to_string(), serde_json::Value::String(text));
        Ok(self)
    }

    pub fn has_arg(&self, name: &str) -> bool {
        self.arguments.contains_key(name)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn render(&self) -> AppResult<String> {
        render_template(&self.template, &self.arguments)
    }
}

/// Renders `template` with `arguments`. A variable the template references but
/// the arguments lack is a `TemplateError`.
pub fn render_template<T: Serialize>(template: &str, arguments: T) -> AppResult<String> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    Ok(env.render_str(template, arguments)?)
}
