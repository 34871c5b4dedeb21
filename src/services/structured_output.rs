use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use validator::Validate;

use crate::{
    config::PipelineConfig,
    constants::prompts::SCHEMA_FIX_PROMPT,
    errors::{AppError, AppResult},
    services::{
        model_client::{CompletionModel, ModelProfile, RetryingCompletionModel},
        output_parser::parse_structured,
        prompt_renderer::PromptSpec,
    },
};

const FORMAT_INSTRUCTIONS: &str = "format_instructions";

/// The one entry point for every LLM-backed feature: render, call, normalize,
/// repair, validate, and retry validation once with a corrective prompt.
#[derive(Clone)]
pub struct StructuredOutputPipeline {
    model: Arc<dyn CompletionModel>,
}

impl StructuredOutputPipeline {
    /// Wraps `model` with the transport retry policy from `config`.
    pub fn new(model: Arc<dyn CompletionModel>, config: &PipelineConfig) -> Self {
        Self {
            model: Arc::new(RetryingCompletionModel::new(model, config)),
        }
    }

    pub async fn invoke<T>(&self, spec: PromptSpec, profile: &ModelProfile) -> AppResult<T>
    where
        T: DeserializeOwned + JsonSchema + Validate,
    {
        let schema = format_instructions::<T>()?;
        let spec = if spec.has_arg(FORMAT_INSTRUCTIONS) {
            spec
        } else {
            spec.with_arg(FORMAT_INSTRUCTIONS, schema.clone())
        };

        let prompt = spec.render()?;
        log::debug!("Invoking {} with a {}-byte prompt", profile.name, prompt.len());
        let completion = self.call_model(&prompt, profile).await?;

        let first_error = match parse_structured::<T>(&completion) {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        log::warn!(
            "Output from {} did not match the schema ({}); requesting a fix-up",
            profile.name,
            first_error
        );

        let fix_prompt = PromptSpec::new(SCHEMA_FIX_PROMPT)
            .with_arg(FORMAT_INSTRUCTIONS, schema)
            .with_arg("completion", completion)
            .with_arg("error", first_error.to_string())
            .render()?;
        let fixed = self.call_model(&fix_prompt, profile).await?;

        parse_structured::<T>(&fixed).map_err(|e| {
            log::error!("Fix-up output from {} still invalid: {}", profile.name, e);
            AppError::SchemaValidationError(format!(
                "output did not match the schema after one fix-up: {}",
                e
            ))
        })
    }

    async fn call_model(&self, prompt: &str, profile: &ModelProfile) -> AppResult<String> {
        self.model
            .complete(prompt, profile)
            .await
            .map_err(|e| AppError::ModelError(e.to_string()))
    }
}

/// The JSON schema of `T`, as embedded in prompts.
pub fn format_instructions<T: JsonSchema>() -> AppResult<String> {
    serde_json::to_string_pretty(&schemars::schema_for!(T))
        .map_err(|e| AppError::InternalError(format!("schema serialization failed: {}", e)))
}
