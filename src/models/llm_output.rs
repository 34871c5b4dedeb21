//! Shapes the model is asked to produce. Each one doubles as the JSON schema
//! handed to the model and as the validation target for its answer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema, Validate)]
pub struct AdaptationOutput {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub intro: String,
    #[validate(length(min = 1))]
    pub adapted_text: String,
    #[validate(length(min = 1))]
    pub dialogue_starter_question: String,
    /// Revision notes, a translation of the adapted text and a per-word dictionary.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema, Validate)]
pub struct GeneratedArticleOutput {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CoachReply {
    pub error_review: String,
    pub corrected_response: String,
    #[serde(default)]
    pub grammar_explanation: String,
    #[validate(length(min = 1))]
    pub follow_up_question: String,
    pub follow_up_translation: String,
    #[serde(default)]
    pub follow_up_grammar_topic: Option<String>,
    #[serde(default)]
    pub used_vocabulary: BTreeMap<String, String>,
}
