//! KIPP assistant configuration and the canned suggestion it answers with.

use serde::{Deserialize, Serialize};

use crate::normalize::Example;
use crate::schema::{Project, DEFAULT_SCALE};
use crate::{AnnotationError, Result};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KippConfig {
    pub model: String,
    pub system_prompt: String,
    pub quick_prompts: Vec<String>,
}

impl Default for KippConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: "You are an annotator's assistant. Help evaluate answers briefly and to the point."
                .to_string(),
            quick_prompts: vec![
                "Suggest relevance criteria".to_string(),
                "Is there any toxicity?".to_string(),
            ],
        }
    }
}

impl KippConfig {
    /// Trims quick prompts and drops the empty ones.
    pub fn normalized(mut self) -> Self {
        self.quick_prompts = self
            .quick_prompts
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        self
    }
}

/// Splits a one-prompt-per-line text block into quick prompts.
pub fn parse_quick_prompts(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn validate_prompt(prompt: &str) -> Result<&str> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AnnotationError::EmptyPrompt);
    }
    Ok(prompt)
}

/// Placeholder reply: points the annotator back at the instruction and the
/// rating scale of the first stars question.
pub fn suggestion(project: &Project, context: Option<&Example>) -> String {
    let scale = project
        .questionnaire
        .iter()
        .find_map(|q| q.scale())
        .unwrap_or(DEFAULT_SCALE);
    let context = match context {
        Some(_) => "see the current dialogues",
        None => "no example selected",
    };
    format!(
        "Model: {}.\nRecommendation: check that the answer follows the project instruction, use the {scale}-point scale and mark relevance.\nContext: {context}.",
        project.kipp.model
    )
}
