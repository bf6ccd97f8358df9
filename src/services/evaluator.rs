use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::EvaluationResult;
use crate::services::llm_client::{LanguageModel, LlmError};

#[derive(Debug, Error)]
pub enum EvaluateError {
    #[error("model response did not match the evaluation schema: {message}")]
    MalformedModelResponse { message: String },

    #[error(transparent)]
    Model(#[from] LlmError),
}

impl EvaluateError {
    fn malformed(message: impl Into<String>) -> Self {
        EvaluateError::MalformedModelResponse {
            message: message.into(),
        }
    }
}

/// Tunables for the prompt and the response checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatorSettings {
    pub max_output_tokens: u32,
    pub min_improvements: usize,
    pub max_improvements: usize,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            max_output_tokens: 2000,
            min_improvements: 3,
            max_improvements: 6,
        }
    }
}

impl From<&Config> for EvaluatorSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_output_tokens: config.max_output_tokens,
            min_improvements: config.min_improvements,
            max_improvements: config.max_improvements,
        }
    }
}

/// Turns resume text into structured feedback through a language model.
#[derive(Clone)]
pub struct Evaluator {
    model: Arc<dyn LanguageModel>,
    settings: EvaluatorSettings,
}

impl Evaluator {
    pub fn new(model: Arc<dyn LanguageModel>, settings: EvaluatorSettings) -> Self {
        Self { model, settings }
    }

    pub async fn evaluate(
        &self,
        resume_text: &str,
        target_role: &str,
    ) -> Result<EvaluationResult, EvaluateError> {
        let start = Instant::now();
        let prompt = build_prompt(resume_text, target_role, &self.settings);

        debug!(prompt_length = prompt.len(), "Sending resume to language model");

        let raw = self
            .model
            .complete(&prompt, self.settings.max_output_tokens)
            .await?;

        let result = parse_evaluation(&raw, &self.settings).map_err(|e| {
            warn!(response_length = raw.len(), error = %e, "Model response rejected");
            e
        })?;

        info!(
            overall_score = result.overall_score,
            strengths = result.strengths.len(),
            improvements = result.improvements.len(),
            high_priority = result.high_priority_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Resume evaluated"
        );

        Ok(result)
    }
}

pub fn build_prompt(resume_text: &str, target_role: &str, settings: &EvaluatorSettings) -> String {
    let min = settings.min_improvements;
    let max = settings.max_improvements;

    format!(
        r#"You are an expert resume coach and hiring manager with 15+ years of experience.

Analyze this resume for someone applying to: {target_role}

Resume:
{resume_text}

Return ONLY a valid JSON object with this exact structure (no markdown, no extra text):
{{
  "overall_score": <integer 1-10>,
  "summary": "<2-3 sentence honest overall assessment>",
  "strengths": [
    "<specific strength referencing actual resume content>",
    "<specific strength>",
    "<specific strength>"
  ],
  "improvements": [
    {{
      "section": "<section name e.g. Work Experience, Skills, Summary, Education, Formatting>",
      "issue": "<what is wrong or missing, be specific and reference actual content>",
      "suggestion": "<concrete actionable fix, show them exactly what to change>",
      "priority": "<high|medium|low>"
    }}
  ]
}}

Rules:
- Be specific. Reference actual content from their resume, never give generic advice.
- Prioritize improvements that would most impact getting an interview for {target_role}.
- high priority = will likely cost them interviews. medium = notable gap. low = polish.
- Return {min}-{max} improvements total.
- Return only valid JSON."#
    )
}

/// Removes a surrounding Markdown code fence and an optional `json` tag.
/// Text without a leading fence is returned trimmed.
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let Some(after_open) = text.strip_prefix("```") else {
        return text;
    };

    let inner = match after_open.find("```") {
        Some(end) => &after_open[..end],
        None => after_open,
    };

    inner.strip_prefix("json").unwrap_or(inner).trim()
}

pub fn parse_evaluation(
    raw: &str,
    settings: &EvaluatorSettings,
) -> Result<EvaluationResult, EvaluateError> {
    let cleaned = strip_code_fence(raw);

    let value: serde_json::Value = serde_json::from_str(cleaned)
        .map_err(|e| EvaluateError::malformed(format!("invalid JSON: {}", e)))?;

    let result: EvaluationResult = serde_json::from_value(value)
        .map_err(|e| EvaluateError::malformed(format!("schema mismatch: {}", e)))?;

    validate(&result, settings)?;
    Ok(result)
}

fn validate(result: &EvaluationResult, settings: &EvaluatorSettings) -> Result<(), EvaluateError> {
    if !(1..=10).contains(&result.overall_score) {
        return Err(EvaluateError::malformed(format!(
            "overall_score {} outside 1-10",
            result.overall_score
        )));
    }

    let count = result.improvements.len();
    if count < settings.min_improvements || count > settings.max_improvements {
        return Err(EvaluateError::malformed(format!(
            "{} improvements, expected {}-{}",
            count, settings.min_improvements, settings.max_improvements
        )));
    }

    Ok(())
}
