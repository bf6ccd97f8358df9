use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Likely to cost the candidate interviews.
    High,
    /// A notable gap.
    Medium,
    /// Polish.
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    pub section: String,
    pub issue: String,
    pub suggestion: String,
    pub priority: Priority,
}

/// Structured feedback for one resume, serialized as the response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub overall_score: u8,
    pub summary: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<Improvement>,
}

impl EvaluationResult {
    pub fn high_priority_count(&self) -> usize {
        self.improvements
            .iter()
            .filter(|i| i.priority == Priority::High)
            .count()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
