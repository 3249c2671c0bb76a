//! Seams for the language-model collaborators.

mod llm;

pub use llm::{LlmClient, LlmConfig};

use async_trait::async_trait;
use serde::Deserialize;

use interview_core::model::{Assessment, InterviewLevel, Language, Question};

use crate::error::UpstreamError;

/// Grades a single answer.
#[async_trait]
pub trait ScoringClient: Send + Sync {
    /// # Errors
    ///
    /// Returns `UpstreamError` when the collaborator is unreachable or replies
    /// with something that cannot be read as an assessment.
    async fn evaluate(
        &self,
        question: &Question,
        answer: &str,
        language: Language,
    ) -> Result<Assessment, UpstreamError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub profession: String,
    pub level: InterviewLevel,
    pub language: Language,
    pub count: u32,
}

/// Raw generated question; `difficulty` is free text until normalized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

/// Proposes interview questions.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// # Errors
    ///
    /// Returns `UpstreamError` when generation fails.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedQuestion>, UpstreamError>;
}
