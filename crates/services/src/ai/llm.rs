use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use interview_core::model::{Assessment, Language, Question, ResponseAnalysis, Score};

use super::{GeneratedQuestion, GenerationRequest, QuestionGenerator, ScoringClient};
use crate::error::UpstreamError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Settings for an OpenAI-compatible chat-completions endpoint.
#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: Url,
    pub api_key: String,
    pub model: String,
}

impl LlmConfig {
    /// Read `INTERVIEW_AI_API_KEY`, `INTERVIEW_AI_BASE_URL` and `INTERVIEW_AI_MODEL`.
    ///
    /// Returns `None` without an API key or with a base URL that does not parse.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("INTERVIEW_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let raw_base =
            env::var("INTERVIEW_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let base_url = match Url::parse(&raw_base) {
            Ok(url) => url,
            Err(err) => {
                warn!(base_url = %raw_base, error = %err, "ignoring AI settings with invalid base url");
                return None;
            }
        };
        let model = env::var("INTERVIEW_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

/// Chat-completions client backing both scoring and question generation.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: Option<LlmConfig>,
}

impl LlmClient {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(LlmConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<LlmConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn complete(&self, prompt: String) -> Result<String, UpstreamError> {
        let config = self.config.as_ref().ok_or(UpstreamError::NotConfigured)?;

        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are an expert interviewer. Reply with JSON only.".to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(config.completions_url())
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(UpstreamError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl ScoringClient for LlmClient {
    async fn evaluate(
        &self,
        question: &Question,
        answer: &str,
        language: Language,
    ) -> Result<Assessment, UpstreamError> {
        let prompt = format!(
            "Evaluate this interview response and give feedback in {language}.\n\n\
             Question: \"{question}\"\n\
             Response: \"{answer}\"\n\n\
             Reply with a JSON object with the fields:\n\
             - score (number 0-100)\n\
             - strengths (array of strings)\n\
             - improvements (array of strings)\n\
             - keywords (array of strings)\n\
             - feedback (string)",
            language = language.english_name(),
            question = question.text,
        );
        let raw = self.complete(prompt).await?;
        debug!(question_id = %question.id, "scoring reply received");
        parse_assessment(&raw)
    }
}

#[async_trait]
impl QuestionGenerator for LlmClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedQuestion>, UpstreamError> {
        let prompt = format!(
            "Generate exactly {count} interview questions for a {level} level {profession} \
             position, written in {language}. Cover a range of topics relevant to the position.\n\
             Reply with a JSON object {{\"questions\": [{{\"question\", \"category\", \"difficulty\"}}]}} \
             where difficulty is easy, medium or hard.",
            count = request.count,
            level = request.level.as_str(),
            profession = request.profession,
            language = request.language.english_name(),
        );
        let raw = self.complete(prompt).await?;
        parse_generated(&raw)
    }
}

/// Drops a surrounding markdown code fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[derive(Debug, Deserialize)]
struct ScoringPayload {
    score: f64,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    improvements: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    feedback: String,
}

fn parse_assessment(raw: &str) -> Result<Assessment, UpstreamError> {
    let payload: ScoringPayload = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| UpstreamError::InvalidPayload(e.to_string()))?;
    Ok(Assessment {
        score: Score::saturating_from_f64(payload.score),
        feedback: payload.feedback.trim().to_string(),
        analysis: ResponseAnalysis {
            strengths: payload.strengths,
            areas_for_improvement: payload.improvements,
            keywords: payload.keywords,
        },
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeneratedPayload {
    Wrapped { questions: Vec<GeneratedQuestion> },
    Bare(Vec<GeneratedQuestion>),
}

fn parse_generated(raw: &str) -> Result<Vec<GeneratedQuestion>, UpstreamError> {
    let payload: GeneratedPayload = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| UpstreamError::InvalidPayload(e.to_string()))?;
    let questions = match payload {
        GeneratedPayload::Wrapped { questions } | GeneratedPayload::Bare(questions) => questions,
    };
    if questions.is_empty() {
        return Err(UpstreamError::EmptyResponse);
    }
    Ok(questions)
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}
