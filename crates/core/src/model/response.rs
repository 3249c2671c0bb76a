use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{InterviewId, QuestionId, ResponseId};
use crate::model::score::Score;

/// Feedback recorded when the scoring collaborator fails.
pub const SCORING_UNAVAILABLE_FEEDBACK: &str = "Unable to generate feedback at this time";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseAnalysis {
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub keywords: Vec<String>,
}

/// Score, feedback and analysis attached to a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub score: Score,
    pub feedback: String,
    pub analysis: ResponseAnalysis,
}

impl Assessment {
    /// Used when the scoring collaborator errors out.
    #[must_use]
    pub fn scoring_unavailable() -> Self {
        Self {
            score: Score::FALLBACK,
            feedback: SCORING_UNAVAILABLE_FEEDBACK.to_string(),
            analysis: ResponseAnalysis::default(),
        }
    }

    /// Used for responses without text, which are never sent for scoring.
    #[must_use]
    pub fn unscored() -> Self {
        Self {
            score: Score::FALLBACK,
            feedback: String::new(),
            analysis: ResponseAnalysis::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDraft {
    pub question_id: QuestionId,
    pub interview_id: InterviewId,
    pub text: Option<String>,
    pub audio_url: Option<String>,
    pub duration_secs: Option<u32>,
}

/// Partial update; absent or empty fields keep the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseUpdate {
    pub text: Option<String>,
    pub audio_url: Option<String>,
    pub duration_secs: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub id: ResponseId,
    pub question_id: QuestionId,
    pub interview_id: InterviewId,
    pub text: String,
    pub audio_url: Option<String>,
    pub duration_secs: u32,
    pub score: Score,
    pub feedback: String,
    /// Mirrors `score`.
    pub confidence: Score,
    pub analysis: ResponseAnalysis,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Response {
    #[must_use]
    pub fn submit(
        id: ResponseId,
        draft: ResponseDraft,
        assessment: Assessment,
        now: DateTime<Utc>,
    ) -> Self {
        let mut response = Self {
            id,
            question_id: draft.question_id,
            interview_id: draft.interview_id,
            text: draft.text.unwrap_or_default(),
            audio_url: draft.audio_url.filter(|a| !a.trim().is_empty()),
            duration_secs: draft.duration_secs.unwrap_or(0),
            score: Score::MIN,
            feedback: String::new(),
            confidence: Score::MIN,
            analysis: ResponseAnalysis::default(),
            created_at: now,
            updated_at: now,
        };
        response.apply_assessment(assessment, now);
        response
    }

    /// A response counts as an answer when it carries text or audio.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        !self.text.trim().is_empty() || self.audio_url.is_some()
    }

    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn apply_assessment(&mut self, assessment: Assessment, now: DateTime<Utc>) {
        self.score = assessment.score;
        self.confidence = assessment.score;
        self.feedback = assessment.feedback;
        self.analysis = assessment.analysis;
        self.updated_at = now;
    }

    /// Apply an update. Returns `true` when the text changed and needs re-scoring.
    pub fn revise(&mut self, update: ResponseUpdate, now: DateTime<Utc>) -> bool {
        let mut text_changed = false;
        if let Some(text) = update.text.filter(|t| !t.is_empty()) {
            text_changed = text != self.text;
            self.text = text;
        }
        if let Some(audio) = update.audio_url.filter(|a| !a.trim().is_empty()) {
            self.audio_url = Some(audio);
        }
        if let Some(duration) = update.duration_secs.filter(|d| *d > 0) {
            self.duration_secs = duration;
        }
        self.updated_at = now;
        text_changed
    }
}
