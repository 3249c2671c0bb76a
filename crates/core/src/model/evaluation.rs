use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{EvaluationId, InterviewId, UserId};
use crate::model::interview::{Interview, InterviewStatus};
use crate::model::question::Question;
use crate::model::response::Response;
use crate::model::score::{Score, rounded_mean};

const MAX_LISTED: usize = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EvaluationError {
    #[error("interview {0} is not completed")]
    NotCompleted(InterviewId),

    #[error("invalid access level: {0}")]
    InvalidAccessLevel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Basic,
    Detailed,
}

impl AccessLevel {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Basic => "basic",
            AccessLevel::Detailed => "detailed",
        }
    }

    /// # Errors
    ///
    /// Returns `EvaluationError::InvalidAccessLevel` for unknown names.
    pub fn parse(s: &str) -> Result<Self, EvaluationError> {
        match s {
            "basic" => Ok(AccessLevel::Basic),
            "detailed" => Ok(AccessLevel::Detailed),
            other => Err(EvaluationError::InvalidAccessLevel(other.to_string())),
        }
    }
}

/// Summary report for a completed interview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub interview_id: InterviewId,
    pub user_id: UserId,
    pub overall_score: Score,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub detailed_feedback: String,
    pub is_paid: bool,
    pub access_level: AccessLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn dedup_limited<'a>(items: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .take(MAX_LISTED)
        .map(str::to_string)
        .collect()
}

impl Evaluation {
    /// Build the evaluation from a completed interview and its responses.
    ///
    /// # Errors
    ///
    /// Returns `EvaluationError::NotCompleted` unless the interview is completed.
    pub fn from_interview(
        id: EvaluationId,
        interview: &Interview,
        questions: &[Question],
        responses: &[Response],
        now: DateTime<Utc>,
    ) -> Result<Self, EvaluationError> {
        if interview.status() != InterviewStatus::Completed {
            return Err(EvaluationError::NotCompleted(interview.id()));
        }

        let strengths = dedup_limited(responses.iter().flat_map(|r| &r.analysis.strengths));
        let weaknesses = dedup_limited(
            responses
                .iter()
                .flat_map(|r| &r.analysis.areas_for_improvement),
        );

        let mut ordered: Vec<&Question> = questions.iter().collect();
        ordered.sort_by_key(|q| q.order);

        let mut recommendations = Vec::new();
        let mut feedback_lines = Vec::new();
        for question in ordered {
            let own: Vec<&Response> = responses
                .iter()
                .filter(|r| r.question_id == question.id)
                .collect();

            if !own.iter().any(|r| r.is_answered()) {
                recommendations.push(format!("Practice answering: {}", question.text));
                feedback_lines.push(format!("Q{}: not answered", question.order));
                continue;
            }

            let sum: u64 = own.iter().map(|r| u64::from(r.score.value())).sum();
            let mean = rounded_mean(sum, own.len() as u64);
            if mean < u64::from(Score::PASSING.value()) {
                recommendations.push(format!(
                    "Review {} topics: {}",
                    question.category, question.text
                ));
            }
            let notes: Vec<&str> = own
                .iter()
                .map(|r| r.feedback.trim())
                .filter(|f| !f.is_empty())
                .collect();
            if notes.is_empty() {
                feedback_lines.push(format!("Q{} ({mean}/100)", question.order));
            } else {
                feedback_lines.push(format!("Q{} ({mean}/100): {}", question.order, notes.join(" ")));
            }
        }

        Ok(Self {
            id,
            interview_id: interview.id(),
            user_id: interview.user_id(),
            overall_score: interview.total_score(),
            strengths,
            weaknesses,
            recommendations,
            detailed_feedback: feedback_lines.join("\n"),
            is_paid: false,
            access_level: AccessLevel::Basic,
            created_at: now,
            updated_at: now,
        })
    }

    /// Failing, unpaid evaluations need payment for the detailed level.
    #[must_use]
    pub fn requires_payment(&self) -> bool {
        !self.overall_score.is_passing() && !self.is_paid
    }

    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.is_paid || self.access_level == AccessLevel::Detailed
    }

    /// Unlock after a successful charge.
    pub fn unlock_paid(&mut self, now: DateTime<Utc>) {
        self.is_paid = true;
        self.access_level = AccessLevel::Detailed;
        self.updated_at = now;
    }

    /// Unlock without a charge (premium accounts).
    pub fn unlock_complimentary(&mut self, now: DateTime<Utc>) {
        self.access_level = AccessLevel::Detailed;
        self.updated_at = now;
    }

    /// Copy with detailed feedback and recommendations stripped.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            detailed_feedback: String::new(),
            recommendations: Vec::new(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::ResponseId;
    use crate::model::interview::InterviewDraft;
    use crate::model::level::Language;
    use crate::model::question::{QuestionDraft, build_questions};
    use crate::model::response::{Assessment, ResponseAnalysis, ResponseDraft};
    use crate::stats::recompute;
    use crate::time::fixed_now;

    fn scored(q: &Question, text: Option<&str>, score: u8, strengths: &[&str]) -> Response {
        Response::submit(
            ResponseId::new(),
            ResponseDraft {
                question_id: q.id,
                interview_id: q.interview_id,
                text: text.map(Into::into),
                audio_url: None,
                duration_secs: Some(10),
            },
            Assessment {
                score: Score::new(score).unwrap(),
                feedback: "ok".into(),
                analysis: ResponseAnalysis {
                    strengths: strengths.iter().map(|s| (*s).to_string()).collect(),
                    areas_for_improvement: vec!["depth".into()],
                    keywords: Vec::new(),
                },
            },
            fixed_now(),
        )
    }

    fn completed(scores: &[u8]) -> (Interview, Vec<Question>, Vec<Response>) {
        let mut interview = Interview::start(
            InterviewId::new(),
            UserId::new(),
            InterviewDraft {
                title: "t".into(),
                profession: "p".into(),
                ..InterviewDraft::default()
            },
            Language::En,
            fixed_now(),
        )
        .unwrap();
        let drafts = (0..scores.len() + 1)
            .map(|i| QuestionDraft {
                text: format!("q{i}"),
                ..QuestionDraft::default()
            })
            .collect();
        let questions = build_questions(interview.id(), drafts, fixed_now()).unwrap();
        interview.attach_questions(&questions, fixed_now()).unwrap();
        let responses: Vec<Response> = scores
            .iter()
            .zip(&questions)
            .map(|(s, q)| scored(q, Some("answer"), *s, &["clear", "Clear", "concise"]))
            .collect();
        interview
            .apply_aggregate(recompute(interview.question_count(), &responses), fixed_now())
            .unwrap();
        interview.complete(fixed_now());
        (interview, questions, responses)
    }

    #[test]
    fn requires_completed_interview() {
        let (mut interview, questions, responses) = completed(&[80]);
        let fresh = Interview::start(
            InterviewId::new(),
            interview.user_id(),
            InterviewDraft {
                title: "t".into(),
                profession: "p".into(),
                ..InterviewDraft::default()
            },
            Language::En,
            fixed_now(),
        )
        .unwrap();
        assert!(matches!(
            Evaluation::from_interview(EvaluationId::new(), &fresh, &questions, &responses, fixed_now()),
            Err(EvaluationError::NotCompleted(_))
        ));
        interview.complete(fixed_now());
        assert!(
            Evaluation::from_interview(EvaluationId::new(), &interview, &questions, &responses, fixed_now())
                .is_ok()
        );
    }

    #[test]
    fn failing_evaluation_requires_payment_until_paid() {
        let (interview, questions, responses) = completed(&[60, 50]);
        let mut eval =
            Evaluation::from_interview(EvaluationId::new(), &interview, &questions, &responses, fixed_now())
                .unwrap();
        assert_eq!(eval.overall_score.value(), 55);
        assert!(eval.requires_payment());
        assert!(!eval.is_unlocked());
        eval.unlock_paid(fixed_now());
        assert!(!eval.requires_payment());
        assert_eq!(eval.access_level, AccessLevel::Detailed);
    }

    #[test]
    fn recommendations_cover_skipped_and_weak_questions() {
        let (interview, questions, responses) = completed(&[90, 40]);
        let eval =
            Evaluation::from_interview(EvaluationId::new(), &interview, &questions, &responses, fixed_now())
                .unwrap();
        assert_eq!(eval.recommendations.len(), 2);
        assert!(eval.recommendations[0].starts_with("Review general topics"));
        assert!(eval.recommendations[1].starts_with("Practice answering"));
        assert_eq!(eval.strengths, vec!["clear".to_string(), "concise".to_string()]);
        assert_eq!(eval.weaknesses, vec!["depth".to_string()]);
        assert!(eval.detailed_feedback.contains("Q3: not answered"));
    }

    #[test]
    fn redacted_drops_detail() {
        let (interview, questions, responses) = completed(&[40]);
        let eval =
            Evaluation::from_interview(EvaluationId::new(), &interview, &questions, &responses, fixed_now())
                .unwrap();
        let redacted = eval.redacted();
        assert!(redacted.detailed_feedback.is_empty());
        assert!(redacted.recommendations.is_empty());
        assert_eq!(redacted.strengths, eval.strengths);
    }
}
