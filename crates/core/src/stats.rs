//! Derived interview aggregates and per-user reporting.
//!
//! Every function here is a pure recomputation over the full input set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::model::score::rounded_mean;
use crate::model::{Interview, InterviewStatus, Question, QuestionDifficulty, Response, Score};

/// Aggregate counters stored on an interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewStatistics {
    pub total_questions: u32,
    pub answered_questions: u32,
    pub skipped_questions: u32,
    /// Rounded mean response duration in seconds.
    pub average_response_time: u32,
    /// Rounded mean response score.
    pub confidence: u8,
}

impl InterviewStatistics {
    /// All-zero statistics for a freshly created interview.
    #[must_use]
    pub fn empty(total_questions: u32) -> Self {
        Self {
            total_questions,
            answered_questions: 0,
            skipped_questions: total_questions,
            average_response_time: 0,
            confidence: 0,
        }
    }

    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.answered_questions.checked_add(self.skipped_questions) == Some(self.total_questions)
    }
}

/// Result of a full recomputation, applied to an interview in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregate {
    pub statistics: InterviewStatistics,
    pub total_score: Score,
    pub total_duration_secs: u32,
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn score_of(value: u64) -> Score {
    u8::try_from(value)
        .ok()
        .and_then(|v| Score::new(v).ok())
        .unwrap_or(Score::MAX)
}

/// Recompute interview aggregates from every response it holds.
#[must_use]
pub fn recompute(total_questions: u32, responses: &[Response]) -> Aggregate {
    let answered: HashSet<_> = responses
        .iter()
        .filter(|r| r.is_answered())
        .map(|r| r.question_id)
        .collect();
    let answered_questions = clamp_u32(answered.len() as u64).min(total_questions);

    let count = responses.len() as u64;
    let duration_sum: u64 = responses.iter().map(|r| u64::from(r.duration_secs)).sum();
    let score_sum: u64 = responses.iter().map(|r| u64::from(r.score.value())).sum();

    let confidence = score_of(rounded_mean(score_sum, count));

    Aggregate {
        statistics: InterviewStatistics {
            total_questions,
            answered_questions,
            skipped_questions: total_questions - answered_questions,
            average_response_time: clamp_u32(rounded_mean(duration_sum, count)),
            confidence: confidence.value(),
        },
        total_score: confidence,
        total_duration_secs: clamp_u32(duration_sum),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyBucket {
    pub count: u32,
    /// Sum of each question's rounded mean score.
    pub total_score: u32,
    pub average_score: u32,
}

fn question_mean(question: &Question, responses: &[Response]) -> u64 {
    let (sum, count) = responses
        .iter()
        .filter(|r| r.question_id == question.id)
        .fold((0_u64, 0_u64), |(s, c), r| (s + u64::from(r.score.value()), c + 1));
    rounded_mean(sum, count)
}

/// Group questions by difficulty. A question with no responses contributes 0.
#[must_use]
pub fn breakdown_by_difficulty(
    questions: &[Question],
    responses: &[Response],
) -> BTreeMap<QuestionDifficulty, DifficultyBucket> {
    let mut buckets: BTreeMap<QuestionDifficulty, DifficultyBucket> = BTreeMap::new();
    for question in questions {
        let bucket = buckets.entry(question.difficulty).or_default();
        bucket.count = bucket.count.saturating_add(1);
        bucket.total_score = bucket
            .total_score
            .saturating_add(clamp_u32(question_mean(question, responses)));
    }
    for bucket in buckets.values_mut() {
        bucket.average_score =
            clamp_u32(rounded_mean(u64::from(bucket.total_score), u64::from(bucket.count)));
    }
    buckets
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSummary {
    pub score: u8,
    pub feedback: String,
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStats {
    pub question: String,
    pub category: String,
    pub difficulty: QuestionDifficulty,
    pub responses: Vec<ResponseSummary>,
}

/// Per-question view in question order.
#[must_use]
pub fn question_breakdown(questions: &[Question], responses: &[Response]) -> Vec<QuestionStats> {
    let mut ordered: Vec<&Question> = questions.iter().collect();
    ordered.sort_by_key(|q| q.order);
    ordered
        .into_iter()
        .map(|q| QuestionStats {
            question: q.text.clone(),
            category: q.category.clone(),
            difficulty: q.difficulty,
            responses: responses
                .iter()
                .filter(|r| r.question_id == q.id)
                .map(|r| ResponseSummary {
                    score: r.score.value(),
                    feedback: r.feedback.clone(),
                    duration: r.duration_secs,
                })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_interviews: u32,
    pub completed_interviews: u32,
    /// Rounded mean `total_score` of completed interviews.
    pub average_score: u32,
    pub total_duration: u64,
    /// Keyed like `"Jan 2025"`.
    pub interviews_by_month: BTreeMap<String, u32>,
    pub interviews_by_profession: BTreeMap<String, u32>,
}

#[must_use]
pub fn user_stats(interviews: &[Interview]) -> UserStats {
    let mut stats = UserStats {
        total_interviews: clamp_u32(interviews.len() as u64),
        ..UserStats::default()
    };
    let mut completed_score_sum = 0_u64;

    for interview in interviews {
        if interview.status() == InterviewStatus::Completed {
            stats.completed_interviews += 1;
            completed_score_sum += u64::from(interview.total_score().value());
        }
        stats.total_duration += u64::from(interview.duration_secs());

        let month = interview.created_at().format("%b %Y").to_string();
        *stats.interviews_by_month.entry(month).or_default() += 1;
        *stats
            .interviews_by_profession
            .entry(interview.profession().to_string())
            .or_default() += 1;
    }

    stats.average_score = clamp_u32(rounded_mean(
        completed_score_sum,
        u64::from(stats.completed_interviews),
    ));
    stats
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: DateTime<Utc>,
    pub score: u8,
    pub profession: String,
    pub duration: u32,
}

/// Completed interviews ordered by creation time.
#[must_use]
pub fn performance_trends(interviews: &[Interview]) -> Vec<TrendPoint> {
    let mut completed: Vec<&Interview> = interviews
        .iter()
        .filter(|i| i.status() == InterviewStatus::Completed)
        .collect();
    completed.sort_by_key(|i| i.created_at());
    completed
        .into_iter()
        .map(|i| TrendPoint {
            date: i.created_at(),
            score: i.total_score().value(),
            profession: i.profession().to_string(),
            duration: i.duration_secs(),
        })
        .collect()
}
