use chrono::{DateTime, Utc};
use interview_core::AccessTier;
use interview_core::model::{
    AccessLevel, Evaluation, Interview, InterviewId, PersistedInterview, Plan, Question,
    QuestionDifficulty, Response, ResponseId, Score, Subscription, SubscriptionStatus, User,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use std::str::FromStr;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps write failures: unique violations to `Conflict`, dangling references to `NotFound`.
pub(crate) fn write_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Conflict;
        }
        if db.is_foreign_key_violation() {
            return StorageError::NotFound;
        }
    }
    StorageError::Connection(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn parse_field<T>(field: &'static str, raw: &str) -> Result<T, StorageError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| StorageError::Serialization(format!("{field}: {e}")))
}

pub(crate) fn id_field<T>(row: &SqliteRow, field: &'static str) -> Result<T, StorageError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    let raw: String = row.try_get(field).map_err(ser)?;
    parse_field(field, &raw)
}

pub(crate) fn u32_field(row: &SqliteRow, field: &'static str) -> Result<u32, StorageError> {
    let v: i64 = row.try_get(field).map_err(ser)?;
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn score_field(row: &SqliteRow, field: &'static str) -> Result<Score, StorageError> {
    let v: i64 = row.try_get(field).map_err(ser)?;
    Score::try_from(v).map_err(ser)
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

pub(crate) fn json_field<T: DeserializeOwned>(
    row: &SqliteRow,
    field: &'static str,
) -> Result<T, StorageError> {
    let raw: String = row.try_get(field).map_err(ser)?;
    serde_json::from_str(&raw).map_err(|e| StorageError::Serialization(format!("{field}: {e}")))
}

pub(crate) fn map_user_row(
    row: &SqliteRow,
    interviews: Vec<InterviewId>,
) -> Result<User, StorageError> {
    let tier: String = row.try_get("subscription_status").map_err(ser)?;
    let subscription_id: Option<String> = row.try_get("subscription_id").map_err(ser)?;
    let language: String = row.try_get("language").map_err(ser)?;

    Ok(User {
        id: id_field(row, "id")?,
        email: row.try_get("email").map_err(ser)?,
        first_name: row.try_get("first_name").map_err(ser)?,
        last_name: row.try_get("last_name").map_err(ser)?,
        profession: row.try_get("profession").map_err(ser)?,
        language: parse_field("language", &language)?,
        free_trial_end_date: row.try_get("free_trial_end_date").map_err(ser)?,
        subscription_status: AccessTier::parse(&tier)
            .ok_or_else(|| StorageError::Serialization(format!("invalid tier: {tier}")))?,
        subscription_id: subscription_id
            .map(|s| parse_field("subscription_id", &s))
            .transpose()?,
        interviews,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

pub(crate) fn map_subscription_row(row: &SqliteRow) -> Result<Subscription, StorageError> {
    let plan: String = row.try_get("plan").map_err(ser)?;
    let status: String = row.try_get("status").map_err(ser)?;

    Ok(Subscription {
        id: id_field(row, "id")?,
        user_id: id_field(row, "user_id")?,
        plan: Plan::parse(&plan).map_err(ser)?,
        status: SubscriptionStatus::parse(&status).map_err(ser)?,
        start_date: row.try_get("start_date").map_err(ser)?,
        end_date: row.try_get("end_date").map_err(ser)?,
        renewal_date: row.try_get("renewal_date").map_err(ser)?,
        price: row.try_get("price").map_err(ser)?,
        currency: row.try_get("currency").map_err(ser)?,
        provider_payment_id: row.try_get("provider_payment_id").map_err(ser)?,
        provider_transaction_id: row.try_get("provider_transaction_id").map_err(ser)?,
        features: json_field(row, "features")?,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

pub(crate) fn map_interview_row(
    row: &SqliteRow,
    questions: Vec<interview_core::model::QuestionId>,
) -> Result<Interview, StorageError> {
    let kind: String = row.try_get("kind").map_err(ser)?;
    let level: String = row.try_get("level").map_err(ser)?;
    let language: String = row.try_get("language").map_err(ser)?;
    let status: String = row.try_get("status").map_err(ser)?;
    let completed_at: Option<DateTime<Utc>> = row.try_get("completed_at").map_err(ser)?;

    Interview::from_persisted(PersistedInterview {
        id: id_field(row, "id")?,
        user_id: id_field(row, "user_id")?,
        title: row.try_get("title").map_err(ser)?,
        profession: row.try_get("profession").map_err(ser)?,
        kind: parse_field("kind", &kind)?,
        level: parse_field("level", &level)?,
        language: parse_field("language", &language)?,
        status: parse_field("status", &status)?,
        duration_secs: u32_field(row, "duration_secs")?,
        questions,
        current_question_index: u32_field(row, "current_question_index")?,
        total_score: score_field(row, "total_score")?,
        feedback: row.try_get("feedback").map_err(ser)?,
        statistics: json_field(row, "statistics")?,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
        completed_at,
    })
    .map_err(ser)
}

pub(crate) fn map_question_row(
    row: &SqliteRow,
    responses: Vec<ResponseId>,
) -> Result<Question, StorageError> {
    let difficulty: String = row.try_get("difficulty").map_err(ser)?;

    Ok(Question {
        id: id_field(row, "id")?,
        interview_id: id_field(row, "interview_id")?,
        text: row.try_get("text").map_err(ser)?,
        audio_url: row.try_get("audio_url").map_err(ser)?,
        order: u32_field(row, "position")?,
        category: row.try_get("category").map_err(ser)?,
        difficulty: QuestionDifficulty::normalize(&difficulty).map_err(ser)?,
        responses,
        time_limit_secs: u32_field(row, "time_limit_secs")?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_response_row(row: &SqliteRow) -> Result<Response, StorageError> {
    Ok(Response {
        id: id_field(row, "id")?,
        question_id: id_field(row, "question_id")?,
        interview_id: id_field(row, "interview_id")?,
        text: row.try_get("text").map_err(ser)?,
        audio_url: row.try_get("audio_url").map_err(ser)?,
        duration_secs: u32_field(row, "duration_secs")?,
        score: score_field(row, "score")?,
        feedback: row.try_get("feedback").map_err(ser)?,
        confidence: score_field(row, "confidence")?,
        analysis: json_field(row, "analysis")?,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

pub(crate) fn map_evaluation_row(row: &SqliteRow) -> Result<Evaluation, StorageError> {
    let access_level: String = row.try_get("access_level").map_err(ser)?;
    let is_paid: i64 = row.try_get("is_paid").map_err(ser)?;

    Ok(Evaluation {
        id: id_field(row, "id")?,
        interview_id: id_field(row, "interview_id")?,
        user_id: id_field(row, "user_id")?,
        overall_score: score_field(row, "overall_score")?,
        strengths: json_field(row, "strengths")?,
        weaknesses: json_field(row, "weaknesses")?,
        recommendations: json_field(row, "recommendations")?,
        detailed_feedback: row.try_get("detailed_feedback").map_err(ser)?,
        is_paid: is_paid != 0,
        access_level: AccessLevel::parse(&access_level).map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}
