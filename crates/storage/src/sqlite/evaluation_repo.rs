use interview_core::model::{Evaluation, EvaluationId, InterviewId, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_evaluation_row, to_json, write_err};
use crate::repository::{EvaluationRepository, StorageError};

const EVALUATION_COLUMNS: &str = r"
    id, interview_id, user_id, overall_score, strengths, weaknesses, recommendations,
    detailed_feedback, is_paid, access_level, created_at, updated_at
";

#[async_trait::async_trait]
impl EvaluationRepository for SqliteRepository {
    async fn insert_evaluation(&self, evaluation: &Evaluation) -> Result<(), StorageError> {
        sqlx::query(&format!(
            "INSERT INTO evaluations ({EVALUATION_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ))
        .bind(evaluation.id.to_string())
        .bind(evaluation.interview_id.to_string())
        .bind(evaluation.user_id.to_string())
        .bind(i64::from(evaluation.overall_score.value()))
        .bind(to_json(&evaluation.strengths)?)
        .bind(to_json(&evaluation.weaknesses)?)
        .bind(to_json(&evaluation.recommendations)?)
        .bind(&evaluation.detailed_feedback)
        .bind(i64::from(evaluation.is_paid))
        .bind(evaluation.access_level.as_str())
        .bind(evaluation.created_at)
        .bind(evaluation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(())
    }

    async fn get_evaluation(&self, id: EvaluationId) -> Result<Evaluation, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_evaluation_row(&row)
    }

    async fn evaluation_for_interview(
        &self,
        interview_id: InterviewId,
    ) -> Result<Option<Evaluation>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE interview_id = ?1"
        ))
        .bind(interview_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_evaluation_row).transpose()
    }

    async fn list_evaluations_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Evaluation>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {EVALUATION_COLUMNS} FROM evaluations WHERE user_id = ?1 \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_evaluation_row).collect()
    }

    async fn update_evaluation(&self, evaluation: &Evaluation) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE evaluations SET
                is_paid = ?2,
                access_level = ?3,
                updated_at = ?4
            WHERE id = ?1
            ",
        )
        .bind(evaluation.id.to_string())
        .bind(i64::from(evaluation.is_paid))
        .bind(evaluation.access_level.as_str())
        .bind(evaluation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
