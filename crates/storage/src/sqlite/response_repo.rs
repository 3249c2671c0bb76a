use interview_core::model::{InterviewId, Response, ResponseId};

use super::SqliteRepository;
use super::mapping::{conn, map_response_row, to_json, write_err};
use crate::repository::{ResponseRepository, StorageError};

const RESPONSE_COLUMNS: &str = r"
    id, question_id, interview_id, text, audio_url, duration_secs, score, feedback,
    confidence, analysis, created_at, updated_at
";

#[async_trait::async_trait]
impl ResponseRepository for SqliteRepository {
    async fn insert_response(&self, response: &Response) -> Result<(), StorageError> {
        // The question's response list is derived from this row, so one insert links both.
        sqlx::query(&format!(
            "INSERT INTO responses ({RESPONSE_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ))
        .bind(response.id.to_string())
        .bind(response.question_id.to_string())
        .bind(response.interview_id.to_string())
        .bind(&response.text)
        .bind(response.audio_url.as_deref())
        .bind(i64::from(response.duration_secs))
        .bind(i64::from(response.score.value()))
        .bind(&response.feedback)
        .bind(i64::from(response.confidence.value()))
        .bind(to_json(&response.analysis)?)
        .bind(response.created_at)
        .bind(response.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(())
    }

    async fn update_response(&self, response: &Response) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE responses SET
                text = ?2,
                audio_url = ?3,
                duration_secs = ?4,
                score = ?5,
                feedback = ?6,
                confidence = ?7,
                analysis = ?8,
                updated_at = ?9
            WHERE id = ?1
            ",
        )
        .bind(response.id.to_string())
        .bind(&response.text)
        .bind(response.audio_url.as_deref())
        .bind(i64::from(response.duration_secs))
        .bind(i64::from(response.score.value()))
        .bind(&response.feedback)
        .bind(i64::from(response.confidence.value()))
        .bind(to_json(&response.analysis)?)
        .bind(response.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_response(&self, id: ResponseId) -> Result<Response, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM responses WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        map_response_row(&row)
    }

    async fn load_responses_for_interview(
        &self,
        interview_id: InterviewId,
    ) -> Result<Vec<Response>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM responses WHERE interview_id = ?1 \
             ORDER BY created_at ASC, rowid ASC"
        ))
        .bind(interview_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_response_row).collect()
    }
}
