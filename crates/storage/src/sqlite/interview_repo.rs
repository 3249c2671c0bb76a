use std::collections::HashMap;

use chrono::{DateTime, Utc};
use interview_core::model::{Interview, InterviewId, Question, QuestionId, ResponseId, UserId};
use interview_core::stats::Aggregate;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{conn, id_field, map_interview_row, map_question_row, to_json, write_err};
use crate::repository::{InterviewRepository, StorageError};

const INTERVIEW_COLUMNS: &str = r"
    id, user_id, title, profession, kind, level, language, status, duration_secs,
    current_question_index, total_score, feedback, statistics, created_at, updated_at,
    completed_at
";

const QUESTION_COLUMNS: &str = r"
    id, interview_id, text, audio_url, position, category, difficulty, time_limit_secs, created_at
";

impl SqliteRepository {
    async fn question_ids_for(
        &self,
        interview_id: InterviewId,
    ) -> Result<Vec<QuestionId>, StorageError> {
        let rows = sqlx::query("SELECT id FROM questions WHERE interview_id = ?1 ORDER BY position")
            .bind(interview_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;
        rows.iter().map(|row| id_field(row, "id")).collect()
    }

    async fn response_ids_by_question(
        &self,
        filter_sql: &str,
        key: String,
    ) -> Result<HashMap<QuestionId, Vec<ResponseId>>, StorageError> {
        let sql = format!(
            "SELECT id, question_id FROM responses WHERE {filter_sql} ORDER BY created_at ASC, rowid ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(key)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut grouped: HashMap<QuestionId, Vec<ResponseId>> = HashMap::new();
        for row in &rows {
            let question_id: QuestionId = id_field(row, "question_id")?;
            grouped
                .entry(question_id)
                .or_default()
                .push(id_field(row, "id")?);
        }
        Ok(grouped)
    }

    async fn hydrate_interview(&self, row: &SqliteRow) -> Result<Interview, StorageError> {
        let id: InterviewId = id_field(row, "id")?;
        let questions = self.question_ids_for(id).await?;
        map_interview_row(row, questions)
    }
}

#[async_trait::async_trait]
impl InterviewRepository for SqliteRepository {
    async fn insert_interview_with_questions(
        &self,
        interview: &Interview,
        questions: &[Question],
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(&format!(
            "INSERT INTO interviews ({INTERVIEW_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
        ))
        .bind(interview.id().to_string())
        .bind(interview.user_id().to_string())
        .bind(interview.title())
        .bind(interview.profession())
        .bind(interview.kind().as_str())
        .bind(interview.level().as_str())
        .bind(interview.language().code())
        .bind(interview.status().as_str())
        .bind(i64::from(interview.duration_secs()))
        .bind(i64::from(interview.current_question_index()))
        .bind(i64::from(interview.total_score().value()))
        .bind(interview.feedback())
        .bind(to_json(&interview.statistics())?)
        .bind(interview.created_at())
        .bind(interview.updated_at())
        .bind(interview.completed_at())
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        for question in questions {
            sqlx::query(&format!(
                "INSERT INTO questions ({QUESTION_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ))
            .bind(question.id.to_string())
            .bind(question.interview_id.to_string())
            .bind(&question.text)
            .bind(question.audio_url.as_deref())
            .bind(i64::from(question.order))
            .bind(&question.category)
            .bind(question.difficulty.as_str())
            .bind(i64::from(question.time_limit_secs))
            .bind(question.created_at)
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn load_interview(&self, id: InterviewId) -> Result<Interview, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        self.hydrate_interview(&row).await
    }

    async fn load_interview_with_questions(
        &self,
        id: InterviewId,
    ) -> Result<(Interview, Vec<Question>), StorageError> {
        let interview = self.load_interview(id).await?;

        let rows = sqlx::query(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE interview_id = ?1 ORDER BY position"
        ))
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut responses = self
            .response_ids_by_question("interview_id = ?1", id.to_string())
            .await?;

        let questions = rows
            .iter()
            .map(|row| {
                let question_id: QuestionId = id_field(row, "id")?;
                map_question_row(row, responses.remove(&question_id).unwrap_or_default())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((interview, questions))
    }

    async fn list_interviews_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Interview>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {INTERVIEW_COLUMNS} FROM interviews WHERE user_id = ?1 \
             ORDER BY created_at ASC, rowid ASC"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut interviews = Vec::with_capacity(rows.len());
        for row in &rows {
            interviews.push(self.hydrate_interview(row).await?);
        }
        Ok(interviews)
    }

    async fn store_status(&self, interview: &Interview) -> Result<Interview, StorageError> {
        sqlx::query(
            r"
            UPDATE interviews SET
                status = ?2,
                updated_at = ?3,
                completed_at = ?4
            WHERE id = ?1 AND status <> 'completed'
            ",
        )
        .bind(interview.id().to_string())
        .bind(interview.status().as_str())
        .bind(interview.updated_at())
        .bind(interview.completed_at())
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        self.load_interview(interview.id()).await
    }

    async fn store_aggregate(
        &self,
        id: InterviewId,
        aggregate: Aggregate,
        progress: u32,
        now: DateTime<Utc>,
    ) -> Result<Interview, StorageError> {
        let res = sqlx::query(
            r"
            UPDATE interviews SET
                duration_secs = ?2,
                total_score = ?3,
                statistics = ?4,
                current_question_index = MAX(current_question_index, ?5),
                updated_at = ?6
            WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .bind(i64::from(aggregate.total_duration_secs))
        .bind(i64::from(aggregate.total_score.value()))
        .bind(to_json(&aggregate.statistics)?)
        .bind(i64::from(progress))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        self.load_interview(id).await
    }

    async fn delete_interview_cascade(&self, id: InterviewId) -> Result<(), StorageError> {
        let key = id.to_string();
        let mut tx = self.pool.begin().await.map_err(conn)?;

        for table in ["evaluations", "responses", "questions"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE interview_id = ?1"))
                .bind(&key)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }

        let res = sqlx::query("DELETE FROM interviews WHERE id = ?1")
            .bind(&key)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            tx.rollback().await.map_err(conn)?;
            return Err(StorageError::NotFound);
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        let mut responses = self
            .response_ids_by_question("question_id = ?1", id.to_string())
            .await?;
        map_question_row(&row, responses.remove(&id).unwrap_or_default())
    }
}
