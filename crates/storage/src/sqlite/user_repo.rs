use interview_core::model::{InterviewId, User, UserId};

use super::SqliteRepository;
use super::mapping::{conn, id_field, map_user_row, write_err};
use crate::repository::{StorageError, UserRepository};

impl SqliteRepository {
    pub(crate) async fn interview_ids_for(
        &self,
        user_id: UserId,
    ) -> Result<Vec<InterviewId>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id FROM interviews
            WHERE user_id = ?1
            ORDER BY created_at ASC, rowid ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(|row| id_field(row, "id")).collect()
    }
}

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO users (
                id, email, first_name, last_name, profession, language,
                free_trial_end_date, subscription_status, subscription_id,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.profession)
        .bind(user.language.code())
        .bind(user.free_trial_end_date)
        .bind(user.subscription_status.as_str())
        .bind(user.subscription_id.map(|id| id.to_string()))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<User, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, email, first_name, last_name, profession, language,
                   free_trial_end_date, subscription_status, subscription_id,
                   created_at, updated_at
            FROM users WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        let interviews = self.interview_ids_for(id).await?;
        map_user_row(&row, interviews)
    }

    async fn update_user(&self, user: &User) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE users SET
                first_name = ?2,
                last_name = ?3,
                profession = ?4,
                language = ?5,
                subscription_status = ?6,
                subscription_id = ?7,
                updated_at = ?8
            WHERE id = ?1
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.profession)
        .bind(user.language.code())
        .bind(user.subscription_status.as_str())
        .bind(user.subscription_id.map(|id| id.to_string()))
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
