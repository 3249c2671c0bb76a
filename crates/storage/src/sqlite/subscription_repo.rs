use interview_core::model::{Subscription, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_subscription_row, to_json, write_err};
use crate::repository::{StorageError, SubscriptionRepository};

#[async_trait::async_trait]
impl SubscriptionRepository for SqliteRepository {
    async fn upsert_subscription(&self, subscription: &Subscription) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO subscriptions (
                id, user_id, plan, status, start_date, end_date, renewal_date,
                price, currency, provider_payment_id, provider_transaction_id,
                features, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(user_id) DO UPDATE SET
                id = excluded.id,
                plan = excluded.plan,
                status = excluded.status,
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                renewal_date = excluded.renewal_date,
                price = excluded.price,
                currency = excluded.currency,
                provider_payment_id = excluded.provider_payment_id,
                provider_transaction_id = excluded.provider_transaction_id,
                features = excluded.features,
                updated_at = excluded.updated_at
            ",
        )
        .bind(subscription.id.to_string())
        .bind(subscription.user_id.to_string())
        .bind(subscription.plan.as_str())
        .bind(subscription.status.as_str())
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .bind(subscription.renewal_date)
        .bind(subscription.price)
        .bind(&subscription.currency)
        .bind(subscription.provider_payment_id.as_deref())
        .bind(subscription.provider_transaction_id.as_deref())
        .bind(to_json(&subscription.features)?)
        .bind(subscription.created_at)
        .bind(subscription.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_err)?;
        Ok(())
    }

    async fn subscription_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, plan, status, start_date, end_date, renewal_date,
                   price, currency, provider_payment_id, provider_transaction_id,
                   features, created_at, updated_at
            FROM subscriptions WHERE user_id = ?1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_subscription_row).transpose()
    }
}
