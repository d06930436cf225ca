use sqlx::Row;

use crate::{
    api::middleware::error::ApiResult, database::Database, models::now_rfc3339,
};

impl Database {
    /// Register or replace a user's FCM device token
    pub async fn upsert_push_token(&self, user_id: &str, token: &str) -> ApiResult<()> {
        let now = now_rfc3339();

        sqlx::query(
            "INSERT INTO push_tokens (user_id, token, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT (user_id) DO UPDATE SET token = excluded.token, updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(token)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_push_token(&self, user_id: &str) -> ApiResult<Option<String>> {
        let row = sqlx::query(
            "SELECT token
             FROM push_tokens
             WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("token")?)),
            None => Ok(None),
        }
    }

    pub async fn delete_push_token(&self, user_id: &str) -> ApiResult<bool> {
        let result = sqlx::query("DELETE FROM push_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
