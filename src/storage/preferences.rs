use super::schema::Database;
use super::types::DatabaseError;

impl Database {
    // ========================================================================
    // User Preferences
    // ========================================================================

    /// Stored value for `key`, or `None` when it was never written.
    pub async fn get_preference(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM user_preferences WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Insert or replace a preference value.
    pub async fn set_preference(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO user_preferences (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All `(key, value)` pairs whose key starts with `prefix`, ordered by key.
    ///
    /// An empty prefix returns every stored preference.
    pub async fn get_preferences_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<(String, String)>, DatabaseError> {
        let pattern = format!("{}%", prefix);
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM user_preferences WHERE key LIKE ? ORDER BY key")
                .bind(&pattern)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows)
    }
}
