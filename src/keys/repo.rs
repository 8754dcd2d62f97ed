use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::warn;

use super::crypto::KeyCipher;

/// Stored credential row. Older keys are retained but flagged inactive
/// rather than deleted.
#[derive(Debug, Clone, FromRow)]
pub struct ApiKeyRecord {
    pub id: i64,
    pub user_id: i64,
    pub encrypted_api_key: String,
    pub iv: String,
    pub is_active: bool,
    pub last_validated: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Deactivates every existing key for the user and inserts the new active
/// one. Both statements run in a single transaction so at most one row per
/// user is ever active.
pub async fn save(
    db: &PgPool,
    cipher: &KeyCipher,
    user_id: i64,
    api_key: &str,
) -> anyhow::Result<()> {
    let (material, iv) = cipher.encrypt(api_key)?;

    let mut tx = db.begin().await?;
    sqlx::query(
        r#"
        UPDATE youtube_api_keys
        SET is_active = false, updated_at = now()
        WHERE user_id = $1 AND is_active = true
        "#,
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO youtube_api_keys (user_id, encrypted_api_key, iv, is_active, last_validated)
        VALUES ($1, $2, $3, true, now())
        "#,
    )
    .bind(user_id)
    .bind(&material)
    .bind(&iv)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

/// The single credential currently eligible for use, decrypted.
pub async fn active_key(
    db: &PgPool,
    cipher: &KeyCipher,
    user_id: i64,
) -> anyhow::Result<Option<String>> {
    let row = sqlx::query_as::<_, ApiKeyRecord>(
        r#"
        SELECT id, user_id, encrypted_api_key, iv, is_active, last_validated,
               created_at, updated_at
        FROM youtube_api_keys
        WHERE user_id = $1 AND is_active = true
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    match row {
        Some(record) => Ok(Some(cipher.decrypt(&record.encrypted_api_key, &record.iv)?)),
        None => Ok(None),
    }
}

/// Read path degrades: a storage error counts as "no key".
pub async fn has_active(db: &PgPool, user_id: i64) -> bool {
    let result = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT count(*) FROM youtube_api_keys
        WHERE user_id = $1 AND is_active = true
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await;

    match result {
        Ok(count) => count > 0,
        Err(e) => {
            warn!(error = %e, user_id, "has_active check failed");
            false
        }
    }
}

pub async fn deactivate_all(db: &PgPool, user_id: i64) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE youtube_api_keys
        SET is_active = false, updated_at = now()
        WHERE user_id = $1 AND is_active = true
        "#,
    )
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(())
}
