use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "language", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ru,
    En,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Preference {
    pub id: i64,
    pub user_id: i64,
    pub language: Language,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Read path degrades: unset or unreachable both come back as the default.
pub async fn language_for(db: &PgPool, user_id: i64) -> Language {
    let result = sqlx::query_as::<_, Preference>(
        r#"
        SELECT id, user_id, language, created_at, updated_at
        FROM user_preferences
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await;

    match result {
        Ok(Some(pref)) => pref.language,
        Ok(None) => Language::En,
        Err(e) => {
            warn!(error = %e, user_id, "preference lookup failed");
            Language::En
        }
    }
}

pub async fn set_language(db: &PgPool, user_id: i64, language: Language) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_preferences (user_id, language)
        VALUES ($1, $2)
        ON CONFLICT (user_id) DO UPDATE
        SET language = EXCLUDED.language,
            updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(language)
    .execute(db)
    .await?;
    Ok(())
}
