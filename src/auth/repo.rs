use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// User record in the database. One row per Telegram identity, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: UserRole,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub last_signed_in: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct UpsertUser<'a> {
    pub open_id: &'a str,
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub login_method: Option<&'a str>,
    pub role: Option<UserRole>,
}

impl User {
    pub async fn find_by_open_id(db: &PgPool, open_id: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, open_id, name, email, login_method, role,
                   created_at, updated_at, last_signed_in
            FROM users
            WHERE open_id = $1
            "#,
        )
        .bind(open_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create-or-update keyed by open_id. Idempotent: a repeat call never
    /// creates a second row, and last_signed_in is refreshed unconditionally.
    pub async fn upsert(db: &PgPool, user: UpsertUser<'_>) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (open_id, name, email, login_method, role, last_signed_in)
            VALUES ($1, $2, $3, $4, COALESCE($5, 'user'::user_role), now())
            ON CONFLICT (open_id) DO UPDATE
            SET name = COALESCE(EXCLUDED.name, users.name),
                email = COALESCE(EXCLUDED.email, users.email),
                login_method = COALESCE(EXCLUDED.login_method, users.login_method),
                role = COALESCE($5, users.role),
                last_signed_in = now(),
                updated_at = now()
            RETURNING id, open_id, name, email, login_method, role,
                      created_at, updated_at, last_signed_in
            "#,
        )
        .bind(user.open_id)
        .bind(user.name)
        .bind(user.email)
        .bind(user.login_method)
        .bind(user.role)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}
