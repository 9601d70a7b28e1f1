//! Profile store (user roles)

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::identity::Role;
use crate::Result;

/// Role of `user_id`; a user without a profile row is a plain user
pub async fn role_for(db: &SqlitePool, user_id: Uuid) -> Result<Role> {
    let role: Option<String> = sqlx::query_scalar("SELECT role FROM profiles WHERE id = ?")
        .bind(user_id.to_string())
        .fetch_optional(db)
        .await?;

    Ok(role.as_deref().map(Role::from_db).unwrap_or_default())
}

pub async fn set_role(db: &SqlitePool, user_id: Uuid, role: Role) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO profiles (id, role, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(id) DO UPDATE SET role = excluded.role, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(user_id.to_string())
    .bind(role.as_str())
    .execute(db)
    .await?;

    Ok(())
}
