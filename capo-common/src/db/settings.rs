//! Settings blob store
//!
//! The `settings` table is a key-value store. Each user's prompter and app
//! settings are kept as one JSON blob apiece, keyed `<name>:<user id>`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::settings::{AppSettings, DisplaySettings, PrompterSettings};
use crate::Result;

pub const PROMPTER_SETTINGS_KEY: &str = "prompterSettings";
pub const APP_SETTINGS_KEY: &str = "appSettings";

/// Settings key for one user's blob
pub fn user_key(name: &str, user_id: Uuid) -> String {
    format!("{}:{}", name, user_id)
}

/// Raw setting value
pub async fn get_setting(db: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(db)
            .await?;
    Ok(value.flatten())
}

/// Insert or replace a raw setting value
pub async fn set_setting(db: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(db)
    .await?;

    Ok(())
}

/// Decode a JSON blob; a missing or unreadable blob yields the default
async fn load_blob<T: DeserializeOwned + Default>(db: &SqlitePool, key: &str) -> Result<T> {
    let Some(raw) = get_setting(db, key).await? else {
        return Ok(T::default());
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!("Stored setting '{}' is unreadable, using defaults: {}", key, e);
            Ok(T::default())
        }
    }
}

async fn save_blob<T: Serialize>(db: &SqlitePool, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    set_setting(db, key, &json).await
}

/// Read both of a user's settings blobs
pub async fn load_display_settings(db: &SqlitePool, user_id: Uuid) -> Result<DisplaySettings> {
    let prompter: PrompterSettings =
        load_blob(db, &user_key(PROMPTER_SETTINGS_KEY, user_id)).await?;
    let app: AppSettings = load_blob(db, &user_key(APP_SETTINGS_KEY, user_id)).await?;

    Ok(DisplaySettings {
        prompter: prompter.normalized(),
        app,
    })
}

pub async fn save_prompter_settings(
    db: &SqlitePool,
    user_id: Uuid,
    settings: &PrompterSettings,
) -> Result<()> {
    save_blob(db, &user_key(PROMPTER_SETTINGS_KEY, user_id), settings).await
}

pub async fn save_app_settings(
    db: &SqlitePool,
    user_id: Uuid,
    settings: &AppSettings,
) -> Result<()> {
    save_blob(db, &user_key(APP_SETTINGS_KEY, user_id), settings).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::create_schema;
    use crate::settings::FontSize;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_empty_store_yields_defaults() {
        let db = setup_test_db().await;
        let settings = load_display_settings(&db, Uuid::new_v4()).await.unwrap();
        assert_eq!(settings, DisplaySettings::default());
    }

    #[tokio::test]
    async fn test_saved_settings_are_reloaded() {
        let db = setup_test_db().await;
        let user = Uuid::new_v4();

        let prompter = PrompterSettings {
            rotation_interval: 45,
            font_size: FontSize::Small,
            ..Default::default()
        };
        let app = AppSettings {
            is_app_dark_mode: true,
            use_vivid_colors: true,
        };
        save_prompter_settings(&db, user, &prompter).await.unwrap();
        save_app_settings(&db, user, &app).await.unwrap();

        let loaded = load_display_settings(&db, user).await.unwrap();
        assert_eq!(loaded.prompter, prompter);
        assert_eq!(loaded.app, app);

        let raw = get_setting(&db, &user_key(PROMPTER_SETTINGS_KEY, user))
            .await
            .unwrap()
            .unwrap();
        assert!(raw.contains("\"rotationInterval\":45"));
    }

    #[tokio::test]
    async fn test_settings_are_kept_per_user() {
        let db = setup_test_db().await;
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        let app = AppSettings {
            is_app_dark_mode: true,
            use_vivid_colors: true,
        };
        save_app_settings(&db, alice, &app).await.unwrap();

        assert_eq!(load_display_settings(&db, alice).await.unwrap().app, app);
        assert_eq!(
            load_display_settings(&db, bob).await.unwrap(),
            DisplaySettings::default()
        );
    }

    #[tokio::test]
    async fn test_corrupt_or_out_of_range_blob() {
        let db = setup_test_db().await;
        let user = Uuid::new_v4();
        set_setting(&db, &user_key(APP_SETTINGS_KEY, user), "not json")
            .await
            .unwrap();
        set_setting(
            &db,
            &user_key(PROMPTER_SETTINGS_KEY, user),
            r#"{"rotationInterval":5}"#,
        )
        .await
        .unwrap();

        let loaded = load_display_settings(&db, user).await.unwrap();
        assert_eq!(loaded.app, AppSettings::default());
        assert_eq!(loaded.prompter.rotation_interval, 30);
    }
}
