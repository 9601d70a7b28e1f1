//! Per-user display settings cache
//!
//! A user's settings are read from the store on first use and kept in
//! memory afterwards. Updates are written to the store before the cached
//! copy changes.

use capo_common::db::settings as store;
use capo_common::settings::{
    AppSettings, AppSettingsPatch, DisplaySettings, PrompterSettings, PrompterSettingsPatch,
};
use capo_common::Result;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct SettingsCache {
    users: Arc<RwLock<HashMap<Uuid, DisplaySettings>>>,
}

impl SettingsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings of `user_id`, loading them on first use
    pub async fn get(&self, db: &SqlitePool, user_id: Uuid) -> Result<DisplaySettings> {
        if let Some(settings) = self.users.read().await.get(&user_id) {
            return Ok(settings.clone());
        }

        let mut users = self.users.write().await;
        if let Some(settings) = users.get(&user_id) {
            return Ok(settings.clone());
        }

        let settings = store::load_display_settings(db, user_id).await?;
        debug!(user_id = %user_id, "Display settings loaded");
        users.insert(user_id, settings.clone());
        Ok(settings)
    }

    pub async fn update_prompter(
        &self,
        db: &SqlitePool,
        user_id: Uuid,
        patch: &PrompterSettingsPatch,
    ) -> Result<PrompterSettings> {
        let mut users = self.users.write().await;
        let current = match users.get(&user_id) {
            Some(settings) => settings.clone(),
            None => store::load_display_settings(db, user_id).await?,
        };

        let updated = current.prompter.apply(patch);
        store::save_prompter_settings(db, user_id, &updated).await?;

        users.insert(
            user_id,
            DisplaySettings {
                prompter: updated.clone(),
                app: current.app,
            },
        );
        Ok(updated)
    }

    pub async fn update_app(
        &self,
        db: &SqlitePool,
        user_id: Uuid,
        patch: &AppSettingsPatch,
    ) -> Result<AppSettings> {
        let mut users = self.users.write().await;
        let current = match users.get(&user_id) {
            Some(settings) => settings.clone(),
            None => store::load_display_settings(db, user_id).await?,
        };

        let updated = current.app.apply(patch);
        store::save_app_settings(db, user_id, &updated).await?;

        users.insert(
            user_id,
            DisplaySettings {
                prompter: current.prompter,
                app: updated.clone(),
            },
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capo_common::db::create_schema;
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
    async fn test_update_touches_only_the_caller() {
        let db = setup_test_db().await;
        let cache = SettingsCache::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        // Bob's defaults are cached before Alice changes anything
        assert_eq!(cache.get(&db, bob).await.unwrap(), DisplaySettings::default());

        let patch = PrompterSettingsPatch {
            upper_case: Some(true),
            ..Default::default()
        };
        let updated = cache.update_prompter(&db, alice, &patch).await.unwrap();
        assert!(updated.upper_case);

        assert!(cache.get(&db, alice).await.unwrap().prompter.upper_case);
        assert!(!cache.get(&db, bob).await.unwrap().prompter.upper_case);
    }

    #[tokio::test]
    async fn test_stored_settings_are_loaded_on_first_use() {
        let db = setup_test_db().await;
        let user = Uuid::new_v4();
        let app = AppSettings {
            is_app_dark_mode: true,
            use_vivid_colors: false,
        };
        store::save_app_settings(&db, user, &app).await.unwrap();

        let cache = SettingsCache::new();
        assert_eq!(cache.get(&db, user).await.unwrap().app, app);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_cache_unchanged() {
        let db = setup_test_db().await;
        let cache = SettingsCache::new();
        let user = Uuid::new_v4();
        cache.get(&db, user).await.unwrap();

        sqlx::query("DROP TABLE settings").execute(&db).await.unwrap();

        let patch = AppSettingsPatch {
            use_vivid_colors: Some(true),
            ..Default::default()
        };
        assert!(cache.update_app(&db, user, &patch).await.is_err());
        assert!(!cache.get(&db, user).await.unwrap().app.use_vivid_colors);
    }
}
