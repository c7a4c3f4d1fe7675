//! Legacy store trait and SQLite implementation.

use crate::error::LegacyResult;
use crate::repos::{AchievementRepo, GameRepo, PreferencesRepo, UserAuthRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;

/// Combined read-only view of the legacy database.
#[async_trait]
pub trait LegacyStore: GameRepo + PreferencesRepo + AchievementRepo + UserAuthRepo + Send + Sync {
    /// Check database connectivity.
    async fn health_check(&self) -> LegacyResult<()>;
}

/// Read-only SQLite connection to the legacy database.
pub struct SqliteLegacyStore {
    pool: Pool<Sqlite>,
}

impl SqliteLegacyStore {
    /// Open an existing legacy database read-only.
    ///
    /// Fails if the file does not exist; the legacy database is never created.
    pub async fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> LegacyResult<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(false)
            .read_only(true)
            // Prevent transient "database is locked" errors while the old app shuts down.
            .busy_timeout(busy_timeout);

        let pool = SqlitePoolOptions::new()
            // One connection per migrated table so the four reads can overlap.
            .max_connections(4)
            .connect_with(opts)
            .await?;

        tracing::debug!(path = %path.as_ref().display(), "Opened legacy database");
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl LegacyStore for SqliteLegacyStore {
    async fn health_check(&self) -> LegacyResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

mod sqlite_impl {
    use super::*;
    use crate::models::{GameAchievementRow, GameRow, UserAuthRow, UserPreferencesRow};

    #[async_trait]
    impl GameRepo for SqliteLegacyStore {
        async fn select_games(&self) -> LegacyResult<Vec<GameRow>> {
            // Play time accumulates fractional milliseconds and is then kept as
            // REAL despite the INTEGER column; lastTimePlayed is declared
            // DATETIME. The casts keep decoding stable whatever storage class a
            // row ended up with.
            let rows = sqlx::query_as::<_, GameRow>(
                r#"
                SELECT objectID, shop, title, iconUrl,
                       CAST(ROUND(playTimeInMilliseconds) AS INTEGER) AS playTimeInMilliseconds,
                       CAST(lastTimePlayed AS TEXT) AS lastTimePlayed,
                       remoteId, winePrefixPath, launchOptions, executablePath, isDeleted
                FROM game
                ORDER BY id
                "#,
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl PreferencesRepo for SqliteLegacyStore {
        async fn select_user_preferences(&self) -> LegacyResult<Vec<UserPreferencesRow>> {
            let rows = sqlx::query_as::<_, UserPreferencesRow>(
                r#"
                SELECT downloadsPath, language, realDebridApiToken, allDebridApiKey,
                       preferQuitInsteadOfHiding, runAtStartup, startMinimized,
                       disableNsfwAlert, seedAfterDownloadComplete,
                       showHiddenAchievementsDescription, downloadNotificationsEnabled,
                       repackUpdatesNotificationsEnabled, achievementNotificationsEnabled
                FROM user_preferences
                ORDER BY id
                "#,
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl AchievementRepo for SqliteLegacyStore {
        async fn select_game_achievements(&self) -> LegacyResult<Vec<GameAchievementRow>> {
            let rows = sqlx::query_as::<_, GameAchievementRow>(
                r#"
                SELECT objectId, shop, achievements, unlockedAchievements
                FROM game_achievement
                ORDER BY id
                "#,
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }

    #[async_trait]
    impl UserAuthRepo for SqliteLegacyStore {
        async fn select_user_auth(&self) -> LegacyResult<Vec<UserAuthRow>> {
            let rows = sqlx::query_as::<_, UserAuthRow>(
                r#"
                SELECT userId, displayName, profileImageUrl, backgroundImageUrl, subscription,
                       accessToken, refreshToken, tokenExpirationTimestamp
                FROM user_auth
                ORDER BY id
                "#,
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }
}
