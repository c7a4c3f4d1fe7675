//! Legacy database fixtures.

use hearth_legacy::error::{LegacyError, LegacyResult};
use hearth_legacy::models::{GameAchievementRow, GameRow, UserAuthRow, UserPreferencesRow};
use hearth_legacy::repos::{AchievementRepo, GameRepo, PreferencesRepo, UserAuthRepo};
use hearth_legacy::schema::LEGACY_SCHEMA;
use hearth_legacy::{LegacyStore, SqliteLegacyStore};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// A legacy database file being filled by a test.
pub struct LegacyDb {
    dir: TempDir,
    pool: Pool<Sqlite>,
}

impl LegacyDb {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let opts = SqliteConnectOptions::new()
            .filename(dir.path().join("hydra.db"))
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .unwrap();
        sqlx::raw_sql(LEGACY_SCHEMA).execute(&pool).await.unwrap();
        Self { dir, pool }
    }

    pub async fn exec(&self, sql: &str) {
        sqlx::raw_sql(sql).execute(&self.pool).await.unwrap();
    }

    /// A typical legacy installation: two games, preferences, one achievement
    /// record and a signed-in user.
    #[allow(dead_code)]
    pub async fn populated() -> Self {
        let db = Self::new().await;
        db.exec(
            r#"
            INSERT INTO game (objectID, shop, title, iconUrl, playTimeInMilliseconds,
                              lastTimePlayed, remoteId, isDeleted)
            VALUES ('1245620', 'steam', 'Elden Ring', 'https://cdn/icon.png', 3600000,
                    '2024-03-01 12:30:00.000', 'remote-1', 0),
                   ('570', 'steam', 'Dota 2', NULL, 0, NULL, NULL, 1);

            INSERT INTO user_preferences (downloadsPath, language, realDebridApiToken,
                allDebridApiKey, preferQuitInsteadOfHiding, runAtStartup, startMinimized,
                disableNsfwAlert, seedAfterDownloadComplete, showHiddenAchievementsDescription,
                downloadNotificationsEnabled, repackUpdatesNotificationsEnabled,
                achievementNotificationsEnabled)
            VALUES ('/games', 'pt-BR', 'X', NULL, 0, 1, 0, 1, 1, 0, 1, NULL, 1);

            INSERT INTO game_achievement (objectId, shop, achievements, unlockedAchievements)
            VALUES ('1245620', 'steam',
                    '[{"name":"ACH_1","displayName":"First Steps","hidden":false}]',
                    '[{"name":"ACH_1","unlockTime":1700000000000}]');

            INSERT INTO user_auth (userId, displayName, profileImageUrl, backgroundImageUrl,
                                   subscription, accessToken, refreshToken,
                                   tokenExpirationTimestamp)
            VALUES ('user-1', 'Tarnished', NULL, NULL, NULL, 'access-plain', 'refresh-plain',
                    1700000000000);
            "#,
        )
        .await;
        db
    }

    /// Close the writer and open the database read-only.
    pub async fn open(self) -> (TempDir, Arc<dyn LegacyStore>) {
        self.pool.close().await;
        let store = SqliteLegacyStore::open(self.dir.path().join("hydra.db"), Duration::from_secs(1))
            .await
            .unwrap();
        (self.dir, Arc::new(store))
    }
}

/// Wraps a legacy store, counts reads and optionally fails the achievements
/// table.
pub struct InstrumentedSource {
    inner: Arc<dyn LegacyStore>,
    fail_achievements: bool,
    reads: AtomicUsize,
}

impl InstrumentedSource {
    #[allow(dead_code)]
    pub fn new(inner: Arc<dyn LegacyStore>) -> Self {
        Self {
            inner,
            fail_achievements: false,
            reads: AtomicUsize::new(0),
        }
    }

    #[allow(dead_code)]
    pub fn failing_achievements(inner: Arc<dyn LegacyStore>) -> Self {
        Self {
            fail_achievements: true,
            ..Self::new(inner)
        }
    }

    #[allow(dead_code)]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl GameRepo for InstrumentedSource {
    async fn select_games(&self) -> LegacyResult<Vec<GameRow>> {
        self.count();
        self.inner.select_games().await
    }
}

#[async_trait::async_trait]
impl PreferencesRepo for InstrumentedSource {
    async fn select_user_preferences(&self) -> LegacyResult<Vec<UserPreferencesRow>> {
        self.count();
        self.inner.select_user_preferences().await
    }
}

#[async_trait::async_trait]
impl AchievementRepo for InstrumentedSource {
    async fn select_game_achievements(&self) -> LegacyResult<Vec<GameAchievementRow>> {
        self.count();
        if self.fail_achievements {
            return Err(LegacyError::Config("simulated achievements failure".to_string()));
        }
        self.inner.select_game_achievements().await
    }
}

#[async_trait::async_trait]
impl UserAuthRepo for InstrumentedSource {
    async fn select_user_auth(&self) -> LegacyResult<Vec<UserAuthRow>> {
        self.count();
        self.inner.select_user_auth().await
    }
}

#[async_trait::async_trait]
impl LegacyStore for InstrumentedSource {
    async fn health_check(&self) -> LegacyResult<()> {
        self.inner.health_check().await
    }
}
