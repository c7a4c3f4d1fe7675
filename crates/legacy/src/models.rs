//! Rows of the legacy SQLite schema.
//!
//! Column names are camelCase in the legacy database. Boolean columns hold
//! integer truth values (`1` is true); JSON columns hold serialized text.

use sqlx::FromRow;

/// Row of the `game` table.
#[derive(Debug, Clone, FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct GameRow {
    #[sqlx(rename = "objectID")]
    pub object_id: String,
    pub shop: String,
    pub title: String,
    pub icon_url: Option<String>,
    pub play_time_in_milliseconds: Option<i64>,
    /// Text timestamp as written by the legacy ORM.
    pub last_time_played: Option<String>,
    pub remote_id: Option<String>,
    pub wine_prefix_path: Option<String>,
    pub launch_options: Option<String>,
    pub executable_path: Option<String>,
    pub is_deleted: Option<i64>,
}

/// Row of the `user_preferences` table. Holds zero or one row.
#[derive(Debug, Clone, FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct UserPreferencesRow {
    pub downloads_path: Option<String>,
    pub language: Option<String>,
    /// Plaintext in the legacy database.
    pub real_debrid_api_token: Option<String>,
    /// Plaintext in the legacy database.
    pub all_debrid_api_key: Option<String>,
    pub prefer_quit_instead_of_hiding: Option<i64>,
    pub run_at_startup: Option<i64>,
    pub start_minimized: Option<i64>,
    pub disable_nsfw_alert: Option<i64>,
    pub seed_after_download_complete: Option<i64>,
    pub show_hidden_achievements_description: Option<i64>,
    pub download_notifications_enabled: Option<i64>,
    pub repack_updates_notifications_enabled: Option<i64>,
    pub achievement_notifications_enabled: Option<i64>,
}

/// Row of the `game_achievement` table.
#[derive(Debug, Clone, FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct GameAchievementRow {
    pub object_id: String,
    pub shop: String,
    /// JSON array of achievement definitions.
    pub achievements: Option<String>,
    /// JSON array of unlocked achievements.
    pub unlocked_achievements: Option<String>,
}

/// Row of the `user_auth` table. Holds zero or one row.
#[derive(Debug, Clone, FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct UserAuthRow {
    pub user_id: String,
    pub display_name: String,
    pub profile_image_url: Option<String>,
    pub background_image_url: Option<String>,
    /// JSON subscription object, if any.
    pub subscription: Option<String>,
    /// Plaintext in the legacy database.
    pub access_token: String,
    /// Plaintext in the legacy database.
    pub refresh_token: String,
    pub token_expiration_timestamp: i64,
}
