//! Key encoding scheme for the document store.
//!
//! Games and achievements are keyed by `shop:objectId` inside their own
//! sublevel. Singleton documents live at fixed keys in the root namespace.

/// User preferences document.
pub const USER_PREFERENCES: &str = "userPreferences";

/// Authenticated user profile document.
pub const USER: &str = "user";

/// Auth tokens document (tokens are encrypted).
pub const AUTH: &str = "auth";

/// UI language, stored as a raw string.
pub const LANGUAGE: &str = "language";

/// Completion flag of the legacy SQLite migration.
pub const SQLITE_MIGRATION_DONE: &str = "sqliteMigrationDone";

/// Per-domain outcome of the last legacy migration attempt.
pub const SQLITE_MIGRATION_REPORT: &str = "sqliteMigrationReport";

/// Sublevel names.
pub mod sublevels {
    /// Library entries.
    pub const GAMES: &str = "games";
    /// Achievement definitions and unlocks per game.
    pub const GAME_ACHIEVEMENTS: &str = "gameAchievements";
    /// Download queue.
    pub const DOWNLOADS: &str = "downloads";
}

/// Build the key of a game-scoped document.
pub fn game_key(shop: &str, object_id: &str) -> String {
    format!("{shop}:{object_id}")
}
