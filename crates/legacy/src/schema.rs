//! Schema of the legacy database.
//!
//! Only the columns read by this crate are listed. The legacy app wrote more
//! (download state, timestamps); they are never read.

/// DDL of the legacy tables, for building fixture databases.
pub const LEGACY_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS game (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    objectID TEXT NOT NULL,
    shop TEXT NOT NULL,
    title TEXT NOT NULL,
    iconUrl TEXT,
    playTimeInMilliseconds INTEGER DEFAULT 0,
    lastTimePlayed DATETIME,
    remoteId TEXT,
    winePrefixPath TEXT,
    launchOptions TEXT,
    executablePath TEXT,
    isDeleted INTEGER DEFAULT 0,
    UNIQUE (objectID, shop)
);

CREATE TABLE IF NOT EXISTS user_preferences (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    downloadsPath TEXT,
    language TEXT DEFAULT 'en',
    realDebridApiToken TEXT,
    allDebridApiKey TEXT,
    preferQuitInsteadOfHiding INTEGER DEFAULT 0,
    runAtStartup INTEGER DEFAULT 0,
    startMinimized INTEGER DEFAULT 0,
    disableNsfwAlert INTEGER DEFAULT 0,
    seedAfterDownloadComplete INTEGER DEFAULT 1,
    showHiddenAchievementsDescription INTEGER DEFAULT 0,
    downloadNotificationsEnabled INTEGER DEFAULT 0,
    repackUpdatesNotificationsEnabled INTEGER DEFAULT 0,
    achievementNotificationsEnabled INTEGER DEFAULT 1
);

CREATE TABLE IF NOT EXISTS game_achievement (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    objectId TEXT NOT NULL,
    shop TEXT NOT NULL,
    achievements TEXT,
    unlockedAchievements TEXT,
    UNIQUE (objectId, shop)
);

CREATE TABLE IF NOT EXISTS user_auth (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    userId TEXT NOT NULL DEFAULT '',
    displayName TEXT NOT NULL DEFAULT '',
    profileImageUrl TEXT,
    backgroundImageUrl TEXT,
    subscription TEXT,
    accessToken TEXT NOT NULL DEFAULT '',
    refreshToken TEXT NOT NULL DEFAULT '',
    tokenExpirationTimestamp INTEGER NOT NULL DEFAULT 0
);
"#;
