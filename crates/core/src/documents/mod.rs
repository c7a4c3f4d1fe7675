//! Documents persisted in the key-value store.
//!
//! Field names are serialized in camelCase to stay readable by the desktop
//! frontend, which shares the same store.

pub mod achievement;
pub mod download;
pub mod game;
pub mod preferences;
pub mod user;

pub use achievement::{AchievementDefinition, GameAchievement, UnlockedAchievement};
pub use download::{Download, DownloadStatus, Downloader};
pub use game::Game;
pub use preferences::UserPreferences;
pub use user::{Auth, User};
