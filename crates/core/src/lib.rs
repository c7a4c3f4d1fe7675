//! Core types shared across Hearth crates.
//!
//! This crate defines:
//! - Application configuration
//! - The key encoding scheme of the document store
//! - Documents persisted in the store (games, preferences, achievements,
//!   session, downloads)

pub mod config;
pub mod documents;
pub mod keys;

pub use config::AppConfig;
pub use documents::{
    AchievementDefinition, Auth, Download, DownloadStatus, Downloader, Game, GameAchievement,
    UnlockedAchievement, User, UserPreferences,
};
pub use keys::game_key;
