//! Repository traits for legacy tables.

pub mod achievements;
pub mod auth;
pub mod games;
pub mod preferences;

pub use achievements::AchievementRepo;
pub use auth::UserAuthRepo;
pub use games::GameRepo;
pub use preferences::PreferencesRepo;
