//! User preferences.

use serde::{Deserialize, Serialize};

/// Singleton preferences document.
///
/// Provider credentials are stored as ciphertext and must go through the
/// secret cipher before use. A `None` credential was never configured.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub downloads_path: Option<String>,
    pub language: Option<String>,
    pub real_debrid_api_token: Option<String>,
    pub all_debrid_api_key: Option<String>,
    pub tor_box_api_token: Option<String>,
    pub prefer_quit_instead_of_hiding: bool,
    pub run_at_startup: bool,
    pub start_minimized: bool,
    pub disable_nsfw_alert: bool,
    pub seed_after_download_complete: bool,
    pub show_hidden_achievements_description: bool,
    pub download_notifications_enabled: bool,
    pub repack_updates_notifications_enabled: bool,
    pub achievement_notifications_enabled: bool,
}
