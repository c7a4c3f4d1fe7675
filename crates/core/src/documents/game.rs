//! Library entries.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A game in the user's library, keyed by `shop:objectId`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub object_id: String,
    pub shop: String,
    pub title: String,
    pub icon_url: Option<String>,
    #[serde(default)]
    pub play_time_in_milliseconds: i64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_time_played: Option<OffsetDateTime>,
    pub remote_id: Option<String>,
    pub wine_prefix_path: Option<String>,
    pub launch_options: Option<String>,
    pub executable_path: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
}
