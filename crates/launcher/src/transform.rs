//! Mapping of legacy rows to store documents.
//!
//! Every function here is pure apart from secret encryption: one row in, one
//! document (or document pair) out.

use crate::error::{LaunchError, LaunchResult};
use hearth_core::documents::{Auth, Game, GameAchievement, User, UserPreferences};
use hearth_core::keys::game_key;
use hearth_crypto::SecretCipher;
use hearth_legacy::models::{GameAchievementRow, GameRow, UserAuthRow, UserPreferencesRow};
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Normalize a legacy integer truth value. Only `1` is true.
pub fn flag(value: Option<i64>) -> bool {
    value == Some(1)
}

/// Parse a legacy `lastTimePlayed` value.
///
/// The legacy ORM wrote `YYYY-MM-DD HH:MM:SS[.fff]` in UTC; RFC 3339 values
/// written by later app versions are accepted as well.
pub fn parse_legacy_timestamp(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    if let Ok(parsed) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(parsed);
    }
    let sqlite_format = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    PrimitiveDateTime::parse(value, sqlite_format)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

/// Map a `game` row to its library document and key.
pub fn game_document(row: GameRow) -> (String, Game) {
    let last_time_played = row.last_time_played.as_deref().and_then(|raw| {
        let parsed = parse_legacy_timestamp(raw);
        if parsed.is_none() {
            tracing::warn!(
                shop = %row.shop,
                object_id = %row.object_id,
                value = %raw,
                "Dropping unparseable lastTimePlayed"
            );
        }
        parsed
    });

    let key = game_key(&row.shop, &row.object_id);
    let game = Game {
        object_id: row.object_id,
        shop: row.shop,
        title: row.title,
        icon_url: row.icon_url,
        play_time_in_milliseconds: row.play_time_in_milliseconds.unwrap_or(0),
        last_time_played,
        remote_id: row.remote_id,
        wine_prefix_path: row.wine_prefix_path,
        launch_options: row.launch_options,
        executable_path: row.executable_path,
        is_deleted: flag(row.is_deleted),
    };
    (key, game)
}

/// Map the `user_preferences` row, encrypting provider credentials.
///
/// Absent or empty credentials are stored as null.
pub fn preferences_document(
    row: UserPreferencesRow,
    cipher: &dyn SecretCipher,
) -> LaunchResult<UserPreferences> {
    Ok(UserPreferences {
        downloads_path: row.downloads_path,
        language: row.language,
        real_debrid_api_token: encrypt_optional(cipher, row.real_debrid_api_token)?,
        all_debrid_api_key: encrypt_optional(cipher, row.all_debrid_api_key)?,
        // Not part of the legacy schema
        tor_box_api_token: None,
        prefer_quit_instead_of_hiding: flag(row.prefer_quit_instead_of_hiding),
        run_at_startup: flag(row.run_at_startup),
        start_minimized: flag(row.start_minimized),
        disable_nsfw_alert: flag(row.disable_nsfw_alert),
        seed_after_download_complete: flag(row.seed_after_download_complete),
        show_hidden_achievements_description: flag(row.show_hidden_achievements_description),
        download_notifications_enabled: flag(row.download_notifications_enabled),
        repack_updates_notifications_enabled: flag(row.repack_updates_notifications_enabled),
        achievement_notifications_enabled: flag(row.achievement_notifications_enabled),
    })
}

/// Map a `game_achievement` row, decoding its two JSON columns.
///
/// A NULL column is an empty list; malformed JSON fails the row.
pub fn achievement_document(row: GameAchievementRow) -> LaunchResult<(String, GameAchievement)> {
    let key = game_key(&row.shop, &row.object_id);
    let achievements = decode_json_column(&key, "achievements", row.achievements.as_deref())?;
    let unlocked_achievements = decode_json_column(
        &key,
        "unlockedAchievements",
        row.unlocked_achievements.as_deref(),
    )?;
    Ok((
        key,
        GameAchievement {
            achievements,
            unlocked_achievements,
        },
    ))
}

/// Split the `user_auth` row into the profile and the auth document.
pub fn session_documents(row: UserAuthRow, cipher: &dyn SecretCipher) -> LaunchResult<(User, Auth)> {
    let subscription = row.subscription.filter(|s| !s.is_empty()).map(|raw| {
        serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
    });

    let user = User {
        id: row.user_id,
        display_name: row.display_name,
        profile_image_url: row.profile_image_url,
        background_image_url: row.background_image_url,
        subscription,
    };
    let auth = Auth {
        access_token: cipher.encrypt(&row.access_token)?,
        refresh_token: cipher.encrypt(&row.refresh_token)?,
        token_expiration_timestamp: row.token_expiration_timestamp,
    };
    Ok((user, auth))
}

fn encrypt_optional(
    cipher: &dyn SecretCipher,
    value: Option<String>,
) -> LaunchResult<Option<String>> {
    match value {
        Some(secret) if !secret.is_empty() => Ok(Some(cipher.encrypt(&secret)?)),
        _ => Ok(None),
    }
}

fn decode_json_column<T: DeserializeOwned>(
    key: &str,
    column: &str,
    raw: Option<&str>,
) -> LaunchResult<Vec<T>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    serde_json::from_str::<Option<Vec<T>>>(raw)
        .map(Option::unwrap_or_default)
        .map_err(|e| LaunchError::InvalidRecord {
            table: "game_achievement",
            message: format!("{key}: invalid {column}: {e}"),
        })
}
