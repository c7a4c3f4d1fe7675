//! Achievement records.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Achievement definitions and unlocks for one game, keyed by `shop:objectId`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAchievement {
    #[serde(default)]
    pub achievements: Vec<AchievementDefinition>,
    #[serde(default)]
    pub unlocked_achievements: Vec<UnlockedAchievement>,
}

/// A single achievement as described by the shop.
///
/// Shops disagree on the extra fields they send, so anything not modelled here
/// is kept verbatim in `extra`. Shops also disagree on types: `hidden` may be
/// a boolean or a `0/1` integer and names may be missing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDefinition {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub display_name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub icongray: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub hidden: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An achievement the user has unlocked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedAchievement {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Unlock time as unix milliseconds. Fractional values are rounded.
    #[serde(default, deserialize_with = "lenient_millis")]
    pub unlock_time: i64,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        other => return Err(de::Error::custom(format!("expected a string, got {other}"))),
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    })
}

fn lenient_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let millis = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(0),
        Value::Number(n) => match n.as_i64() {
            Some(v) => return Ok(v),
            None => n.as_f64(),
        },
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match millis {
        Some(v) if v.is_finite() => Ok(v.round() as i64),
        _ => Err(de::Error::custom("unlockTime is not a number")),
    }
}
