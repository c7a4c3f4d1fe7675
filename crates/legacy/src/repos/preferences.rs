//! User preferences repository.

use crate::error::LegacyResult;
use crate::models::UserPreferencesRow;
use async_trait::async_trait;

/// Read access to the `user_preferences` table.
#[async_trait]
pub trait PreferencesRepo: Send + Sync {
    /// Select every preferences row. The legacy app only ever wrote one.
    async fn select_user_preferences(&self) -> LegacyResult<Vec<UserPreferencesRow>>;
}
