//! Game achievement repository.

use crate::error::LegacyResult;
use crate::models::GameAchievementRow;
use async_trait::async_trait;

/// Read access to the `game_achievement` table.
#[async_trait]
pub trait AchievementRepo: Send + Sync {
    /// Select every achievement row, in insertion order.
    async fn select_game_achievements(&self) -> LegacyResult<Vec<GameAchievementRow>>;
}
