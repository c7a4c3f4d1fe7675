//! Game repository.

use crate::error::LegacyResult;
use crate::models::GameRow;
use async_trait::async_trait;

/// Read access to the `game` table.
#[async_trait]
pub trait GameRepo: Send + Sync {
    /// Select every game, in insertion order.
    async fn select_games(&self) -> LegacyResult<Vec<GameRow>>;
}
