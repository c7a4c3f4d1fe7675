//! Session repository.

use crate::error::LegacyResult;
use crate::models::UserAuthRow;
use async_trait::async_trait;

/// Read access to the `user_auth` table.
#[async_trait]
pub trait UserAuthRepo: Send + Sync {
    /// Select every session row. The legacy app only ever wrote one.
    async fn select_user_auth(&self) -> LegacyResult<Vec<UserAuthRow>>;
}
