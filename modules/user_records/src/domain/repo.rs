use async_trait::async_trait;

use crate::contract::model::UserRecord;

/// Port for the record store. The service owns the read-modify-write cycle,
/// so the adapter only needs whole-record operations keyed by `user_id`.
#[async_trait]
pub trait UserRecordsRepository: Send + Sync {
    async fn find(&self, user_id: &str) -> anyhow::Result<Option<UserRecord>>;

    async fn insert(&self, record: &UserRecord) -> anyhow::Result<()>;

    async fn update(&self, record: &UserRecord) -> anyhow::Result<()>;

    /// Returns `false` when no record existed.
    async fn delete(&self, user_id: &str) -> anyhow::Result<bool>;

    /// Every non-null `screenshot_ref` currently stored.
    async fn screenshot_refs(&self) -> anyhow::Result<Vec<String>>;
}
