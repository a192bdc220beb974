use async_trait::async_trait;

/// Blob storage for screenshot bytes, addressed by an opaque key.
///
/// The key doubles as the reference persisted in `screenshot_ref`; every
/// upload is stored under a fresh key.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Replace the blob under `key`. Readers see either the old or the new bytes.
    async fn put(&self, key: &str, bytes: &[u8]) -> anyhow::Result<()>;

    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;

    /// Returns `false` when nothing was stored under `key`.
    async fn remove(&self, key: &str) -> anyhow::Result<bool>;

    /// Keys of all stored blobs.
    async fn keys(&self) -> anyhow::Result<Vec<String>>;
}
