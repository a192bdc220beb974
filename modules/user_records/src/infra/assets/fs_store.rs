use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::domain::ports::AssetStore;

const ASSET_EXT: &str = "img";
const TMP_EXT: &str = "tmp";

/// Stores each asset as `<root>/<key>.img`.
///
/// Writes land in a temp file next to the target and are renamed into place,
/// so readers never observe a partial file.
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_root(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("create asset dir {}", self.root.display()))
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        // Keys are hex digests joined by '-'; anything else could escape the root.
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            bail!("invalid asset key {key:?}");
        }
        Ok(self.root.join(format!("{key}.{ASSET_EXT}")))
    }

    /// Remove temp files left behind by interrupted writes.
    pub async fn sweep_temp_files(&self) -> anyhow::Result<usize> {
        let mut removed = 0;
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e).context("read asset dir"),
        };
        while let Some(entry) = dir.next_entry().await.context("read asset dir entry")? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(TMP_EXT) {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e).context("remove temp asset"),
                }
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> anyhow::Result<()> {
        let target = self.path_for(key)?;
        self.ensure_root().await?;

        let tmp = self
            .root
            .join(format!("{key}.{}.{TMP_EXT}", uuid::Uuid::new_v4().simple()));

        let write = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            tokio::fs::rename(&tmp, &target).await
        };

        if let Err(e) = write.await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("write asset {}", target.display()));
        }
        debug!(path = %target.display(), bytes = bytes.len(), "asset stored");
        Ok(())
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read asset {}", path.display())),
        }
    }

    async fn remove(&self, key: &str) -> anyhow::Result<bool> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("remove asset {}", path.display())),
        }
    }

    async fn keys(&self) -> anyhow::Result<Vec<String>> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).context("read asset dir"),
        };
        let mut keys = Vec::new();
        while let Some(entry) = dir.next_entry().await.context("read asset dir entry")? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ASSET_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_owned());
            }
        }
        Ok(keys)
    }
}
