use std::collections::HashSet;
use std::sync::Arc;

use image::ImageFormat;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::contract::model::{Screenshot, ScreenshotUpload};
use crate::domain::error::DomainError;
use crate::domain::ports::AssetStore;

/// Formats accepted for screenshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
        }
    }

    /// Cheap magic-byte check; no decoding.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Png => Some(ImageKind::Png),
            ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            _ => None,
        }
    }

    fn format(&self) -> ImageFormat {
        match self {
            ImageKind::Png => ImageFormat::Png,
            ImageKind::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// A screenshot that passed size and format checks.
#[derive(Debug)]
pub struct ValidatedScreenshot {
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
}

/// Key prefix shared by every upload of a user: hex SHA-256 of the id, so
/// arbitrary ids are safe file names.
pub fn asset_prefix(user_id: &str) -> String {
    hex::encode(Sha256::digest(user_id.as_bytes()))
}

/// Fresh key for one upload. A new upload never overwrites the bytes the
/// stored record still points at.
pub fn new_asset_key(user_id: &str) -> String {
    format!("{}-{}", asset_prefix(user_id), Uuid::new_v4().simple())
}

/// Owns screenshot bytes on behalf of the screen split.
pub struct ScreenshotManager {
    store: Arc<dyn AssetStore>,
    max_bytes: usize,
}

impl ScreenshotManager {
    pub fn new(store: Arc<dyn AssetStore>, max_bytes: usize) -> Self {
        Self { store, max_bytes }
    }

    /// Size check, format sniff and a full decode on the blocking pool.
    pub async fn validate(
        &self,
        upload: ScreenshotUpload,
    ) -> Result<ValidatedScreenshot, DomainError> {
        let ScreenshotUpload {
            bytes,
            declared_content_type,
        } = upload;

        if bytes.is_empty() {
            return Err(DomainError::validation("screenshot", "screenshot is empty"));
        }
        if bytes.len() > self.max_bytes {
            return Err(DomainError::validation(
                "screenshot",
                format!(
                    "screenshot is {} bytes, limit is {}",
                    bytes.len(),
                    self.max_bytes
                ),
            ));
        }

        let kind = ImageKind::sniff(&bytes).ok_or_else(|| {
            DomainError::invalid_asset_format("screenshot must be a PNG or JPEG image")
        })?;

        if let Some(declared) = declared_content_type.as_deref() {
            if !declared.eq_ignore_ascii_case(kind.content_type()) {
                debug!(
                    declared,
                    detected = kind.content_type(),
                    "declared screenshot type differs from content; using detected type"
                );
            }
        }

        tokio::task::spawn_blocking(move || {
            image::load_from_memory_with_format(&bytes, kind.format())
                .map(|_| ValidatedScreenshot { bytes, kind })
                .map_err(|e| {
                    DomainError::invalid_asset_format(format!("screenshot does not decode: {e}"))
                })
        })
        .await
        .map_err(|e| DomainError::storage(format!("screenshot validation task failed: {e}")))?
    }

    /// Write validated bytes under a new key; returns the reference to persist.
    pub async fn write(
        &self,
        user_id: &str,
        screenshot: &ValidatedScreenshot,
    ) -> Result<String, DomainError> {
        let key = new_asset_key(user_id);
        self.store.put(&key, &screenshot.bytes).await?;
        debug!(%user_id, key = %key, bytes = screenshot.bytes.len(), "screenshot written");
        Ok(key)
    }

    /// Bytes behind `reference`, the record's `screenshot_ref`.
    pub async fn fetch(&self, user_id: &str, reference: &str) -> Result<Screenshot, DomainError> {
        let bytes = self
            .store
            .get(reference)
            .await?
            .ok_or_else(|| DomainError::screenshot_not_found(user_id))?;

        // Stored bytes were validated on the way in; re-sniff only for the header.
        let content_type = ImageKind::sniff(&bytes)
            .map(|k| k.content_type())
            .unwrap_or("application/octet-stream");
        Ok(Screenshot {
            bytes,
            content_type,
        })
    }

    /// Remove the asset behind `reference`. Idempotent.
    pub async fn delete(&self, reference: &str) -> Result<(), DomainError> {
        if self.store.remove(reference).await? {
            debug!(key = %reference, "screenshot removed");
        }
        Ok(())
    }

    /// Like [`delete`](Self::delete) but only logs failures; the leftover is
    /// picked up by [`reclaim_orphans`](Self::reclaim_orphans).
    pub async fn delete_best_effort(&self, reference: &str) {
        if let Err(e) = self.delete(reference).await {
            warn!(key = %reference, error = %e, "failed to remove screenshot asset; left for reclaim");
        }
    }

    /// Remove every stored asset whose key is not in `referenced`.
    pub async fn reclaim_orphans(&self, referenced: &HashSet<String>) -> Result<usize, DomainError> {
        let mut reclaimed = 0;
        for key in self.store.keys().await? {
            if referenced.contains(&key) {
                continue;
            }
            if self.store.remove(&key).await? {
                reclaimed += 1;
            }
        }
        if reclaimed > 0 {
            info!(reclaimed, "removed orphaned screenshot assets");
        }
        Ok(reclaimed)
    }
}
