use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument};

use crate::contract::model::{
    Note, PushSubscription, Screenshot, ScreenPatch, ScreenshotUpload, Split, SplitPatch,
    UserRecord,
};
use crate::domain::error::DomainError;
use crate::domain::locks::UserLocks;
use crate::domain::ports::{AssetStore, PushSender};
use crate::domain::push::{note_notification, PushRegistry};
use crate::domain::repo::UserRecordsRepository;
use crate::domain::screenshots::ScreenshotManager;
use crate::domain::{merge, timestamps};

/// Domain service holding the record rules: merge, clear, timestamps,
/// screenshot lifecycle and note notifications.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UserRecordsRepository>,
    screenshots: Arc<ScreenshotManager>,
    push: Arc<PushRegistry>,
    locks: Arc<UserLocks>,
    config: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_user_id_length: usize,
    pub max_screenshot_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_user_id_length: 256,
            max_screenshot_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Service {
    pub fn new(
        repo: Arc<dyn UserRecordsRepository>,
        assets: Arc<dyn AssetStore>,
        push_sender: Arc<dyn PushSender>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            screenshots: Arc::new(ScreenshotManager::new(assets, config.max_screenshot_bytes)),
            push: Arc::new(PushRegistry::new(push_sender)),
            locks: Arc::new(UserLocks::new()),
            config,
        }
    }

    /// Full record. Unknown users get the all-null record; nothing is created.
    #[instrument(name = "user_records.service.get", skip(self), fields(user_id = %user_id))]
    pub async fn get(&self, user_id: &str) -> Result<UserRecord, DomainError> {
        self.validate_user_id(user_id)?;
        let mut record = self
            .repo
            .find(user_id)
            .await?
            .unwrap_or_else(|| UserRecord::empty(user_id));
        timestamps::derive(&mut record, Utc::now().date_naive());
        Ok(record)
    }

    /// Merge a partial update into one split, creating the record on first write.
    #[instrument(
        name = "user_records.service.merge_split",
        skip(self, patch),
        fields(user_id = %user_id, split = %patch.split())
    )]
    pub async fn merge_split(
        &self,
        user_id: &str,
        patch: SplitPatch,
    ) -> Result<UserRecord, DomainError> {
        self.validate_user_id(user_id)?;
        let split = patch.split();

        let guard = self.locks.acquire(user_id).await;
        let (mut record, existed) = self.load(user_id).await?;
        let note_before = record.note.clone();

        merge::apply(&mut record, patch);
        timestamps::stamp(&mut record, split, Utc::now());
        self.persist(&record, existed).await?;
        drop(guard);

        info!(split = %split, created = !existed, "split merged");

        if split == Split::Note {
            self.announce_note(&record, &note_before).await;
        }

        timestamps::derive(&mut record, Utc::now().date_naive());
        Ok(record)
    }

    /// Screen update with an optional new screenshot.
    ///
    /// The new asset is written under its own key before the record points at
    /// it; the previous asset is removed only once the record is persisted. A
    /// failed call leaves both the record and the old bytes as they were.
    #[instrument(
        name = "user_records.service.merge_screen",
        skip(self, patch, upload),
        fields(user_id = %user_id, with_screenshot = upload.is_some())
    )]
    pub async fn merge_screen(
        &self,
        user_id: &str,
        patch: ScreenPatch,
        upload: Option<ScreenshotUpload>,
    ) -> Result<UserRecord, DomainError> {
        self.validate_user_id(user_id)?;

        // Decode outside the lock; it is the slow part.
        let validated = match upload {
            Some(u) => Some(self.screenshots.validate(u).await?),
            None => None,
        };

        let guard = self.locks.acquire(user_id).await;
        let (mut record, existed) = self.load(user_id).await?;
        let previous = record.screen.screenshot_ref.clone();

        let mut written = None;
        if let Some(shot) = &validated {
            let reference = self.screenshots.write(user_id, shot).await?;
            record.screen.screenshot_ref = Some(reference.clone());
            written = Some(reference);
        }
        merge::apply(&mut record, SplitPatch::Screen(patch));
        timestamps::stamp(&mut record, Split::Screen, Utc::now());

        if let Err(e) = self.persist(&record, existed).await {
            if let Some(reference) = &written {
                self.screenshots.delete_best_effort(reference).await;
            }
            return Err(e);
        }
        if let (Some(_), Some(old)) = (&written, &previous) {
            self.screenshots.delete_best_effort(old).await;
        }
        drop(guard);

        info!(created = !existed, "screen merged");
        timestamps::derive(&mut record, Utc::now().date_naive());
        Ok(record)
    }

    /// Null every field of one split; the screen split also drops its asset.
    #[instrument(name = "user_records.service.clear_split", skip(self), fields(user_id = %user_id, split = %split))]
    pub async fn clear_split(&self, user_id: &str, split: Split) -> Result<UserRecord, DomainError> {
        self.validate_user_id(user_id)?;

        let guard = self.locks.acquire(user_id).await;
        let (mut record, existed) = self.load(user_id).await?;
        let previous = record.screen.screenshot_ref.clone();

        merge::clear(&mut record, split);
        timestamps::stamp(&mut record, split, Utc::now());
        self.persist(&record, existed).await?;

        // Reference is gone from the record; now the bytes can go.
        if split == Split::Screen {
            if let Some(reference) = &previous {
                self.screenshots.delete_best_effort(reference).await;
            }
        }
        drop(guard);

        info!("split cleared");
        timestamps::derive(&mut record, Utc::now().date_naive());
        Ok(record)
    }

    /// Clear all four splits. `created_at` and the push subscription survive.
    #[instrument(name = "user_records.service.clear_all", skip(self), fields(user_id = %user_id))]
    pub async fn clear_all(&self, user_id: &str) -> Result<UserRecord, DomainError> {
        self.validate_user_id(user_id)?;

        let guard = self.locks.acquire(user_id).await;
        let (mut record, existed) = self.load(user_id).await?;
        let previous = record.screen.screenshot_ref.clone();

        let now = Utc::now();
        for split in Split::ALL {
            merge::clear(&mut record, split);
            timestamps::stamp(&mut record, split, now);
        }
        self.persist(&record, existed).await?;
        if let Some(reference) = &previous {
            self.screenshots.delete_best_effort(reference).await;
        }
        drop(guard);

        info!("all splits cleared");
        timestamps::derive(&mut record, now.date_naive());
        Ok(record)
    }

    /// Remove the record and its asset.
    #[instrument(name = "user_records.service.delete_user", skip(self), fields(user_id = %user_id))]
    pub async fn delete_user(&self, user_id: &str) -> Result<(), DomainError> {
        self.validate_user_id(user_id)?;

        let _guard = self.locks.acquire(user_id).await;
        let Some(record) = self.repo.find(user_id).await? else {
            return Err(DomainError::user_not_found(user_id));
        };
        if !self.repo.delete(user_id).await? {
            return Err(DomainError::user_not_found(user_id));
        }
        if let Some(reference) = &record.screen.screenshot_ref {
            self.screenshots.delete_best_effort(reference).await;
        }
        info!("user deleted");
        Ok(())
    }

    /// Screenshot bytes, if the record references any.
    #[instrument(name = "user_records.service.fetch_screenshot", skip(self), fields(user_id = %user_id))]
    pub async fn fetch_screenshot(&self, user_id: &str) -> Result<Screenshot, DomainError> {
        self.validate_user_id(user_id)?;

        let reference = self
            .repo
            .find(user_id)
            .await?
            .and_then(|r| r.screen.screenshot_ref)
            .ok_or_else(|| DomainError::screenshot_not_found(user_id))?;
        self.screenshots.fetch(user_id, &reference).await
    }

    /// Store (or replace) the user's push subscription.
    #[instrument(name = "user_records.service.subscribe", skip(self, subscription), fields(user_id = %user_id))]
    pub async fn subscribe(
        &self,
        user_id: &str,
        subscription: PushSubscription,
    ) -> Result<(), DomainError> {
        self.validate_user_id(user_id)?;
        self.push.validate(&subscription)?;

        let _guard = self.locks.acquire(user_id).await;
        let (mut record, existed) = self.load(user_id).await?;
        record.push_subscription = Some(subscription);
        timestamps::stamp_created(&mut record, Utc::now());
        self.persist(&record, existed).await?;

        info!(created = !existed, "push subscription stored");
        Ok(())
    }

    /// Delete assets no record references.
    ///
    /// Meant for startup, before requests are served: a screenshot written by
    /// an in-flight request is unreferenced until its record is persisted.
    #[instrument(name = "user_records.service.reclaim_orphaned_assets", skip(self))]
    pub async fn reclaim_orphaned_assets(&self) -> Result<usize, DomainError> {
        let referenced: HashSet<String> = self.repo.screenshot_refs().await?.into_iter().collect();
        self.screenshots.reclaim_orphans(&referenced).await
    }

    async fn announce_note(&self, record: &UserRecord, before: &Note) {
        let Some(subscription) = record.push_subscription.as_ref() else {
            return;
        };
        match note_notification(before, &record.note) {
            Some(message) => {
                self.push
                    .notify(&record.user_id, subscription, message)
                    .await
            }
            None => debug!("note unchanged; no notification"),
        }
    }

    async fn load(&self, user_id: &str) -> Result<(UserRecord, bool), DomainError> {
        Ok(match self.repo.find(user_id).await? {
            Some(record) => (record, true),
            None => (UserRecord::empty(user_id), false),
        })
    }

    async fn persist(&self, record: &UserRecord, existed: bool) -> Result<(), DomainError> {
        let result = if existed {
            self.repo.update(record).await
        } else {
            self.repo.insert(record).await
        };
        result.map_err(|e| {
            error!(user_id = %record.user_id, error = %format!("{e:#}"), "failed to persist user record");
            DomainError::from(e)
        })
    }

    fn validate_user_id(&self, user_id: &str) -> Result<(), DomainError> {
        if user_id.trim().is_empty() {
            return Err(DomainError::validation("user_id", "must not be empty"));
        }
        if user_id.chars().count() > self.config.max_user_id_length {
            return Err(DomainError::validation(
                "user_id",
                format!(
                    "must be at most {} characters",
                    self.config.max_user_id_length
                ),
            ));
        }
        Ok(())
    }
}
