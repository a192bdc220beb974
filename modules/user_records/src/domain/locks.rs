use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-user mutual exclusion for read-modify-write cycles.
///
/// Different users never contend. Entries are dropped once the last holder
/// or waiter for a user goes away, so the table only grows with concurrency,
/// not with the number of users ever seen.
#[derive(Default)]
pub struct UserLocks {
    slots: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: &str) -> UserLockGuard {
        let slot = self
            .slots
            .entry(user_id.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = slot.lock_owned().await;
        UserLockGuard {
            guard: Some(guard),
            user_id: user_id.to_owned(),
            slots: self.slots.clone(),
        }
    }

    /// Number of users with a live lock entry.
    #[cfg(test)]
    fn active(&self) -> usize {
        self.slots.len()
    }
}

pub struct UserLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    user_id: String,
    slots: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Drop for UserLockGuard {
    fn drop(&mut self) {
        // Release first so the strong count reflects only the map and waiters.
        self.guard.take();
        self.slots
            .remove_if(&self.user_id, |_, slot| Arc::strong_count(slot) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn entry_is_removed_after_release() {
        let locks = UserLocks::new();
        {
            let _g = locks.acquire("Jordan").await;
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn same_user_is_serialized() {
        let locks = Arc::new(UserLocks::new());
        let first = locks.acquire("Jordan").await;

        let l = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = l.acquire("Jordan").await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap();
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn different_users_do_not_block() {
        let locks = UserLocks::new();
        let _a = locks.acquire("Jordan").await;
        let b = tokio::time::timeout(Duration::from_millis(200), locks.acquire("Sam")).await;
        assert!(b.is_ok());
        assert_eq!(locks.active(), 2);
    }
}
