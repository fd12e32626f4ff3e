//! Per-path mutual exclusion for name resolution

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Async locks keyed by logical directory
///
/// Holding the guard for a path from name resolution until the blob is
/// written keeps two stores in the same process from picking the same name.
/// Entries are dropped once no task holds or waits for them.
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Guard returned by [`PathLocks::lock`]; releases the path on drop
#[derive(Debug)]
pub struct PathGuard<'a> {
    owner: &'a PathLocks,
    key: String,
    mutex: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl PathLocks {
    /// Creates an empty lock table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `path`
    pub async fn lock(&self, path: &str) -> PathGuard<'_> {
        let key = path.trim_matches('/').to_string();
        let mutex = Arc::clone(self.locks.lock().entry(key.clone()).or_default());

        let guard = Arc::clone(&mutex).lock_owned().await;
        PathGuard {
            owner: self,
            key,
            mutex,
            guard: Some(guard),
        }
    }

    /// Number of paths currently locked or awaited
    #[must_use]
    pub fn active(&self) -> usize {
        self.locks.lock().len()
    }
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();

        let mut locks = self.owner.locks.lock();
        // One reference in the table, one here; anything more is a waiter
        if Arc::strong_count(&self.mutex) == 2 {
            locks.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_entries_are_cleaned_up() {
        let locks = PathLocks::new();
        {
            let _guard = locks.lock("a/b").await;
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_same_path_is_exclusive() {
        let locks = Arc::new(PathLocks::new());
        let guard = locks.lock("/docs/").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("docs").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
        assert_eq!(locks.active(), 0);
    }

    #[tokio::test]
    async fn test_different_paths_do_not_block() {
        let locks = PathLocks::new();
        let _a = locks.lock("a").await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.lock("b"))
            .await
            .unwrap();
        assert_eq!(locks.active(), 2);
    }
}
