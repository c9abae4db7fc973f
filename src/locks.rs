use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Per-album mutual exclusion for scrapes and refresh writes.
///
/// The bot and the refresh job both scrape albums; holding the guard for an
/// album's key ensures at most one scrape of that album runs at a time while
/// unrelated albums proceed in parallel.
#[derive(Debug, Clone, Default)]
pub struct AlbumLocks {
    inner: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl AlbumLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`. Released when the guard drops.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(key.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Try to take `key` without waiting.
    pub fn try_acquire(&self, key: &str) -> Option<OwnedMutexGuard<()>> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(key.to_string()).or_default().clone()
        };
        lock.try_lock_owned().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = AlbumLocks::new();
        let guard = locks.acquire("-1_2").await;

        assert!(locks.try_acquire("-1_2").is_none());
        assert!(locks.try_acquire("-1_3").is_some());

        drop(guard);
        assert!(locks.try_acquire("-1_2").is_some());
    }

    #[tokio::test]
    async fn test_waiter_proceeds_after_release() {
        let locks = AlbumLocks::new();
        let guard = locks.acquire("key").await;

        let mut waiter = tokio_test::task::spawn(locks.acquire("key"));
        tokio_test::assert_pending!(waiter.poll());

        drop(guard);
        assert!(waiter.is_woken());
        let _guard = tokio_test::assert_ready!(waiter.poll());
    }
}
