//! Task-scoped metadata storage with a process-wide fallback slot.

use std::cell::RefCell;
use std::future::Future;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::context::metadata::{MetadataValue, RequestMetadata};

tokio::task_local! {
    static SCOPED_METADATA: RefCell<RequestMetadata>;
}

static GLOBAL_STORE: OnceLock<Arc<ContextStore>> = OnceLock::new();

/// Run `fut` inside a fresh, empty metadata scope.
///
/// Every [`ContextStore`] read or write made from within `fut` (and from the
/// futures it awaits) targets this scope. Tasks spawned from inside do not
/// inherit it.
pub async fn scope<F>(fut: F) -> F::Output
where
    F: Future,
{
    SCOPED_METADATA
        .scope(RefCell::new(RequestMetadata::new()), fut)
        .await
}

/// Whether the current task is running inside a metadata scope.
pub fn in_scope() -> bool {
    SCOPED_METADATA.try_with(|_| ()).is_ok()
}

/// Get/set access to the metadata of the current unit of work.
///
/// Inside a [`scope`] the value is isolated per scope. Outside of one, the
/// store falls back to its own slot, shared by every caller of this store;
/// concurrent writers then see last-writer-wins.
#[derive(Debug, Default)]
pub struct ContextStore {
    fallback: Mutex<RequestMetadata>,
}

impl ContextStore {
    /// Create a store with its own fallback slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store.
    pub fn global() -> Arc<ContextStore> {
        GLOBAL_STORE
            .get_or_init(|| Arc::new(ContextStore::new()))
            .clone()
    }

    /// Replace the metadata of the current unit of work.
    pub fn set_metadata(&self, metadata: RequestMetadata) {
        let mut pending = Some(metadata);
        let scoped = SCOPED_METADATA
            .try_with(|slot| {
                if let Some(metadata) = pending.take() {
                    *slot.borrow_mut() = metadata;
                }
            })
            .is_ok();

        if !scoped {
            warn_unscoped();
            *self.lock_fallback() = pending.take().unwrap_or_default();
        }
    }

    /// Add or replace one key in the current unit's metadata.
    pub fn insert_metadata(&self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        let key = key.into();
        let value = value.into();
        let mut pending = Some((key, value));
        let scoped = SCOPED_METADATA
            .try_with(|slot| {
                if let Some((k, v)) = pending.take() {
                    slot.borrow_mut().insert(k, v);
                }
            })
            .is_ok();

        if !scoped {
            warn_unscoped();
            if let Some((k, v)) = pending.take() {
                self.lock_fallback().insert(k, v);
            }
        }
    }

    /// The metadata of the current unit of work; empty when none was set.
    pub fn get_metadata(&self) -> RequestMetadata {
        SCOPED_METADATA
            .try_with(|slot| slot.borrow().clone())
            .unwrap_or_else(|_| self.lock_fallback().clone())
    }

    /// Reset the current unit's metadata to empty.
    pub fn clear_metadata(&self) {
        let scoped = SCOPED_METADATA
            .try_with(|slot| *slot.borrow_mut() = RequestMetadata::new())
            .is_ok();
        if !scoped {
            *self.lock_fallback() = RequestMetadata::new();
        }
    }

    fn lock_fallback(&self) -> std::sync::MutexGuard<'_, RequestMetadata> {
        self.fallback.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// Goes straight to the sink: the Logger reads this store, so routing the
// warning through it could recurse.
fn warn_unscoped() {
    tracing::warn!(
        target: "metric_mongrel::context",
        "No request scope active; metadata is stored process-wide (last writer wins)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::capture_logs;
    use std::time::Duration;

    #[tokio::test]
    async fn test_scoped_metadata_is_isolated() {
        let store = Arc::new(ContextStore::new());

        let mut handles = Vec::new();
        for id in 0..8i64 {
            let store = store.clone();
            handles.push(tokio::spawn(scope(async move {
                store.set_metadata(RequestMetadata::new().with("worker", id));
                // Force interleaving with the other scopes.
                for _ in 0..5 {
                    tokio::task::yield_now().await;
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                store.get_metadata()
            })));
        }

        for (id, handle) in handles.into_iter().enumerate() {
            let seen = handle.await.unwrap();
            assert_eq!(seen, RequestMetadata::new().with("worker", id as i64));
        }

        // Nothing leaked into the fallback slot.
        assert!(store.get_metadata().is_empty());
    }

    #[tokio::test]
    async fn test_scope_starts_empty_and_nests() {
        let store = ContextStore::new();
        scope(async {
            assert!(in_scope());
            assert!(store.get_metadata().is_empty());
            store.insert_metadata("outer", true);

            scope(async {
                assert!(store.get_metadata().is_empty());
                store.insert_metadata("inner", true);
            })
            .await;

            assert_eq!(store.get_metadata(), RequestMetadata::new().with("outer", true));
        })
        .await;
        assert!(!in_scope());
    }

    #[test]
    fn test_unscoped_last_writer_wins_with_warnings() {
        let (logs, _guard) = capture_logs();
        let store = ContextStore::new();

        store.set_metadata(RequestMetadata::new().with("run", "first"));
        store.set_metadata(RequestMetadata::new().with("run", "second"));

        assert_eq!(store.get_metadata(), RequestMetadata::new().with("run", "second"));
        assert_eq!(logs.count_matching("WARN", "No request scope active"), 2);
    }

    #[test]
    fn test_clear_fallback() {
        let (_logs, _guard) = capture_logs();
        let store = ContextStore::new();
        store.insert_metadata("job", "nightly");
        assert_eq!(store.get_metadata().len(), 1);

        store.clear_metadata();
        assert!(store.get_metadata().is_empty());
    }
}
