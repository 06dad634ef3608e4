//! Superseding fetches
//!
//! When a selection changes while the fetch for the previous selection is
//! still running, the old request is aborted and only the newest result is
//! delivered.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tokio::task::{AbortHandle, JoinHandle};

use crate::error::{Error, Result};
use crate::log_debug;

const MODULE: &str = "fetcher";

/// Runs one request at a time; starting a new one supersedes the previous
#[derive(Debug, Default)]
pub struct LatestOnly {
    generation: AtomicU64,
    inflight: Mutex<Option<AbortHandle>>,
}

impl LatestOnly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fut` as the newest request.
    ///
    /// Resolves to [`Error::Superseded`] if another call started before this
    /// one finished.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (generation, handle) = self.start(fut).await;
        self.finish(generation, handle).await
    }

    // Numbering and handle swap happen under one lock so the newest
    // generation always owns the running task.
    async fn start<F, T>(&self, fut: F) -> (u64, JoinHandle<Result<T>>)
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let mut inflight = self.inflight.lock().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = tokio::spawn(fut);
        if let Some(previous) = inflight.replace(handle.abort_handle()) {
            log_debug!(MODULE, "Aborting superseded request");
            previous.abort();
        }
        (generation, handle)
    }

    async fn finish<T>(&self, generation: u64, handle: JoinHandle<Result<T>>) -> Result<T> {
        let outcome = handle.await;

        {
            let mut inflight = self.inflight.lock().await;
            if self.generation.load(Ordering::SeqCst) != generation {
                return Err(Error::Superseded);
            }
            *inflight = None;
        }

        match outcome {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(Error::Superseded),
            Err(e) => Err(Error::Task(e.to_string())),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// A fetch derived from a dependency key; it re-runs only when the key changes
#[derive(Debug)]
pub struct DerivedFetch<K> {
    key: Mutex<Option<K>>,
    latest: LatestOnly,
}

impl<K> Default for DerivedFetch<K> {
    fn default() -> Self {
        Self {
            key: Mutex::new(None),
            latest: LatestOnly::new(),
        }
    }
}

impl<K: Clone + PartialEq + Send> DerivedFetch<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch for `key` unless it equals the last requested key, in which case
    /// `Ok(None)` is returned and nothing is sent.
    ///
    /// A failed fetch forgets its key so the same key can be retried by the
    /// caller.
    pub async fn update<F, Fut, T>(&self, key: K, fetch: F) -> Result<Option<T>>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        // The key is recorded and the fetch started under the key lock, so
        // the last recorded key is the one whose fetch survives.
        let (generation, handle) = {
            let mut last = self.key.lock().await;
            if last.as_ref() == Some(&key) {
                return Ok(None);
            }
            *last = Some(key.clone());
            self.latest.start(fetch(key.clone())).await
        };

        let result = self.latest.finish(generation, handle).await;
        if let Err(ref e) = result {
            if !matches!(e, Error::Superseded) {
                let mut last = self.key.lock().await;
                if last.as_ref() == Some(&key) {
                    *last = None;
                }
            }
        }
        result.map(Some)
    }

    /// Forget the last key so the next update always fetches
    pub async fn invalidate(&self) {
        *self.key.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Barrier;

    #[tokio::test]
    async fn test_latest_only_passes_result() {
        let latest = LatestOnly::new();
        let value = latest.run(async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
        assert_eq!(latest.generation(), 1);
    }

    #[tokio::test]
    async fn test_latest_only_supersedes_older_request() {
        let latest = Arc::new(LatestOnly::new());

        let slow = {
            let latest = latest.clone();
            tokio::spawn(async move {
                latest
                    .run(async {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        Ok("old")
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let fast = latest.run(async { Ok("new") }).await.unwrap();
        assert_eq!(fast, "new");
        assert!(matches!(slow.await.unwrap(), Err(Error::Superseded)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_latest_only_concurrent_callers_keep_newest() {
        for _ in 0..500 {
            let latest = Arc::new(LatestOnly::new());
            let barrier = Arc::new(Barrier::new(2));

            let callers: Vec<_> = (0..2u32)
                .map(|value| {
                    let latest = latest.clone();
                    let barrier = barrier.clone();
                    tokio::spawn(async move {
                        barrier.wait().await;
                        latest
                            .run(async move {
                                tokio::time::sleep(Duration::from_millis(1)).await;
                                Ok(value)
                            })
                            .await
                    })
                })
                .collect();

            let mut delivered = 0;
            for caller in callers {
                match caller.await.unwrap() {
                    Ok(_) => delivered += 1,
                    Err(Error::Superseded) => {}
                    Err(e) => panic!("unexpected error {:?}", e),
                }
            }
            assert!(delivered >= 1, "newest request was lost");
            assert_eq!(latest.generation(), 2);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_latest_only_last_started_call_wins() {
        let latest = Arc::new(LatestOnly::new());
        let mut older = Vec::new();
        for value in 0..8u32 {
            let latest = latest.clone();
            older.push(tokio::spawn(async move {
                latest
                    .run(async move {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(value)
                    })
                    .await
            }));
        }
        // Let every earlier call register before the last one starts
        while latest.generation() < 8 {
            tokio::task::yield_now().await;
        }

        let newest = latest.run(async { Ok(99u32) }).await.unwrap();
        assert_eq!(newest, 99);
        for caller in older {
            assert!(matches!(caller.await.unwrap(), Err(Error::Superseded)));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_derived_fetch_concurrent_keys() {
        for _ in 0..200 {
            let derived: Arc<DerivedFetch<u32>> = Arc::new(DerivedFetch::new());
            let barrier = Arc::new(Barrier::new(2));

            let callers: Vec<_> = (1..=2u32)
                .map(|key| {
                    let derived = derived.clone();
                    let barrier = barrier.clone();
                    tokio::spawn(async move {
                        barrier.wait().await;
                        derived
                            .update(key, |k| async move {
                                tokio::time::sleep(Duration::from_millis(1)).await;
                                Ok(k * 10)
                            })
                            .await
                    })
                })
                .collect();

            let mut delivered = Vec::new();
            for caller in callers {
                match caller.await.unwrap() {
                    Ok(Some(value)) => delivered.push(value),
                    Ok(None) | Err(Error::Superseded) => {}
                    Err(e) => panic!("unexpected error {:?}", e),
                }
            }
            let last = derived.key.lock().await.clone().unwrap();
            assert!(delivered.contains(&(last * 10)), "latest key was not delivered");
        }
    }

    #[tokio::test]
    async fn test_derived_fetch_only_on_change() {
        let derived: DerivedFetch<String> = DerivedFetch::new();
        let first = derived
            .update("23.05.3".to_string(), |v| async move { Ok(v.len()) })
            .await
            .unwrap();
        assert_eq!(first, Some(7));

        let same = derived
            .update("23.05.3".to_string(), |_| async { Ok(0usize) })
            .await
            .unwrap();
        assert_eq!(same, None);

        let changed = derived
            .update("snapshot".to_string(), |v| async move { Ok(v.len()) })
            .await
            .unwrap();
        assert_eq!(changed, Some(8));
    }

    #[tokio::test]
    async fn test_derived_fetch_retries_after_error() {
        let derived: DerivedFetch<u32> = DerivedFetch::new();
        let err = derived
            .update(1, |_| async { Err::<(), _>(Error::Task("offline".to_string())) })
            .await;
        assert!(err.is_err());

        let again = derived.update(1, |_| async { Ok(()) }).await.unwrap();
        assert_eq!(again, Some(()));
    }
}
