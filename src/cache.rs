//! Time-windowed response cache
//!
//! [`ThrottlingCache`] wraps a [`DiagnosticsProvider`] and invokes it at most
//! once per window. The whole check-and-refresh sequence runs under a single
//! async mutex: callers that arrive while a refresh is in flight wait for it
//! and share its result instead of starting a second one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

/// Produces the response body that the cache stores and serves.
///
/// There is no error type: a provider renders its own failures into the
/// returned payload.
#[async_trait]
pub trait DiagnosticsProvider: Send + Sync {
    /// Gather diagnostics and render them
    async fn collect(&self) -> String;
}

/// Last provider result and the instant it is accounted to
struct CachedResult {
    value: Arc<str>,
    produced_at: Instant,
}

/// Cache statistics tracked atomically
#[derive(Debug, Default)]
struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Serves one provider result per window to every caller
pub struct ThrottlingCache {
    provider: Arc<dyn DiagnosticsProvider>,
    window: Duration,
    slot: Arc<Mutex<Option<CachedResult>>>,
    stats: CacheStats,
}

impl ThrottlingCache {
    /// Create an empty cache; the first lookup always invokes the provider
    #[must_use]
    pub fn new(provider: Arc<dyn DiagnosticsProvider>, window: Duration) -> Self {
        Self {
            provider,
            window,
            slot: Arc::new(Mutex::new(None)),
            stats: CacheStats::default(),
        }
    }

    /// Configured window
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Return the cached response, refreshing it if the window has elapsed
    pub async fn get(&self) -> Arc<str> {
        self.get_at(Instant::now()).await
    }

    /// Same as [`get`](Self::get) with an explicit clock reading.
    ///
    /// `now` is taken by the caller before waiting for the lock. A caller
    /// that queued behind a refresh therefore sees the fresh value as
    /// younger than the window and gets a hit.
    ///
    /// A refresh runs in its own task holding the lock, so it completes and
    /// stores its result even if the caller that started it is dropped.
    pub async fn get_at(&self, now: Instant) -> Arc<str> {
        let mut slot = Arc::clone(&self.slot).lock_owned().await;

        if let Some(cached) = slot.as_ref()
            && now.saturating_duration_since(cached.produced_at) < self.window
        {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(&cached.value);
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        let provider = Arc::clone(&self.provider);
        let refresh = tokio::spawn(async move {
            let started = Instant::now();
            let value: Arc<str> = provider.collect().await.into();
            debug!(
                elapsed_ms = started.elapsed().as_millis(),
                bytes = value.len(),
                "Diagnostics refreshed"
            );

            *slot = Some(CachedResult {
                value: Arc::clone(&value),
                produced_at: now,
            });
            value
        });

        match refresh.await {
            Ok(value) => value,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                // Only reachable while the runtime shuts down.
                error!(error = %e, "Diagnostics refresh cancelled");
                Arc::from("")
            }
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStatsSnapshot {
        let hits = self.stats.hits.load(Ordering::Relaxed);
        let misses = self.stats.misses.load(Ordering::Relaxed);
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if hits + misses == 0 {
            0.0
        } else {
            hits as f64 / (hits + misses) as f64
        };
        CacheStatsSnapshot {
            hits,
            misses,
            hit_rate,
        }
    }
}

/// Snapshot of cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStatsSnapshot {
    /// Lookups served from the stored value
    pub hits: u64,
    /// Lookups that invoked the provider
    pub misses: u64,
    /// Hit rate (0.0-1.0)
    pub hit_rate: f64,
}

/// Keep the cache warm by looking it up once per window until shutdown.
///
/// Each tick uses its scheduled deadline as the clock reading, so
/// consecutive ticks are exactly one window apart and always refresh. A
/// request-triggered refresh in between turns the next tick into a hit,
/// which keeps the one-invocation-per-window bound.
pub fn spawn_refresher(
    cache: Arc<ThrottlingCache>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cache.window());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                deadline = interval.tick() => {
                    cache.get_at(deadline.into_std()).await;
                }
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }
        debug!("Background refresh stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    /// Returns the scripted values in order, repeating the last one
    struct ScriptedProvider {
        values: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(values: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                values,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DiagnosticsProvider for ScriptedProvider {
        async fn collect(&self) -> String {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.values[n.min(self.values.len() - 1)].to_string()
        }
    }

    fn cache_with(provider: &Arc<ScriptedProvider>, window: Duration) -> ThrottlingCache {
        ThrottlingCache::new(Arc::clone(provider) as Arc<dyn DiagnosticsProvider>, window)
    }

    #[tokio::test]
    async fn test_first_call_invokes_provider() {
        let provider = ScriptedProvider::new(vec!["A"]);
        let cache = cache_with(&provider, Duration::from_secs(60));

        assert_eq!(&*cache.get().await, "A");
        assert_eq!(provider.calls(), 1);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 0);
    }

    #[tokio::test]
    async fn test_window_scenario() {
        let provider = ScriptedProvider::new(vec!["A", "B"]);
        let cache = cache_with(&provider, Duration::from_millis(500));
        let t0 = Instant::now();

        assert_eq!(&*cache.get_at(t0).await, "A");
        assert_eq!(&*cache.get_at(t0 + Duration::from_millis(200)).await, "A");
        assert_eq!(&*cache.get_at(t0 + Duration::from_millis(600)).await, "B");
        assert_eq!(&*cache.get_at(t0 + Duration::from_millis(650)).await, "B");

        assert_eq!(provider.calls(), 2);
        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 2);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_window_boundary_is_a_miss() {
        let provider = ScriptedProvider::new(vec!["A", "B"]);
        let cache = cache_with(&provider, Duration::from_millis(500));
        let t0 = Instant::now();

        cache.get_at(t0).await;
        assert_eq!(&*cache.get_at(t0 + Duration::from_millis(499)).await, "A");
        assert_eq!(&*cache.get_at(t0 + Duration::from_millis(500)).await, "B");
    }

    #[tokio::test]
    async fn test_earlier_clock_reading_is_a_hit() {
        let provider = ScriptedProvider::new(vec!["A", "B"]);
        let cache = cache_with(&provider, Duration::from_millis(500));
        let t0 = Instant::now();

        cache.get_at(t0 + Duration::from_secs(1)).await;
        assert_eq!(&*cache.get_at(t0).await, "A");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_independent_instances() {
        let provider = ScriptedProvider::new(vec!["A", "B", "C"]);
        let first = cache_with(&provider, Duration::from_secs(60));
        let second = cache_with(&provider, Duration::from_secs(60));

        assert_eq!(&*first.get().await, "A");
        assert_eq!(&*second.get().await, "B");
        assert_eq!(&*first.get().await, "A");
        assert_eq!(provider.calls(), 2);
    }

    /// Sleeps before answering "call-N" for its N-th invocation
    struct SlowProvider {
        calls: AtomicUsize,
        latency: Duration,
    }

    #[async_trait]
    impl DiagnosticsProvider for SlowProvider {
        async fn collect(&self) -> String {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.latency).await;
            format!("call-{n}")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_caller_does_not_abort_refresh() {
        let provider = Arc::new(SlowProvider {
            calls: AtomicUsize::new(0),
            latency: Duration::from_millis(200),
        });
        let cache = ThrottlingCache::new(
            Arc::clone(&provider) as Arc<dyn DiagnosticsProvider>,
            Duration::from_secs(60),
        );
        let now = Instant::now();

        // Caller gives up while the provider is still running
        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), cache.get_at(now)).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(&*cache.get_at(now).await, "call-1");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_empty_stats() {
        let provider = ScriptedProvider::new(vec!["A"]);
        let cache = cache_with(&provider, Duration::from_millis(500));

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert!(stats.hit_rate.abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresher_invokes_once_per_window() {
        let provider = ScriptedProvider::new(vec!["A", "B", "C", "D"]);
        let cache = Arc::new(cache_with(&provider, Duration::from_millis(500)));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = spawn_refresher(Arc::clone(&cache), shutdown_rx);

        // Ticks at 0ms, 500ms and 1000ms
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(provider.calls(), 3);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
