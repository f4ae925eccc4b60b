// ── View-query cache ──
//
// One entry per `QueryKey`, holding the last good value, at most one
// shared in-flight request, the last error, and a generation number.
// Reads never hold a map guard across an await: the entry is inspected
// and updated synchronously, then the caller awaits outside the lock.
//
// A request settles into its entry only if the entry's generation still
// matches the one it was started with. Invalidation and `clear` bump the
// generation, so a response that was in flight at that moment is handed
// to the callers already waiting on it and otherwise discarded.
//
// A 401 from any request, including a background refresh nobody awaits,
// drops every entry: the session is gone and no cached value belongs to
// the next identity.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::invalidation::Mutation;
use super::key::{KeyPattern, QueryKey};
use crate::error::CoreError;
use crate::stream::CacheEvents;

/// How long a value counts as fresh unless configured otherwise.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(30);

const EVENT_CAPACITY: usize = 256;

type AnyValue = Arc<dyn Any + Send + Sync>;
type InFlight = Shared<BoxFuture<'static, Result<AnyValue, CoreError>>>;

/// Observable state of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    /// Never fetched, or invalidated before any value arrived.
    Empty,
    /// A request is in flight and the next read will wait for it.
    Loading,
    Fresh,
    /// A value is available but due for refresh. Invalidated values stay
    /// here until the next read refetches them.
    ///
    /// If the background refresh of a stale value fails, the value is kept
    /// and the key stays `Stale` without further refreshes until
    /// [`QueryCache::refetch`] or invalidation. [`QueryCache::error`] then
    /// returns the failure, and [`QueryCache::is_fetching`] is false.
    Stale,
    /// The last request failed and there is no usable value.
    Error,
}

/// Change notification published on [`QueryCache::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Loaded(QueryKey),
    Failed(QueryKey),
    Invalidated(QueryKey),
    Cleared,
}

impl CacheEvent {
    pub fn key(&self) -> Option<&QueryKey> {
        match self {
            Self::Loaded(k) | Self::Failed(k) | Self::Invalidated(k) => Some(k),
            Self::Cleared => None,
        }
    }
}

#[derive(Default)]
struct Entry {
    value: Option<AnyValue>,
    fetched_at: Option<Instant>,
    invalidated: bool,
    error: Option<CoreError>,
    in_flight: Option<InFlight>,
    generation: u64,
}

impl Entry {
    fn is_fresh(&self, stale_time: Duration) -> bool {
        !self.invalidated && self.fetched_at.is_some_and(|at| at.elapsed() < stale_time)
    }
}

enum Lookup {
    Ready(AnyValue),
    Failed(CoreError),
    Wait(InFlight),
}

/// Shared cache of remote reads keyed by [`QueryKey`].
///
/// Cheaply cloneable; clones share entries. Must be used from within a
/// Tokio runtime because requests are driven by spawned tasks.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    entries: DashMap<QueryKey, Entry>,
    stale_time: Duration,
    generations: AtomicU64,
    requests: AtomicU64,
    events: broadcast::Sender<CacheEvent>,
    cancel: CancellationToken,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.inner.entries.len())
            .field("stale_time", &self.inner.stale_time)
            .finish_non_exhaustive()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self::with_cancellation(stale_time, CancellationToken::new())
    }

    /// Request driver tasks stop when `cancel` fires.
    pub fn with_cancellation(stale_time: Duration, cancel: CancellationToken) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(CacheInner {
                entries: DashMap::new(),
                stale_time,
                generations: AtomicU64::new(0),
                requests: AtomicU64::new(0),
                events,
                cancel,
            }),
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.inner.stale_time
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Read `key`, using `fut` only if a request has to be made.
    ///
    /// Fresh values are returned as-is. Values past the stale time are
    /// returned and a background refresh is started. Without a usable value
    /// (never fetched, or invalidated) the caller joins the key's in-flight
    /// request, starting one if needed. A recorded error is returned again
    /// until [`refetch`](Self::refetch) or invalidation.
    pub async fn fetch<T, Fut>(&self, key: QueryKey, fut: Fut) -> Result<Arc<T>, CoreError>
    where
        T: Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let lookup = {
            let mut entry = self.inner.entries.entry(key.clone()).or_default();
            match entry.value.clone() {
                Some(value) if !entry.invalidated => {
                    let refresh = !entry.is_fresh(self.inner.stale_time)
                        && entry.in_flight.is_none()
                        && entry.error.is_none();
                    if refresh {
                        trace!(%key, "stale, refreshing in background");
                        let _refresh = self.start(&key, &mut entry, fut);
                    }
                    Lookup::Ready(value)
                }
                _ => {
                    if let Some(err) = entry.error.clone() {
                        Lookup::Failed(err)
                    } else if let Some(in_flight) = entry.in_flight.clone() {
                        trace!(%key, "joining in-flight request");
                        Lookup::Wait(in_flight)
                    } else {
                        Lookup::Wait(self.start(&key, &mut entry, fut))
                    }
                }
            }
        };

        match lookup {
            Lookup::Ready(value) => downcast(&key, value),
            Lookup::Failed(err) => Err(err),
            Lookup::Wait(in_flight) => downcast(&key, in_flight.await?),
        }
    }

    /// Manual refresh: join the in-flight request or start a new one,
    /// regardless of freshness. Clears a recorded error.
    pub async fn refetch<T, Fut>(&self, key: QueryKey, fut: Fut) -> Result<Arc<T>, CoreError>
    where
        T: Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let in_flight = {
            let mut entry = self.inner.entries.entry(key.clone()).or_default();
            match entry.in_flight.clone() {
                Some(in_flight) => in_flight,
                None => self.start(&key, &mut entry, fut),
            }
        };
        downcast(&key, in_flight.await?)
    }

    /// The cached value for `key`, fresh or not, without fetching.
    pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let value = self.inner.entries.get(key)?.value.clone()?;
        value.downcast::<T>().ok()
    }

    pub fn state(&self, key: &QueryKey) -> QueryState {
        let Some(entry) = self.inner.entries.get(key) else {
            return QueryState::Empty;
        };
        if entry.value.is_some() && !entry.invalidated {
            if entry.is_fresh(self.inner.stale_time) {
                QueryState::Fresh
            } else {
                QueryState::Stale
            }
        } else if entry.in_flight.is_some() {
            QueryState::Loading
        } else if entry.error.is_some() {
            QueryState::Error
        } else if entry.value.is_some() {
            QueryState::Stale
        } else {
            QueryState::Empty
        }
    }

    /// The error recorded by the last request for `key`, if it failed.
    pub fn error(&self, key: &QueryKey) -> Option<CoreError> {
        self.inner.entries.get(key)?.error.clone()
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner
            .entries
            .get(key)
            .is_some_and(|e| e.in_flight.is_some())
    }

    /// Number of requests started since creation.
    pub fn requests_started(&self) -> u64 {
        self.inner.requests.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    // ── Invalidation ─────────────────────────────────────────────────

    /// Mark every matching entry stale, detach its in-flight request and
    /// forget its error. Returns the number of entries touched.
    pub fn invalidate(&self, pattern: &KeyPattern) -> usize {
        let mut touched = Vec::new();
        for mut item in self.inner.entries.iter_mut() {
            if !pattern.matches(item.key()) {
                continue;
            }
            let key = item.key().clone();
            let entry = item.value_mut();
            entry.invalidated = true;
            entry.error = None;
            entry.in_flight = None;
            entry.generation = self.inner.next_generation();
            touched.push(key);
        }

        for key in &touched {
            trace!(%key, "invalidated");
            let _ = self.inner.events.send(CacheEvent::Invalidated(key.clone()));
        }
        touched.len()
    }

    /// Apply the invalidation graph for a successful mutation.
    pub fn invalidate_for(&self, mutation: Mutation) {
        if mutation.changes_identity() {
            self.clear();
            return;
        }
        let touched: usize = mutation
            .invalidates()
            .iter()
            .map(|pattern| self.invalidate(pattern))
            .sum();
        debug!(?mutation, touched, "applied mutation invalidation");
    }

    /// Drop every entry. In-flight responses are discarded on arrival.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Stream of cache changes from now on.
    pub fn subscribe(&self) -> CacheEvents {
        CacheEvents::new(self.inner.events.subscribe())
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Register a new in-flight request for `key` and spawn its driver so
    /// it settles even if every caller goes away.
    fn start<T, Fut>(&self, key: &QueryKey, entry: &mut Entry, fut: Fut) -> InFlight
    where
        T: Send + Sync + 'static,
        Fut: Future<Output = Result<T, CoreError>> + Send + 'static,
    {
        let generation = self.inner.next_generation();
        entry.generation = generation;
        entry.error = None;
        self.inner.requests.fetch_add(1, Ordering::Relaxed);
        trace!(%key, generation, "starting request");

        let cache = Arc::downgrade(&self.inner);
        let settle_key = key.clone();
        let in_flight = async move {
            let result = fut.await.map(|value| Arc::new(value) as AnyValue);
            if let Some(inner) = cache.upgrade() {
                inner.settle(&settle_key, generation, &result);
            }
            result
        }
        .boxed()
        .shared();
        entry.in_flight = Some(in_flight.clone());

        let driver = in_flight.clone();
        let cancel = self.inner.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                _ = driver => {}
            }
        });

        in_flight
    }
}

impl CacheInner {
    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn clear(&self) {
        self.entries.clear();
        debug!("query cache cleared");
        let _ = self.events.send(CacheEvent::Cleared);
    }

    fn settle(&self, key: &QueryKey, generation: u64, result: &Result<AnyValue, CoreError>) {
        if matches!(result, Err(err) if err.is_unauthorized()) {
            debug!(%key, "credentials rejected, dropping cached data");
            self.clear();
            return;
        }

        let event = {
            let Some(mut entry) = self.entries.get_mut(key) else {
                trace!(%key, "entry gone, discarding response");
                return;
            };
            if entry.generation != generation {
                trace!(%key, generation, "superseded, discarding response");
                return;
            }
            entry.in_flight = None;
            match result {
                Ok(value) => {
                    entry.value = Some(Arc::clone(value));
                    entry.fetched_at = Some(Instant::now());
                    entry.invalidated = false;
                    entry.error = None;
                    CacheEvent::Loaded(key.clone())
                }
                Err(err) => {
                    debug!(%key, error = %err, "query failed");
                    entry.error = Some(err.clone());
                    CacheEvent::Failed(key.clone())
                }
            }
        };
        let _ = self.events.send(event);
    }
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, value: AnyValue) -> Result<Arc<T>, CoreError> {
    value
        .downcast::<T>()
        .map_err(|_| CoreError::Internal(format!("cached value for {key} has an unexpected type")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use futures_util::future::join_all;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::FarmId;

    fn counted(
        calls: &Arc<AtomicUsize>,
        delay: Duration,
        value: u32,
    ) -> impl Future<Output = Result<u32, CoreError>> + Send + 'static {
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            Ok(value)
        }
    }

    fn failing(calls: &Arc<AtomicUsize>) -> impl Future<Output = Result<u32, CoreError>> + Send + 'static {
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::Api {
                message: "boom".into(),
                status: Some(500),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_reads_share_one_request() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let reads = (0..8).map(|_| {
            cache.fetch(
                QueryKey::Farms,
                counted(&calls, Duration::from_millis(50), 7),
            )
        });
        let results = join_all(reads).await;

        assert!(results.iter().all(|r| **r.as_ref().unwrap() == 7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.requests_started(), 1);
        assert_eq!(cache.state(&QueryKey::Farms), QueryState::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn different_keys_fetch_independently() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let a = cache.fetch(QueryKey::Farm(FarmId::new(1)), counted(&calls, Duration::ZERO, 1));
        let b = cache.fetch(QueryKey::Farm(FarmId::new(2)), counted(&calls, Duration::ZERO, 2));
        let (a, b) = tokio::join!(a, b);

        assert_eq!((*a.unwrap(), *b.unwrap()), (1, 2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_value_is_served_while_refreshing() {
        let cache = QueryCache::new(Duration::from_secs(30));
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::Farms;

        cache.fetch(key.clone(), counted(&calls, Duration::ZERO, 1)).await.unwrap();
        let again = cache.fetch(key.clone(), counted(&calls, Duration::ZERO, 99)).await.unwrap();
        assert_eq!(*again, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1, "fresh value must not refetch");

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(cache.state(&key), QueryState::Stale);

        let mut events = cache.subscribe();
        let stale = cache.fetch(key.clone(), counted(&calls, Duration::ZERO, 2)).await.unwrap();
        assert_eq!(*stale, 1);

        assert_eq!(events.recv().await, Some(CacheEvent::Loaded(key.clone())));
        assert_eq!(*cache.peek::<u32>(&key).unwrap(), 2);
        assert_eq!(cache.state(&key), QueryState::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_discards_in_flight_response() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::FarmCrops(FarmId::new(1));

        let slow = tokio::spawn({
            let cache = cache.clone();
            let fut = counted(&calls, Duration::from_millis(100), 1);
            let key = key.clone();
            async move { cache.fetch(key, fut).await }
        });
        tokio::task::yield_now().await;
        assert_eq!(cache.state(&key), QueryState::Loading);

        assert_eq!(cache.invalidate(&KeyPattern::Exact(key.clone())), 1);
        let fresh = cache
            .fetch(key.clone(), counted(&calls, Duration::from_millis(10), 2))
            .await
            .unwrap();
        assert_eq!(*fresh, 2);

        // The original waiter still gets the response it asked for.
        assert_eq!(*slow.await.unwrap().unwrap(), 1);
        assert_eq!(*cache.peek::<u32>(&key).unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn read_after_invalidation_waits_for_new_data() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::Farms;

        cache.fetch(key.clone(), counted(&calls, Duration::ZERO, 1)).await.unwrap();
        cache.invalidate(&KeyPattern::All);
        assert_eq!(cache.state(&key), QueryState::Stale);
        assert_eq!(*cache.peek::<u32>(&key).unwrap(), 1);

        let value = cache
            .fetch(key.clone(), counted(&calls, Duration::from_millis(20), 2))
            .await
            .unwrap();
        assert_eq!(*value, 2);
        assert_eq!(cache.state(&key), QueryState::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_are_sticky_until_refetch() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::CurrentUser;

        assert!(cache.fetch(key.clone(), failing(&calls)).await.is_err());
        assert_eq!(cache.state(&key), QueryState::Error);

        let again = cache.fetch(key.clone(), counted(&calls, Duration::ZERO, 5)).await;
        assert!(matches!(again, Err(CoreError::Api { status: Some(500), .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1, "no automatic retry");

        let retried = cache
            .refetch(key.clone(), counted(&calls, Duration::ZERO, 5))
            .await
            .unwrap();
        assert_eq!(*retried, 5);
        assert!(cache.error(&key).is_none());
        assert_eq!(cache.state(&key), QueryState::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_clears_errors() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::Farms;

        assert!(cache.fetch(key.clone(), failing(&calls)).await.is_err());
        cache.invalidate_for(Mutation::CreateFarm);
        assert_eq!(cache.state(&key), QueryState::Empty);

        let value = cache.fetch(key, counted(&calls, Duration::ZERO, 3)).await.unwrap();
        assert_eq!(*value, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn mutation_invalidation_is_scoped() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let one = FarmId::new(1);
        let two = FarmId::new(2);

        for key in [QueryKey::FarmCrops(one), QueryKey::FarmCrops(two), QueryKey::FarmWeather(one)] {
            cache.fetch(key, counted(&calls, Duration::ZERO, 0)).await.unwrap();
        }
        let mut events = cache.subscribe();
        cache.invalidate_for(Mutation::CreateCrop { farm: one });

        assert_eq!(cache.state(&QueryKey::FarmCrops(one)), QueryState::Stale);
        assert_eq!(cache.state(&QueryKey::FarmCrops(two)), QueryState::Fresh);
        assert_eq!(cache.state(&QueryKey::FarmWeather(one)), QueryState::Fresh);
        assert_eq!(
            events.recv().await,
            Some(CacheEvent::Invalidated(QueryKey::FarmCrops(one)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn sign_out_clears_everything() {
        let cache = QueryCache::default();
        let calls = Arc::new(AtomicUsize::new(0));

        cache.fetch(QueryKey::CurrentUser, counted(&calls, Duration::ZERO, 1)).await.unwrap();
        let mut events = cache.subscribe();
        cache.invalidate_for(Mutation::SignOut);

        assert!(cache.is_empty());
        assert!(cache.peek::<u32>(&QueryKey::CurrentUser).is_none());
        assert_eq!(events.recv().await, Some(CacheEvent::Cleared));
    }

    fn rejected() -> impl Future<Output = Result<u32, CoreError>> + Send + 'static {
        async {
            Err(CoreError::Unauthorized {
                message: "token expired".into(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn background_unauthorized_drops_stale_values() {
        let cache = QueryCache::new(Duration::from_secs(30));
        let calls = Arc::new(AtomicUsize::new(0));
        let farms = QueryKey::Farms;
        let user = QueryKey::CurrentUser;

        cache.fetch(farms.clone(), counted(&calls, Duration::ZERO, 1)).await.unwrap();
        cache.fetch(user.clone(), counted(&calls, Duration::ZERO, 1)).await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;

        let mut events = cache.subscribe();
        let stale = cache.fetch(farms.clone(), rejected()).await.unwrap();
        assert_eq!(*stale, 1);
        assert_eq!(events.recv().await, Some(CacheEvent::Cleared));

        assert!(cache.is_empty());
        assert!(cache.peek::<u32>(&user).is_none());
        let next = cache.fetch(farms.clone(), rejected()).await;
        assert!(matches!(next, Err(CoreError::Unauthorized { .. })));
        assert!(cache.peek::<u32>(&farms).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_background_refresh_keeps_value_and_records_error() {
        let cache = QueryCache::new(Duration::from_secs(30));
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::Farms;

        cache.fetch(key.clone(), counted(&calls, Duration::ZERO, 1)).await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;

        let mut events = cache.subscribe();
        assert_eq!(*cache.fetch(key.clone(), failing(&calls)).await.unwrap(), 1);
        assert_eq!(events.recv().await, Some(CacheEvent::Failed(key.clone())));

        assert_eq!(cache.state(&key), QueryState::Stale);
        assert!(!cache.is_fetching(&key));
        assert!(cache.error(&key).is_some());

        // No automatic retry while the error is recorded.
        let again = cache.fetch(key.clone(), counted(&calls, Duration::ZERO, 9)).await.unwrap();
        assert_eq!(*again, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn type_mismatch_is_an_internal_error() {
        let cache = QueryCache::default();
        cache.fetch(QueryKey::Farms, async { Ok(1_u32) }).await.unwrap();

        let wrong = cache
            .fetch::<String, _>(QueryKey::Farms, async { Ok(String::new()) })
            .await;
        assert!(matches!(wrong, Err(CoreError::Internal(_))));
    }
}
