//! Async resource cells: a read model (`ApiQuery`) and a write model
//! (`ApiMutation`) over any promise-shaped call.
//!
//! # Design
//! A query owns one `ResourceState` and a dependency value. Firing it marks the
//! cell loading, runs the fetcher, and applies the outcome: data on success,
//! an error message on failure with the previous data left in place.
//!
//! Every fire takes a fresh generation number. When an older call resolves
//! after a newer one was issued, its outcome is dropped, so the cell always
//! reflects the latest request and `loading` stays set until that request
//! resolves.
//!
//! No lock is held across an await: state is read, the fetch runs unlocked,
//! state is written back.
//!
//! A call future dropped before it resolves (a timeout, a cancelled task)
//! still clears `loading`: a guard owned by the call settles the cell on drop.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::cache::QueryCache;
use crate::envelope::Envelope;
use crate::error::ApiError;

/// The `{ data, loading, error }` triple a screen renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

type Fetcher<D, T> =
    Arc<dyn Fn(&D) -> BoxFuture<'static, Result<Envelope<T>, ApiError>> + Send + Sync>;

type KeyFn<D> = Arc<dyn Fn(&D) -> String + Send + Sync>;

struct QueryInner<D, T> {
    deps: D,
    state: ResourceState<T>,
    generation: u64,
}

struct CacheBinding<D> {
    cache: QueryCache,
    key: KeyFn<D>,
}

impl<D> Clone for CacheBinding<D> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            key: Arc::clone(&self.key),
        }
    }
}

/// Read model bound to a dependency value.
pub struct ApiQuery<D, T> {
    fetcher: Fetcher<D, T>,
    inner: Arc<Mutex<QueryInner<D, T>>>,
    immediate: bool,
    cache: Option<CacheBinding<D>>,
}

impl<D, T> Clone for ApiQuery<D, T> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            inner: Arc::clone(&self.inner),
            immediate: self.immediate,
            cache: self.cache.clone(),
        }
    }
}

impl<D, T> ApiQuery<D, T>
where
    D: Clone + PartialEq + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(deps: D, fetch: F) -> Self
    where
        F: Fn(&D) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Envelope<T>, ApiError>> + Send + 'static,
    {
        Self {
            fetcher: Arc::new(move |deps: &D| fetch(deps).boxed()),
            inner: Arc::new(Mutex::new(QueryInner {
                deps,
                state: ResourceState::default(),
                generation: 0,
            })),
            immediate: true,
            cache: None,
        }
    }

    /// Whether `mount` and dependency changes fire automatically.
    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Share results through `cache` under the key derived from the deps.
    pub fn with_cache<K>(mut self, cache: QueryCache, key: K) -> Self
    where
        K: Fn(&D) -> String + Send + Sync + 'static,
    {
        self.cache = Some(CacheBinding {
            cache,
            key: Arc::new(key),
        });
        self
    }

    pub async fn mount(&self) {
        if self.immediate {
            self.refetch().await;
        }
    }

    /// Replace the dependency value; fires when it changed and the query is
    /// immediate.
    pub async fn set_dependencies(&self, deps: D) {
        let changed = {
            let mut inner = self.lock();
            if inner.deps == deps {
                false
            } else {
                inner.deps = deps;
                true
            }
        };
        if changed && self.immediate {
            self.refetch().await;
        }
    }

    pub async fn refetch(&self) {
        let (generation, deps) = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.state.loading = true;
            inner.state.error = None;
            if let Some(cached) = self.cached(&inner.deps) {
                inner.state.data = Some(cached);
            }
            (inner.generation, inner.deps.clone())
        };

        let pending = PendingFetch {
            inner: &self.inner,
            generation,
        };
        let outcome = (self.fetcher)(&deps).await.and_then(Envelope::into_data);
        std::mem::forget(pending);

        let mut inner = self.lock();
        if generation != inner.generation {
            tracing::debug!(
                generation,
                latest = inner.generation,
                "discarding superseded response"
            );
            return;
        }
        inner.state.loading = false;
        match outcome {
            Ok(data) => {
                if let Some(binding) = &self.cache {
                    binding.cache.insert(&(binding.key)(&deps), data.clone());
                }
                inner.state.data = Some(data);
            }
            Err(e) => {
                tracing::warn!(error = %e, "query failed, keeping previous data");
                inner.state.error = Some(e.to_string());
            }
        }
    }

    pub fn state(&self) -> ResourceState<T> {
        self.lock().state.clone()
    }

    pub fn data(&self) -> Option<T> {
        self.lock().state.data.clone()
    }

    pub fn loading(&self) -> bool {
        self.lock().state.loading
    }

    pub fn error(&self) -> Option<String> {
        self.lock().state.error.clone()
    }

    pub fn dependencies(&self) -> D {
        self.lock().deps.clone()
    }

    fn cached(&self, deps: &D) -> Option<T> {
        let binding = self.cache.as_ref()?;
        binding.cache.get::<T>(&(binding.key)(deps))
    }

    fn lock(&self) -> MutexGuard<'_, QueryInner<D, T>> {
        lock(&self.inner)
    }
}

fn lock<X>(mutex: &Mutex<X>) -> MutexGuard<'_, X> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Held across a query's fetch; clears `loading` if the fetch is dropped
/// while it is still the latest one.
struct PendingFetch<'a, D, T> {
    inner: &'a Mutex<QueryInner<D, T>>,
    generation: u64,
}

impl<D, T> Drop for PendingFetch<'_, D, T> {
    fn drop(&mut self) {
        let mut inner = lock(self.inner);
        if inner.generation == self.generation {
            tracing::debug!(generation = self.generation, "fetch dropped before it resolved");
            inner.state.loading = false;
        }
    }
}

type Call<I, T> = Arc<dyn Fn(I) -> BoxFuture<'static, Result<Envelope<T>, ApiError>> + Send + Sync>;

#[derive(Debug, Default)]
struct MutationInner {
    in_flight: usize,
    error: Option<String>,
}

/// Write model: never fires on its own, surfaces failures to the caller.
pub struct ApiMutation<I, T> {
    call: Call<I, T>,
    inner: Arc<Mutex<MutationInner>>,
    invalidates: Option<(QueryCache, Vec<String>)>,
}

impl<I, T> Clone for ApiMutation<I, T> {
    fn clone(&self) -> Self {
        Self {
            call: Arc::clone(&self.call),
            inner: Arc::clone(&self.inner),
            invalidates: self.invalidates.clone(),
        }
    }
}

impl<I, T> ApiMutation<I, T>
where
    I: Send + 'static,
    T: Send + 'static,
{
    pub fn new<F, Fut>(call: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Envelope<T>, ApiError>> + Send + 'static,
    {
        Self {
            call: Arc::new(move |input: I| call(input).boxed()),
            inner: Arc::new(Mutex::new(MutationInner::default())),
            invalidates: None,
        }
    }

    /// Drop cache keys under each prefix after every successful call.
    pub fn invalidates(mut self, cache: QueryCache, prefixes: &[&str]) -> Self {
        let prefixes = prefixes.iter().map(|p| p.to_string()).collect();
        self.invalidates = Some((cache, prefixes));
        self
    }

    /// Run the call. The error is recorded on the cell and also returned.
    pub async fn mutate(&self, input: I) -> Result<T, ApiError> {
        {
            let mut inner = self.lock();
            inner.in_flight += 1;
            inner.error = None;
        }

        let in_flight = InFlight(&self.inner);
        let outcome = (self.call)(input).await.and_then(Envelope::into_data);
        std::mem::forget(in_flight);

        let mut inner = self.lock();
        inner.in_flight -= 1;
        match outcome {
            Ok(data) => {
                drop(inner);
                if let Some((cache, prefixes)) = &self.invalidates {
                    for prefix in prefixes {
                        cache.invalidate_prefix(prefix);
                    }
                }
                Ok(data)
            }
            Err(e) => {
                tracing::warn!(error = %e, "mutation failed");
                inner.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn loading(&self) -> bool {
        self.lock().in_flight > 0
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MutationInner> {
        lock(&self.inner)
    }
}

/// Gives back one in-flight slot if a mutation is dropped mid-call.
struct InFlight<'a>(&'a Mutex<MutationInner>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.0).in_flight -= 1;
    }
}
