//! Typed, keyed store of query results.
//!
//! Each [`QueryKey`] owns one [`QueryCell`]. A cell publishes its
//! [`QueryEntry`] through a `watch` channel, joins concurrent fetches of the
//! same generation into one in-flight future, and replaces its entry wholesale
//! when a fetch settles.

use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;

use crate::domain::form_options::FormOptions;
use crate::domain::record::Record;
use crate::services::normalizer::{DataSource, FetchIssue, Normalized};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Records,
    Config,
}

impl QueryKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            QueryKey::Records => "records",
            QueryKey::Config => "config",
        }
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot of one query.
#[derive(Debug)]
pub struct QueryEntry<T> {
    pub status: QueryStatus,
    /// Last successfully loaded data; kept while refetching or after an error.
    pub data: Option<Arc<T>>,
    /// Fallback reason on success, failure reason on error.
    pub error: Option<FetchIssue>,
    pub source: Option<DataSource>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Set by an invalidation until the next fetch settles.
    pub stale: bool,
    generation: u64,
}

impl<T> Clone for QueryEntry<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            source: self.source,
            updated_at: self.updated_at,
            stale: self.stale,
            generation: self.generation,
        }
    }
}

impl<T> Default for QueryEntry<T> {
    fn default() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            source: None,
            updated_at: None,
            stale: false,
            generation: 0,
        }
    }
}

impl<T> QueryEntry<T> {
    /// First load still pending: nothing to show yet.
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading && self.data.is_none()
    }

    /// Any fetch pending, including background refetches.
    pub fn is_fetching(&self) -> bool {
        self.status == QueryStatus::Loading
    }
}

/// Outcome of a loader: normalized data, or the reason there is none.
pub type LoadResult<T> = Result<Normalized<T>, FetchIssue>;

struct InFlight<T> {
    generation: u64,
    future: Shared<BoxFuture<'static, QueryEntry<T>>>,
}

pub struct QueryCell<T> {
    key: QueryKey,
    state: watch::Sender<QueryEntry<T>>,
    generation: AtomicU64,
    in_flight: Mutex<Option<InFlight<T>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> QueryCell<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(key: QueryKey) -> Self {
        let (state, _) = watch::channel(QueryEntry::default());
        Self {
            key,
            state,
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
        }
    }

    pub fn key(&self) -> QueryKey {
        self.key
    }

    pub fn snapshot(&self) -> QueryEntry<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryEntry<T>> {
        self.state.subscribe()
    }

    /// Marks the entry stale. Fetches started before this call can no longer
    /// be joined, and their results never replace newer ones.
    pub fn invalidate(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("Invalidated {} query (generation {generation})", self.key);
        self.state.send_modify(|entry| entry.stale = true);
    }

    /// Runs `load` unless a fetch of the current generation is already in
    /// flight, in which case that fetch is awaited instead.
    pub async fn fetch<F>(self: &Arc<Self>, load: F) -> QueryEntry<T>
    where
        F: FnOnce() -> BoxFuture<'static, LoadResult<T>>,
    {
        let future = {
            let mut in_flight = lock(&self.in_flight);
            let generation = self.generation.load(Ordering::SeqCst);

            match in_flight.as_ref() {
                Some(pending) if pending.generation == generation => {
                    log::debug!("Joining in-flight {} query", self.key);
                    pending.future.clone()
                }
                _ => {
                    let cell = Arc::downgrade(self);
                    let loading = load();
                    let future = async move {
                        let outcome = loading.await;
                        match cell.upgrade() {
                            Some(cell) => cell.settle(generation, outcome),
                            None => QueryEntry::default(),
                        }
                    }
                    .boxed()
                    .shared();

                    *in_flight = Some(InFlight {
                        generation,
                        future: future.clone(),
                    });
                    self.state
                        .send_modify(|entry| entry.status = QueryStatus::Loading);
                    future
                }
            }
        };

        future.await
    }

    fn settle(&self, generation: u64, outcome: LoadResult<T>) -> QueryEntry<T> {
        // A newer fetch still running will settle the status itself.
        let newer_pending = {
            let mut in_flight = lock(&self.in_flight);
            if in_flight
                .as_ref()
                .is_some_and(|pending| pending.generation == generation)
            {
                *in_flight = None;
            }
            in_flight
                .as_ref()
                .is_some_and(|pending| pending.generation > generation)
        };

        let newest = self.generation.load(Ordering::SeqCst) == generation;
        self.state.send_modify(|entry| {
            if generation < entry.generation {
                log::debug!("Discarding superseded {} result", self.key);
                return;
            }

            entry.generation = generation;
            entry.updated_at = Some(Utc::now());
            entry.stale = !newest;
            if !newer_pending {
                entry.status = match &outcome {
                    Ok(_) => QueryStatus::Success,
                    Err(_) => QueryStatus::Error,
                };
            }

            match outcome {
                Ok(normalized) => {
                    entry.data = Some(Arc::new(normalized.data));
                    entry.source = Some(normalized.source);
                    entry.error = normalized.issue;
                }
                Err(issue) => {
                    log::error!("Failed to load {} query: {issue}", self.key);
                    entry.error = Some(issue);
                }
            }
        });

        self.snapshot()
    }
}

/// Query cells for every key used by the record screen.
#[derive(Clone)]
pub struct QueryStore {
    records: Arc<QueryCell<Vec<Record>>>,
    config: Arc<QueryCell<FormOptions>>,
}

impl Default for QueryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(QueryCell::new(QueryKey::Records)),
            config: Arc::new(QueryCell::new(QueryKey::Config)),
        }
    }

    pub fn records(&self) -> &Arc<QueryCell<Vec<Record>>> {
        &self.records
    }

    pub fn config(&self) -> &Arc<QueryCell<FormOptions>> {
        &self.config
    }

    pub fn invalidate(&self, key: QueryKey) {
        match key {
            QueryKey::Records => self.records.invalidate(),
            QueryKey::Config => self.config.invalidate(),
        }
    }
}
