//! Per-session state containers: the signed-in user, their listings and their clients.
//!
//! Each container exposes `is_loading` and `error` for the UI, but every
//! operation also returns its own `Result`, so concurrent callers never have
//! to read the shared fields to learn their outcome.

pub mod clients;
pub mod properties;
pub mod user;

pub use clients::ClientsStore;
pub use properties::PropertiesStore;
pub use user::UserStore;

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;

use crate::error::AppError;

/// Loading and error state shared by all calls on one container.
#[derive(Default)]
pub struct Status {
    in_flight: AtomicUsize,
    error: RwLock<Option<String>>,
}

/// One slot of the in-flight count, released on drop.
struct Loading<'a>(&'a AtomicUsize);

impl<'a> Loading<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Status {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while any call on the container is running.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Message of the most recent failure, if the last call to finish failed.
    pub fn error(&self) -> Option<String> {
        self.error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_error(&self, message: impl Into<String>) {
        *self.error.write().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    pub fn clear_error(&self) {
        *self.error.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Run one container operation: mark loading, reset the error, and on
    /// failure log it and record its message before handing it back.
    pub async fn track<T, F>(&self, context: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        let _loading = Loading::enter(&self.in_flight);
        self.clear_error();

        let result = fut.await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "{context}");
            self.set_error(e.to_string());
        }
        result
    }
}

/// One published version of a cached list.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub generation: u64,
    pub items: Arc<Vec<T>>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            items: self.items.clone(),
        }
    }
}

/// A cached list replaced wholesale by fetches.
///
/// Every fetch takes a generation number before it goes out. A result is
/// published only if no later fetch has published first, so an older fetch
/// finishing late cannot overwrite a newer list.
pub struct Listing<T> {
    next_generation: AtomicU64,
    snapshot: watch::Sender<Snapshot<T>>,
}

impl<T> Listing<T> {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Snapshot {
            generation: 0,
            items: Arc::new(Vec::new()),
        });
        Self {
            next_generation: AtomicU64::new(1),
            snapshot,
        }
    }

    /// Reserve a generation for a fetch about to start.
    pub fn begin(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst)
    }

    /// Publish a fetch result. Returns false if a newer generation is already published.
    pub fn publish(&self, generation: u64, items: Arc<Vec<T>>) -> bool {
        let published = self.snapshot.send_if_modified(|current| {
            if generation <= current.generation {
                return false;
            }
            *current = Snapshot { generation, items };
            true
        });
        if !published {
            tracing::debug!(generation, "Discarding stale list fetch");
        }
        published
    }

    /// Drop the entries matching `remove`. Fetches begun before this call are
    /// invalidated, since they may have read the entries before removal.
    pub fn remove_where(&self, remove: impl Fn(&T) -> bool)
    where
        T: Clone,
    {
        let generation = self.begin();
        self.snapshot.send_modify(|current| {
            let items = current.items.iter().filter(|item| !remove(item)).cloned().collect();
            *current = Snapshot {
                generation,
                items: Arc::new(items),
            };
        });
    }

    pub fn items(&self) -> Arc<Vec<T>> {
        self.snapshot.borrow().items.clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.snapshot.subscribe()
    }
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self::new()
    }
}
