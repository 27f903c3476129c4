//! Capacity-bounded deduplication of concurrent calls.
//!
//! A [`MemoizedCallMap`] guarantees that at most one operation per key is in
//! flight at a time: concurrent callers for the same key all await the same
//! shared result. Entries are evicted as soon as the operation settles, so
//! nothing is cached beyond the in-flight window.
//!
//! When a capacity is configured, callers for new keys beyond that capacity
//! wait in a FIFO queue; once the queue itself is full, calls are rejected
//! immediately with [`CallError::CapacityExceeded`].

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// Errors returned by [`MemoizedCallMap::call_by_key`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError<E> {
    #[error("capacity exceeded: {capacity} calls in flight and {queue_capacity} queued")]
    CapacityExceeded {
        capacity: usize,
        queue_capacity: usize,
    },

    #[error("call was dropped before it could start")]
    Cancelled,

    #[error("call aborted: {0}")]
    Aborted(String),

    #[error("{0}")]
    Failed(E),
}

type SharedCall<T, E> = Shared<BoxFuture<'static, Result<T, CallError<E>>>>;
type Operation<T, E> = BoxFuture<'static, Result<T, E>>;

struct State<K, T, E> {
    in_flight: HashMap<K, SharedCall<T, E>>,
    /// Slots handed to queued callers that have not started yet.
    reserved: usize,
    queue: VecDeque<oneshot::Sender<()>>,
}

impl<K, T, E> State<K, T, E> {
    /// Hand a freed slot to the oldest caller still waiting for one.
    fn release_slot(&mut self) {
        while let Some(waiter) = self.queue.pop_front() {
            if waiter.send(()).is_ok() {
                self.reserved += 1;
                return;
            }
        }
    }

    fn prune_abandoned(&mut self) {
        self.queue.retain(|waiter| !waiter.is_closed());
    }
}

struct Inner<K, T, E> {
    state: Mutex<State<K, T, E>>,
    capacity: Option<usize>,
    queue_capacity: Option<usize>,
}

impl<K, T, E> Inner<K, T, E> {
    fn lock(&self) -> MutexGuard<'_, State<K, T, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn has_free_slot(&self, state: &State<K, T, E>) -> bool {
        match self.capacity {
            Some(capacity) => state.in_flight.len() + state.reserved < capacity,
            None => true,
        }
    }
}

/// Removes a settled call from the map and passes its slot on.
///
/// Armed from inside the spawned task so that a task which never runs does
/// not touch the (possibly held) lock while being dropped.
struct Eviction<K: Eq + Hash, T, E> {
    inner: Arc<Inner<K, T, E>>,
    key: K,
}

impl<K: Eq + Hash, T, E> Drop for Eviction<K, T, E> {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        state.in_flight.remove(&self.key);
        state.release_slot();
    }
}

/// A caller's place in the waiting queue.
struct QueueTicket<K, T, E> {
    inner: Arc<Inner<K, T, E>>,
    rx: Option<oneshot::Receiver<()>>,
}

impl<K, T, E> QueueTicket<K, T, E> {
    /// Wait until a slot is handed over. Returns `false` if the map went away.
    async fn wait(&mut self) -> bool {
        let granted = match self.rx.as_mut() {
            Some(rx) => rx.await.is_ok(),
            None => false,
        };
        self.rx = None;
        granted
    }
}

impl<K, T, E> Drop for QueueTicket<K, T, E> {
    fn drop(&mut self) {
        // Abandoned while queued: give back a slot we may have been handed.
        if let Some(mut rx) = self.rx.take() {
            rx.close();
            if rx.try_recv().is_ok() {
                let mut state = self.inner.lock();
                state.reserved = state.reserved.saturating_sub(1);
                state.release_slot();
            }
        }
    }
}

enum Admission<K, T, E> {
    Run(Slot<T, E>),
    Queued(QueueTicket<K, T, E>),
}

/// A call that is either already running or registered and waiting for its
/// operation.
enum Slot<T, E> {
    Joined(SharedCall<T, E>),
    Started(SharedCall<T, E>, oneshot::Sender<Operation<T, E>>),
}

impl<T, E> Slot<T, E> {
    /// Build the operation, if this caller owns the call, and hand it to the
    /// waiting task. Runs with the map unlocked.
    fn run<F, Fut>(self, factory: F) -> SharedCall<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        match self {
            Slot::Joined(call) => call,
            Slot::Started(call, start) => {
                let _ = start.send(factory().boxed());
                call
            }
        }
    }
}

/// Deduplicating, capacity-bounded map of in-flight calls.
pub struct MemoizedCallMap<K, T, E> {
    inner: Arc<Inner<K, T, E>>,
}

impl<K, T, E> Clone for MemoizedCallMap<K, T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, T, E> MemoizedCallMap<K, T, E>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create a map with no bound on concurrently in-flight keys.
    pub fn new() -> Self {
        Self::build(None, None)
    }

    /// Create a map allowing at most `capacity` keys in flight.
    ///
    /// With `queue_capacity = None` the waiting queue is unbounded.
    pub fn with_capacity(capacity: usize, queue_capacity: Option<usize>) -> Self {
        Self::build(Some(capacity.max(1)), queue_capacity)
    }

    fn build(capacity: Option<usize>, queue_capacity: Option<usize>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    in_flight: HashMap::new(),
                    reserved: 0,
                    queue: VecDeque::new(),
                }),
                capacity,
                queue_capacity,
            }),
        }
    }

    /// Run `factory` for `key` unless a call for `key` is already in flight,
    /// in which case the in-flight result is shared.
    ///
    /// The operation runs on its own task: it completes (and is evicted)
    /// even if every caller stops waiting for it. `factory` is called without
    /// the map's lock held, so it may itself use the map.
    pub async fn call_by_key<F, Fut>(&self, key: K, factory: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let slot = match self.admit(&key)? {
            Admission::Run(slot) => slot,
            Admission::Queued(mut ticket) => {
                if !ticket.wait().await {
                    return Err(CallError::Cancelled);
                }
                self.resume(key)
            }
        };
        slot.run(factory).await
    }

    /// Number of keys currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inner.lock().in_flight.len()
    }

    /// Number of callers waiting for a free slot.
    pub fn queued(&self) -> usize {
        let mut state = self.inner.lock();
        state.prune_abandoned();
        state.queue.len()
    }

    fn admit(&self, key: &K) -> Result<Admission<K, T, E>, CallError<E>> {
        let mut state = self.inner.lock();

        if let Some(call) = state.in_flight.get(key) {
            tracing::trace!("joining in-flight call");
            return Ok(Admission::Run(Slot::Joined(call.clone())));
        }

        if self.inner.has_free_slot(&state) {
            return Ok(Admission::Run(self.spawn(&mut state, key.clone())));
        }

        state.prune_abandoned();
        if let Some(queue_capacity) = self.inner.queue_capacity {
            if state.queue.len() >= queue_capacity {
                let capacity = self.inner.capacity.unwrap_or_default();
                tracing::debug!(capacity, queue_capacity, "call rejected, queue full");
                return Err(CallError::CapacityExceeded {
                    capacity,
                    queue_capacity,
                });
            }
        }

        let (tx, rx) = oneshot::channel();
        state.queue.push_back(tx);
        tracing::trace!(queued = state.queue.len(), "call queued");

        Ok(Admission::Queued(QueueTicket {
            inner: Arc::clone(&self.inner),
            rx: Some(rx),
        }))
    }

    /// Start a queued call on the slot it was handed.
    fn resume(&self, key: K) -> Slot<T, E> {
        let mut state = self.inner.lock();
        state.reserved = state.reserved.saturating_sub(1);

        if let Some(call) = state.in_flight.get(&key).cloned() {
            // Someone else started this key while we waited; pass our slot on.
            state.release_slot();
            return Slot::Joined(call);
        }

        self.spawn(&mut state, key)
    }

    /// Register a call for `key` whose task waits for its operation.
    ///
    /// If the operation never arrives (the factory panicked) the call settles
    /// as [`CallError::Cancelled`] and is evicted.
    fn spawn(&self, state: &mut State<K, T, E>, key: K) -> Slot<T, E> {
        let (start, operation) = oneshot::channel::<Operation<T, E>>();
        let inner = Arc::clone(&self.inner);
        let evict_key = key.clone();

        let handle = tokio::spawn(async move {
            let _eviction = Eviction {
                inner,
                key: evict_key,
            };
            match operation.await {
                Ok(operation) => operation.await.map_err(CallError::Failed),
                Err(_) => Err(CallError::Cancelled),
            }
        });

        let call = async move {
            match handle.await {
                Ok(result) => result,
                Err(err) => Err(CallError::Aborted(err.to_string())),
            }
        }
        .boxed()
        .shared();

        state.in_flight.insert(key, call.clone());
        Slot::Started(call, start)
    }
}

impl<K, T, E> Default for MemoizedCallMap<K, T, E>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
