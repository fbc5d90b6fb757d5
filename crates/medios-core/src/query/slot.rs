//! Last-call-wins request slots.
//!
//! A slot is the single place a view reads one kind of result from. Every
//! request issued against it takes a ticket; only the newest ticket may
//! publish. A slower, older request that resolves late is dropped, so the
//! published state always reflects the most recent call.

use super::state::QueryResult;
use crate::error::QueryError;
use lru::LruCache;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Published when the caller awaiting a request goes away before it resolves.
pub const ABANDONED_MESSAGE: &str = "La solicitud fue abandonada antes de completarse.";

/// Slots kept by a [`SlotRegistry`] unless configured otherwise.
pub const DEFAULT_SLOT_CAPACITY: usize = 256;

/// Proof of having started a request on a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Default)]
struct Generation {
    current: u64,
    settled: bool,
}

struct SlotInner<T> {
    key: String,
    generation: Mutex<Generation>,
    tx: watch::Sender<QueryResult<T>>,
}

/// Cheap to clone; clones share the same state.
pub struct QuerySlot<T> {
    inner: Arc<SlotInner<T>>,
}

impl<T> Clone for QuerySlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> QuerySlot<T> {
    pub fn new(key: impl Into<String>) -> Self {
        let (tx, _) = watch::channel(QueryResult::Idle);
        Self {
            inner: Arc::new(SlotInner {
                key: key.into(),
                generation: Mutex::new(Generation::default()),
                tx,
            }),
        }
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Start a request. Supersedes any request still in flight and moves the
    /// slot to `Loading`.
    pub fn begin(&self) -> Ticket {
        let mut gen = self.lock();
        gen.current += 1;
        gen.settled = false;
        self.inner.tx.send_replace(QueryResult::Loading);
        Ticket {
            generation: gen.current,
        }
    }

    /// Publish the outcome of the request behind `ticket`.
    ///
    /// Returns false, leaving the slot untouched, when the ticket has been
    /// superseded or already completed, or when `result` is not terminal.
    pub fn complete(&self, ticket: Ticket, result: QueryResult<T>) -> bool {
        if !result.is_terminal() {
            return false;
        }

        let mut gen = self.lock();
        if gen.current != ticket.generation || gen.settled {
            log::warn!(
                "Slot '{}': dropping result of generation {} (current {})",
                self.inner.key,
                ticket.generation,
                gen.current
            );
            return false;
        }
        gen.settled = true;
        self.inner.tx.send_replace(result);
        true
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.lock().current == ticket.generation
    }

    pub fn state(&self) -> QueryResult<T> {
        self.inner.tx.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.tx.borrow().is_loading()
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryResult<T>> {
        self.inner.tx.subscribe()
    }

    /// Begin, await `fut`, complete. Returns the result if it was published,
    /// `None` if a newer request superseded this one meanwhile.
    ///
    /// If the returned future is dropped before `fut` resolves and no newer
    /// request has started, the slot settles on a network failure carrying
    /// [`ABANDONED_MESSAGE`] instead of staying `Loading`.
    pub async fn run<F>(&self, fut: F) -> Option<QueryResult<T>>
    where
        F: Future<Output = QueryResult<T>>,
    {
        let mut in_flight = InFlight {
            slot: self,
            ticket: self.begin(),
            resolved: false,
        };
        let result = fut.await;
        in_flight.resolved = true;
        if self.complete(in_flight.ticket, result.clone()) {
            Some(result)
        } else {
            None
        }
    }

    fn abandon(&self, ticket: Ticket) {
        let mut gen = self.lock();
        if gen.current != ticket.generation || gen.settled {
            return;
        }
        log::warn!(
            "Slot '{}': generation {} abandoned while loading",
            self.inner.key,
            ticket.generation
        );
        gen.settled = true;
        self.inner
            .tx
            .send_replace(QueryResult::Failure(QueryError::network(ABANDONED_MESSAGE)));
    }

    /// Back to `Idle`; any request in flight is superseded.
    pub fn reset(&self) {
        let mut gen = self.lock();
        gen.current += 1;
        gen.settled = true;
        self.inner.tx.send_replace(QueryResult::Idle);
    }

    fn lock(&self) -> MutexGuard<'_, Generation> {
        self.inner
            .generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Settles the slot if `run` is dropped mid-flight.
struct InFlight<'a, T: Clone> {
    slot: &'a QuerySlot<T>,
    ticket: Ticket,
    resolved: bool,
}

impl<T: Clone> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if !self.resolved {
            self.slot.abandon(self.ticket);
        }
    }
}

/// Named slots, created on first use.
///
/// Holds at most `capacity` slots. Making room evicts the least recently
/// used slot that is not loading, or the least recently used one when every
/// slot is loading. Handles to an evicted slot keep working; it is only
/// forgotten by the registry.
pub struct SlotRegistry<T> {
    slots: Mutex<LruCache<String, QuerySlot<T>>>,
}

impl<T> Default for SlotRegistry<T> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SLOT_CAPACITY)
    }
}

impl<T> SlotRegistry<T> {
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            slots: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl<T: Clone> SlotRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, key: &str) -> QuerySlot<T> {
        let mut slots = self.lock();
        if let Some(slot) = slots.get(key) {
            return slot.clone();
        }

        if slots.len() >= slots.cap().get() {
            let idle = slots
                .iter()
                .rev()
                .find(|(_, slot)| !slot.is_loading())
                .map(|(key, _)| key.clone());
            let evicted = match idle {
                Some(idle) => slots.pop(&idle).map(|_| idle),
                None => slots.pop_lru().map(|(key, _)| key),
            };
            if let Some(evicted) = evicted {
                log::debug!("Evicted slot '{}'", evicted);
            }
        }

        let slot = QuerySlot::new(key);
        slots.put(key.to_string(), slot.clone());
        slot
    }

    pub fn get(&self, key: &str) -> Option<QuerySlot<T>> {
        self.lock().get(key).cloned()
    }

    /// Current state of every slot, sorted by key.
    pub fn snapshot(&self) -> Vec<(String, QueryResult<T>)> {
        let slots = self.lock();
        let mut out: Vec<_> = slots
            .iter()
            .map(|(key, slot)| (key.clone(), slot.state()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, QuerySlot<T>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryErrorKind;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[test]
    fn test_begin_then_complete() {
        let slot: QuerySlot<u32> = QuerySlot::new("headlines");
        assert!(slot.state().is_idle());

        let t = slot.begin();
        assert!(slot.state().is_loading());
        assert!(slot.complete(t, QueryResult::Success(7)));
        assert_eq!(slot.state(), QueryResult::Success(7));

        // A ticket completes once.
        assert!(!slot.complete(t, QueryResult::Success(8)));
        assert_eq!(slot.state(), QueryResult::Success(7));
    }

    #[test]
    fn test_stale_ticket_is_dropped() {
        let slot: QuerySlot<&str> = QuerySlot::new("analysis");
        let a = slot.begin();
        let b = slot.begin();
        assert!(!slot.is_current(a));

        assert!(slot.complete(b, QueryResult::Success("B")));
        assert!(!slot.complete(a, QueryResult::Success("A")));
        assert_eq!(slot.state(), QueryResult::Success("B"));
    }

    #[test]
    fn test_stale_failure_does_not_clobber_loading() {
        let slot: QuerySlot<u8> = QuerySlot::new("geo");
        let a = slot.begin();
        let _b = slot.begin();
        assert!(!slot.complete(a, QueryResult::Failure(QueryError::unknown("late"))));
        assert!(slot.state().is_loading());
    }

    #[test]
    fn test_non_terminal_results_are_refused() {
        let slot: QuerySlot<u8> = QuerySlot::new("x");
        let t = slot.begin();
        assert!(!slot.complete(t, QueryResult::Idle));
        assert!(!slot.complete(t, QueryResult::Loading));
        assert!(slot.complete(t, QueryResult::Success(1)));
    }

    #[test]
    fn test_reset_supersedes_in_flight() {
        let slot: QuerySlot<u8> = QuerySlot::new("x");
        let t = slot.begin();
        slot.reset();
        assert!(!slot.complete(t, QueryResult::Success(1)));
        assert!(slot.state().is_idle());
    }

    #[tokio::test]
    async fn test_earlier_request_resolving_last_is_ignored() {
        let slot: QuerySlot<&'static str> = QuerySlot::new("headlines");
        let (tx_a, rx_a) = oneshot::channel();

        let first = {
            let slot = slot.clone();
            tokio::spawn(async move {
                slot.run(async move { QueryResult::Success(rx_a.await.unwrap_or("A")) })
                    .await
            })
        };
        // Let the first request take its ticket before the second.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let second = slot.run(async { QueryResult::Success("B") }).await;
        assert_eq!(second, Some(QueryResult::Success("B")));

        tx_a.send("A").unwrap();
        assert_eq!(first.await.unwrap(), None);
        assert_eq!(slot.state(), QueryResult::Success("B"));
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let slot: QuerySlot<u8> = QuerySlot::new("x");
        let mut rx = slot.subscribe();

        let t = slot.begin();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_loading());

        slot.complete(t, QueryResult::Success(3));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), QueryResult::Success(3));
    }

    #[test]
    fn test_registry_reuses_slots() {
        let registry: SlotRegistry<u8> = SlotRegistry::new();
        assert!(registry.is_empty());

        let a = registry.slot("b-slot");
        let t = a.begin();
        registry.slot("b-slot").complete(t, QueryResult::Success(9));
        registry.slot("a-slot");

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.snapshot(),
            vec![
                ("a-slot".to_string(), QueryResult::Idle),
                ("b-slot".to_string(), QueryResult::Success(9)),
            ]
        );
        assert!(registry.get("missing").is_none());
    }

    #[tokio::test]
    async fn test_dropped_run_settles_slot() {
        let slot: QuerySlot<u8> = QuerySlot::new("analysis");
        let never = std::future::pending::<QueryResult<u8>>();

        let outcome = tokio::time::timeout(Duration::from_millis(20), slot.run(never)).await;
        assert!(outcome.is_err());

        let err = slot.state().failure().cloned().unwrap();
        assert_eq!(err.kind, QueryErrorKind::NetworkError);
        assert_eq!(err.message, ABANDONED_MESSAGE);
    }

    #[tokio::test]
    async fn test_dropped_stale_run_leaves_newer_request_alone() {
        let slot: QuerySlot<u8> = QuerySlot::new("analysis");
        let never = std::future::pending::<QueryResult<u8>>();
        let stale = tokio::time::timeout(Duration::from_millis(20), slot.run(never));

        let (outcome, current) = tokio::join!(stale, async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            slot.begin()
        });
        assert!(outcome.is_err());
        assert!(slot.state().is_loading());
        assert!(slot.complete(current, QueryResult::Success(1)));
    }

    #[test]
    fn test_registry_is_bounded() {
        let registry: SlotRegistry<u8> = SlotRegistry::with_capacity(2);
        for i in 0..500 {
            registry.slot(&format!("headlines:t{}", i));
        }
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.capacity(), 2);
        assert!(registry.get("headlines:t499").is_some());
        assert!(registry.get("headlines:t0").is_none());
    }

    #[test]
    fn test_registry_evicts_settled_before_loading() {
        let registry: SlotRegistry<u8> = SlotRegistry::with_capacity(2);
        let busy = registry.slot("busy");
        let _ticket = busy.begin();
        registry.slot("done");

        // "busy" is least recently used but still loading.
        registry.slot("new");
        assert!(registry.get("busy").is_some());
        assert!(registry.get("done").is_none());

        let only_loading: SlotRegistry<u8> = SlotRegistry::with_capacity(1);
        let _t = only_loading.slot("a").begin();
        only_loading.slot("b");
        assert_eq!(only_loading.len(), 1);
        assert!(only_loading.get("b").is_some());
    }
}
