//! A bounded, blocking FIFO shared between producer and consumer threads.
//!
//! Producers never block: a [`push`](BoundedQueue::push) onto a full queue is
//! settled immediately according to the queue's [`FullPolicy`]. Consumers block
//! in [`pull`](BoundedQueue::pull) until an item is available.
//!
//! How "full" is measured is left to an [`Accounting`] strategy: [`Counted`]
//! bounds the number of items, [`ByCost`] bounds the sum of their
//! [`Cost`]s (see [`WeightedQueue`]).
//!
//! ```
//! use bounded_fifo::{BoundedQueue, FullPolicy, PushError};
//!
//! let queue = BoundedQueue::new(2, FullPolicy::DropOldest);
//! queue.push(1).unwrap();
//! queue.push(2).unwrap();
//! assert_eq!(queue.push(3), Err(PushError::Evicted(1)));
//! assert_eq!(queue.pull(), 2);
//! ```
//!
//! A queue cannot be dropped while another thread is blocked in `pull` on it;
//! share it through an `Arc` and stop every producer and consumer (for example
//! with [`pull_timeout`](BoundedQueue::pull_timeout) and a flag) before
//! letting the last handle go.

use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::sync::{Condvar, Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

mod accounting;
mod config;
mod error;
mod weighted;

pub use accounting::{Accounting, ByCost, Capacity, Counted, Cost};
pub use config::{FullPolicy, QueueConfig};
pub use error::{InvalidCost, PushError, QueueError, UnknownPolicy};
pub use weighted::WeightedQueue;


struct State<T, A: Accounting<T>> {
    /// Each item with the weight it was admitted at.
    items: VecDeque<(T, A::Measure)>,
    capacity: A::Measure,
    accounting: A,
}

impl<T, A: Accounting<T>> State<T, A> {
    fn enqueue(&mut self, item: T, weight: A::Measure) {
        self.accounting.enqueued(weight);
        self.items.push_back((item, weight));
    }

    fn dequeue(&mut self) -> Option<T> {
        let (item, weight) = self.items.pop_front()?;
        self.accounting.dequeued(weight, self.items.is_empty());
        Some(item)
    }

    /// Evicted items are moved into `evicted` so they can be dropped once the
    /// lock is released.
    fn push(
        &mut self,
        item: T,
        weight: A::Measure,
        policy: FullPolicy,
        evicted: &mut Vec<T>,
    ) -> Result<(), PushError<T>> {
        if self.accounting.fits(weight, self.capacity) {
            self.enqueue(item, weight);
            return Ok(());
        }
        match policy {
            FullPolicy::DropIncoming => Err(PushError::Full(item)),
            // Evicting everything would not help; keep what we have.
            FullPolicy::DropOldest if !A::fits_alone(weight, self.capacity) => {
                Err(PushError::Full(item))
            }
            FullPolicy::DropOldest => {
                while !self.accounting.fits(weight, self.capacity) {
                    match self.dequeue() {
                        Some(old) => evicted.push(old),
                        None => break,
                    }
                }
                self.enqueue(item, weight);
                Err(PushError::Evicted(evicted.len()))
            }
        }
    }
}

/// A bounded FIFO guarded by one mutex and one condition variable.
///
/// `A` decides how occupancy and capacity are measured; the default counts
/// items.
///
/// # Panics
///
/// Every method panics if the lock was poisoned, i.e. a thread panicked while
/// holding it. No item code runs under the lock ([`Cost::cost`] is asked
/// before locking, destructors run after unlocking), so this takes a bug in
/// the queue itself. Such a queue is not recovered.
pub struct BoundedQueue<T, A: Accounting<T> = Counted> {
    state: Mutex<State<T, A>>,
    not_empty: Condvar,
    policy: FullPolicy,
}

#[cold]
fn poisoned() -> ! {
    panic!("queue lock poisoned: a thread panicked while holding it")
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `capacity` items.
    pub fn new(capacity: usize, policy: FullPolicy) -> BoundedQueue<T> {
        BoundedQueue::build(capacity, policy, Counted::default())
    }
}

impl<T, A: Accounting<T> + Default> BoundedQueue<T, A> {
    /// Creates a queue after checking that `capacity` is usable.
    pub fn try_new(capacity: A::Measure, policy: FullPolicy) -> Result<Self, QueueError> {
        capacity.validate()?;
        Ok(BoundedQueue::build(capacity, policy, A::default()))
    }

    pub fn from_config(config: QueueConfig<A::Measure>) -> Result<Self, QueueError> {
        BoundedQueue::try_new(config.capacity, config.policy)
    }
}

impl<T, A: Accounting<T>> BoundedQueue<T, A> {
    fn build(capacity: A::Measure, policy: FullPolicy, accounting: A) -> Self {
        BoundedQueue {
            state: Mutex::new(State {
                items: VecDeque::new(),
                capacity,
                accounting,
            }),
            not_empty: Condvar::new(),
            policy,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T, A>> {
        self.state.lock().unwrap_or_else(|_| poisoned())
    }

    /// Adds `item` at the tail without blocking.
    ///
    /// `Ok(())` means the item was stored and nothing else changed. When the
    /// item does not fit, the outcome follows the queue's policy:
    /// [`PushError::Full`] hands the item back, [`PushError::Evicted`] reports
    /// that older items were dropped to store it.
    pub fn push(&self, item: T) -> Result<(), PushError<T>> {
        let weight = match A::weigh(&item) {
            Ok(weight) => weight,
            Err(InvalidCost(cost)) => {
                debug!(cost, "item with invalid cost rejected");
                return Err(PushError::InvalidCost { item, cost });
            }
        };
        let mut evicted = Vec::new();
        let res = self.lock().push(item, weight, self.policy, &mut evicted);
        // Wake anyone waiting for us up
        self.not_empty.notify_one();

        match &res {
            Ok(()) => {}
            Err(PushError::Full(_)) => debug!(policy = %self.policy, "queue full, item rejected"),
            Err(PushError::Evicted(n)) => {
                debug!(policy = %self.policy, evicted = n, "queue full, oldest items dropped")
            }
            Err(PushError::InvalidCost { .. }) => {}
        }
        drop(evicted);
        res
    }

    /// Removes the head item, blocking while the queue is empty.
    pub fn pull(&self) -> T {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.dequeue() {
                return item;
            }
            state = self.not_empty.wait(state).unwrap_or_else(|_| poisoned());
        }
    }

    /// Removes the head item if there is one.
    pub fn try_pull(&self) -> Option<T> {
        self.lock().dequeue()
    }

    /// Like [`pull`](BoundedQueue::pull), but gives up after `timeout`.
    pub fn pull_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = match Instant::now().checked_add(timeout) {
            Some(deadline) => deadline,
            None => return Some(self.pull()),
        };
        let mut state = self.lock();
        loop {
            if let Some(item) = state.dequeue() {
                return Some(item);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            state = self
                .not_empty
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|_| poisoned())
                .0;
        }
    }

    /// Current occupancy, in the accounting's unit.
    pub fn size(&self) -> A::Measure {
        self.lock().accounting.occupancy()
    }

    /// Number of stored items, whatever the accounting.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn capacity(&self) -> A::Measure {
        self.lock().capacity
    }

    /// Changes the capacity. Items already stored are kept even if they no
    /// longer fit; later pushes settle the difference according to the policy.
    pub fn set_capacity(&self, capacity: A::Measure) -> Result<(), QueueError> {
        capacity.validate()?;
        self.lock().capacity = capacity;
        trace!(?capacity, "queue capacity changed");
        Ok(())
    }

    /// Drops every stored item and resets occupancy to zero.
    ///
    /// Blocked consumers stay blocked.
    pub fn clear(&self) {
        let drained = {
            let mut state = self.lock();
            state.accounting.cleared();
            mem::take(&mut state.items)
        };
        trace!(dropped = drained.len(), "queue cleared");
        // Dropped outside the lock: a panicking destructor must not poison it.
        drop(drained);
    }

    /// Whether occupancy has reached capacity. Stale as soon as it returns.
    pub fn is_full(&self) -> bool {
        let state = self.lock();
        state.accounting.is_full(state.capacity)
    }

    pub fn policy(&self) -> FullPolicy {
        self.policy
    }
}

impl<T, A: Accounting<T> + Default> Default for BoundedQueue<T, A> {
    fn default() -> Self {
        BoundedQueue::build(
            <A::Measure as Capacity>::DEFAULT,
            FullPolicy::default(),
            A::default(),
        )
    }
}

impl<T, A: Accounting<T>> fmt::Debug for BoundedQueue<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("BoundedQueue");
        d.field("policy", &self.policy);
        match self.state.try_lock() {
            Ok(state) => d
                .field("len", &state.items.len())
                .field("size", &state.accounting.occupancy())
                .field("capacity", &state.capacity),
            Err(TryLockError::Poisoned(_)) => d.field("state", &"<poisoned>"),
            Err(TryLockError::WouldBlock) => d.field("state", &"<locked>"),
        };
        d.finish()
    }
}
