use thiserror::Error;

/// Why a [`push`](crate::BoundedQueue::push) did not end with a plain admission.
///
/// Only [`PushError::Evicted`] means the pushed item is now in the queue; in
/// every other case the item is handed back and [`PushError::into_inner`]
/// returns it.
#[derive(Debug, PartialEq, Error)]
pub enum PushError<T> {
    /// The queue had no room and the item was not stored.
    #[error("queue is full")]
    Full(T),
    /// The queue had no room; this many of the oldest items were dropped and
    /// the new item was stored.
    #[error("queue was full, evicted {0} oldest item(s)")]
    Evicted(usize),
    /// The item reported a cost that cannot be accounted for.
    #[error("item reported invalid cost {cost}")]
    InvalidCost { item: T, cost: f64 },
}

impl<T> PushError<T> {
    /// Returns the pushed item if the queue did not keep it.
    pub fn into_inner(self) -> Option<T> {
        match self {
            PushError::Full(item) | PushError::InvalidCost { item, .. } => Some(item),
            PushError::Evicted(_) => None,
        }
    }

    pub fn is_evicted(&self) -> bool {
        matches!(self, PushError::Evicted(_))
    }
}

/// A cost outside of what an occupancy sum can absorb (negative or NaN).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("invalid cost {0}")]
pub struct InvalidCost(pub f64);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueueError {
    #[error("invalid capacity {0}: must be finite and non-negative")]
    InvalidCapacity(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown full-queue policy `{0}`, expected `drop_incoming` or `drop_oldest`")]
pub struct UnknownPolicy(pub String);
