use crate::accounting::{ByCost, Cost};
use crate::BoundedQueue;

/// A queue bounded by the summed [`Cost`] of its items instead of their number.
///
/// ```
/// use bounded_fifo::{Cost, FullPolicy, PushError, WeightedQueue};
///
/// struct Frame(f64);
///
/// impl Cost for Frame {
///     fn cost(&self) -> f64 {
///         self.0
///     }
/// }
///
/// let queue = WeightedQueue::try_new(1.0, FullPolicy::DropIncoming).unwrap();
/// assert!(queue.push(Frame(0.5)).is_ok());
/// assert!(matches!(queue.push(Frame(0.7)), Err(PushError::Full(_))));
/// assert_eq!(queue.size(), 0.5);
/// ```
pub type WeightedQueue<T> = BoundedQueue<T, ByCost>;

impl<T: Cost> BoundedQueue<T, ByCost> {
    /// Summed cost of the stored items.
    ///
    /// Same as [`size`](BoundedQueue::size); spelled out for call sites that
    /// read better with the unit in mind.
    pub fn total_cost(&self) -> f64 {
        self.size()
    }

    /// Room left before the queue is full; zero once the capacity is reached
    /// or was shrunk below the current occupancy.
    pub fn remaining(&self) -> f64 {
        let state = self.lock();
        (state.capacity - state.accounting.sum()).max(0.0)
    }
}
