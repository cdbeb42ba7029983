//! How a queue measures its own fullness.
//!
//! The queue owns the locking and signalling; an [`Accounting`] only keeps the
//! occupancy figure in step with the items the queue stores and removes.
//! [`Accounting::weigh`] runs before the lock is taken; every other hook runs
//! with the lock held and never calls back into item code.

use std::fmt::Debug;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::{InvalidCost, QueueError};

/// A capacity/occupancy measure.
pub trait Capacity: Copy + PartialOrd + Debug {
    /// Capacity used when none is configured.
    const DEFAULT: Self;

    fn validate(self) -> Result<(), QueueError>;
}

impl Capacity for usize {
    const DEFAULT: usize = 10;

    fn validate(self) -> Result<(), QueueError> {
        Ok(())
    }
}

impl Capacity for f64 {
    const DEFAULT: f64 = 1.0;

    fn validate(self) -> Result<(), QueueError> {
        if self.is_finite() && self >= 0.0 {
            Ok(())
        } else {
            Err(QueueError::InvalidCapacity(self))
        }
    }
}

pub trait Accounting<T> {
    type Measure: Capacity;

    /// Current occupancy.
    fn occupancy(&self) -> Self::Measure;

    /// How much room `item` would take, or why it cannot be stored at all.
    ///
    /// The result is stored next to the item and handed back to
    /// [`dequeued`](Accounting::dequeued), so it is asked for only once.
    fn weigh(item: &T) -> Result<Self::Measure, InvalidCost>;

    /// Whether an item of `weight` can be added without exceeding `capacity`.
    fn fits(&self, weight: Self::Measure, capacity: Self::Measure) -> bool;

    /// Whether an item of `weight` could fit in an empty queue.
    fn fits_alone(weight: Self::Measure, capacity: Self::Measure) -> bool;

    fn is_full(&self, capacity: Self::Measure) -> bool;

    fn enqueued(&mut self, weight: Self::Measure);

    /// An item of `weight` has left the queue; `now_empty` is set when it was
    /// the last one.
    fn dequeued(&mut self, weight: Self::Measure, now_empty: bool);

    fn cleared(&mut self);
}

/// Occupancy is the number of stored items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counted {
    len: usize,
}

impl<T> Accounting<T> for Counted {
    type Measure = usize;

    fn occupancy(&self) -> usize {
        self.len
    }

    fn weigh(_: &T) -> Result<usize, InvalidCost> {
        Ok(1)
    }

    fn fits(&self, weight: usize, capacity: usize) -> bool {
        self.len.saturating_add(weight) <= capacity
    }

    fn fits_alone(weight: usize, capacity: usize) -> bool {
        weight <= capacity
    }

    fn is_full(&self, capacity: usize) -> bool {
        self.len >= capacity
    }

    fn enqueued(&mut self, weight: usize) {
        self.len += weight;
    }

    fn dequeued(&mut self, weight: usize, now_empty: bool) {
        self.len = if now_empty { 0 } else { self.len - weight };
    }

    fn cleared(&mut self) {
        self.len = 0;
    }
}

/// Something that takes up a known amount of room, e.g. a video frame and its
/// duration in seconds.
///
/// Asked once per push, before the queue is locked.
pub trait Cost {
    fn cost(&self) -> f64;
}

impl<C: Cost + ?Sized> Cost for &C {
    fn cost(&self) -> f64 {
        (**self).cost()
    }
}

impl<C: Cost + ?Sized> Cost for Box<C> {
    fn cost(&self) -> f64 {
        (**self).cost()
    }
}

impl<C: Cost + ?Sized> Cost for Rc<C> {
    fn cost(&self) -> f64 {
        (**self).cost()
    }
}

impl<C: Cost + ?Sized> Cost for Arc<C> {
    fn cost(&self) -> f64 {
        (**self).cost()
    }
}

/// Relative slack allowed on a cost capacity, so that e.g. 25 frames of
/// `1.0 / 25.0` seconds fill a one second queue despite rounding in the sum.
const COST_TOLERANCE: f64 = 1e-9;

fn with_slack(capacity: f64) -> f64 {
    capacity + capacity.abs() * COST_TOLERANCE
}

/// Occupancy is the sum of [`Cost::cost`] over the stored items.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ByCost {
    sum: f64,
}

impl ByCost {
    pub fn sum(&self) -> f64 {
        self.sum
    }
}

impl<T: Cost> Accounting<T> for ByCost {
    type Measure = f64;

    fn occupancy(&self) -> f64 {
        self.sum
    }

    fn weigh(item: &T) -> Result<f64, InvalidCost> {
        let cost = item.cost();
        // rejects NaN as well
        if cost >= 0.0 {
            Ok(cost)
        } else {
            Err(InvalidCost(cost))
        }
    }

    fn fits(&self, weight: f64, capacity: f64) -> bool {
        self.sum + weight <= with_slack(capacity)
    }

    fn fits_alone(weight: f64, capacity: f64) -> bool {
        weight <= with_slack(capacity)
    }

    fn is_full(&self, capacity: f64) -> bool {
        self.sum >= capacity - capacity.abs() * COST_TOLERANCE
    }

    fn enqueued(&mut self, weight: f64) {
        self.sum += weight;
    }

    fn dequeued(&mut self, weight: f64, now_empty: bool) {
        // Subtraction drifts; an empty queue holds exactly nothing.
        self.sum = if now_empty {
            0.0
        } else {
            (self.sum - weight).max(0.0)
        };
    }

    fn cleared(&mut self) {
        self.sum = 0.0;
    }
}
