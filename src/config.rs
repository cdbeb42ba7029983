use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::accounting::Capacity;
use crate::error::UnknownPolicy;

/// What a push does when the new item does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullPolicy {
    /// Refuse the new item and leave the queue untouched.
    #[default]
    DropIncoming,
    /// Drop items from the head until the new item fits, then store it.
    DropOldest,
}

impl fmt::Display for FullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FullPolicy::DropIncoming => "drop_incoming",
            FullPolicy::DropOldest => "drop_oldest",
        })
    }
}

impl FromStr for FullPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").as_str() {
            "drop_incoming" => Ok(FullPolicy::DropIncoming),
            "drop_oldest" => Ok(FullPolicy::DropOldest),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

/// Serializable description of a queue: its capacity and full-queue policy.
///
/// Missing fields fall back to the capacity type's default and
/// [`FullPolicy::DropIncoming`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "C: Capacity + Deserialize<'de>"))]
pub struct QueueConfig<C> {
    pub capacity: C,
    pub policy: FullPolicy,
}

impl<C: Capacity> Default for QueueConfig<C> {
    fn default() -> Self {
        QueueConfig {
            capacity: C::DEFAULT,
            policy: FullPolicy::default(),
        }
    }
}

impl<C> QueueConfig<C> {
    pub fn new(capacity: C, policy: FullPolicy) -> Self {
        QueueConfig { capacity, policy }
    }
}
