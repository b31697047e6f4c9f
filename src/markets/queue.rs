//! Lock-guarded request lists shared between the caller and a worker task

use crate::asset::Asset;
use parking_lot::Mutex;

/// One pending change to an exchange's subscription set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionRequest {
    Subscribe(Asset),
    Unsubscribe(Asset),
}

impl SubscriptionRequest {
    pub fn asset(&self) -> &Asset {
        match self {
            Self::Subscribe(asset) | Self::Unsubscribe(asset) => asset,
        }
    }
}

/// Ordered list behind a mutex
///
/// The lock is only held to push, swap out or copy the contents, never
/// across I/O.
#[derive(Debug)]
pub struct LockingList<T> {
    items: Mutex<Vec<T>>,
}

impl<T> Default for LockingList<T> {
    fn default() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }
}

impl<T> LockingList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&self, item: T) {
        self.items.lock().push(item);
    }

    /// Drop everything queued and keep only `item`
    pub fn replace(&self, item: T) {
        let mut items = self.items.lock();
        items.clear();
        items.push(item);
    }

    pub fn clear(&self) {
        self.items.lock().clear();
    }

    /// Snapshot-and-clear in one critical section
    pub fn take_all(&self) -> Vec<T> {
        std::mem::take(&mut *self.items.lock())
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T: Clone> LockingList<T> {
    /// Copy of the queued items in submission order
    pub fn snapshot(&self) -> Vec<T> {
        self.items.lock().clone()
    }
}

/// Per-exchange FIFO of subscribe/unsubscribe requests
pub type SubscriptionQueue = LockingList<SubscriptionRequest>;
