//! Priority queue with first-in-first-out ordering of equal keys.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// A min-priority queue which pulls values with equal keys in insertion order.
///
/// Every value is tagged at insertion time with a unique epoch taken from a
/// monotonically increasing counter. The underlying binary heap is sorted by
/// the pair `(key, epoch)`, so the epoch only matters when two keys compare
/// equal, in which case the value inserted first is pulled first.
///
/// This is what makes the scheduling of same-time events reproducible: the
/// order in which they are processed depends only on the order in which they
/// were scheduled.
pub(crate) struct PriorityQueue<K: Ord, V> {
    heap: BinaryHeap<Reverse<Item<K, V>>>,
    next_epoch: u64,
}

impl<K: Ord, V> PriorityQueue<K, V> {
    /// Creates an empty `PriorityQueue`.
    pub(crate) fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_epoch: 0,
        }
    }

    /// Returns the number of key-value pairs in the priority queue.
    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    /// Inserts a new key-value pair.
    ///
    /// This operation has *O*(log(*N*)) worse-case complexity.
    pub(crate) fn insert(&mut self, key: K, value: V) {
        let epoch = self.next_epoch;
        assert_ne!(epoch, u64::MAX);
        self.next_epoch += 1;

        self.heap.push(Reverse(Item {
            key: UniqueKey { key, epoch },
            value,
        }));
    }

    /// Pulls the value with the lowest key.
    ///
    /// If there are several equal lowest keys, the value which was inserted
    /// first is returned.
    pub(crate) fn pull(&mut self) -> Option<(K, V)> {
        self.heap
            .pop()
            .map(|Reverse(item)| (item.key.key, item.value))
    }

    /// Peeks a reference to the lowest key, leaving it in the queue.
    pub(crate) fn peek_key(&self) -> Option<&K> {
        self.heap.peek().map(|Reverse(item)| &item.key.key)
    }

    /// Drops all key-value pairs.
    pub(crate) fn clear(&mut self) {
        self.heap.clear();
    }
}

/// A heap item. Items are compared on their unique key only.
struct Item<K, V> {
    key: UniqueKey<K>,
    value: V,
}

impl<K: Ord, V> PartialEq for Item<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Ord, V> Eq for Item<K, V> {}

impl<K: Ord, V> PartialOrd for Item<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord, V> Ord for Item<K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// A unique key made of the user-provided key complemented by a unique epoch.
///
/// Implementation note: `UniqueKey` derives `Ord`, which orders fields
/// lexicographically, so `key` must stay declared before `epoch`.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct UniqueKey<K> {
    /// The user-provided key.
    key: K,
    /// A unique epoch that indicates the insertion date.
    epoch: u64,
}
