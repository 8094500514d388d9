use std::collections::VecDeque;

/// Insertion-ordered buffer holding at most `capacity` items. Pushing past the
/// cap drops from the front, so the oldest insert goes first.
#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedLog<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        // a zero cap would silently drop every write
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends and evicts; returns how many items were evicted.
    pub fn push(&mut self, item: T) -> usize {
        self.items.push_back(item);
        let mut evicted = 0;
        while self.items.len() > self.capacity {
            self.items.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Replaces the first item matching `same` in place, keeping its slot in
    /// the eviction order, or appends when nothing matches.
    /// Returns `(replaced, evicted)`.
    pub fn upsert<F>(&mut self, item: T, same: F) -> (bool, usize)
    where
        F: Fn(&T, &T) -> bool,
    {
        if let Some(slot) = self.items.iter_mut().find(|existing| same(existing, &item)) {
            *slot = item;
            return (true, 0);
        }
        (false, self.push(item))
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }
}
