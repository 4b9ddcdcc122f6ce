use std::{
    borrow::Borrow,
    collections::{BTreeMap, HashMap},
    hash::Hash,
};

/// Least-recently-used map holding at most `capacity` entries.
///
/// Recency is tracked with a monotonically increasing tick per access, `order` maps
/// ticks back to keys so the oldest entry is always the first one in the tree.
#[derive(Debug)]
pub(crate) struct Lru<K, V> {
    capacity: usize,
    tick: u64,
    entries: HashMap<K, Slot<V>>,
    order: BTreeMap<u64, K>,
}

#[derive(Debug)]
struct Slot<V> {
    tick: u64,
    value: V,
}

impl<K, V> Lru<K, V>
where
    K: Hash + Eq + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            tick: 0,
            entries: HashMap::new(),
            order: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Returns the value and marks it as the most recently used entry.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.tick += 1;
        let tick = self.tick;

        let slot = self.entries.get_mut(key)?;
        if let Some(key) = self.order.remove(&slot.tick) {
            self.order.insert(tick, key);
        }
        slot.tick = tick;

        Some(&slot.value)
    }

    /// Inserts or replaces `key`, returning the evicted entry if the capacity was exceeded.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        self.tick += 1;
        let tick = self.tick;

        if let Some(previous) = self.entries.insert(key.clone(), Slot { tick, value }) {
            self.order.remove(&previous.tick);
        }
        self.order.insert(tick, key);

        if self.entries.len() <= self.capacity {
            return None;
        }

        let (_, oldest) = self.order.pop_first()?;
        self.entries
            .remove(&oldest)
            .map(|slot| (oldest, slot.value))
    }

    /// Entries ordered from least to most recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order
            .values()
            .filter_map(|key| self.entries.get(key).map(|slot| (key, &slot.value)))
    }
}
