use log::debug;

use crate::KeyNotFound;
use crate::chain::{self, Chain};

pub const DEFAULT_BUCKET_SIZE: usize = 8;

/// Separate-chaining hash table from `String` keys to `V`.
///
/// Buckets are addressed by [`HashTable::hash`] modulo the bucket count.
/// Before every insert the table doubles its bucket count if the load factor
/// (computed with the count *before* the insert) has reached
/// [`HashTable::MAX_LOAD_FACTOR`].
pub struct HashTable<V> {
    slots: Vec<Chain<V>>,
    count: usize,
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::with_buckets(DEFAULT_BUCKET_SIZE)
    }
}

impl<V> HashTable<V> {
    pub const MAX_LOAD_FACTOR: f64 = 0.7;
    pub const GROWTH_FACTOR: usize = 2;

    /// Creates an empty table with [`DEFAULT_BUCKET_SIZE`] buckets
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with `buckets` many buckets.
    ///
    /// A table always has at least one bucket, so `0` is bumped to `1`.
    pub fn with_buckets(buckets: usize) -> Self {
        Self {
            slots: Self::empty_slots(buckets.max(1)),
            count: 0,
        }
    }

    /// Number of keys stored
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the number of buckets, or "slots" of the table
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.count as f64 / self.capacity() as f64
    }

    /// Sum of the key's code points.
    ///
    /// Anagrams always collide.
    pub fn hash(key: &str) -> u64 {
        key.chars().map(u64::from).sum()
    }

    pub fn bucket_index(&self, key: &str) -> usize {
        Self::index_for(key, self.capacity())
    }

    /// Inserts `value` under `key`, overwriting the value in place
    /// if the key is already present
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        if self.load_factor() >= Self::MAX_LOAD_FACTOR {
            self.resize();
        }

        let key = key.into();
        let i = self.bucket_index(&key);
        if self.slots[i].upsert(key, value) {
            self.count += 1;
        }
    }

    /// Returns the value stored under `key`, `None` if there is none
    pub fn read(&self, key: &str) -> Option<&V> {
        self.slots[self.bucket_index(key)].get(key)
    }

    pub fn read_mut(&mut self, key: &str) -> Option<&mut V> {
        let i = self.bucket_index(key);
        self.slots[i].get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.read(key).is_some()
    }

    /// Unlinks `key` from its chain.
    ///
    /// Never shrinks the table.
    pub fn delete(&mut self, key: &str) -> Result<(), KeyNotFound> {
        let i = self.bucket_index(key);
        match self.slots[i].remove(key) {
            Some(_) => {
                self.count -= 1;
                Ok(())
            }
            None => Err(KeyNotFound),
        }
    }

    /// The chain behind bucket `index`
    pub fn chain(&self, index: usize) -> Option<&Chain<V>> {
        self.slots.get(index)
    }

    // [adapters]

    /// Visits entries bucket by bucket, each chain head to tail
    pub fn iter(&self) -> Iter<'_, V> {
        let mut slots = self.slots.iter();
        let chain = slots.next().map(Chain::iter).unwrap_or_default();
        Iter { slots, chain }
    }

    // [private]

    fn index_for(key: &str, capacity: usize) -> usize {
        (Self::hash(key) % capacity as u64) as usize
    }

    fn empty_slots(n: usize) -> Vec<Chain<V>> {
        (0..n).map(|_| Chain::new()).collect()
    }

    /// Doubles the bucket count and rebuilds every chain.
    ///
    /// Entries are re-appended in bucket order then chain order,
    /// each into a newly allocated node; the old buckets are dropped
    /// as a whole once the swap is done.
    fn resize(&mut self) {
        let new_cap = self.capacity() * Self::GROWTH_FACTOR;
        debug!(
            target: "hashtable::resize",
            "growing {} -> {} buckets with {} keys",
            self.capacity(),
            new_cap,
            self.count
        );

        let old = std::mem::replace(&mut self.slots, Self::empty_slots(new_cap));
        self.count = 0;

        for chain in old {
            for entry in chain {
                let (key, value) = entry.into_parts();
                let i = Self::index_for(&key, new_cap);
                self.slots[i].push_back(key, value);
                self.count += 1;
            }
        }
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for HashTable<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashTable")
            .field("count", &self.count)
            .field("capacity", &self.capacity())
            .field("slots", &self.slots)
            .finish()
    }
}

impl<'a, V> IntoIterator for &'a HashTable<V> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a, V> {
    slots: std::slice::Iter<'a, Chain<V>>,
    chain: chain::Iter<'a, V>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.chain.next() {
                return Some((entry.key(), entry.value()));
            }
            self.chain = self.slots.next()?.iter();
        }
    }
}
