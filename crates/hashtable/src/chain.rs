use crate::macros::boxentry;

/// A singly linked list of entries sharing one bucket.
///
/// Each link owns the next one, new entries go to the tail,
/// and lookups scan from the head.
pub struct Chain<V> {
    head: Option<Box<Entry<V>>>,
    len: usize,
}

impl<V> Default for Chain<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Chain<V> {
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Appends a freshly allocated entry after the current tail
    pub(crate) fn push_back(&mut self, key: String, value: V) {
        let mut tail = &mut self.head;
        while let Some(node) = tail {
            tail = &mut node.next;
        }
        *tail = Some(boxentry!(key, value));
        self.len += 1;
    }

    #[inline]
    pub(crate) fn pop_front(&mut self) -> Option<Entry<V>> {
        self.head.take().map(|mut node| {
            self.head = node.next.take();
            self.len -= 1;
            *node
        })
    }

    /// Overwrites the value of `key` if it is already linked,
    /// otherwise appends a new entry.
    ///
    /// Returns `true` when a new entry was added
    pub(crate) fn upsert(&mut self, key: String, value: V) -> bool {
        if let Some(existing) = self.get_mut(&key) {
            *existing = value;
            return false;
        }
        self.push_back(key, value);
        true
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let mut cur = self.head.as_deref_mut();
        while let Some(node) = cur {
            if node.key == key {
                return Some(&mut node.value);
            }
            cur = node.next.as_deref_mut();
        }
        None
    }

    /// Unlinks the entry holding `key`, splicing its successor
    /// into the link that pointed at it
    pub(crate) fn remove(&mut self, key: &str) -> Option<Entry<V>> {
        let mut link = &mut self.head;
        while link.as_ref().is_some_and(|node| node.key != key) {
            link = &mut link.as_mut()?.next;
        }

        let mut removed = link.take()?;
        *link = removed.next.take();
        self.len -= 1;
        Some(*removed)
    }

    // [adapters]

    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(self)
    }

    /// Keys in chain order, head first
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.iter().map(Entry::key)
    }
}

impl<V> Drop for Chain<V> {
    fn drop(&mut self) {
        let mut curr = self.head.take();
        while let Some(mut node) = curr {
            curr = node.next.take();
            // node goes out of scope here, calling drop
        }
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for Chain<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<V> IntoIterator for Chain<V> {
    type Item = Entry<V>;
    type IntoIter = IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self)
    }
}

/// One key-value node of a [`Chain`]
pub struct Entry<V> {
    pub(crate) key: String,
    pub(crate) value: V,
    pub(crate) next: Option<Box<Entry<V>>>,
}

impl<V> Entry<V> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_parts(self) -> (String, V) {
        (self.key, self.value)
    }
}

impl<V: PartialEq> PartialEq for Entry<V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}
impl<V: Eq> Eq for Entry<V> {}

impl<V: std::fmt::Debug> std::fmt::Debug for Entry<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}, {:?}>", self.key, self.value)
    }
}

// [iterators]

pub struct Iter<'a, V> {
    current: Option<&'a Entry<V>>,
    len: usize,
}

impl<'a, V> Iter<'a, V> {
    pub fn new(chain: &'a Chain<V>) -> Self {
        Self {
            current: chain.head.as_deref(),
            len: chain.len,
        }
    }
}

impl<V> Default for Iter<'_, V> {
    fn default() -> Self {
        Self {
            current: None,
            len: 0,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a Entry<V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.current.take().map(|node| {
            self.current = node.next.as_deref();
            self.len -= 1;
            node
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

pub struct IntoIter<V>(Chain<V>);

impl<V> Iterator for IntoIter<V> {
    type Item = Entry<V>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.0.len, Some(self.0.len))
    }
}
