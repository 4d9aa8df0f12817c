//! Recency-ordered principal index
//!
//! A hash map from principal name to a slot in an arena of nodes, with the
//! nodes threaded into a doubly-linked recency list through slot indices.
//! The head is the most recently used entry, the tail the least.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;

/// A cached client for one principal
pub struct CacheEntry<C> {
    /// Principal name
    pub key: String,
    /// Shared client handle
    pub client: Arc<C>,
    /// Last time the entry was handed out
    pub last_used: Instant,
}

impl<C> CacheEntry<C> {
    pub fn new(key: String, client: Arc<C>, last_used: Instant) -> Self {
        CacheEntry {
            key,
            client,
            last_used,
        }
    }

    /// Whether the entry has been idle for at least `keep_alive` at `now`
    pub fn is_expired(&self, now: Instant, keep_alive: std::time::Duration) -> bool {
        now >= self.last_used + keep_alive
    }
}

impl<C> std::fmt::Debug for CacheEntry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("last_used", &self.last_used)
            .finish()
    }
}

struct Node<C> {
    entry: CacheEntry<C>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Bounded LRU index of cache entries keyed by principal name
pub struct PrincipalIndex<C> {
    slots: Vec<Option<Node<C>>>,
    free: Vec<usize>,
    lookup: HashMap<String, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    max_size: usize,
}

impl<C> PrincipalIndex<C> {
    pub fn new(max_size: usize) -> Self {
        PrincipalIndex {
            slots: Vec::with_capacity(max_size.saturating_add(1)),
            free: Vec::new(),
            lookup: HashMap::with_capacity(max_size.saturating_add(1)),
            head: None,
            tail: None,
            max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lookup.contains_key(key)
    }

    /// Look up an entry without changing its recency
    pub fn peek(&self, key: &str) -> Option<&CacheEntry<C>> {
        let slot = *self.lookup.get(key)?;
        self.node(slot).map(|node| &node.entry)
    }

    /// Refresh an entry's timestamp and move it to the MRU position
    pub fn touch(&mut self, key: &str, now: Instant) -> Option<&CacheEntry<C>> {
        let slot = *self.lookup.get(key)?;
        self.unlink(slot);
        self.link_front(slot);
        let node = self.node_mut(slot)?;
        node.entry.last_used = now;
        Some(&node.entry)
    }

    /// Insert a new entry at the MRU position
    ///
    /// If the index then exceeds its capacity the LRU entry is detached and
    /// returned. The caller owns it from then on; nothing here closes it.
    /// Any existing entry under the same key is detached and returned first.
    pub fn push_front(&mut self, entry: CacheEntry<C>) -> Vec<CacheEntry<C>> {
        let mut detached = Vec::new();
        if let Some(previous) = self.remove(&entry.key) {
            detached.push(previous);
        }

        let key = entry.key.clone();
        let node = Node {
            entry,
            prev: None,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.link_front(slot);
        self.lookup.insert(key, slot);

        while self.len() > self.max_size {
            match self.pop_back() {
                Some(evicted) => detached.push(evicted),
                None => break,
            }
        }

        detached
    }

    /// Detach the LRU entry
    pub fn pop_back(&mut self) -> Option<CacheEntry<C>> {
        let slot = self.tail?;
        self.take_slot(slot)
    }

    /// Detach an entry by key
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry<C>> {
        let slot = *self.lookup.get(key)?;
        self.take_slot(slot)
    }

    /// Detach every entry matching `pred`, scanning the whole index
    ///
    /// Returned entries are in MRU to LRU order.
    pub fn remove_if<P>(&mut self, mut pred: P) -> Vec<CacheEntry<C>>
    where
        P: FnMut(&CacheEntry<C>) -> bool,
    {
        let mut matched = Vec::new();
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let Some(node) = self.node(slot) else { break };
            cursor = node.next;
            if pred(&node.entry) {
                matched.push(slot);
            }
        }

        matched
            .into_iter()
            .filter_map(|slot| self.take_slot(slot))
            .collect()
    }

    /// Detach every entry
    pub fn drain(&mut self) -> Vec<CacheEntry<C>> {
        self.remove_if(|_| true)
    }

    /// Principal names in MRU to LRU order
    pub fn keys(&self) -> Vec<String> {
        self.iter().map(|entry| entry.key.clone()).collect()
    }

    /// Iterate entries in MRU to LRU order
    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry<C>> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.node(cursor?)?;
            cursor = node.next;
            Some(&node.entry)
        })
    }

    fn node(&self, slot: usize) -> Option<&Node<C>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, slot: usize) -> Option<&mut Node<C>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    fn take_slot(&mut self, slot: usize) -> Option<CacheEntry<C>> {
        self.unlink(slot);
        let node = self.slots.get_mut(slot)?.take()?;
        self.lookup.remove(&node.entry.key);
        self.free.push(slot);
        Some(node.entry)
    }

    fn unlink(&mut self, slot: usize) {
        let Some(node) = self.node_mut(slot) else { return };
        let (prev, next) = (node.prev.take(), node.next.take());

        match prev {
            Some(p) => {
                if let Some(n) = self.node_mut(p) {
                    n.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(n) = self.node_mut(n) {
                    n.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn link_front(&mut self, slot: usize) {
        let old_head = self.head;
        if let Some(node) = self.node_mut(slot) {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head
            && let Some(node) = self.node_mut(h)
        {
            node.prev = Some(slot);
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }
}
