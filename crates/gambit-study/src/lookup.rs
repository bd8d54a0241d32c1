//! Bookkeeping for external lookups (tablebase results, puzzle details).
//!
//! Lookups are answered elsewhere and may arrive late. Answers are cached
//! forever by key, since a position or puzzle id always has the same answer,
//! but an answer is only applied if the board has not changed since the
//! request was issued.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

use crate::history::MoveHistory;

/// Proof of the board state at the moment a lookup was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    generation: u64,
    key: String,
}

impl LookupTicket {
    pub(crate) fn new(generation: u64, key: &str) -> Self {
        LookupTicket {
            generation,
            key: key.to_string(),
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// FEN of the position the lookup is about.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Cache-forever store of lookup answers.
#[derive(Debug, Clone)]
pub struct LookupCache<K, V> {
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash, V> LookupCache<K, V> {
    pub fn new() -> Self {
        LookupCache {
            entries: HashMap::new(),
        }
    }

    /// The cached answer for `key`, if any.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Store an answer. An existing answer for the same key is kept.
    pub fn insert(&mut self, key: K, value: V) -> &V {
        self.entries.entry(key).or_insert(value)
    }

    /// Number of cached answers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> LookupCache<String, V> {
    /// Record the answer to a lookup issued with `ticket`.
    ///
    /// The answer is always cached. It is returned for use only if `history`
    /// still shows the board the ticket was issued for; otherwise it is
    /// stale and `None` is returned.
    pub fn resolve(&mut self, history: &MoveHistory, ticket: &LookupTicket, value: V) -> Option<&V> {
        let fresh = history.accepts(ticket);
        let stored = self.insert(ticket.key().to_string(), value);
        if fresh {
            Some(stored)
        } else {
            debug!(key = %ticket.key(), "discarding stale lookup result");
            None
        }
    }
}

impl<K: Eq + Hash, V> Default for LookupCache<K, V> {
    fn default() -> Self {
        LookupCache::new()
    }
}

#[cfg(test)]
mod tests {
    use super::LookupCache;
    use crate::history::MoveHistory;

    #[test]
    fn first_answer_wins() {
        let mut cache: LookupCache<&str, u32> = LookupCache::new();
        assert_eq!(*cache.insert("k", 1), 1);
        assert_eq!(*cache.insert("k", 2), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"k"), Some(&1));
    }

    #[test]
    fn fresh_result_is_applied() {
        let history = MoveHistory::new();
        let ticket = history.ticket();
        let mut cache = LookupCache::new();
        assert_eq!(cache.resolve(&history, &ticket, "draw"), Some(&"draw"));
    }

    #[test]
    fn stale_result_is_cached_but_not_applied() {
        let mut history = MoveHistory::new();
        history.load_uci("e2e4").unwrap();
        let ticket = history.ticket();
        history.undo();

        let mut cache = LookupCache::new();
        assert_eq!(cache.resolve(&history, &ticket, 7u8), None);
        assert_eq!(cache.get(&ticket.key().to_string()), Some(&7));
    }
}
