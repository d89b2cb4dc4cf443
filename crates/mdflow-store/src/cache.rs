//! String-keyed cache whose entries expire a fixed time after they are set.
//!
//! Expiry is checked lazily on access; [`TtlCache::purge_expired`] drops dead
//! entries eagerly. Time comes from `tokio::time::Instant`, so paused-clock
//! tests can advance it.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry<V> {
  value: V,
  expires_at: Instant,
}

impl<V> Entry<V> {
  fn is_live(&self, now: Instant) -> bool {
    now < self.expires_at
  }
}

/// A cache with one fixed time-to-live for every entry.
#[derive(Debug)]
pub struct TtlCache<V> {
  entries: HashMap<String, Entry<V>>,
  ttl: Duration,
}

impl<V> TtlCache<V> {
  pub fn new(ttl: Duration) -> Self {
    Self {
      entries: HashMap::new(),
      ttl,
    }
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  /// Get a live entry.
  pub fn get(&self, key: &str) -> Option<&V> {
    let now = Instant::now();
    self
      .entries
      .get(key)
      .filter(|entry| entry.is_live(now))
      .map(|entry| &entry.value)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.get(key).is_some()
  }

  /// Insert only if no live entry exists for `key`.
  ///
  /// Returns `false`, leaving the existing entry untouched, on conflict.
  pub fn add(&mut self, key: impl Into<String>, value: V) -> bool {
    let key = key.into();
    if self.contains(&key) {
      return false;
    }
    self.set(key, value);
    true
  }

  /// Insert or overwrite, restarting the entry's lifetime.
  pub fn set(&mut self, key: impl Into<String>, value: V) {
    let entry = Entry {
      value,
      expires_at: Instant::now() + self.ttl,
    };
    self.entries.insert(key.into(), entry);
  }

  /// Modify a live entry in place without extending its lifetime.
  ///
  /// Returns what `f` returned, or `None` when there is no live entry.
  pub fn update<R>(&mut self, key: &str, f: impl FnOnce(&mut V) -> R) -> Option<R> {
    let now = Instant::now();
    self
      .entries
      .get_mut(key)
      .filter(|entry| entry.is_live(now))
      .map(|entry| f(&mut entry.value))
  }

  /// Drop expired entries, returning how many were dropped.
  pub fn purge_expired(&mut self) -> usize {
    let now = Instant::now();
    let before = self.entries.len();
    self.entries.retain(|_, entry| entry.is_live(now));
    before - self.entries.len()
  }

  /// Number of live entries.
  pub fn len(&self) -> usize {
    let now = Instant::now();
    self.entries.values().filter(|e| e.is_live(now)).count()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
