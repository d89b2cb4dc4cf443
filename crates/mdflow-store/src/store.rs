use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::types::{ExperimentRecord, ExperimentStatus};

/// Cache key of the experiment index.
const INDEX_KEY: &str = "experiment_ids";

struct Inner {
  records: TtlCache<ExperimentRecord>,
  index: TtlCache<Vec<String>>,
}

/// Experiments known to this process, each kept for the retention window.
///
/// All operations take one short lock and never await while holding it.
pub struct ExperimentStore {
  inner: Mutex<Inner>,
}

impl ExperimentStore {
  pub fn new(retention: Duration) -> Self {
    Self {
      inner: Mutex::new(Inner {
        records: TtlCache::new(retention),
        index: TtlCache::new(retention),
      }),
    }
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Record a newly submitted experiment.
  ///
  /// Inserts at most once per id: if a live record already exists this is a
  /// no-op and returns `false`. On insert the id is prepended to the index,
  /// within the same critical section, and the index lifetime restarts.
  /// Expired records and their index entries are dropped on every insert.
  pub fn record_new(&self, record: ExperimentRecord) -> bool {
    let id = record.id.clone();
    let mut guard = self.lock();
    let inner = &mut *guard;

    let purged = inner.records.purge_expired();
    if purged > 0 {
      debug!(purged, "dropped expired experiments");
    }

    if !inner.records.add(id.clone(), record) {
      debug!(experiment_id = %id, "experiment already recorded, keeping the first record");
      return false;
    }

    let records = &inner.records;
    let mut ids = inner.index.get(INDEX_KEY).cloned().unwrap_or_default();
    ids.retain(|existing| existing != &id && records.contains(existing));
    ids.insert(0, id.clone());
    inner.index.set(INDEX_KEY, ids);

    info!(experiment_id = %id, "experiment recorded");
    true
  }

  /// Ids in the index, most recent first. May include expired experiments.
  pub fn ids(&self) -> Vec<String> {
    self
      .lock()
      .index
      .get(INDEX_KEY)
      .cloned()
      .unwrap_or_default()
  }

  /// Live experiments, most recent first. Ids whose record has expired are
  /// skipped.
  pub fn list_active(&self) -> Vec<ExperimentRecord> {
    let inner = self.lock();
    let Some(ids) = inner.index.get(INDEX_KEY) else {
      return Vec::new();
    };

    ids
      .iter()
      .filter_map(|id| inner.records.get(id).cloned())
      .collect()
  }

  pub fn get(&self, id: &str) -> Option<ExperimentRecord> {
    self.lock().records.get(id).cloned()
  }

  /// Current status, `Unknown` once the record is gone.
  pub fn status(&self, id: &str) -> ExperimentStatus {
    self
      .lock()
      .records
      .get(id)
      .map(|record| record.status)
      .unwrap_or(ExperimentStatus::Unknown)
  }

  /// Move a running experiment to `Finished`.
  ///
  /// Returns `true` only for the transition itself; an already finished or
  /// evicted experiment is left alone. The record keeps its original expiry.
  pub fn mark_finished(&self, id: &str) -> bool {
    let changed = self
      .lock()
      .records
      .update(id, |record| {
        if record.status == ExperimentStatus::Running {
          record.status = ExperimentStatus::Finished;
          true
        } else {
          false
        }
      })
      .unwrap_or(false);

    if changed {
      info!(experiment_id = %id, "experiment finished");
    }
    changed
  }

  /// Drop expired records and index, returning how many entries went.
  pub fn purge_expired(&self) -> usize {
    let mut inner = self.lock();
    inner.records.purge_expired() + inner.index.purge_expired()
  }

  /// Number of live records.
  pub fn len(&self) -> usize {
    self.lock().records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
