use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use mdflow_store::{ExperimentStatus, ExperimentStore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::probe::ArtifactProbe;

/// Why a background poll ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
  /// The artifact appeared and the experiment was marked finished.
  Finished,
  /// The experiment left the store before its artifact appeared.
  Expired,
  /// The poll was cancelled.
  Cancelled,
}

struct Watch {
  generation: u64,
  cancel: CancellationToken,
}

type Watches = Arc<Mutex<HashMap<String, Watch>>>;

/// Determines experiment status on demand and in the background.
///
/// Each watched experiment gets its own task with a child of the poller's
/// cancellation token, so experiments never wait on each other and
/// [`StatusPoller::shutdown`] stops all of them.
pub struct StatusPoller {
  probe: Arc<dyn ArtifactProbe>,
  store: Arc<ExperimentStore>,
  interval: Duration,
  cancel: CancellationToken,
  watches: Watches,
  next_generation: AtomicU64,
}

impl StatusPoller {
  pub fn new(
    probe: Arc<dyn ArtifactProbe>,
    store: Arc<ExperimentStore>,
    interval: Duration,
  ) -> Self {
    Self {
      probe,
      store,
      interval,
      cancel: CancellationToken::new(),
      watches: Arc::new(Mutex::new(HashMap::new())),
      next_generation: AtomicU64::new(0),
    }
  }

  pub fn interval(&self) -> Duration {
    self.interval
  }

  /// Probe an artifact URL once.
  pub async fn check_once(&self, url: &str) -> ExperimentStatus {
    self.probe.probe(url).await
  }

  /// Probe a stored experiment once and record a confirmed finish.
  ///
  /// Returns `Unknown` for experiments not in the store and skips the probe
  /// for experiments already finished.
  pub async fn check_experiment(&self, id: &str, url: &str) -> ExperimentStatus {
    match self.store.status(id) {
      ExperimentStatus::Running => {}
      status => return status,
    }

    match self.probe.probe(url).await {
      ExperimentStatus::Finished => {
        self.store.mark_finished(id);
        // Re-read: the record may have expired during the probe.
        self.store.status(id)
      }
      _ => ExperimentStatus::Running,
    }
  }

  /// Start polling `url` until the experiment's artifact appears.
  ///
  /// Returns `None` if the experiment is already being watched.
  pub fn watch(&self, id: &str, url: &str) -> Option<JoinHandle<PollOutcome>> {
    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
    let cancel = self.cancel.child_token();

    {
      let mut watches = lock(&self.watches);
      if watches.contains_key(id) {
        debug!(experiment_id = %id, "experiment already watched");
        return None;
      }
      watches.insert(
        id.to_string(),
        Watch {
          generation,
          cancel: cancel.clone(),
        },
      );
    }

    info!(experiment_id = %id, url, "watching experiment artifact");

    let probe = self.probe.clone();
    let store = self.store.clone();
    let watches = self.watches.clone();
    let interval = self.interval;
    let id = id.to_string();
    let url = url.to_string();

    Some(tokio::spawn(async move {
      let outcome = poll_until_available(&*probe, &store, &id, &url, interval, &cancel).await;

      let mut watches = lock(&watches);
      if watches.get(&id).is_some_and(|w| w.generation == generation) {
        watches.remove(&id);
      }
      drop(watches);

      info!(experiment_id = %id, outcome = ?outcome, "stopped watching experiment");
      outcome
    }))
  }

  /// Stop watching an experiment. Returns whether it was being watched.
  pub fn cancel(&self, id: &str) -> bool {
    match lock(&self.watches).remove(id) {
      Some(watch) => {
        watch.cancel.cancel();
        true
      }
      None => false,
    }
  }

  pub fn is_watching(&self, id: &str) -> bool {
    lock(&self.watches).contains_key(id)
  }

  /// Ids currently being watched.
  pub fn watched(&self) -> Vec<String> {
    lock(&self.watches).keys().cloned().collect()
  }

  /// Cancel every watch, including ones started later.
  pub fn shutdown(&self) {
    self.cancel.cancel();
    lock(&self.watches).clear();
  }
}

impl Drop for StatusPoller {
  fn drop(&mut self) {
    self.cancel.cancel();
  }
}

fn lock(watches: &Watches) -> MutexGuard<'_, HashMap<String, Watch>> {
  watches.lock().unwrap_or_else(|e| e.into_inner())
}

/// Probe on a fixed interval until the artifact appears, the record expires
/// or the token fires.
async fn poll_until_available(
  probe: &dyn ArtifactProbe,
  store: &ExperimentStore,
  id: &str,
  url: &str,
  interval: Duration,
  cancel: &CancellationToken,
) -> PollOutcome {
  loop {
    match store.status(id) {
      ExperimentStatus::Unknown => return PollOutcome::Expired,
      ExperimentStatus::Finished => return PollOutcome::Finished,
      ExperimentStatus::Running => {}
    }

    let status = tokio::select! {
      _ = cancel.cancelled() => return PollOutcome::Cancelled,
      status = probe.probe(url) => status,
    };

    if status == ExperimentStatus::Finished {
      store.mark_finished(id);
      return PollOutcome::Finished;
    }

    tokio::select! {
      _ = cancel.cancelled() => return PollOutcome::Cancelled,
      _ = tokio::time::sleep(interval) => {}
    }
  }
}
