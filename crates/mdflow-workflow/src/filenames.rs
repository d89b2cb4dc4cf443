use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// Millisecond timestamp that is strictly increasing within the process.
///
/// Two submissions in the same millisecond still get distinct stamps, so
/// names derived from a stamp never collide for the lifetime of the process.
/// Uniqueness across restarts is only as good as the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stamp(u64);

impl Stamp {
  /// Take the next stamp.
  pub fn now() -> Self {
    let now = SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .map(|d| d.as_millis() as u64)
      .unwrap_or_default();

    let previous = LAST_STAMP
      .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
        Some(now.max(last + 1))
      })
      .unwrap_or_else(|last| last);
    Stamp(now.max(previous + 1))
  }

  pub fn from_millis(millis: u64) -> Self {
    Stamp(millis)
  }

  /// Milliseconds since the unix epoch.
  pub fn as_millis(&self) -> u64 {
    self.0
  }
}

impl fmt::Display for Stamp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Artifact filenames for one simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filenames {
  pub archive_filename: String,
  pub video_filename: String,
}

impl Filenames {
  pub fn for_stamp(stamp: Stamp) -> Self {
    Self {
      archive_filename: format!("md-simulation-{}.tgz", stamp),
      video_filename: format!("md-simulation-{}.avi", stamp),
    }
  }
}
