//! mdflow Poller
//!
//! Finds out whether an experiment's output archive has reached object
//! storage. A probe that gets `200` means the run finished; any other answer,
//! including no answer at all, means it is still running. There is no failure
//! signal at this layer, only "not yet".
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                 StatusPoller                  │
//! │  - check_once(url) / check_experiment(id)     │
//! │  - watch(id, url) → one task per experiment   │
//! │  - cancel(id), shutdown()                     │
//! └───────────────────────────────────────────────┘
//!                         │
//!                         ▼
//! ┌───────────────────────────────────────────────┐
//! │       ArtifactProbe (HttpArtifactProbe)       │
//! │  - HEAD <base>/<bucket>/<path><archive>       │
//! └───────────────────────────────────────────────┘
//! ```

mod locator;
mod poller;
mod probe;

pub use locator::ArtifactLocator;
pub use poller::{PollOutcome, StatusPoller};
pub use probe::{ArtifactProbe, HttpArtifactProbe};
