//! mdflow Config
//!
//! Settings consumed by the rest of the workspace: where the workflow engine
//! lives, where simulation artifacts land in object storage, how long
//! experiments are remembered and how often their artifacts are probed.
//!
//! Settings are loaded from a JSON file. Every field has a default, so an
//! empty object (or no file at all) yields a usable configuration:
//!
//! ```json
//! {
//!   "engine": { "url": "http://localhost:51404/apps", "timeout_secs": 30 },
//!   "storage": { "region": "eu-central-1", "bucket": "paasage-md-bucket", "path": "results/" },
//!   "cache": { "retention_secs": 3600 },
//!   "poll": { "interval_secs": 5, "probe_timeout_secs": 10, "auto_watch": true }
//! }
//! ```

mod error;
mod settings;

pub use error::ConfigError;
pub use settings::{CacheSettings, EngineSettings, PollSettings, Settings, StorageSettings};
