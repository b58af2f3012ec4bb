//! rowmend core
//!
//! Orchestrates a run: load the working copy, reconcile it with snapshot
//! history, repair regressions, enhance, and commit.
//!
//! # Core Concepts
//!
//! - [`RunConfig`]: Layered settings (defaults, TOML, environment, flags)
//! - [`Runner`]: The pipeline, generic over a [`rowmend_recovery::SnapshotStore`]
//! - [`RunTracker`]: Validated run state machine
//! - [`RunError`]: Failure taxonomy with exit codes and recovery actions
//!
//! # Example
//!
//! ```rust,ignore
//! use rowmend_core::{EnhanceRequest, RunConfig, Runner};
//!
//! let config = RunConfig::discover(None, Path::new("."))?.with_process_env();
//! let store = config.snapshot_store(Path::new("gods.csv"));
//! let mut runner = Runner::new(config, store);
//! let report = runner.enhance(&EnhanceRequest::new("gods.csv", selector, enhancements))?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod commit;
mod config;
mod error;
mod runner;
mod state;

pub use commit::commit;
pub use config::{ConfigError, RunConfig, DEFAULT_CONFIG_FILE, SNAPSHOT_DIR_ENV};
pub use error::{exit_code, RunError};
pub use runner::{CheckOutcome, EnhanceRequest, RunReport, Runner};
pub use state::{allowed_transitions, validate_transition, RunState, RunTracker, StateError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
