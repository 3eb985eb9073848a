//! Script Runner - Lifecycle engine for trace analysis scripts
//!
//! Replays a recorded EVM transaction through a set of independent analysis
//! scripts and aggregates what they find into a single [`RunOutput`].
//!
//! # Lifecycle
//!
//! A transactional run executes, for every script in dependency order:
//!
//! 1. `on_tx_start` - once, even when the trace is empty
//! 2. `on_start` - once, before any step
//! 3. `on_step` - for each step index (outer loop), for each script (inner loop)
//! 4. `on_finish` - once; a returned value becomes the script's result
//! 5. `on_tx_end` - once
//!
//! Deploy-time runs invoke only `on_deploy` (or `on_redeploy`) once per script.
//! Hooks a script does not override are skipped and leave no snapshot.
//!
//! # State
//!
//! * Each script owns a [`Store`] for the whole run
//! * All scripts share one [`SharedBus`] of published results
//! * After every hook a [`Snapshot`] copies both, insulated from later writes
//!
//! Hooks never run concurrently; a failing hook aborts the run and no output
//! is produced.

pub mod context;
pub mod error;
pub mod output;
pub mod phase;
pub mod resolver;
pub mod runner;
pub mod script;
pub mod snapshot;
pub mod store;

pub use context::ScriptContext;
pub use error::{RunnerError, StoreError};
pub use output::{Mark, MarkKind, RunOutput, ScriptResult, View, ViewType};
pub use phase::{Hooks, Phase};
pub use resolver::resolve;
pub use runner::{run_for_tx, run_on_deploy, run_on_redeploy, ScriptRunner};
pub use script::{HookAbsent, Script, ScriptDescriptor};
pub use snapshot::Snapshot;
pub use store::{SharedBus, SnapshotValue, Store};

/// Result type for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;
