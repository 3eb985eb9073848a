//! Script trait and descriptors
//!
//! A script is an independently written analysis unit that reacts to some of
//! the lifecycle phases. Scripts hold no mutable state of their own: anything
//! that must survive between hooks lives in the [`Store`](crate::Store) the
//! context hands out.
//!
//! Only the hooks a script overrides take part in a run. The default bodies
//! return [`HookAbsent`], which the runner treats as "no call": nothing is
//! snapshotted and the hook is not offered again for the rest of the run.
//!
//! # Example
//!
//! ```ignore
//! struct CountJumps;
//!
//! #[async_trait]
//! impl Script for CountJumps {
//!     fn id(&self) -> &str { "user.jumps" }
//!
//!     async fn on_step(
//!         &self,
//!         ctx: &mut ScriptContext<'_>,
//!         _step: &ExecutionStep,
//!     ) -> anyhow::Result<()> {
//!         if ctx.flags().is_jump {
//!             *ctx.store().get_or_insert_with("jumps", || 0u64)? += 1;
//!         }
//!         Ok(())
//!     }
//!
//!     async fn on_finish(&self, ctx: &mut ScriptContext<'_>) -> anyhow::Result<Option<Value>> {
//!         Ok(ctx.store().get::<u64>("jumps").map(|n| json!({ "jumps": n })))
//!     }
//! }
//! ```

use crate::ScriptContext;
use async_trait::async_trait;
use evm_tracer::ExecutionStep;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Marker error of a hook the script does not implement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("hook not implemented")]
pub struct HookAbsent;

fn absent<T>() -> anyhow::Result<T> {
    Err(HookAbsent.into())
}

/// Lifecycle hooks of an analysis script
///
/// A hook left at its default is absent: it is never counted as invoked and
/// leaves no snapshot.
#[async_trait]
pub trait Script: Send + Sync {
    /// Unique id, used for dependencies, results and view ownership
    fn id(&self) -> &str;

    /// Ids of scripts that must run before this one in every phase
    fn depends_on(&self) -> Vec<String> {
        Vec::new()
    }

    /// Contract deployed; runs once with no step bound
    async fn on_deploy(&self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        absent()
    }

    /// Contract deployed again; runs once with no step bound
    async fn on_redeploy(&self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        absent()
    }

    /// New transaction, called even when the trace is empty
    async fn on_tx_start(&self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        absent()
    }

    /// Trace known, before the first step
    async fn on_start(&self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        absent()
    }

    async fn on_step(
        &self,
        _ctx: &mut ScriptContext<'_>,
        _step: &ExecutionStep,
    ) -> anyhow::Result<()> {
        absent()
    }

    /// All steps visited. A returned value becomes this script's result and
    /// is published on the shared bus under its id.
    async fn on_finish(&self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<Option<Value>> {
        absent()
    }

    async fn on_tx_end(&self, _ctx: &mut ScriptContext<'_>) -> anyhow::Result<()> {
        absent()
    }
}

/// A loaded script plus the metadata the resolver needs
///
/// Id and dependencies are captured once at construction; a loader may still
/// override the dependencies before the runner resolves them.
#[derive(Clone)]
pub struct ScriptDescriptor {
    id: String,
    depends_on: Vec<String>,
    script: Arc<dyn Script>,
}

impl ScriptDescriptor {
    pub fn new(script: Arc<dyn Script>) -> Self {
        Self {
            id: script.id().to_string(),
            depends_on: script.depends_on(),
            script,
        }
    }

    pub fn from_script<S: Script + 'static>(script: S) -> Self {
        Self::new(Arc::new(script))
    }

    /// Replace the declared dependencies
    pub fn with_depends_on<I, S>(mut self, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = depends_on.into_iter().map(Into::into).collect();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    pub fn script(&self) -> &dyn Script {
        self.script.as_ref()
    }
}

impl fmt::Debug for ScriptDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptDescriptor")
            .field("id", &self.id)
            .field("depends_on", &self.depends_on)
            .finish()
    }
}
