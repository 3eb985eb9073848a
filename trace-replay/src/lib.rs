//! Trace Replay - Analysis runs over recorded EVM transactions
//!
//! This crate ties the pieces together: it loads a replay bundle, selects the
//! built-in scripts, drives the script runner under a time limit, and hands
//! the output to a sink.

pub mod bundle;
pub mod config;
pub mod scripts;
pub mod sink;

pub use bundle::ReplayBundle;
pub use config::{ReplayConfig, RunKind};
pub use sink::{JsonSink, RunSink};

use anyhow::Context;
use evm_tracer::RunEnvironment;
use script_runner::{RunOutput, ScriptRunner};
use std::future::Future;
use std::time::Duration;

/// Result type for replay operations
pub type Result<T> = anyhow::Result<T>;

/// Runner over the scripts enabled by `config`
pub fn runner(config: &ReplayConfig) -> Result<ScriptRunner> {
    let scripts = scripts::select(&config.scripts)?;
    Ok(ScriptRunner::new(scripts)?)
}

/// Replay `env` through the configured scripts
///
/// The lifecycle is chosen by `config.run`. Exceeding `config.timeout()`
/// fails the run; no partial output is kept.
pub async fn replay(env: &RunEnvironment, config: &ReplayConfig) -> Result<RunOutput> {
    let runner = runner(config)?;
    tracing::info!(
        "Replaying {} ({:?} run) with {} scripts",
        env.contract_address,
        config.run,
        runner.scripts().len()
    );

    match config.run {
        RunKind::Tx => with_timeout(config.timeout(), runner.run_for_tx(env)).await,
        RunKind::Deploy => with_timeout(config.timeout(), runner.run_on_deploy(env)).await,
        RunKind::Redeploy => with_timeout(config.timeout(), runner.run_on_redeploy(env)).await,
    }
}

async fn with_timeout<F>(limit: Option<Duration>, run: F) -> Result<RunOutput>
where
    F: Future<Output = script_runner::Result<RunOutput>>,
{
    let output = match limit {
        Some(limit) => tokio::time::timeout(limit, run)
            .await
            .with_context(|| format!("Run timed out after {limit:?}"))??,
        None => run.await?,
    };
    Ok(output)
}
