//! Lifecycle orchestrator
//!
//! Drives resolved scripts through the phases of a run, one hook invocation
//! at a time. Every phase completes for all scripts before the next phase
//! starts, step phases iterate steps in the outer loop, and a snapshot is
//! recorded after each invocation. Hooks a script does not implement are
//! skipped without a snapshot. The first hook error aborts the run.

use crate::context::{Channels, ContextBuilder};
use crate::resolver::resolve;
use crate::store::{SharedBus, Store};
use crate::{
    HookAbsent, Hooks, Phase, Result, RunOutput, RunnerError, ScriptDescriptor, ScriptResult,
    Snapshot,
};
use evm_tracer::RunEnvironment;
use serde_json::Value;

/// Mutable state of one run; dropped wholesale if the run fails
struct RunState {
    /// One store per script, indexed like the resolved order
    stores: Vec<Store>,
    /// Hooks each script turned out not to implement
    absent: Vec<Hooks>,
    shared: SharedBus,
    channels: Channels,
    results: Vec<ScriptResult>,
    snapshots: Vec<Snapshot>,
}

impl RunState {
    fn new(script_count: usize) -> Self {
        Self {
            stores: (0..script_count).map(|_| Store::new()).collect(),
            absent: vec![Hooks::empty(); script_count],
            shared: SharedBus::new(),
            channels: Channels::default(),
            results: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    fn finish(self) -> RunOutput {
        RunOutput {
            run_id: hex::encode(rand::random::<[u8; 32]>()),
            scripts: self.results,
            marks: self.channels.marks,
            views: self.channels.views,
            snapshots: self.snapshots,
        }
    }
}

/// Runs a fixed, dependency-ordered set of scripts
///
/// Dependencies are resolved once, at construction; every run reuses that
/// order. Runs share nothing: each starts with empty stores and an empty bus.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    scripts: Vec<ScriptDescriptor>,
}

impl ScriptRunner {
    /// Resolve `scripts` into execution order
    pub fn new(scripts: Vec<ScriptDescriptor>) -> Result<Self> {
        let scripts = resolve(scripts)?;
        tracing::debug!(
            "Resolved script order: {:?}",
            scripts.iter().map(ScriptDescriptor::id).collect::<Vec<_>>()
        );
        Ok(Self { scripts })
    }

    /// Scripts in resolved order
    pub fn scripts(&self) -> &[ScriptDescriptor] {
        &self.scripts
    }

    /// Replay one transaction through every lifecycle phase
    pub async fn run_for_tx(&self, env: &RunEnvironment) -> Result<RunOutput> {
        tracing::info!(
            "Starting transaction run: {} scripts, {} steps",
            self.scripts.len(),
            env.trace.len()
        );

        let builder = ContextBuilder::new(env);
        let mut state = RunState::new(self.scripts.len());
        let last = env.last_step_index();

        self.run_phase(env, &builder, &mut state, Phase::OnTxStart, Some(0))
            .await?;
        self.run_phase(env, &builder, &mut state, Phase::OnStart, Some(0))
            .await?;
        for index in 0..env.trace.len() {
            self.run_phase(env, &builder, &mut state, Phase::OnStep, Some(index))
                .await?;
        }
        self.run_phase(env, &builder, &mut state, Phase::OnFinish, Some(last))
            .await?;
        self.run_phase(env, &builder, &mut state, Phase::OnTxEnd, Some(last))
            .await?;

        let output = state.finish();
        tracing::info!(
            "Transaction run complete: {} results, {} marks, {} views, {} snapshots",
            output.scripts.len(),
            output.marks.len(),
            output.views.len(),
            output.snapshots.len()
        );
        Ok(output)
    }

    /// One-shot deploy-time run (`on_deploy` only, no step bound)
    pub async fn run_on_deploy(&self, env: &RunEnvironment) -> Result<RunOutput> {
        self.run_one_shot(env, Phase::OnDeploy).await
    }

    /// One-shot run after a redeploy (`on_redeploy` only, no step bound)
    pub async fn run_on_redeploy(&self, env: &RunEnvironment) -> Result<RunOutput> {
        self.run_one_shot(env, Phase::OnRedeploy).await
    }

    async fn run_one_shot(&self, env: &RunEnvironment, phase: Phase) -> Result<RunOutput> {
        tracing::info!("Starting {} run: {} scripts", phase, self.scripts.len());

        let builder = ContextBuilder::new(env);
        let mut state = RunState::new(self.scripts.len());
        self.run_phase(env, &builder, &mut state, phase, None).await?;

        Ok(state.finish())
    }

    async fn run_phase(
        &self,
        env: &RunEnvironment,
        builder: &ContextBuilder<'_>,
        state: &mut RunState,
        phase: Phase,
        step_index: Option<usize>,
    ) -> Result<()> {
        tracing::trace!("Phase {} (step {:?})", phase, step_index);

        for position in 0..self.scripts.len() {
            if !state.absent[position].covers(phase) {
                self.invoke(env, builder, state, position, phase, step_index)
                    .await?;
            }
        }
        Ok(())
    }

    async fn invoke(
        &self,
        env: &RunEnvironment,
        builder: &ContextBuilder<'_>,
        state: &mut RunState,
        position: usize,
        phase: Phase,
        step_index: Option<usize>,
    ) -> Result<()> {
        let descriptor = &self.scripts[position];
        let script = descriptor.script();
        let id = descriptor.id();
        let step = step_index.and_then(|index| env.step(index));

        let outcome: anyhow::Result<Option<Value>> = {
            let mut ctx = builder.build(
                id,
                phase,
                step_index,
                &mut state.stores[position],
                &mut state.shared,
                &mut state.channels,
            );
            match phase {
                Phase::OnDeploy => script.on_deploy(&mut ctx).await.map(|()| None),
                Phase::OnRedeploy => script.on_redeploy(&mut ctx).await.map(|()| None),
                Phase::OnTxStart => script.on_tx_start(&mut ctx).await.map(|()| None),
                Phase::OnStart => script.on_start(&mut ctx).await.map(|()| None),
                Phase::OnStep => match step {
                    Some(step) => script.on_step(&mut ctx, step).await.map(|()| None),
                    None => Ok(None),
                },
                Phase::OnFinish => script.on_finish(&mut ctx).await,
                Phase::OnTxEnd => script.on_tx_end(&mut ctx).await.map(|()| None),
            }
        };

        let data = match outcome {
            Ok(data) => data,
            Err(err) if err.is::<HookAbsent>() => {
                tracing::trace!(script = id, "No {} hook", phase);
                state.absent[position].insert(phase.hook());
                return Ok(());
            }
            Err(source) => {
                tracing::error!(script = id, "Hook {} failed: {:#}", phase, source);
                return Err(RunnerError::Hook {
                    script: id.to_string(),
                    phase,
                    step_index,
                    source,
                });
            }
        };

        if let Some(data) = data {
            state.shared.publish(id, data.clone());
            state.results.push(ScriptResult {
                script_id: id.to_string(),
                data,
            });
        }

        state.snapshots.push(Snapshot::capture(
            id,
            phase,
            step_index,
            step,
            &state.stores[position],
            &state.shared,
        ));
        Ok(())
    }
}

/// Resolve `scripts` and replay one transaction through them
pub async fn run_for_tx(
    env: &RunEnvironment,
    scripts: Vec<ScriptDescriptor>,
) -> Result<RunOutput> {
    ScriptRunner::new(scripts)?.run_for_tx(env).await
}

/// Resolve `scripts` and run their deploy hooks once
pub async fn run_on_deploy(
    env: &RunEnvironment,
    scripts: Vec<ScriptDescriptor>,
) -> Result<RunOutput> {
    ScriptRunner::new(scripts)?.run_on_deploy(env).await
}

/// Resolve `scripts` and run their redeploy hooks once
pub async fn run_on_redeploy(
    env: &RunEnvironment,
    scripts: Vec<ScriptDescriptor>,
) -> Result<RunOutput> {
    ScriptRunner::new(scripts)?.run_on_redeploy(env).await
}
