//! Lifecycle phases and hook declarations

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named stage of the script lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// One-shot, deploy-time run
    OnDeploy,
    /// One-shot run after the contract was deployed again
    OnRedeploy,
    /// Transaction started (called even for an empty trace)
    OnTxStart,
    /// Trace known, no step visited yet
    OnStart,
    /// One trace step
    OnStep,
    /// All steps visited; the hook may return a result
    OnFinish,
    /// Transaction analysis done
    OnTxEnd,
}

impl Phase {
    /// Phases of a transactional run, in execution order
    pub const TRANSACTION: [Phase; 5] = [
        Phase::OnTxStart,
        Phase::OnStart,
        Phase::OnStep,
        Phase::OnFinish,
        Phase::OnTxEnd,
    ];

    /// Flag of the hook invoked in this phase
    pub const fn hook(self) -> Hooks {
        match self {
            Self::OnDeploy => Hooks::DEPLOY,
            Self::OnRedeploy => Hooks::REDEPLOY,
            Self::OnTxStart => Hooks::TX_START,
            Self::OnStart => Hooks::START,
            Self::OnStep => Hooks::STEP,
            Self::OnFinish => Hooks::FINISH,
            Self::OnTxEnd => Hooks::TX_END,
        }
    }

    /// Whether the phase runs without any trace step bound
    pub const fn is_one_shot(self) -> bool {
        matches!(self, Self::OnDeploy | Self::OnRedeploy)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnDeploy => "onDeploy",
            Self::OnRedeploy => "onRedeploy",
            Self::OnTxStart => "onTxStart",
            Self::OnStart => "onStart",
            Self::OnStep => "onStep",
            Self::OnFinish => "onFinish",
            Self::OnTxEnd => "onTxEnd",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Set of lifecycle hooks, one flag per phase
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Hooks: u8 {
        const DEPLOY = 1 << 0;
        const REDEPLOY = 1 << 1;
        const TX_START = 1 << 2;
        const START = 1 << 3;
        const STEP = 1 << 4;
        const FINISH = 1 << 5;
        const TX_END = 1 << 6;
    }
}

impl Hooks {
    /// Whether the hook for `phase` is in the set
    pub fn covers(self, phase: Phase) -> bool {
        self.contains(phase.hook())
    }
}
