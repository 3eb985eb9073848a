//! Runner errors

use crate::Phase;
use thiserror::Error;

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("duplicate script id: {0}")]
    DuplicateId(String),

    #[error("script {script:?} depends on missing {dependency:?}")]
    MissingDependency { script: String, dependency: String },

    #[error("script {0:?} depends on itself")]
    SelfDependency(String),

    #[error("cyclic script dependencies between {0:?}")]
    CyclicDependency(Vec<String>),

    #[error("script {script:?} failed in {phase}{}", step_suffix(.step_index))]
    Hook {
        script: String,
        phase: Phase,
        step_index: Option<usize>,
        #[source]
        source: anyhow::Error,
    },
}

fn step_suffix(step_index: &Option<usize>) -> String {
    step_index
        .map(|index| format!(" at step {index}"))
        .unwrap_or_default()
}

impl RunnerError {
    /// Whether the error was detected before any hook ran
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Hook { .. })
    }
}

/// Typed access to a store entry failed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store key {key:?} holds a value of another type (expected {expected})")]
    TypeMismatch { key: String, expected: &'static str },
}
