//! Replay bundles
//!
//! A bundle is everything a run needs, captured in one JSON document:
//! contract code, transaction metadata and the trace. The trace is given
//! either as raw `debug_traceTransaction` struct logs or as already
//! converted execution steps.

use anyhow::{Context, Result};
use evm_tracer::{ExecutionStep, RawStructLog, RunEnvironment, TraceResult, TxMeta};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayBundle {
    pub contract_address: String,
    /// Runtime code, hex
    pub runtime_bytecode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_bytecode: Option<String>,
    #[serde(default)]
    pub is_creation_phase: bool,
    #[serde(default)]
    pub tx: TxMeta,
    #[serde(default, alias = "struct_logs", skip_serializing_if = "Option::is_none")]
    pub struct_logs: Option<Vec<RawStructLog>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<ExecutionStep>>,
}

impl ReplayBundle {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse replay bundle")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read bundle {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid bundle {}", path.display()))
    }

    /// Build the run environment, disassembling code and converting the trace
    pub fn into_environment(self) -> Result<RunEnvironment> {
        let steps = match (self.trace, self.struct_logs) {
            (Some(trace), logs) => {
                if logs.is_some() {
                    tracing::warn!("Bundle has both trace and structLogs; using trace");
                }
                trace
            }
            (None, Some(struct_logs)) => TraceResult { struct_logs }
                .into_steps()
                .context("Failed to convert struct logs")?,
            (None, None) => Vec::new(),
        };

        let mut env = RunEnvironment::new(self.contract_address, self.runtime_bytecode)
            .context("Invalid runtime bytecode")?;
        if let Some(creation) = self.creation_bytecode {
            env = env
                .with_creation_bytecode(creation)
                .context("Invalid creation bytecode")?;
        }

        tracing::debug!(
            "Bundle for {}: {} runtime bytes, {} steps",
            env.contract_address,
            env.runtime_disasm.len(),
            steps.len()
        );

        Ok(env
            .with_trace(steps)
            .with_tx(self.tx)
            .with_creation_phase(self.is_creation_phase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evm_tracer::Word;

    #[test]
    fn test_struct_logs_bundle() {
        let bundle = ReplayBundle::from_json(
            r#"{
                "contractAddress": "0xabc",
                "runtimeBytecode": "0x6001600055",
                "tx": { "hash": "0x01", "value": "0x10", "status": 1 },
                "struct_logs": [
                    { "pc": 0, "op": "PUSH1", "gas": 100, "gasCost": 3, "depth": 1, "stack": [] },
                    { "pc": 2, "op": "PUSH1", "gas": 97, "gasCost": 3, "depth": 1, "stack": ["0x1"] }
                ]
            }"#,
        )
        .unwrap();

        let env = bundle.into_environment().unwrap();
        assert_eq!(env.trace.len(), 2);
        assert_eq!(env.trace[1].stack, vec![Word::from(1)]);
        assert_eq!(env.runtime_disasm.len(), 5);
        assert_eq!(env.tx.value, Word::from(16));
        assert_eq!(env.tx.status, Some(1));
        assert!(!env.is_creation_phase);
    }

    #[test]
    fn test_converted_trace_bundle() {
        let env = ReplayBundle::from_json(
            r#"{
                "contractAddress": "0xabc",
                "runtimeBytecode": "00",
                "creationBytecode": "0x6000",
                "isCreationPhase": true,
                "trace": [ { "pc": 0, "opcode": "STOP", "gas": 0, "gasCost": 0, "depth": 1, "stack": [] } ]
            }"#,
        )
        .unwrap()
        .into_environment()
        .unwrap();

        assert_eq!(env.trace[0].opcode, "STOP");
        assert_eq!(env.creation_disasm.len(), 2);
        assert!(env.is_creation_phase);
    }

    #[test]
    fn test_missing_trace_is_empty() {
        let json = r#"{ "contractAddress": "0x1", "runtimeBytecode": "0x" }"#;
        let env = ReplayBundle::from_json(json)
            .unwrap()
            .into_environment()
            .unwrap();
        assert!(env.trace.is_empty());
        assert!(env.runtime_disasm.is_empty());
    }

    #[test]
    fn test_bad_bytecode_is_rejected() {
        let json = r#"{ "contractAddress": "0x1", "runtimeBytecode": "0x123" }"#;
        let err = ReplayBundle::from_json(json)
            .unwrap()
            .into_environment()
            .unwrap_err();
        assert!(format!("{err:#}").contains("Invalid runtime bytecode"));
    }
}
