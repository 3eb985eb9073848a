//! Conversion of `debug_traceTransaction` struct logs into execution steps
//!
//! geth and anvil report one struct log per executed opcode, with stack words
//! as hex strings. Some nodes spell the list `struct_logs`.

use crate::{ExecutionStep, Result, Word};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One struct log entry, as returned by the node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStructLog {
    pub pc: u64,
    pub op: String,
    pub gas: u64,
    pub gas_cost: u64,
    pub depth: u64,
    #[serde(default)]
    pub stack: Option<Vec<String>>,
    #[serde(default)]
    pub memory: Option<Vec<String>>,
    #[serde(default)]
    pub storage: Option<BTreeMap<String, String>>,
}

/// Top-level `debug_traceTransaction` result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceResult {
    #[serde(default, alias = "struct_logs")]
    pub struct_logs: Vec<RawStructLog>,
}

impl TryFrom<RawStructLog> for ExecutionStep {
    type Error = crate::TraceError;

    fn try_from(log: RawStructLog) -> Result<Self> {
        let stack = log
            .stack
            .unwrap_or_default()
            .iter()
            .map(|word| word.parse::<Word>())
            .collect::<Result<Vec<_>>>()?;

        Ok(ExecutionStep {
            pc: log.pc,
            opcode: log.op,
            gas: log.gas,
            gas_cost: log.gas_cost,
            depth: log.depth,
            stack,
            raw_memory: log.memory,
            raw_storage: log.storage,
        })
    }
}

impl TraceResult {
    /// Convert every struct log into an execution step, in order
    pub fn into_steps(self) -> Result<Vec<ExecutionStep>> {
        self.struct_logs
            .into_iter()
            .map(ExecutionStep::try_from)
            .collect()
    }
}

/// Parse a `debug_traceTransaction` JSON result into execution steps
pub fn steps_from_trace_json(json: &str) -> Result<Vec<ExecutionStep>> {
    let result: TraceResult = serde_json::from_str(json)?;
    tracing::debug!("Parsed {} struct logs", result.struct_logs.len());
    result.into_steps()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = r#"{
        "gas": 21046,
        "failed": false,
        "structLogs": [
            {"pc": 0, "op": "PUSH1", "gas": 79000, "gasCost": 3, "depth": 1, "stack": []},
            {"pc": 2, "op": "PUSH1", "gas": 78997, "gasCost": 3, "depth": 1, "stack": ["0x1"]},
            {"pc": 4, "op": "ADD", "gas": 78994, "gasCost": 3, "depth": 1,
             "stack": ["0x1", "0x2"], "storage": {"00": "01"}}
        ]
    }"#;

    #[test]
    fn test_steps_from_trace_json() {
        let steps = steps_from_trace_json(TRACE).unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[2].opcode, "ADD");
        assert_eq!(steps[2].stack, vec![Word::from(1), Word::from(2)]);
        assert_eq!(steps[1].gas_cost, 3);
        assert_eq!(
            steps[2].raw_storage.as_ref().and_then(|s| s.get("00")).map(String::as_str),
            Some("01")
        );
        assert!(steps[0].raw_memory.is_none());
    }

    #[test]
    fn test_snake_case_alias_and_missing_stack() {
        let steps = steps_from_trace_json(
            r#"{"struct_logs": [{"pc": 7, "op": "STOP", "gas": 1, "gasCost": 0, "depth": 1}]}"#,
        )
        .unwrap();
        assert_eq!(steps.len(), 1);
        assert!(steps[0].stack.is_empty());
    }

    #[test]
    fn test_bad_stack_word_is_rejected() {
        let err = steps_from_trace_json(
            r#"{"structLogs": [{"pc": 0, "op": "POP", "gas": 1, "gasCost": 2, "depth": 1, "stack": ["0xnothex"]}]}"#,
        );
        assert!(matches!(err, Err(crate::TraceError::InvalidWord(_))));
    }
}
