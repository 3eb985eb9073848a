//! Data structures for execution traces

use crate::bytecode::{disassemble, Disassembly};
use crate::{Result, Word};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One sample of a transaction trace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStep {
    /// Program counter (byte offset in the executing code)
    pub pc: u64,
    /// Opcode mnemonic as reported by the node
    pub opcode: String,
    /// Gas remaining before this step
    pub gas: u64,
    /// Gas charged by this step
    pub gas_cost: u64,
    /// Call depth (1 for the outermost frame)
    pub depth: u64,
    /// Stack, bottom first
    #[serde(default)]
    pub stack: Vec<Word>,
    /// Raw memory words, if the node reported them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_memory: Option<Vec<String>>,
    /// Raw storage slots touched so far, if the node reported them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_storage: Option<BTreeMap<String, String>>,
}

impl ExecutionStep {
    /// Create a step with an empty stack and no raw memory/storage
    pub fn new(pc: u64, opcode: impl Into<String>) -> Self {
        Self {
            pc,
            opcode: opcode.into(),
            ..Self::default()
        }
    }

    /// Attach stack contents, bottom first
    pub fn with_stack(mut self, stack: Vec<Word>) -> Self {
        self.stack = stack;
        self
    }
}

/// Transaction metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TxMeta {
    pub hash: String,
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Wei transferred
    pub value: Word,
    pub gas_used: Word,
    /// Receipt status (1 success, 0 revert)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u64>,
    /// Calldata, hex
    pub input: String,
    pub nonce: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Created contract, for deploy transactions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_before: Option<Word>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_after: Option<Word>,
}

/// Static input of one replay run
///
/// Owned by the caller; the runner only ever borrows it immutably.
#[derive(Debug, Clone, Default)]
pub struct RunEnvironment {
    /// Address of the contract under analysis
    pub contract_address: String,
    /// Runtime bytecode, hex
    pub runtime_bytecode: String,
    /// Creation (init) bytecode, hex
    pub creation_bytecode: Option<String>,
    /// pc → byte table of the runtime bytecode
    pub runtime_disasm: Disassembly,
    /// pc → byte table of the creation bytecode (empty when unknown)
    pub creation_disasm: Disassembly,
    /// Ordered steps of the transaction (empty for deploy-time runs)
    pub trace: Vec<ExecutionStep>,
    /// Transaction metadata
    pub tx: TxMeta,
    /// Whether the traced transaction is the contract creation
    pub is_creation_phase: bool,
}

impl RunEnvironment {
    /// Create an environment for a contract, disassembling its runtime code
    pub fn new(
        contract_address: impl Into<String>,
        runtime_bytecode: impl Into<String>,
    ) -> Result<Self> {
        let runtime_bytecode = runtime_bytecode.into();
        let runtime_disasm = disassemble(&runtime_bytecode)?;

        Ok(Self {
            contract_address: contract_address.into(),
            runtime_bytecode,
            runtime_disasm,
            ..Self::default()
        })
    }

    /// Attach creation bytecode, disassembling it
    pub fn with_creation_bytecode(mut self, creation_bytecode: impl Into<String>) -> Result<Self> {
        let creation_bytecode = creation_bytecode.into();
        self.creation_disasm = disassemble(&creation_bytecode)?;
        self.creation_bytecode = Some(creation_bytecode);
        Ok(self)
    }

    /// Attach the transaction trace
    pub fn with_trace(mut self, trace: Vec<ExecutionStep>) -> Self {
        self.trace = trace;
        self
    }

    /// Attach transaction metadata
    pub fn with_tx(mut self, tx: TxMeta) -> Self {
        self.tx = tx;
        self
    }

    /// Mark this run as the contract-creation transaction
    pub fn with_creation_phase(mut self, is_creation_phase: bool) -> Self {
        self.is_creation_phase = is_creation_phase;
        self
    }

    /// Step at `index`, if the trace has one
    pub fn step(&self, index: usize) -> Option<&ExecutionStep> {
        self.trace.get(index)
    }

    /// Index of the last step, or 0 for an empty trace
    pub fn last_step_index(&self) -> usize {
        self.trace.len().saturating_sub(1)
    }
}
