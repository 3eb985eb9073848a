//! EVM Tracer - Execution trace model for EVM transactions
//!
//! This crate holds the static inputs a trace replay works on: the recorded
//! per-step samples of a transaction, the runtime/creation bytecode and their
//! pc tables, and the transaction metadata.
//!
//! # Overview
//!
//! * [`ExecutionStep`] - one sample (pc, opcode, gas, depth, stack, raw memory/storage)
//! * [`RunEnvironment`] - everything a replay run reads, borrowed immutably by the runner
//! * [`Word`] - 256-bit (and wider) stack/value words, serialized as decimal strings
//! * [`disassemble`] - hex bytecode into a pc → byte table
//! * [`classify`] - opcode mnemonic into jump/call/terminator/push/dup/swap flags
//! * [`steps_from_trace_json`] - `debug_traceTransaction` output into steps
//!
//! # Usage
//!
//! ```no_run
//! use evm_tracer::{steps_from_trace_json, RunEnvironment};
//!
//! let raw = std::fs::read_to_string("trace.json").unwrap();
//! let steps = steps_from_trace_json(&raw).unwrap();
//!
//! let env = RunEnvironment::new("0x5fbdb2315678afecb367f032d93f642f64180aa3", "0x6001600201")
//!     .unwrap()
//!     .with_trace(steps);
//! println!("Replaying {} steps", env.trace.len());
//! ```

pub mod bytecode;
pub mod error;
pub mod opcode;
pub mod struct_log;
pub mod trace;
pub mod word;

pub use bytecode::{disassemble, Disassembly, RawByte};
pub use error::TraceError;
pub use opcode::{classify, OpcodeFlags, INVALID_OPCODE, UNKNOWN_BYTE};
pub use struct_log::{steps_from_trace_json, RawStructLog, TraceResult};
pub use trace::{ExecutionStep, RunEnvironment, TxMeta};
pub use word::Word;

/// Result type for EVM tracer operations
pub type Result<T> = std::result::Result<T, TraceError>;
