//! Opcode classification
//!
//! Maps an opcode mnemonic to the semantic flags analysis scripts filter on.

use serde::{Deserialize, Serialize};

/// Mnemonic reported when there is no step to look at
pub const INVALID_OPCODE: &str = "INVALID";

/// Byte reported when the runtime table has no entry for a pc
pub const UNKNOWN_BYTE: u8 = 0xFF;

/// Semantic flags of one opcode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpcodeFlags {
    /// JUMP / JUMPI
    pub is_jump: bool,
    /// CALL / DELEGATECALL / STATICCALL / CALLCODE
    pub is_call: bool,
    /// STOP / RETURN / REVERT / SELFDESTRUCT / INVALID
    pub is_terminator: bool,
    /// PUSH0..PUSH32
    pub is_push: bool,
    /// DUP1..DUP16
    pub is_dup: bool,
    /// SWAP1..SWAP16
    pub is_swap: bool,
}

/// Classify a mnemonic, case-insensitively
pub fn classify(mnemonic: &str) -> OpcodeFlags {
    let op = mnemonic.to_ascii_uppercase();

    OpcodeFlags {
        is_jump: matches!(op.as_str(), "JUMP" | "JUMPI"),
        is_call: matches!(
            op.as_str(),
            "CALL" | "DELEGATECALL" | "STATICCALL" | "CALLCODE"
        ),
        is_terminator: matches!(
            op.as_str(),
            "STOP" | "RETURN" | "REVERT" | "SELFDESTRUCT" | "INVALID"
        ),
        is_push: op.starts_with("PUSH"),
        is_dup: op.starts_with("DUP"),
        is_swap: op.starts_with("SWAP"),
    }
}
