//! Bytecode disassembly into a pc → byte table

use crate::{Result, TraceError};
use serde::{Deserialize, Serialize};

/// One entry of a disassembly table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawByte {
    /// Byte offset in the code
    pub pc: u64,
    /// Raw byte at that offset
    pub byte: u8,
}

/// Byte table of a bytecode blob, indexed by program counter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Disassembly {
    bytes: Vec<u8>,
}

impl Disassembly {
    /// Build a table from raw code bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Byte at `pc`, or `None` past the end of the code
    pub fn byte_at(&self, pc: u64) -> Option<u8> {
        usize::try_from(pc)
            .ok()
            .and_then(|index| self.bytes.get(index).copied())
    }

    /// Number of bytes in the code
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the code is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Raw code bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Iterate `(pc, byte)` entries in pc order
    pub fn entries(&self) -> impl Iterator<Item = RawByte> + '_ {
        self.bytes.iter().enumerate().map(|(pc, &byte)| RawByte {
            pc: pc as u64,
            byte,
        })
    }
}

pub(crate) fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode hex bytecode (optionally `0x`-prefixed) into a pc → byte table
pub fn disassemble(bytecode: &str) -> Result<Disassembly> {
    let hex_body = strip_hex_prefix(bytecode.trim());
    if hex_body.len() % 2 != 0 {
        return Err(TraceError::OddHexLength(hex_body.len()));
    }

    let bytes = hex::decode(hex_body).map_err(TraceError::InvalidHex)?;
    tracing::debug!("Disassembled {} bytes of bytecode", bytes.len());

    Ok(Disassembly::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_with_prefix() {
        // PUSH1 0x01 PUSH1 0x02 ADD
        let disasm = disassemble("0x6001600201").unwrap();
        assert_eq!(disasm.len(), 5);
        assert_eq!(disasm.byte_at(0), Some(0x60));
        assert_eq!(disasm.byte_at(4), Some(0x01));
        assert_eq!(disasm.byte_at(5), None);

        let entries: Vec<RawByte> = disasm.entries().collect();
        assert_eq!(entries[2], RawByte { pc: 2, byte: 0x60 });
    }

    #[test]
    fn test_disassemble_without_prefix_and_empty() {
        assert_eq!(disassemble("00").unwrap().as_bytes(), &[0x00]);
        assert!(disassemble("0x").unwrap().is_empty());
    }

    #[test]
    fn test_disassemble_rejects_bad_input() {
        assert!(matches!(
            disassemble("0x600"),
            Err(TraceError::OddHexLength(3))
        ));
        assert!(matches!(disassemble("0xzz"), Err(TraceError::InvalidHex(_))));
    }
}
