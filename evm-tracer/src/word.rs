//! Arbitrary-precision words
//!
//! Stack entries and wei amounts routinely exceed `u64`, so they are carried as
//! [`BigUint`] and always serialized as decimal strings.

use crate::TraceError;
use num_bigint::BigUint;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Unsigned integer of arbitrary width (EVM stack word, wei amount, gas total)
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Word(BigUint);

impl Word {
    /// Wrap an existing big integer
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    /// Parse a hex word, with or without `0x`. An empty body is zero.
    pub fn from_hex(s: &str) -> Result<Self, TraceError> {
        let body = crate::bytecode::strip_hex_prefix(s);
        if body.is_empty() {
            return Ok(Self::default());
        }
        BigUint::parse_bytes(body.as_bytes(), 16)
            .map(Self)
            .ok_or_else(|| TraceError::InvalidWord(s.to_string()))
    }

    /// Borrow the underlying integer
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// The value as `u64`, if it fits
    pub fn to_u64(&self) -> Option<u64> {
        u64::try_from(&self.0).ok()
    }
}

impl From<u64> for Word {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for Word {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl FromStr for Word {
    type Err = TraceError;

    /// Accepts `0x`-prefixed hex or plain decimal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
            return Self::from_hex(trimmed);
        }
        BigUint::parse_bytes(trimmed.as_bytes(), 10)
            .map(Self)
            .ok_or_else(|| TraceError::InvalidWord(s.to_string()))
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for Word {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

struct WordVisitor;

impl<'de> Visitor<'de> for WordVisitor {
    type Value = Word;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer, a decimal string or a 0x-prefixed hex string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Word, E> {
        Ok(Word::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Word, E> {
        u64::try_from(v)
            .map(Word::from)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Word, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Word {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WordVisitor)
    }
}
