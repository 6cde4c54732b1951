//! Core types for the CAN frame codec
//!
//! This module defines the error taxonomy, the name-keyed value mapping that is
//! handed to and returned by the codec, and the key used to select a message
//! from a schema set.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Result type for operations that combine schema lookup with encode/decode
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised while building a validated schema
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Message '{message}' has zero byte length")]
    ZeroByteLength { message: String },

    #[error("Message '{message}' contains a signal with an empty name")]
    EmptySignalName { message: String },

    #[error("Signal '{signal}' has invalid bit length {length} (expected 1..=64)")]
    InvalidBitLength { signal: String, length: u16 },

    #[error("Signal '{signal}' has invalid scaling (scale {scale}, offset {offset})")]
    InvalidScaling {
        signal: String,
        scale: f64,
        offset: f64,
    },

    #[error(
        "Signal '{signal}' (start bit {start_bit}, length {length}) does not fit in {frame_bits} frame bits"
    )]
    SignalOutOfRange {
        signal: String,
        start_bit: u16,
        length: u16,
        frame_bits: usize,
    },

    #[error("Duplicate signal '{signal}' in message '{message}'")]
    DuplicateSignal { message: String, signal: String },

    #[error("Message '{message}' has more than one multiplexer: '{first}' and '{second}'")]
    MultipleMultiplexers {
        message: String,
        first: String,
        second: String,
    },

    #[error("Multiplexed signal '{signal}' in message '{message}' has no multiplexer")]
    MissingMultiplexer { message: String, signal: String },

    #[error("Signals '{first}' and '{second}' overlap in message '{message}'")]
    OverlappingSignals {
        message: String,
        first: String,
        second: String,
    },

    #[error("Duplicate frame ID 0x{frame_id:X} ('{first}' and '{second}')")]
    DuplicateFrameId {
        frame_id: u32,
        first: String,
        second: String,
    },

    #[error("Duplicate message name '{name}'")]
    DuplicateMessageName { name: String },
}

/// Errors raised while packing signal values into a frame
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("Signal not provided: {0}")]
    MissingSignal(String),

    #[error("Value {1} is out of range for signal '{0}'")]
    OutOfRange(String, f64),
}

/// Errors raised while unpacking a frame
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Frame length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Neither a frame ID nor a message name matched
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unable to find message: {key}")]
pub struct LookupError {
    pub key: MessageKey,
}

/// Umbrella error for schema-set level operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Selects a message by frame ID or by name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// Numeric frame identifier
    Id(u32),
    /// Symbolic message name
    Name(String),
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKey::Id(id) => write!(f, "0x{:X}", id),
            MessageKey::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<u32> for MessageKey {
    fn from(id: u32) -> Self {
        MessageKey::Id(id)
    }
}

impl From<&str> for MessageKey {
    fn from(name: &str) -> Self {
        MessageKey::Name(name.to_string())
    }
}

impl From<String> for MessageKey {
    fn from(name: String) -> Self {
        MessageKey::Name(name)
    }
}

impl FromStr for MessageKey {
    type Err = Infallible;

    /// `0x`-prefixed hex and plain decimal parse as IDs, anything else is a name.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let id = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => trimmed.parse::<u32>().ok(),
        };

        Ok(match id {
            Some(id) => MessageKey::Id(id),
            None => MessageKey::Name(trimmed.to_string()),
        })
    }
}

/// Name-keyed mapping of physical signal values
///
/// Insertion order is preserved, so iteration over values produced by the
/// codec follows the schema's signal order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalValues(IndexMap<String, f64>);

impl SignalValues {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Physical value of a signal, if present
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Set a signal's physical value, returning the previous one
    pub fn set(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.0.insert(name.into(), value)
    }

    /// Builder method: set a signal's physical value
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    /// Remove a signal, keeping the order of the remaining entries
    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.0.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Signal names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for SignalValues {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// A decoded signal with both its raw and physical value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedSignal {
    /// Signal name from the schema
    pub name: String,
    /// Raw value before scaling (sign-extended for signed signals)
    pub raw_value: i64,
    /// Physical value (`raw * scale + offset`)
    pub value: f64,
    /// Engineering unit (e.g., "km/h", "°C", "V")
    pub unit: Option<String>,
}

impl fmt::Display for DecodedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {:.3}", self.name, self.value)?;
        if let Some(unit) = &self.unit {
            write!(f, " {}", unit)?;
        }
        write!(f, " (raw {})", self.raw_value)
    }
}
