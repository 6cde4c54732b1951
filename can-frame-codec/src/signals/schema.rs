//! Validated message schemas
//!
//! A [`SignalSchema`] describes one message type: its frame ID, byte length and
//! the ordered signal definitions packed into it. Schemas are validated once at
//! construction and are immutable afterwards.

use crate::initial::{resolve_initial_values, InitialValues};
use crate::types::{EncodeError, SchemaError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Byte order for signal packing
///
/// Bit positions are numbered sequentially through the frame. Position `p`
/// lives in byte `p / 8`; little-endian numbers bits within a byte from the
/// LSB, big-endian from the MSB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Little-endian (Intel format), LSB first
    #[default]
    LittleEndian,
    /// Big-endian (Motorola format), MSB first
    BigEndian,
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Two's-complement signed integer
    Signed,
    /// Unsigned integer
    #[default]
    Unsigned,
}

/// Role of a signal in a multiplexed message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplexerRole {
    /// Always present
    #[default]
    None,
    /// Its raw value selects the active multiplexed signals
    Multiplexer,
    /// Present only when the multiplexer's raw value equals the selector
    Multiplexed(u64),
}

impl MultiplexerRole {
    /// True if two signals with these roles can appear in the same frame
    pub fn shares_context(&self, other: &MultiplexerRole) -> bool {
        match (self, other) {
            (MultiplexerRole::Multiplexed(a), MultiplexerRole::Multiplexed(b)) => a == b,
            _ => true,
        }
    }
}

fn default_scale() -> f64 {
    1.0
}

/// A CAN signal definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDef {
    /// Signal name, unique within its message
    pub name: String,
    /// First sequential bit position occupied by the signal
    pub start_bit: u16,
    /// Length in bits (1..=64)
    pub bit_length: u16,
    #[serde(default)]
    pub byte_order: ByteOrder,
    #[serde(default)]
    pub value_type: ValueType,
    /// Scale factor to convert raw value to physical value
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Offset to add after scaling
    #[serde(default)]
    pub offset: f64,
    /// Engineering unit (e.g., "km/h", "°C", "V")
    #[serde(default)]
    pub unit: Option<String>,
    /// Raw value used for the initial frame (absent means 0)
    #[serde(default)]
    pub initial_raw_value: Option<i64>,
    #[serde(default)]
    pub multiplexer_role: MultiplexerRole,
}

impl SignalDef {
    /// Create an unsigned little-endian signal with unit scaling
    pub fn new(name: impl Into<String>, start_bit: u16, bit_length: u16) -> Self {
        Self {
            name: name.into(),
            start_bit,
            bit_length,
            byte_order: ByteOrder::LittleEndian,
            value_type: ValueType::Unsigned,
            scale: 1.0,
            offset: 0.0,
            unit: None,
            initial_raw_value: None,
            multiplexer_role: MultiplexerRole::None,
        }
    }

    /// Builder method: set byte order
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Builder method: mark as two's-complement signed
    pub fn signed(mut self) -> Self {
        self.value_type = ValueType::Signed;
        self
    }

    /// Builder method: set scale and offset
    pub fn with_scaling(mut self, scale: f64, offset: f64) -> Self {
        self.scale = scale;
        self.offset = offset;
        self
    }

    /// Builder method: set engineering unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Builder method: set initial raw value
    pub fn with_initial(mut self, raw: i64) -> Self {
        self.initial_raw_value = Some(raw);
        self
    }

    /// Builder method: make this the multiplexer signal
    pub fn multiplexer(mut self) -> Self {
        self.multiplexer_role = MultiplexerRole::Multiplexer;
        self
    }

    /// Builder method: make this signal active only for `selector`
    pub fn multiplexed(mut self, selector: u64) -> Self {
        self.multiplexer_role = MultiplexerRole::Multiplexed(selector);
        self
    }

    pub fn is_signed(&self) -> bool {
        self.value_type == ValueType::Signed
    }

    pub fn is_multiplexer(&self) -> bool {
        self.multiplexer_role == MultiplexerRole::Multiplexer
    }

    /// Initial raw value, 0 when none is declared
    pub fn initial_raw(&self) -> i64 {
        self.initial_raw_value.unwrap_or(0)
    }

    /// Inclusive raw range representable in `bit_length` bits
    pub fn raw_range(&self) -> (i128, i128) {
        let bits = u32::from(self.bit_length);
        if self.is_signed() {
            (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
        } else {
            (0, (1i128 << bits) - 1)
        }
    }

    /// Physical value of a raw integer: `raw * scale + offset`
    pub fn raw_to_physical(&self, raw: i128) -> f64 {
        raw as f64 * self.scale + self.offset
    }

    /// Raw integer for a physical value: `round((physical - offset) / scale)`
    pub fn physical_to_raw(&self, physical: f64) -> Result<i128, EncodeError> {
        let raw = ((physical - self.offset) / self.scale).round();
        let (min, max) = self.raw_range();
        // The f64 bounds are inexact near 2^64, so recheck after the cast
        if !raw.is_finite() || raw < min as f64 || raw > max as f64 {
            return Err(EncodeError::OutOfRange(self.name.clone(), physical));
        }
        self.check_raw(raw as i128)
            .map_err(|_| EncodeError::OutOfRange(self.name.clone(), physical))
    }

    /// Ensure a raw integer fits the signal's bit width
    pub fn check_raw(&self, raw: i128) -> Result<i128, EncodeError> {
        let (min, max) = self.raw_range();
        if raw < min || raw > max {
            return Err(EncodeError::OutOfRange(
                self.name.clone(),
                self.raw_to_physical(raw),
            ));
        }
        Ok(raw)
    }
}

/// A validated, immutable CAN message definition
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSchema {
    frame_id: u32,
    name: String,
    byte_length: usize,
    cycle_time_ms: Option<u32>,
    signals: Vec<SignalDef>,
    /// Index of the multiplexer signal, if any
    multiplexer: Option<usize>,
}

impl SignalSchema {
    /// Validate signal definitions and build a schema
    ///
    /// Fails with the first violation found: zero byte length, malformed
    /// signal, out-of-range bit position, duplicate signal name, inconsistent
    /// multiplexing, or overlapping bit ranges within one multiplexer context.
    pub fn new(
        frame_id: u32,
        name: impl Into<String>,
        byte_length: usize,
        signals: Vec<SignalDef>,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let multiplexer = validate(&name, byte_length, &signals)?;

        log::debug!(
            "Built schema '{}' (ID 0x{:X}): {} bytes, {} signals",
            name,
            frame_id,
            byte_length,
            signals.len()
        );

        Ok(Self {
            frame_id,
            name,
            byte_length,
            cycle_time_ms: None,
            signals,
            multiplexer,
        })
    }

    /// Builder method: set the transmit period
    pub fn with_cycle_time(mut self, cycle_time_ms: u32) -> Self {
        self.cycle_time_ms = Some(cycle_time_ms);
        self
    }

    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    /// Frame ID formatted as lowercase hex, e.g. `0x1a0`
    pub fn id_hex(&self) -> String {
        format!("{:#x}", self.frame_id)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    pub fn frame_bits(&self) -> usize {
        self.byte_length * 8
    }

    pub fn cycle_time_ms(&self) -> Option<u32> {
        self.cycle_time_ms
    }

    /// All signals in declaration order
    pub fn signals(&self) -> &[SignalDef] {
        &self.signals
    }

    /// Look up a signal by name
    pub fn signal(&self, name: &str) -> Option<&SignalDef> {
        self.signals.iter().find(|s| s.name == name)
    }

    /// The multiplexer signal, if the message is multiplexed
    pub fn multiplexer(&self) -> Option<&SignalDef> {
        self.multiplexer.map(|idx| &self.signals[idx])
    }

    pub fn is_multiplexed(&self) -> bool {
        self.multiplexer.is_some()
    }

    /// Initial signal values and the frame they encode to
    pub fn initial_values(&self) -> InitialValues {
        resolve_initial_values(self)
    }
}

/// Check every schema invariant, returning the multiplexer index
fn validate(
    message: &str,
    byte_length: usize,
    signals: &[SignalDef],
) -> Result<Option<usize>, SchemaError> {
    if byte_length == 0 {
        return Err(SchemaError::ZeroByteLength {
            message: message.to_string(),
        });
    }
    let frame_bits = byte_length * 8;

    let mut names = HashSet::new();
    for signal in signals {
        if signal.name.is_empty() {
            return Err(SchemaError::EmptySignalName {
                message: message.to_string(),
            });
        }
        if signal.bit_length == 0 || signal.bit_length > 64 {
            return Err(SchemaError::InvalidBitLength {
                signal: signal.name.clone(),
                length: signal.bit_length,
            });
        }
        if !signal.scale.is_finite() || signal.scale == 0.0 || !signal.offset.is_finite() {
            return Err(SchemaError::InvalidScaling {
                signal: signal.name.clone(),
                scale: signal.scale,
                offset: signal.offset,
            });
        }
        if usize::from(signal.start_bit) + usize::from(signal.bit_length) > frame_bits {
            return Err(SchemaError::SignalOutOfRange {
                signal: signal.name.clone(),
                start_bit: signal.start_bit,
                length: signal.bit_length,
                frame_bits,
            });
        }
        if !names.insert(signal.name.as_str()) {
            return Err(SchemaError::DuplicateSignal {
                message: message.to_string(),
                signal: signal.name.clone(),
            });
        }
    }

    let mut multiplexer: Option<usize> = None;
    for (idx, signal) in signals.iter().enumerate() {
        if !signal.is_multiplexer() {
            continue;
        }
        if let Some(first) = multiplexer {
            return Err(SchemaError::MultipleMultiplexers {
                message: message.to_string(),
                first: signals[first].name.clone(),
                second: signal.name.clone(),
            });
        }
        multiplexer = Some(idx);
    }

    if multiplexer.is_none() {
        if let Some(orphan) = signals
            .iter()
            .find(|s| matches!(s.multiplexer_role, MultiplexerRole::Multiplexed(_)))
        {
            return Err(SchemaError::MissingMultiplexer {
                message: message.to_string(),
                signal: orphan.name.clone(),
            });
        }
    }

    // Masks come from the codec's own packing routine, so overlap is judged
    // on exactly the bits encode would touch.
    let masks: Vec<Vec<u8>> = signals
        .iter()
        .map(|s| crate::codec::signal_mask(s, byte_length))
        .collect();

    for (i, first) in signals.iter().enumerate() {
        for (j, second) in signals.iter().enumerate().skip(i + 1) {
            if !first.multiplexer_role.shares_context(&second.multiplexer_role) {
                continue;
            }
            let overlaps = masks[i].iter().zip(&masks[j]).any(|(a, b)| a & b != 0);
            if overlaps {
                return Err(SchemaError::OverlappingSignals {
                    message: message.to_string(),
                    first: first.name.clone(),
                    second: second.name.clone(),
                });
            }
        }
    }

    Ok(multiplexer)
}
