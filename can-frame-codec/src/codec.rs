//! Message encoding and decoding engine
//!
//! Packs physical signal values into CAN frames and extracts them back, based
//! on a validated [`SignalSchema`]. Handles bit placement, endianness,
//! two's-complement sign handling, multiplexing and physical value conversion.

use crate::signals::schema::{ByteOrder, MultiplexerRole, SignalDef, SignalSchema, ValueType};
use crate::types::{DecodeError, DecodedSignal, EncodeError, SignalValues};

/// Encode signal values into a frame of `schema.byte_length()` bytes
pub fn encode(schema: &SignalSchema, values: &SignalValues) -> Result<Vec<u8>, EncodeError> {
    MessageCodec::new(schema).encode(values)
}

/// Decode a frame into physical signal values
pub fn decode(schema: &SignalSchema, frame: &[u8]) -> Result<SignalValues, DecodeError> {
    MessageCodec::new(schema).decode(frame)
}

/// Stateless codec bound to one message schema
#[derive(Debug, Clone, Copy)]
pub struct MessageCodec<'a> {
    schema: &'a SignalSchema,
}

impl<'a> MessageCodec<'a> {
    pub fn new(schema: &'a SignalSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &'a SignalSchema {
        self.schema
    }

    /// Encode physical values into a frame
    ///
    /// Every active signal must be present in `values`: all non-multiplexed
    /// signals plus the multiplexed signals selected by the multiplexer. The
    /// multiplexer itself falls back to its initial raw value when absent.
    /// Values for inactive or unknown signals are ignored.
    pub fn encode(&self, values: &SignalValues) -> Result<Vec<u8>, EncodeError> {
        let mut data = vec![0u8; self.schema.byte_length()];
        let selector = self.multiplexer_raw(values)?;

        for signal in self.schema.signals() {
            let raw = match signal.multiplexer_role {
                MultiplexerRole::Multiplexed(value) if selector != Some(i128::from(value)) => {
                    continue;
                }
                // A validated schema has exactly one multiplexer, so the selector is set here
                MultiplexerRole::Multiplexer => selector.unwrap_or_default(),
                MultiplexerRole::None | MultiplexerRole::Multiplexed(_) => {
                    let physical = values
                        .get(&signal.name)
                        .ok_or_else(|| EncodeError::MissingSignal(signal.name.clone()))?;
                    signal.physical_to_raw(physical)?
                }
            };

            // Truncation keeps the two's-complement low bits of negative values
            insert_raw(&mut data, signal, raw as u64);
        }

        if log::log_enabled!(log::Level::Trace) {
            for name in values.names() {
                if self.schema.signal(name).is_none() {
                    log::trace!(
                        "Ignoring value for unknown signal '{}' in message '{}'",
                        name,
                        self.schema.name()
                    );
                }
            }
        }

        Ok(data)
    }

    /// Decode a frame into physical values, in schema signal order
    ///
    /// Multiplexed signals not selected by the frame's multiplexer value are
    /// absent from the result.
    pub fn decode(&self, frame: &[u8]) -> Result<SignalValues, DecodeError> {
        Ok(self
            .decode_signals(frame)?
            .into_iter()
            .map(|signal| (signal.name, signal.value))
            .collect())
    }

    /// Decode a frame into signals carrying raw value, physical value and unit
    pub fn decode_signals(&self, frame: &[u8]) -> Result<Vec<DecodedSignal>, DecodeError> {
        if frame.len() != self.schema.byte_length() {
            return Err(DecodeError::LengthMismatch {
                expected: self.schema.byte_length(),
                actual: frame.len(),
            });
        }

        // For multiplexed messages, first extract the multiplexer signal value
        let selector = self.schema.multiplexer().map(|mux| extract_raw(frame, mux));

        let mut decoded = Vec::with_capacity(self.schema.signals().len());
        for signal in self.schema.signals() {
            if let MultiplexerRole::Multiplexed(value) = signal.multiplexer_role {
                if selector != Some(i128::from(value)) {
                    continue;
                }
            }

            let raw = extract_raw(frame, signal);
            decoded.push(DecodedSignal {
                name: signal.name.clone(),
                raw_value: raw as i64,
                value: signal.raw_to_physical(raw),
                unit: signal.unit.clone(),
            });
        }

        Ok(decoded)
    }

    /// Raw multiplexer value requested by `values`, or its initial value
    fn multiplexer_raw(&self, values: &SignalValues) -> Result<Option<i128>, EncodeError> {
        let Some(mux) = self.schema.multiplexer() else {
            return Ok(None);
        };

        let raw = match values.get(&mux.name) {
            Some(physical) => mux.physical_to_raw(physical)?,
            None => {
                log::trace!(
                    "Multiplexer '{}' not provided, using initial raw value {}",
                    mux.name,
                    mux.initial_raw()
                );
                mux.check_raw(i128::from(mux.initial_raw()))?
            }
        };

        Ok(Some(raw))
    }
}

/// Bits a signal occupies in a frame of `byte_length` bytes
pub(crate) fn signal_mask(signal: &SignalDef, byte_length: usize) -> Vec<u8> {
    let mut mask = vec![0u8; byte_length];
    insert_raw(&mut mask, signal, u64::MAX);
    mask
}

/// Write the low `bit_length` bits of `value` into the frame
fn insert_raw(data: &mut [u8], signal: &SignalDef, value: u64) {
    let start_bit = usize::from(signal.start_bit);
    let length = usize::from(signal.bit_length);

    match signal.byte_order {
        ByteOrder::LittleEndian => insert_little_endian(data, start_bit, length, value),
        ByteOrder::BigEndian => insert_big_endian(data, start_bit, length, value),
    }
}

/// Read a signal's raw value, sign-extended when signed
fn extract_raw(data: &[u8], signal: &SignalDef) -> i128 {
    let start_bit = usize::from(signal.start_bit);
    let length = usize::from(signal.bit_length);

    let raw_value = match signal.byte_order {
        ByteOrder::LittleEndian => extract_little_endian(data, start_bit, length),
        ByteOrder::BigEndian => extract_big_endian(data, start_bit, length),
    };

    match signal.value_type {
        ValueType::Unsigned => i128::from(raw_value),
        ValueType::Signed => i128::from(sign_extend(raw_value, length)),
    }
}

/// Extract signal with little-endian (Intel) byte order
///
/// Little-endian format:
/// - Start bit points to the LSB (least significant bit)
/// - Bits are numbered from LSB to MSB within each byte
/// - Byte 0 is the first byte in the CAN frame
fn extract_little_endian(data: &[u8], start_bit: usize, length: usize) -> u64 {
    let mut result: u64 = 0;

    for i in 0..length {
        let bit_pos = start_bit + i;
        let byte_idx = bit_pos / 8;
        let bit_in_byte = bit_pos % 8;

        if byte_idx < data.len() {
            let bit_value = (data[byte_idx] >> bit_in_byte) & 0x01;
            result |= (bit_value as u64) << i;
        }
    }

    result
}

/// Extract signal with big-endian (Motorola) byte order
///
/// Big-endian format:
/// - Start bit points to the MSB (most significant bit) of the signal
/// - Bit numbering: bit 0 = MSB of byte 0, bit 7 = LSB of byte 0
/// - Signal continues into the following bytes with decreasing significance
fn extract_big_endian(data: &[u8], start_bit: usize, length: usize) -> u64 {
    let mut result: u64 = 0;

    for i in 0..length {
        let bit_pos = start_bit + i;
        let byte_idx = bit_pos / 8;
        let bit_in_byte = 7 - (bit_pos % 8);

        if byte_idx < data.len() {
            let bit_value = (data[byte_idx] >> bit_in_byte) & 0x01;
            result |= (bit_value as u64) << (length - 1 - i);
        }
    }

    result
}

/// Inverse of [`extract_little_endian`]
fn insert_little_endian(data: &mut [u8], start_bit: usize, length: usize, value: u64) {
    for i in 0..length {
        let bit_pos = start_bit + i;
        let byte_idx = bit_pos / 8;
        let bit_in_byte = bit_pos % 8;

        if byte_idx < data.len() {
            let bit_value = ((value >> i) & 0x01) as u8;
            data[byte_idx] = (data[byte_idx] & !(1 << bit_in_byte)) | (bit_value << bit_in_byte);
        }
    }
}

/// Inverse of [`extract_big_endian`]
fn insert_big_endian(data: &mut [u8], start_bit: usize, length: usize, value: u64) {
    for i in 0..length {
        let bit_pos = start_bit + i;
        let byte_idx = bit_pos / 8;
        let bit_in_byte = 7 - (bit_pos % 8);

        if byte_idx < data.len() {
            let bit_value = ((value >> (length - 1 - i)) & 0x01) as u8;
            data[byte_idx] = (data[byte_idx] & !(1 << bit_in_byte)) | (bit_value << bit_in_byte);
        }
    }
}

/// Sign-extend a value from N bits to 64 bits
///
/// If the value's MSB is 1, fill the upper bits with 1s.
fn sign_extend(value: u64, bit_length: usize) -> i64 {
    if bit_length >= 64 {
        return value as i64;
    }

    let sign_bit = 1u64 << (bit_length - 1);
    if (value & sign_bit) != 0 {
        let mask = !0u64 << bit_length;
        (value | mask) as i64
    } else {
        value as i64
    }
}
