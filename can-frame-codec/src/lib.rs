//! CAN Frame Codec Library
//!
//! A stateless, schema-driven codec that packs named physical signal values
//! into fixed-length CAN frames and unpacks frames back into named values.
//!
//! # Architecture
//!
//! - [`SignalSchema`] describes one message type and is validated once at
//!   construction (bit ranges, overlaps, multiplexing, duplicates)
//! - [`SchemaSet`] owns a batch of schemas and looks them up by frame ID or name
//! - [`MessageCodec`] encodes and decodes frames against a borrowed schema
//! - [`resolve_initial_values`] computes each message's initial frame
//!
//! The library does NOT:
//! - Parse DBC text files
//! - Talk to a bus (no arbitration, CRC or acknowledgment handling)
//! - Perform any I/O
//!
//! # Example Usage
//!
//! ```
//! use can_frame_codec::{decode, encode, SignalDef, SignalSchema, SignalValues};
//!
//! let schema = SignalSchema::new(
//!     0x123,
//!     "EngineData",
//!     8,
//!     vec![
//!         SignalDef::new("EngineSpeed", 0, 16).with_unit("rpm"),
//!         SignalDef::new("EngineTemp", 16, 8).with_scaling(1.0, -40.0),
//!     ],
//! )
//! .unwrap();
//!
//! let values = SignalValues::new()
//!     .with("EngineSpeed", 3000.0)
//!     .with("EngineTemp", 90.0);
//!
//! let frame = encode(&schema, &values).unwrap();
//! assert_eq!(frame, vec![0xB8, 0x0B, 130, 0, 0, 0, 0, 0]);
//!
//! let decoded = decode(&schema, &frame).unwrap();
//! assert_eq!(decoded.get("EngineTemp"), Some(90.0));
//! ```

// Public modules
pub mod codec;
pub mod initial;
pub mod signals;
pub mod types;

// Re-export main types for convenience
pub use codec::{decode, encode, MessageCodec};
pub use initial::{resolve_initial_values, InitialValues};
pub use signals::{
    ByteOrder, DatabaseStats, MessageDescription, MultiplexerRole, SchemaSet, SignalDef,
    SignalSchema, ValueType,
};
pub use types::{
    CodecError, DecodeError, DecodedSignal, EncodeError, LookupError, MessageKey, Result,
    SchemaError, SignalValues,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
