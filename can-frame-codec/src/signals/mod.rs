//! Signal schemas and the schema set
//!
//! This module contains the validated message model, its serde-friendly
//! description form, and the set that owns every loaded schema.

pub mod database;
pub mod description;
pub mod schema;

// Re-export key types for convenience
pub use database::{DatabaseStats, SchemaSet};
pub use description::MessageDescription;
pub use schema::{ByteOrder, MultiplexerRole, SignalDef, SignalSchema, ValueType};
