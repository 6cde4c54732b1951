//! Structured message descriptions
//!
//! A [`MessageDescription`] is the unvalidated, serde-friendly form of a
//! message, as produced by whatever loads the schema source. Converting it into
//! a [`SignalSchema`] runs the full validation.

use crate::signals::schema::{SignalDef, SignalSchema};
use crate::types::SchemaError;
use serde::{Deserialize, Serialize};

/// Raw description of one message type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDescription {
    /// CAN frame ID
    pub frame_id: u32,
    /// Message name
    pub name: String,
    /// Frame size in bytes
    pub byte_length: usize,
    /// Transmit period in milliseconds
    #[serde(default)]
    pub cycle_time_ms: Option<u32>,
    /// Signals in declaration order
    #[serde(default)]
    pub signals: Vec<SignalDef>,
}

impl MessageDescription {
    /// Validate and convert into a schema
    pub fn into_schema(self) -> Result<SignalSchema, SchemaError> {
        let cycle_time_ms = self.cycle_time_ms;
        let schema = SignalSchema::new(self.frame_id, self.name, self.byte_length, self.signals)?;

        Ok(match cycle_time_ms {
            Some(ms) => schema.with_cycle_time(ms),
            None => schema,
        })
    }
}

impl TryFrom<MessageDescription> for SignalSchema {
    type Error = SchemaError;

    fn try_from(description: MessageDescription) -> Result<Self, Self::Error> {
        description.into_schema()
    }
}

impl From<&SignalSchema> for MessageDescription {
    fn from(schema: &SignalSchema) -> Self {
        Self {
            frame_id: schema.frame_id(),
            name: schema.name().to_string(),
            byte_length: schema.byte_length(),
            cycle_time_ms: schema.cycle_time_ms(),
            signals: schema.signals().to_vec(),
        }
    }
}
