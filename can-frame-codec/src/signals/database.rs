//! Schema set
//!
//! Holds every message schema loaded from one source and provides lookup by
//! frame ID or by message name. Initial values are resolved once per message
//! at insertion time and cached.

use crate::codec::MessageCodec;
use crate::initial::InitialValues;
use crate::signals::description::MessageDescription;
use crate::signals::schema::SignalSchema;
use crate::types::{DecodedSignal, LookupError, MessageKey, Result, SchemaError, SignalValues};
use std::collections::HashMap;

/// A schema together with its resolved initial values
#[derive(Debug, Clone)]
struct LoadedMessage {
    schema: SignalSchema,
    initial: InitialValues,
}

/// A batch of validated message schemas
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    /// Messages in insertion order
    messages: Vec<LoadedMessage>,

    /// Key: frame ID, Value: index into `messages`
    by_id: HashMap<u32, usize>,

    /// Key: message name, Value: index into `messages`
    by_name: HashMap<String, usize>,
}

impl SchemaSet {
    /// Create an empty schema set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from already validated schemas
    pub fn from_schemas(
        schemas: impl IntoIterator<Item = SignalSchema>,
    ) -> std::result::Result<Self, SchemaError> {
        let mut set = Self::new();
        for schema in schemas {
            set.insert(schema)?;
        }
        Ok(set)
    }

    /// Validate every description and build a set, stopping at the first error
    pub fn from_descriptions(
        descriptions: impl IntoIterator<Item = MessageDescription>,
    ) -> std::result::Result<Self, SchemaError> {
        let mut set = Self::new();
        for description in descriptions {
            set.insert(description.into_schema()?)?;
        }

        log::info!(
            "Loaded {} messages ({} signals)",
            set.message_count(),
            set.stats().num_signals
        );
        Ok(set)
    }

    /// Add a schema, rejecting duplicate frame IDs and names
    pub fn insert(&mut self, schema: SignalSchema) -> std::result::Result<(), SchemaError> {
        if let Some(&idx) = self.by_id.get(&schema.frame_id()) {
            return Err(SchemaError::DuplicateFrameId {
                frame_id: schema.frame_id(),
                first: self.messages[idx].schema.name().to_string(),
                second: schema.name().to_string(),
            });
        }
        if self.by_name.contains_key(schema.name()) {
            return Err(SchemaError::DuplicateMessageName {
                name: schema.name().to_string(),
            });
        }

        // A bad initial value is logged by the resolver and must not block loading
        let initial = schema.initial_values();

        let idx = self.messages.len();
        self.by_id.insert(schema.frame_id(), idx);
        self.by_name.insert(schema.name().to_string(), idx);
        log::debug!("Added message '{}' ({})", schema.name(), schema.id_hex());
        self.messages.push(LoadedMessage { schema, initial });

        Ok(())
    }

    /// Look up a schema by frame ID or name
    pub fn get(
        &self,
        key: impl Into<MessageKey>,
    ) -> std::result::Result<&SignalSchema, LookupError> {
        self.loaded(key.into()).map(|message| &message.schema)
    }

    pub fn get_by_id(&self, frame_id: u32) -> Option<&SignalSchema> {
        self.by_id
            .get(&frame_id)
            .map(|&idx| &self.messages[idx].schema)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&SignalSchema> {
        self.by_name
            .get(name)
            .map(|&idx| &self.messages[idx].schema)
    }

    pub fn contains(&self, key: impl Into<MessageKey>) -> bool {
        self.loaded(key.into()).is_ok()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All schemas in insertion order
    pub fn messages(&self) -> impl Iterator<Item = &SignalSchema> {
        self.messages.iter().map(|message| &message.schema)
    }

    /// All frame IDs, sorted
    pub fn frame_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Get schema set statistics
    pub fn stats(&self) -> DatabaseStats {
        DatabaseStats {
            num_messages: self.messages.len(),
            num_signals: self.messages().map(|s| s.signals().len()).sum(),
            num_multiplexed: self.messages().filter(|s| s.is_multiplexed()).count(),
        }
    }

    /// Encode values for the message selected by `key`
    pub fn encode(&self, key: impl Into<MessageKey>, values: &SignalValues) -> Result<Vec<u8>> {
        let schema = self.get(key)?;
        Ok(MessageCodec::new(schema).encode(values)?)
    }

    /// Decode a frame for the message selected by `key`
    pub fn decode(&self, key: impl Into<MessageKey>, frame: &[u8]) -> Result<SignalValues> {
        let schema = self.get(key)?;
        Ok(MessageCodec::new(schema).decode(frame)?)
    }

    /// Decode a frame into raw, physical and unit per signal
    pub fn decode_signals(
        &self,
        key: impl Into<MessageKey>,
        frame: &[u8],
    ) -> Result<Vec<DecodedSignal>> {
        let schema = self.get(key)?;
        Ok(MessageCodec::new(schema).decode_signals(frame)?)
    }

    /// Cached initial values of the message selected by `key`
    pub fn initial_values(&self, key: impl Into<MessageKey>) -> Result<&InitialValues> {
        Ok(&self.loaded(key.into())?.initial)
    }

    fn loaded(&self, key: MessageKey) -> std::result::Result<&LoadedMessage, LookupError> {
        let idx = match &key {
            MessageKey::Id(id) => self.by_id.get(id),
            MessageKey::Name(name) => self.by_name.get(name),
        };

        idx.map(|&idx| &self.messages[idx])
            .ok_or(LookupError { key })
    }
}

/// Schema set statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Total number of messages
    pub num_messages: usize,
    /// Total number of signal definitions
    pub num_signals: usize,
    /// Messages carrying a multiplexer
    pub num_multiplexed: usize,
}
