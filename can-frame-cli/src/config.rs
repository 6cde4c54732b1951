//! Schema file loading
//!
//! A schema file lists message descriptions in TOML or JSON. The format is
//! chosen from the file extension.

use anyhow::{bail, Context, Result};
use can_frame_codec::{MessageDescription, SchemaSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level layout of a schema file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SchemaFile {
    #[serde(default, rename = "message")]
    pub messages: Vec<MessageDescription>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaFormat {
    Toml,
    Json,
}

impl SchemaFormat {
    fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        match extension.as_deref() {
            Some("toml") => Ok(SchemaFormat::Toml),
            Some("json") => Ok(SchemaFormat::Json),
            _ => bail!("Unsupported schema file format: {:?}", path),
        }
    }
}

/// Parse schema file content
fn parse_schema_file(content: &str, format: SchemaFormat) -> Result<SchemaFile> {
    match format {
        SchemaFormat::Toml => toml::from_str(content).context("Invalid TOML schema"),
        SchemaFormat::Json => serde_json::from_str(content).context("Invalid JSON schema"),
    }
}

/// Load and validate every message in a schema file
pub fn load_schema_set(path: &Path) -> Result<SchemaSet> {
    let format = SchemaFormat::from_path(path)?;
    log::info!("Loading schema file: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file: {:?}", path))?;

    let file = parse_schema_file(&content, format)
        .with_context(|| format!("Failed to parse schema file: {:?}", path))?;

    SchemaSet::from_descriptions(file.messages)
        .with_context(|| format!("Invalid schema in {:?}", path))
}
