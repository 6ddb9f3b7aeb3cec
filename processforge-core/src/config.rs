//! Serializer Configuration
//!
//! Every field has a default, so `{}` is a complete config file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PROCESS_ID: &str = "Process_1";
pub const DEFAULT_LANE_SET_ID: &str = "LaneSet_1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SerializerConfig {
    /// Spaces per nesting level. Zero writes the document on one line.
    #[serde(default = "default_indent")]
    pub indent: usize,
    #[serde(default = "default_true")]
    pub xml_declaration: bool,
    #[serde(default = "default_process_id")]
    pub default_process_id: String,
    #[serde(default = "default_lane_set_id")]
    pub lane_set_id: String,
}

fn default_indent() -> usize { 2 }
fn default_true() -> bool { true }
fn default_process_id() -> String { DEFAULT_PROCESS_ID.to_string() }
fn default_lane_set_id() -> String { DEFAULT_LANE_SET_ID.to_string() }

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            xml_declaration: true,
            default_process_id: default_process_id(),
            lane_set_id: default_lane_set_id(),
        }
    }
}

impl SerializerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}
