//! Export - Documents as Downloadable Artifacts

use std::fs;
use std::path::Path;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hashing::{compute_source_hash, sha256_hex};
use crate::model::ProcessGraph;
use crate::pipeline::{GraphSerializer, SerializeError};
use crate::ENGINE_VERSION;

pub const FILE_EXTENSION: &str = "bpmn";
const FALLBACK_STEM: &str = "process";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error("Hashing error: {0}")]
    Hashing(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedDocument {
    pub filename: String,
    pub format: String,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    /// Document size in bytes.
    pub size: usize,
    pub sha256: String,
    pub source_hash: String,
    pub data_base64: String,
}

/// File name for a graph: title, else resolved name, else `process`.
pub fn file_name(graph: &ProcessGraph, default_process_id: &str) -> String {
    let label = graph
        .title()
        .unwrap_or_else(|| graph.resolved_name(default_process_id));

    let mut stem = String::with_capacity(label.len());
    let mut pending_gap = false;
    for c in label.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            if pending_gap && !stem.is_empty() {
                stem.push('_');
            }
            pending_gap = false;
            stem.push(c);
        } else if c.is_whitespace() {
            pending_gap = true;
        }
    }

    if stem.is_empty() {
        stem.push_str(FALLBACK_STEM);
    }
    format!("{}.{}", stem, FILE_EXTENSION)
}

/// Serialize and describe the result as a downloadable file.
pub fn package(
    serializer: &GraphSerializer,
    graph: &ProcessGraph,
) -> Result<(ExportedDocument, String), ExportError> {
    let document = serializer.serialize(graph)?;
    let bytes = document.as_bytes();

    let exported = ExportedDocument {
        filename: file_name(graph, &serializer.config().default_process_id),
        format: FILE_EXTENSION.to_string(),
        engine_version: ENGINE_VERSION.to_string(),
        created_at: Utc::now(),
        size: bytes.len(),
        sha256: sha256_hex(bytes),
        source_hash: compute_source_hash(graph, ENGINE_VERSION)?,
        data_base64: base64::engine::general_purpose::STANDARD.encode(bytes),
    };

    Ok((exported, document))
}

/// Serialize and write the raw document into `dir`.
pub fn write_to_dir(
    serializer: &GraphSerializer,
    graph: &ProcessGraph,
    dir: &Path,
) -> Result<ExportedDocument, ExportError> {
    let (exported, document) = package(serializer, graph)?;
    let path = dir.join(&exported.filename);

    fs::write(&path, document.as_bytes()).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;

    tracing::info!(path = %path.display(), bytes = exported.size, "document exported");
    Ok(exported)
}
