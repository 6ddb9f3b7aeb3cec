//! Serialization Pipeline - Single Entry Point
//!
//! Stages run strictly in order: validate, index, classify, assemble.
//! CRITICAL: every element is checked before assembly starts. No partial documents.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::adjacency::AdjacencyIndex;
use crate::assemble::DocumentAssembler;
use crate::classify::classify_nodes;
use crate::config::SerializerConfig;
use crate::model::ProcessGraph;
use crate::validation::{check_value, validate_elements, validate_model, Diagnostic};

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowField {
    Id,
    Source,
    Target,
}

impl fmt::Display for FlowField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Id => "id",
            Self::Source => "source",
            Self::Target => "target",
        })
    }
}

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("Invalid model: expected a process graph object")]
    InvalidModel,

    #[error("Invalid node list: 'nodes' must be an array")]
    InvalidNodeList,

    #[error("Invalid flow list: 'flows' must be an array")]
    InvalidFlowList,

    #[error("Empty node list: a process graph needs at least one node")]
    EmptyNodeList,

    #[error("Node at index {index} has no id")]
    MissingNodeId { index: usize },

    #[error("Node '{id}' at index {index} has no type")]
    MissingNodeType { index: usize, id: String },

    #[error("Flow '{id}' at index {index} has no {field}")]
    MissingFlowField {
        index: usize,
        id: String,
        field: FlowField,
    },

    #[error("Malformed process graph: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Write error: {0}")]
    Write(#[from] quick_xml::Error),

    #[error("Encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

impl SerializeError {
    /// Stable machine-readable kind, used in CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidModel => "InvalidModel",
            Self::InvalidNodeList => "InvalidNodeList",
            Self::InvalidFlowList => "InvalidFlowList",
            Self::EmptyNodeList => "EmptyNodeList",
            Self::MissingNodeId { .. } => "MissingNodeId",
            Self::MissingNodeType { .. } => "MissingNodeType",
            Self::MissingFlowField { .. } => "MissingFlowField",
            Self::Decode(_) => "Decode",
            Self::Write(_) => "Write",
            Self::Encoding(_) => "Encoding",
        }
    }
}

/// A finished document plus the tolerated conditions met on the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedDocument {
    pub document: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// The serializer - single entry point for graph-to-document conversion
#[derive(Debug, Clone, Default)]
pub struct GraphSerializer {
    config: SerializerConfig,
}

impl GraphSerializer {
    pub fn new(config: SerializerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Run every fatal check on a decoded graph.
    ///
    /// This is the ONLY validation entry point.
    pub fn validate<'g>(&self, graph: &'g ProcessGraph) -> Result<&'g ProcessGraph, SerializeError> {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let graph = validate_model(graph)?;
        validate_elements(graph)?;
        Ok(graph)
    }

    /// Check the raw shape of a JSON graph, then decode it.
    pub fn decode(&self, value: &Value) -> Result<ProcessGraph, SerializeError> {
        check_value(value)?;
        Ok(ProcessGraph::deserialize(value)?)
    }

    pub fn serialize(&self, graph: &ProcessGraph) -> Result<String, SerializeError> {
        self.serialize_with_report(graph).map(|s| s.document)
    }

    /// Serialize, returning diagnostics alongside the document.
    ///
    /// CRITICAL: This ALWAYS calls validate internally. No bypass possible.
    pub fn serialize_with_report(&self, graph: &ProcessGraph) -> Result<SerializedDocument, SerializeError> {
        let graph = self.validate(graph)?;

        tracing::debug!(
            lanes = graph.lanes.len(),
            nodes = graph.nodes.len(),
            flows = graph.flows.len(),
            "serializing process graph"
        );

        let index = AdjacencyIndex::build(&graph.flows);

        let (kinds, diagnostics): (Vec<_>, Vec<_>) = classify_nodes(&graph.nodes)
            .into_iter()
            .map(|c| (c.kind, c.warning))
            .unzip();
        let diagnostics: Vec<Diagnostic> = diagnostics.into_iter().flatten().collect();

        let document = DocumentAssembler::new(&self.config).assemble(graph, &index, &kinds)?;

        tracing::debug!(bytes = document.len(), warnings = diagnostics.len(), "process graph serialized");

        Ok(SerializedDocument { document, diagnostics })
    }

    pub fn serialize_value(&self, value: &Value) -> Result<String, SerializeError> {
        let graph = self.decode(value)?;
        self.serialize(&graph)
    }
}

/// Serialize with default settings.
pub fn serialize(graph: &ProcessGraph) -> Result<String, SerializeError> {
    GraphSerializer::default().serialize(graph)
}

/// Serialize an undecoded JSON graph with default settings.
pub fn serialize_value(value: &Value) -> Result<String, SerializeError> {
    GraphSerializer::default().serialize_value(value)
}
