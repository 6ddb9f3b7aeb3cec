//! ProcessForge Core - Process Graph Serializer
//!
//! # The Four Laws (Non-Negotiable)
//! 1. Validation Precedes Output
//! 2. Unknown Types Degrade, Never Abort
//! 3. Deterministic Output
//! 4. Semantics Only, No Diagram Interchange

pub mod model;
pub mod validation;
pub mod adjacency;
pub mod classify;
pub mod assemble;
pub mod config;
pub mod hashing;
pub mod export;
pub mod pipeline;

pub use model::{ProcessGraph, Lane, Node, Flow};
pub use validation::{Diagnostic, FailureMode, LintReport, Linter, Severity};
pub use adjacency::AdjacencyIndex;
pub use classify::{ElementKind, NodeType};
pub use assemble::{escape_xml, DocumentAssembler};
pub use config::SerializerConfig;
pub use hashing::{compute_source_hash, canonical_json, sha256_hex};
pub use export::{ExportedDocument, ExportError};
pub use pipeline::{serialize, serialize_value, GraphSerializer, SerializeError, SerializedDocument};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
