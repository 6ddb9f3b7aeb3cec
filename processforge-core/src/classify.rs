//! Element Classifier - Closed Element Vocabulary
//!
//! Free-form node type tags map onto a fixed set of BPMN element kinds.
//! Unrecognized tags degrade to a generic task instead of failing.

use serde::{Deserialize, Serialize};

use crate::model::Node;
use crate::validation::{Diagnostic, Severity};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    StartEvent,
    EndEvent,
    /// Fallback for unrecognized type tags.
    #[default]
    Task,
    UserTask,
    ServiceTask,
    ManualTask,
    ScriptTask,
    BusinessRuleTask,
    IntermediateCatchEvent,
    IntermediateThrowEvent,
    ExclusiveGateway,
    ParallelGateway,
    InclusiveGateway,
}

impl ElementKind {
    pub const ALL: [ElementKind; 13] = [
        Self::StartEvent,
        Self::EndEvent,
        Self::Task,
        Self::UserTask,
        Self::ServiceTask,
        Self::ManualTask,
        Self::ScriptTask,
        Self::BusinessRuleTask,
        Self::IntermediateCatchEvent,
        Self::IntermediateThrowEvent,
        Self::ExclusiveGateway,
        Self::ParallelGateway,
        Self::InclusiveGateway,
    ];

    /// The type tag callers use for this kind in a process graph.
    pub fn type_tag(self) -> &'static str {
        match self {
            Self::StartEvent => "startEvent",
            Self::EndEvent => "endEvent",
            Self::Task => "task",
            Self::UserTask => "userTask",
            Self::ServiceTask => "serviceTask",
            Self::ManualTask => "manualTask",
            Self::ScriptTask => "scriptTask",
            Self::BusinessRuleTask => "businessRuleTask",
            Self::IntermediateCatchEvent => "intermediateCatchEvent",
            Self::IntermediateThrowEvent => "intermediateThrowEvent",
            Self::ExclusiveGateway => "exclusiveGateway",
            Self::ParallelGateway => "parallelGateway",
            Self::InclusiveGateway => "inclusiveGateway",
        }
    }

    /// Qualified element name in the emitted document.
    pub fn element_name(self) -> &'static str {
        match self {
            Self::StartEvent => "bpmn:startEvent",
            Self::EndEvent => "bpmn:endEvent",
            Self::Task => "bpmn:task",
            Self::UserTask => "bpmn:userTask",
            Self::ServiceTask => "bpmn:serviceTask",
            Self::ManualTask => "bpmn:manualTask",
            Self::ScriptTask => "bpmn:scriptTask",
            Self::BusinessRuleTask => "bpmn:businessRuleTask",
            Self::IntermediateCatchEvent => "bpmn:intermediateCatchEvent",
            Self::IntermediateThrowEvent => "bpmn:intermediateThrowEvent",
            Self::ExclusiveGateway => "bpmn:exclusiveGateway",
            Self::ParallelGateway => "bpmn:parallelGateway",
            Self::InclusiveGateway => "bpmn:inclusiveGateway",
        }
    }
}

/// A node's type tag after lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType<'a> {
    Known(ElementKind),
    Unrecognized(&'a str),
}

impl<'a> NodeType<'a> {
    pub fn parse(tag: &'a str) -> Self {
        ElementKind::ALL
            .into_iter()
            .find(|kind| kind.type_tag() == tag)
            .map_or(Self::Unrecognized(tag), Self::Known)
    }

    pub fn element_kind(self) -> ElementKind {
        match self {
            Self::Known(kind) => kind,
            Self::Unrecognized(_) => ElementKind::default(),
        }
    }
}

/// Classifier output for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub kind: ElementKind,
    pub warning: Option<Diagnostic>,
}

pub const UNRECOGNIZED_TYPE_RULE: &str = "unrecognized_node_type";

/// Classify a single node. Unknown types yield a generic task plus a warning.
pub fn classify(node: &Node) -> Classification {
    match NodeType::parse(&node.node_type) {
        NodeType::Known(kind) => Classification { kind, warning: None },
        NodeType::Unrecognized(tag) => {
            tracing::warn!(node = %node.id, node_type = %tag, "unrecognized node type, emitting generic task");
            Classification {
                kind: ElementKind::default(),
                warning: Some(Diagnostic {
                    rule: UNRECOGNIZED_TYPE_RULE.to_string(),
                    severity: Severity::Warning,
                    message: format!("Unrecognized node type '{}', emitted as task", tag),
                    subject: Some(node.id.clone()),
                }),
            }
        }
    }
}

/// Classify every node, in input order.
pub fn classify_nodes(nodes: &[Node]) -> Vec<Classification> {
    nodes.iter().map(classify).collect()
}
