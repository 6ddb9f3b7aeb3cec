//! Validation System - Fatal Checks and Advisory Lint
//!
//! Fatal checks reject a graph before any output exists.
//! Lint rules produce diagnostics; a policy decides whether they block.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classify::{NodeType, UNRECOGNIZED_TYPE_RULE};
use crate::model::ProcessGraph;
use crate::pipeline::{FlowField, SerializeError};

/// Top-level shape checks on an undecoded graph value.
pub fn check_value(value: &Value) -> Result<(), SerializeError> {
    let Some(graph) = value.as_object() else {
        return Err(SerializeError::InvalidModel);
    };

    let nodes = match graph.get("nodes") {
        Some(Value::Array(nodes)) => nodes,
        _ => return Err(SerializeError::InvalidNodeList),
    };

    match graph.get("flows") {
        None | Some(Value::Null) | Some(Value::Array(_)) => {}
        Some(_) => return Err(SerializeError::InvalidFlowList),
    }

    if nodes.is_empty() {
        return Err(SerializeError::EmptyNodeList);
    }

    Ok(())
}

/// Top-level checks on a decoded graph. Returns the graph untouched.
pub fn validate_model(graph: &ProcessGraph) -> Result<&ProcessGraph, SerializeError> {
    if graph.nodes.is_empty() {
        return Err(SerializeError::EmptyNodeList);
    }
    Ok(graph)
}

/// Per-element checks. The first malformed element wins, nodes before flows.
pub fn validate_elements(graph: &ProcessGraph) -> Result<(), SerializeError> {
    for (index, node) in graph.nodes.iter().enumerate() {
        if node.id.is_empty() {
            return Err(SerializeError::MissingNodeId { index });
        }
        if node.node_type.is_empty() {
            return Err(SerializeError::MissingNodeType {
                index,
                id: node.id.clone(),
            });
        }
    }

    for (index, flow) in graph.flows.iter().enumerate() {
        let missing = if flow.id.is_empty() {
            Some(FlowField::Id)
        } else if flow.source.is_empty() {
            Some(FlowField::Source)
        } else if flow.target.is_empty() {
            Some(FlowField::Target)
        } else {
            None
        };

        if let Some(field) = missing {
            return Err(SerializeError::MissingFlowField {
                index,
                id: flow.id.clone(),
                field,
            });
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Info,
}

/// A tolerated condition. Never changes what gets emitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    /// Id of the node, flow or lane concerned.
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// Warnings fail the report.
    Block,
    /// Record everything, never fail.
    #[default]
    Warn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintReport {
    pub valid: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl LintReport {
    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Warning)
    }
}

/// Lint rule trait - produces diagnostics
pub trait LintRule {
    fn name(&self) -> &'static str;
    fn check(&self, graph: &ProcessGraph) -> Vec<Diagnostic>;
}

// --- Concrete Rules ---

pub struct UnrecognizedTypeRule;

impl LintRule for UnrecognizedTypeRule {
    fn name(&self) -> &'static str { UNRECOGNIZED_TYPE_RULE }

    fn check(&self, graph: &ProcessGraph) -> Vec<Diagnostic> {
        graph
            .nodes
            .iter()
            .filter_map(|node| match NodeType::parse(&node.node_type) {
                NodeType::Known(_) => None,
                NodeType::Unrecognized(tag) => Some(Diagnostic {
                    rule: self.name().to_string(),
                    severity: Severity::Warning,
                    message: format!("Unrecognized node type '{}', emitted as task", tag),
                    subject: Some(node.id.clone()),
                }),
            })
            .collect()
    }
}

/// Flow endpoints that name no node. The serializer emits them anyway.
pub struct DanglingEndpointRule;

impl LintRule for DanglingEndpointRule {
    fn name(&self) -> &'static str { "dangling_flow_endpoint" }

    fn check(&self, graph: &ProcessGraph) -> Vec<Diagnostic> {
        let node_ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        let mut diagnostics = vec![];

        for flow in &graph.flows {
            for (end, node_id) in [("source", &flow.source), ("target", &flow.target)] {
                if !node_id.is_empty() && !node_ids.contains(node_id.as_str()) {
                    diagnostics.push(Diagnostic {
                        rule: self.name().to_string(),
                        severity: Severity::Warning,
                        message: format!("Flow {} references unknown node '{}'", end, node_id),
                        subject: Some(flow.id.clone()),
                    });
                }
            }
        }

        diagnostics
    }
}

/// Flows the adjacency index drops because an endpoint is empty.
pub struct SkippedFlowRule;

impl LintRule for SkippedFlowRule {
    fn name(&self) -> &'static str { "skipped_flow" }

    fn check(&self, graph: &ProcessGraph) -> Vec<Diagnostic> {
        graph
            .flows
            .iter()
            .filter(|flow| !flow.is_connected())
            .map(|flow| Diagnostic {
                rule: self.name().to_string(),
                severity: Severity::Warning,
                message: "Flow lacks source or target and is not indexed".to_string(),
                subject: Some(flow.id.clone()),
            })
            .collect()
    }
}

/// Ids shared by more than one node, flow or lane.
pub struct DuplicateIdRule;

impl LintRule for DuplicateIdRule {
    fn name(&self) -> &'static str { "duplicate_id" }

    fn check(&self, graph: &ProcessGraph) -> Vec<Diagnostic> {
        let ids = graph
            .lanes
            .iter()
            .map(|l| l.id.as_str())
            .chain(graph.nodes.iter().map(|n| n.id.as_str()))
            .chain(graph.flows.iter().map(|f| f.id.as_str()))
            .filter(|id| !id.is_empty());

        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut order = vec![];
        for id in ids {
            let count = counts.entry(id).or_insert(0);
            if *count == 0 {
                order.push(id);
            }
            *count += 1;
        }

        order
            .into_iter()
            .filter(|id| counts[id] > 1)
            .map(|id| Diagnostic {
                rule: self.name().to_string(),
                severity: Severity::Warning,
                message: format!("Id '{}' is used {} times", id, counts[id]),
                subject: Some(id.to_string()),
            })
            .collect()
    }
}

/// Nodes assigned to a lane the graph does not declare.
pub struct UnknownLaneRule;

impl LintRule for UnknownLaneRule {
    fn name(&self) -> &'static str { "unknown_lane" }

    fn check(&self, graph: &ProcessGraph) -> Vec<Diagnostic> {
        let lane_ids: HashSet<&str> = graph.lanes.iter().map(|l| l.id.as_str()).collect();

        graph
            .nodes
            .iter()
            .filter_map(|node| {
                let lane_id = node.lane_id()?;
                (!lane_ids.contains(lane_id)).then(|| Diagnostic {
                    rule: self.name().to_string(),
                    severity: Severity::Info,
                    message: format!("Node is assigned to undeclared lane '{}'", lane_id),
                    subject: Some(node.id.clone()),
                })
            })
            .collect()
    }
}

/// Linter orchestrates rules and applies policy
pub struct Linter {
    rules: Vec<Box<dyn LintRule>>,
    failure_mode: FailureMode,
}

impl Linter {
    pub fn new(failure_mode: FailureMode) -> Self {
        Self {
            rules: vec![
                Box::new(UnrecognizedTypeRule),
                Box::new(SkippedFlowRule),
                Box::new(DanglingEndpointRule),
                Box::new(DuplicateIdRule),
                Box::new(UnknownLaneRule),
            ],
            failure_mode,
        }
    }

    pub fn lint(&self, graph: &ProcessGraph) -> LintReport {
        let mut diagnostics = vec![];

        for rule in &self.rules {
            diagnostics.extend(rule.check(graph));
        }

        for d in &diagnostics {
            tracing::debug!(rule = %d.rule, subject = ?d.subject, "{}", d.message);
        }

        let has_warnings = diagnostics.iter().any(|d| d.severity == Severity::Warning);
        let valid = match self.failure_mode {
            FailureMode::Block => !has_warnings,
            FailureMode::Warn => true,
        };

        LintReport { valid, diagnostics }
    }
}

impl Default for Linter {
    fn default() -> Self {
        Self::new(FailureMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Flow, Lane, Node};
    use serde_json::json;

    fn node(id: &str, node_type: &str) -> Node {
        Node {
            id: id.into(),
            node_type: node_type.into(),
            ..Default::default()
        }
    }

    fn flow(id: &str, source: &str, target: &str) -> Flow {
        Flow {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            name: None,
        }
    }

    #[test]
    fn test_check_value_order() {
        assert!(matches!(check_value(&Value::Null), Err(SerializeError::InvalidModel)));
        assert!(matches!(check_value(&json!([])), Err(SerializeError::InvalidModel)));
        assert!(matches!(
            check_value(&json!({"nodes": "n1", "flows": 3})),
            Err(SerializeError::InvalidNodeList)
        ));
        assert!(matches!(
            check_value(&json!({"nodes": [], "flows": {}})),
            Err(SerializeError::InvalidFlowList)
        ));
        assert!(matches!(
            check_value(&json!({"nodes": []})),
            Err(SerializeError::EmptyNodeList)
        ));
        assert!(check_value(&json!({"nodes": [{}], "flows": null})).is_ok());
    }

    #[test]
    fn test_first_malformed_element_reported() {
        let graph = ProcessGraph {
            nodes: vec![node("n1", "task"), node("n2", ""), node("", "task")],
            flows: vec![flow("f1", "", "n2")],
            ..Default::default()
        };
        match validate_elements(&graph) {
            Err(SerializeError::MissingNodeType { index, id }) => {
                assert_eq!(index, 1);
                assert_eq!(id, "n2");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_flow_fields_checked_in_order() {
        let graph = ProcessGraph {
            nodes: vec![node("n1", "task")],
            flows: vec![flow("f1", "n1", "n1"), flow("f2", "n1", "")],
            ..Default::default()
        };
        match validate_elements(&graph) {
            Err(SerializeError::MissingFlowField { index, field, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(field, FlowField::Target);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_lint_is_advisory_by_default() {
        let graph = ProcessGraph {
            lanes: vec![Lane { id: "L1".into(), name: None }],
            nodes: vec![node("n1", "bogus"), node("n1", "task")],
            flows: vec![flow("f1", "n1", "ghost")],
            ..Default::default()
        };
        let report = Linter::default().lint(&graph);
        assert!(report.valid);

        let rules: Vec<_> = report.diagnostics.iter().map(|d| d.rule.as_str()).collect();
        assert_eq!(rules, ["unrecognized_node_type", "dangling_flow_endpoint", "duplicate_id"]);
        assert_eq!(report.diagnostics[1].subject.as_deref(), Some("f1"));
    }

    #[test]
    fn test_unconnected_flow_reported() {
        let graph = ProcessGraph {
            nodes: vec![node("a", "task")],
            flows: vec![flow("f", "a", ""), flow("g", "", "a"), flow("h", "a", "a")],
            ..Default::default()
        };
        let report = Linter::default().lint(&graph);
        let skipped: Vec<_> = report
            .diagnostics
            .iter()
            .filter(|d| d.rule == "skipped_flow")
            .map(|d| d.subject.as_deref())
            .collect();
        assert_eq!(skipped, [Some("f"), Some("g")]);
        assert!(report.valid);
    }

    #[test]
    fn test_block_mode_fails_on_warnings() {
        let graph = ProcessGraph {
            nodes: vec![node("n1", "bogus")],
            ..Default::default()
        };
        assert!(!Linter::new(FailureMode::Block).lint(&graph).valid);
    }

    #[test]
    fn test_unknown_lane_is_info_only() {
        let mut assigned = node("n1", "task");
        assigned.lane_id = Some("L9".into());
        let graph = ProcessGraph {
            nodes: vec![assigned],
            ..Default::default()
        };
        let report = Linter::new(FailureMode::Block).lint(&graph);
        assert!(report.valid);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].severity, Severity::Info);
    }
}
