//! Document Assembler - BPMN 2.0 Semantic Markup
//!
//! Emits definitions > process > (laneSet, flow nodes, sequence flows).
//! No diagram interchange section is written; viewers lay the graph out themselves.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::adjacency::AdjacencyIndex;
use crate::classify::ElementKind;
use crate::config::SerializerConfig;
use crate::model::{Lane, ProcessGraph};
use crate::pipeline::SerializeError;

pub const BPMN_MODEL_NS: &str = "http://www.omg.org/spec/BPMN/20100524/MODEL";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const BPMN_DI_NS: &str = "http://www.omg.org/spec/BPMN/20100524/DI";
pub const DC_NS: &str = "http://www.omg.org/spec/DD/20100524/DC";
pub const DI_NS: &str = "http://www.omg.org/spec/DD/20100524/DI";
pub const TARGET_NS: &str = "http://bpmn.io/schema/bpmn";

const DEFINITIONS: &str = "bpmn:definitions";
const PROCESS: &str = "bpmn:process";
const LANE_SET: &str = "bpmn:laneSet";
const LANE: &str = "bpmn:lane";
const FLOW_NODE_REF: &str = "bpmn:flowNodeRef";
const INCOMING: &str = "bpmn:incoming";
const OUTGOING: &str = "bpmn:outgoing";
const SEQUENCE_FLOW: &str = "bpmn:sequenceFlow";

/// Escape XML metacharacters. `&` goes first so introduced entities stay intact.
/// Apostrophes are left alone; every attribute is double-quoted.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub struct DocumentAssembler<'c> {
    config: &'c SerializerConfig,
}

impl<'c> DocumentAssembler<'c> {
    pub fn new(config: &'c SerializerConfig) -> Self {
        Self { config }
    }

    /// Assemble the document. `kinds[i]` is the element kind of `graph.nodes[i]`.
    pub fn assemble(
        &self,
        graph: &ProcessGraph,
        index: &AdjacencyIndex<'_>,
        kinds: &[ElementKind],
    ) -> Result<String, SerializeError> {
        let mut writer = if self.config.indent == 0 {
            Writer::new(Vec::new())
        } else {
            Writer::new_with_indent(Vec::new(), b' ', self.config.indent)
        };

        if self.config.xml_declaration {
            writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        }

        let process_id = graph.resolved_process_id(&self.config.default_process_id);
        let definitions_id = format!("Defs_{}", process_id);

        writer.write_event(Event::Start(element(
            DEFINITIONS,
            &[
                ("xmlns:xsi", XSI_NS),
                ("xmlns:bpmn", BPMN_MODEL_NS),
                ("xmlns:bpmndi", BPMN_DI_NS),
                ("xmlns:dc", DC_NS),
                ("xmlns:di", DI_NS),
                ("id", definitions_id.as_str()),
                ("targetNamespace", TARGET_NS),
            ],
        )))?;

        writer.write_event(Event::Start(element(
            PROCESS,
            &[
                ("id", process_id),
                ("name", graph.resolved_name(&self.config.default_process_id)),
                ("isExecutable", "false"),
            ],
        )))?;

        if !graph.lanes.is_empty() {
            self.write_lane_set(&mut writer, graph)?;
        }

        for (node, kind) in graph.nodes.iter().zip(kinds) {
            let mut attributes = vec![("id", node.id.as_str())];
            if let Some(name) = node.name() {
                attributes.push(("name", name));
            }

            let children: Vec<_> = index
                .incoming(&node.id)
                .iter()
                .map(|flow_id| (INCOMING, *flow_id))
                .chain(index.outgoing(&node.id).iter().map(|flow_id| (OUTGOING, *flow_id)))
                .collect();

            write_with_refs(&mut writer, kind.element_name(), &attributes, &children)?;
        }

        for flow in &graph.flows {
            if flow.id.is_empty() || !flow.is_connected() {
                continue;
            }

            let mut attributes = vec![
                ("id", flow.id.as_str()),
                ("sourceRef", flow.source.as_str()),
                ("targetRef", flow.target.as_str()),
            ];
            if let Some(name) = flow.name() {
                attributes.push(("name", name));
            }

            writer.write_event(Event::Empty(element(SEQUENCE_FLOW, &attributes)))?;
        }

        writer.write_event(Event::End(BytesEnd::new(PROCESS)))?;
        writer.write_event(Event::End(BytesEnd::new(DEFINITIONS)))?;

        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn write_lane_set<W: Write>(
        &self,
        writer: &mut Writer<W>,
        graph: &ProcessGraph,
    ) -> Result<(), SerializeError> {
        writer.write_event(Event::Start(element(
            LANE_SET,
            &[("id", self.config.lane_set_id.as_str())],
        )))?;

        for lane in &graph.lanes {
            let members: Vec<_> = lane_members(lane, graph)
                .map(|node_id| (FLOW_NODE_REF, node_id))
                .collect();

            let mut attributes = vec![("id", lane.id.as_str())];
            if let Some(name) = lane.name() {
                attributes.push(("name", name));
            }

            write_with_refs(writer, LANE, &attributes, &members)?;
        }

        writer.write_event(Event::End(BytesEnd::new(LANE_SET)))?;
        Ok(())
    }
}

/// Ids of nodes assigned to `lane`, in node order.
fn lane_members<'g>(lane: &'g Lane, graph: &'g ProcessGraph) -> impl Iterator<Item = &'g str> {
    graph
        .nodes
        .iter()
        .filter(move |node| node.lane_id() == Some(lane.id.as_str()))
        .map(|node| node.id.as_str())
}

/// Start tag with escaped attribute values, in the given order.
fn element<'a>(name: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    for (key, value) in attributes {
        let escaped = escape_xml(value);
        start.push_attribute((key.as_bytes(), escaped.as_bytes()));
    }
    start
}

/// An element whose children are `<child>id</child>` references, or an empty element.
fn write_with_refs<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    attributes: &[(&str, &str)],
    children: &[(&str, &str)],
) -> Result<(), SerializeError> {
    if children.is_empty() {
        writer.write_event(Event::Empty(element(name, attributes)))?;
        return Ok(());
    }

    writer.write_event(Event::Start(element(name, attributes)))?;
    for (child, text) in children {
        writer.write_event(Event::Start(BytesStart::new(*child)))?;
        writer.write_event(Event::Text(BytesText::from_escaped(escape_xml(text))))?;
        writer.write_event(Event::End(BytesEnd::new(*child)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Flow, Node};

    fn assemble(graph: &ProcessGraph, config: &SerializerConfig) -> String {
        let index = AdjacencyIndex::build(&graph.flows);
        let kinds: Vec<_> = graph
            .nodes
            .iter()
            .map(|n| crate::classify::classify(n).kind)
            .collect();
        DocumentAssembler::new(config).assemble(graph, &index, &kinds).unwrap()
    }

    fn single_line() -> SerializerConfig {
        SerializerConfig {
            indent: 0,
            xml_declaration: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_escape_order() {
        assert_eq!(escape_xml(r#"A & "B" < C"#), "A &amp; &quot;B&quot; &lt; C");
        assert_eq!(escape_xml("&amp;"), "&amp;amp;");
        assert_eq!(escape_xml("it's > that"), "it's &gt; that");
    }

    #[test]
    fn test_single_line_layout() {
        let graph = ProcessGraph {
            process_id: Some("P".into()),
            nodes: vec![
                Node { id: "a".into(), node_type: "startEvent".into(), ..Default::default() },
                Node { id: "b".into(), node_type: "endEvent".into(), name: Some("Done".into()), ..Default::default() },
            ],
            flows: vec![Flow { id: "f".into(), source: "a".into(), target: "b".into(), name: None }],
            ..Default::default()
        };

        let expected = concat!(
            r#"<bpmn:definitions xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
            r#"xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL" "#,
            r#"xmlns:bpmndi="http://www.omg.org/spec/BPMN/20100524/DI" "#,
            r#"xmlns:dc="http://www.omg.org/spec/DD/20100524/DC" "#,
            r#"xmlns:di="http://www.omg.org/spec/DD/20100524/DI" "#,
            r#"id="Defs_P" targetNamespace="http://bpmn.io/schema/bpmn">"#,
            r#"<bpmn:process id="P" name="P" isExecutable="false">"#,
            r#"<bpmn:startEvent id="a"><bpmn:outgoing>f</bpmn:outgoing></bpmn:startEvent>"#,
            r#"<bpmn:endEvent id="b" name="Done"><bpmn:incoming>f</bpmn:incoming></bpmn:endEvent>"#,
            r#"<bpmn:sequenceFlow id="f" sourceRef="a" targetRef="b"/>"#,
            r#"</bpmn:process></bpmn:definitions>"#,
        );
        assert_eq!(assemble(&graph, &single_line()), expected);
    }

    #[test]
    fn test_declaration_first() {
        let graph = ProcessGraph {
            nodes: vec![Node { id: "a".into(), node_type: "task".into(), ..Default::default() }],
            ..Default::default()
        };
        let doc = assemble(&graph, &SerializerConfig::default());
        assert!(doc.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(doc.contains(r#"<bpmn:task id="a"/>"#));
    }

    #[test]
    fn test_lane_set_uses_configured_id() {
        let graph = ProcessGraph {
            lanes: vec![Lane { id: "L1".into(), name: Some("Sales".into()) }, Lane { id: "L2".into(), name: None }],
            nodes: vec![Node {
                id: "a".into(),
                node_type: "userTask".into(),
                lane_id: Some("L1".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let config = SerializerConfig { lane_set_id: "Lanes".into(), ..single_line() };
        let doc = assemble(&graph, &config);
        assert!(doc.contains(concat!(
            r#"<bpmn:laneSet id="Lanes">"#,
            r#"<bpmn:lane id="L1" name="Sales"><bpmn:flowNodeRef>a</bpmn:flowNodeRef></bpmn:lane>"#,
            r#"<bpmn:lane id="L2"/>"#,
            r#"</bpmn:laneSet>"#,
        )));
    }

    #[test]
    fn test_unconnected_flow_not_emitted() {
        let graph = ProcessGraph {
            nodes: vec![Node { id: "a".into(), node_type: "task".into(), ..Default::default() }],
            flows: vec![Flow { id: "f".into(), source: "a".into(), target: String::new(), name: None }],
            ..Default::default()
        };
        let doc = assemble(&graph, &single_line());
        assert!(!doc.contains("sequenceFlow"));
        assert!(doc.contains(r#"<bpmn:task id="a"/>"#));
    }
}
