//! Reads BPMN 2.0 XML into a [`Diagram`]: flow nodes, sequence flows and the
//! BPMNDI bounds/waypoints needed to draw them.

use std::collections::HashMap;

use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::reader::Reader as XmlReader;

use crate::error::{DesignerError, Result};

use super::diagram::Diagram;
use super::registry;
use super::types::{Bounds, GraphNode, SequenceFlow};

type Attrs = Vec<(String, String)>;

struct FlowNodeDef {
    id: String,
    type_tag: String,
    name: Option<String>,
}

#[derive(Default)]
struct ParseState {
    process_depth: usize,
    label_depth: usize,
    current_shape: Option<String>,
    current_edge: Option<String>,
    nodes: Vec<FlowNodeDef>,
    flows: Vec<SequenceFlow>,
    shapes: HashMap<String, Bounds>,
    waypoints: HashMap<String, Vec<(f32, f32)>>,
}

pub fn parse_bpmn(xml: &str) -> Result<Diagram> {
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut state = ParseState::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(XmlEvent::Start(ref e)) => state.open(e, true)?,
            Ok(XmlEvent::Empty(ref e)) => state.open(e, false)?,
            Ok(XmlEvent::End(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                state.close(&name);
            }
            Ok(XmlEvent::Eof) => break,
            Err(e) => return Err(DesignerError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    state.into_diagram()
}

impl ParseState {
    fn open(&mut self, e: &BytesStart<'_>, has_children: bool) -> Result<()> {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
        let attrs = read_attrs(e);

        match name.as_str() {
            "process" => {
                if has_children {
                    self.process_depth += 1;
                }
            }
            "sequenceFlow" if self.process_depth > 0 => {
                self.flows.push(SequenceFlow {
                    id: required(&attrs, "id", &name)?,
                    source: required(&attrs, "sourceRef", &name)?,
                    target: required(&attrs, "targetRef", &name)?,
                    waypoints: Vec::new(),
                });
            }
            "BPMNShape" if has_children => {
                self.current_shape = get_attr(&attrs, "bpmnElement");
            }
            "BPMNEdge" if has_children => {
                self.current_edge = get_attr(&attrs, "bpmnElement");
            }
            "BPMNLabel" if has_children => {
                self.label_depth += 1;
            }
            "Bounds" if self.label_depth == 0 => {
                if let Some(element) = self.current_shape.clone() {
                    let bounds = Bounds::new(
                        number(&attrs, "x")?,
                        number(&attrs, "y")?,
                        number(&attrs, "width")?,
                        number(&attrs, "height")?,
                    );
                    self.shapes.insert(element, bounds);
                }
            }
            "waypoint" => {
                if let Some(element) = self.current_edge.clone() {
                    let point = (number(&attrs, "x")?, number(&attrs, "y")?);
                    self.waypoints.entry(element).or_default().push(point);
                }
            }
            _ if self.process_depth > 0 && is_flow_node(&name) => {
                self.nodes.push(FlowNodeDef {
                    id: required(&attrs, "id", &name)?,
                    type_tag: format!("bpmn:{}", capitalize(&name)),
                    name: get_attr(&attrs, "name").filter(|n| !n.is_empty()),
                });
            }
            _ => {}
        }

        Ok(())
    }

    fn close(&mut self, name: &str) {
        match name {
            "process" => self.process_depth = self.process_depth.saturating_sub(1),
            "BPMNShape" => self.current_shape = None,
            "BPMNEdge" => self.current_edge = None,
            "BPMNLabel" => self.label_depth = self.label_depth.saturating_sub(1),
            _ => {}
        }
    }

    fn into_diagram(mut self) -> Result<Diagram> {
        let mut diagram = Diagram::new();

        for def in self.nodes {
            let bounds = self.shapes.remove(&def.id).unwrap_or_else(|| {
                log::warn!("No diagram bounds for {}, placing at origin", def.id);
                let (w, h) = registry::default_size_for_tag(&def.type_tag);
                Bounds::new(0.0, 0.0, w, h)
            });
            let mut node = GraphNode::new(def.id, def.type_tag, bounds);
            node.name = def.name;
            diagram.add_node(node)?;
        }

        for mut flow in self.flows {
            flow.waypoints = self.waypoints.remove(&flow.id).unwrap_or_default();
            let id = flow.id.clone();
            diagram.add_flow(flow).map_err(|e| match e {
                DesignerError::UnknownNode(node) => DesignerError::InvalidDocument(format!(
                    "Sequence flow {} references unknown element {}",
                    id, node
                )),
                other => other,
            })?;
        }

        log::info!(
            "Imported {} elements and {} sequence flows",
            diagram.nodes().len(),
            diagram.flows().len()
        );
        Ok(diagram)
    }
}

fn is_flow_node(local_name: &str) -> bool {
    local_name == "task"
        || local_name.ends_with("Task")
        || local_name.ends_with("Event")
        || local_name.ends_with("Gateway")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn read_attrs(e: &BytesStart<'_>) -> Attrs {
    e.attributes()
        .filter_map(|a| a.ok())
        .map(|a| {
            let raw = String::from_utf8_lossy(&a.value).to_string();
            let value = quick_xml::escape::unescape(&raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.clone());
            (
                String::from_utf8_lossy(a.key.local_name().as_ref()).to_string(),
                value,
            )
        })
        .collect()
}

fn get_attr(attrs: &[(String, String)], name: &str) -> Option<String> {
    attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
}

fn required(attrs: &[(String, String)], name: &str, element: &str) -> Result<String> {
    get_attr(attrs, name).ok_or_else(|| {
        DesignerError::InvalidDocument(format!("<{}> is missing attribute '{}'", element, name))
    })
}

fn number(attrs: &[(String, String)], name: &str) -> Result<f32> {
    let raw = get_attr(attrs, name)
        .ok_or_else(|| DesignerError::InvalidDocument(format!("Missing coordinate '{}'", name)))?;
    raw.trim().parse().map_err(|_| {
        DesignerError::InvalidDocument(format!("Invalid number for '{}': {}", name, raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL"
                  xmlns:bpmndi="http://www.omg.org/spec/BPMN/20100524/DI"
                  xmlns:dc="http://www.omg.org/spec/DD/20100524/DC"
                  xmlns:di="http://www.omg.org/spec/DD/20100524/DI" id="Definitions_1">
  <bpmn:process id="Process_1" isExecutable="false">
    <bpmn:startEvent id="Start_1" name="Begin">
      <bpmn:outgoing>Flow_1</bpmn:outgoing>
    </bpmn:startEvent>
    <bpmn:userTask id="Switch_1" name="Route &amp; check" />
    <bpmn:intermediateCatchEvent id="Wait_1">
      <bpmn:timerEventDefinition id="Timer_1" />
    </bpmn:intermediateCatchEvent>
    <bpmn:sequenceFlow id="Flow_1" sourceRef="Start_1" targetRef="Switch_1" />
    <bpmn:sequenceFlow id="Flow_2" sourceRef="Switch_1" targetRef="Wait_1" />
  </bpmn:process>
  <bpmndi:BPMNDiagram id="Diagram_1">
    <bpmndi:BPMNPlane id="Plane_1" bpmnElement="Process_1">
      <bpmndi:BPMNShape id="Start_1_di" bpmnElement="Start_1">
        <dc:Bounds x="152" y="102" width="36" height="36" />
        <bpmndi:BPMNLabel>
          <dc:Bounds x="150" y="145" width="40" height="14" />
        </bpmndi:BPMNLabel>
      </bpmndi:BPMNShape>
      <bpmndi:BPMNShape id="Switch_1_di" bpmnElement="Switch_1">
        <dc:Bounds x="240" y="80" width="100" height="80" />
      </bpmndi:BPMNShape>
      <bpmndi:BPMNEdge id="Flow_1_di" bpmnElement="Flow_1">
        <di:waypoint x="188" y="120" />
        <di:waypoint x="240" y="120" />
      </bpmndi:BPMNEdge>
    </bpmndi:BPMNPlane>
  </bpmndi:BPMNDiagram>
</bpmn:definitions>"#;

    #[test]
    fn imports_nodes_flows_and_geometry() {
        let diagram = parse_bpmn(SAMPLE).unwrap();

        let ids: Vec<&str> = diagram.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["Start_1", "Switch_1", "Wait_1"]);

        let start = diagram.node("Start_1").unwrap();
        assert_eq!(start.type_tag, "bpmn:StartEvent");
        assert_eq!(start.name.as_deref(), Some("Begin"));
        // Label bounds must not override the shape bounds.
        assert_eq!(start.bounds, Bounds::new(152.0, 102.0, 36.0, 36.0));

        let switch = diagram.node("Switch_1").unwrap();
        assert_eq!(switch.type_tag, "bpmn:UserTask");
        assert_eq!(switch.name.as_deref(), Some("Route & check"));
        assert_eq!(switch.incoming, vec!["Flow_1".to_string()]);
        assert_eq!(switch.outgoing, vec!["Flow_2".to_string()]);

        let wait = diagram.node("Wait_1").unwrap();
        assert_eq!(wait.type_tag, "bpmn:IntermediateCatchEvent");
        assert_eq!(wait.bounds, Bounds::new(0.0, 0.0, 36.0, 36.0));

        assert_eq!(diagram.flows()[0].waypoints, vec![(188.0, 120.0), (240.0, 120.0)]);
        assert!(diagram.flows()[1].waypoints.is_empty());
    }

    #[test]
    fn dangling_flow_is_invalid() {
        let xml = r#"<definitions><process id="p">
            <startEvent id="s" />
            <sequenceFlow id="f" sourceRef="s" targetRef="missing" />
        </process></definitions>"#;

        let err = parse_bpmn(xml).unwrap_err();
        assert!(matches!(err, DesignerError::InvalidDocument(msg) if msg.contains("missing")));
    }

    #[test]
    fn malformed_xml_is_reported() {
        let err = parse_bpmn("<definitions><process id=\"p\"></definitions>").unwrap_err();
        assert!(matches!(err, DesignerError::Xml(_)));
    }

    #[test]
    fn plain_task_and_unknown_kinds_are_kept() {
        let xml = r#"<definitions><process id="p">
            <task id="t" />
            <inclusiveGateway id="g" />
        </process></definitions>"#;

        let diagram = parse_bpmn(xml).unwrap();
        assert_eq!(diagram.node("t").unwrap().type_tag, "bpmn:Task");
        assert_eq!(diagram.node("g").unwrap().bounds.width, 50.0);
    }
}
