//! In-memory process diagram: the shapes and sequence flows the engine
//! would normally own. Edges are only committed after the `connect.start`
//! pipeline accepts them.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{DesignerError, Result};

use super::events::ConnectPipeline;
use super::palette::{CreateService, ElementFactory, Gesture, GlobalConnect};
use super::registry;
use super::rules::{Rejection, Verdict};
use super::types::{Bounds, ConnectionAttempt, GraphNode, SequenceFlow, ShapeKind};

/// Result of a connect gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    Created(String),
    Rejected(Rejection),
    /// A handler prevented the default without giving a reason.
    Prevented,
}

/// A stored flow the rules would have refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditFinding {
    pub flow_id: String,
    pub source: String,
    pub target: String,
    pub rejection: Rejection,
}

#[derive(Debug, Clone, Default)]
pub struct Diagram {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    flows: Vec<SequenceFlow>,
    next_id: usize,
    connect_mode: bool,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn flows(&self) -> &[SequenceFlow] {
        &self.flows
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn is_connect_mode(&self) -> bool {
        self.connect_mode
    }

    /// Add a shape. Edge lists on the node are ignored; flows carry them.
    pub fn add_node(&mut self, mut node: GraphNode) -> Result<()> {
        if self.index.contains_key(&node.id) {
            return Err(DesignerError::InvalidDocument(format!(
                "Duplicate element id: {}",
                node.id
            )));
        }
        node.incoming.clear();
        node.outgoing.clear();
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Store a flow without consulting the connection rules, as an importer
    /// does for a saved document.
    pub fn add_flow(&mut self, flow: SequenceFlow) -> Result<()> {
        if self.flows.iter().any(|f| f.id == flow.id) {
            return Err(DesignerError::InvalidDocument(format!(
                "Duplicate element id: {}",
                flow.id
            )));
        }
        let source = self.position(&flow.source)?;
        let target = self.position(&flow.target)?;

        self.nodes[source].outgoing.push(flow.id.clone());
        self.nodes[target].incoming.push(flow.id.clone());
        self.flows.push(flow);
        Ok(())
    }

    /// Run the connect gesture through `pipeline` and commit the flow only
    /// when it is accepted and the default was not prevented. Otherwise the
    /// diagram is left untouched.
    pub fn connect(
        &mut self,
        source_id: &str,
        target_id: &str,
        pipeline: &ConnectPipeline,
    ) -> Result<Connection> {
        let source = self.position(source_id)?;
        let target = self.position(target_id)?;

        let outcome = pipeline.dispatch(ConnectionAttempt::between(
            &self.nodes[source],
            &self.nodes[target],
        ));
        if let Verdict::Reject(rejection) = outcome.verdict {
            return Ok(Connection::Rejected(rejection));
        }
        if outcome.default_prevented {
            log::debug!("Connect {} -> {} prevented", source_id, target_id);
            return Ok(Connection::Prevented);
        }

        let id = self.fresh_id("Flow");
        self.add_flow(SequenceFlow {
            id: id.clone(),
            source: source_id.to_string(),
            target: target_id.to_string(),
            waypoints: Vec::new(),
        })?;
        log::debug!("Connected {} -> {} as {}", source_id, target_id, id);
        Ok(Connection::Created(id))
    }

    /// Replay every stored flow in document order against an edge-less copy
    /// and report the ones the pipeline vetoes.
    pub fn audit(&self, pipeline: &ConnectPipeline) -> Vec<AuditFinding> {
        let mut replay: Vec<GraphNode> = self
            .nodes
            .iter()
            .map(|n| GraphNode {
                incoming: Vec::new(),
                outgoing: Vec::new(),
                ..n.clone()
            })
            .collect();
        let mut findings = Vec::new();

        for flow in &self.flows {
            let (Some(&source), Some(&target)) =
                (self.index.get(&flow.source), self.index.get(&flow.target))
            else {
                continue;
            };

            let outcome = pipeline.dispatch(ConnectionAttempt::between(
                &replay[source],
                &replay[target],
            ));
            if let Verdict::Reject(rejection) = outcome.verdict {
                findings.push(AuditFinding {
                    flow_id: flow.id.clone(),
                    source: flow.source.clone(),
                    target: flow.target.clone(),
                    rejection,
                });
            }

            // Keep counting the flow: it exists in the document either way.
            replay[source].outgoing.push(flow.id.clone());
            replay[target].incoming.push(flow.id.clone());
        }

        findings
    }

    /// Union of all node bounds and flow waypoints.
    pub fn bounding_box(&self) -> Option<Bounds> {
        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        let mut max_x = f32::MIN;
        let mut max_y = f32::MIN;
        let mut found = false;

        for node in &self.nodes {
            found = true;
            min_x = min_x.min(node.bounds.x);
            min_y = min_y.min(node.bounds.y);
            max_x = max_x.max(node.bounds.right());
            max_y = max_y.max(node.bounds.bottom());
        }
        for &(x, y) in self.flows.iter().flat_map(|f| f.waypoints.iter()) {
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        found.then(|| Bounds::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| DesignerError::UnknownNode(id.to_string()))
    }

    fn fresh_id(&mut self, prefix: &str) -> String {
        loop {
            self.next_id += 1;
            let id = format!("{}_{}", prefix, self.next_id);
            if !self.index.contains_key(&id) && !self.flows.iter().any(|f| f.id == id) {
                return id;
            }
        }
    }
}

impl ElementFactory for Diagram {
    fn create_shape(&mut self, type_tag: &str) -> GraphNode {
        let prefix = match registry::shape_for_tag(type_tag) {
            ShapeKind::DecoratedEvent => "Event",
            ShapeKind::DiamondGateway => "Gateway",
            ShapeKind::RoundedTask => "Activity",
        };
        let (width, height) = registry::default_size_for_tag(type_tag);
        let id = self.fresh_id(prefix);
        GraphNode::new(id, type_tag, Bounds::new(0.0, 0.0, width, height))
    }
}

impl CreateService for Diagram {
    fn start_create(&mut self, gesture: Gesture, mut shape: GraphNode) {
        shape.bounds.x = gesture.x - shape.bounds.width / 2.0;
        shape.bounds.y = gesture.y - shape.bounds.height / 2.0;
        if let Err(e) = self.add_node(shape) {
            log::warn!("Dropped palette shape: {}", e);
        }
    }
}

impl GlobalConnect for Diagram {
    fn toggle(&mut self, _gesture: Gesture) {
        self.connect_mode = !self.connect_mode;
        log::debug!("Global connect mode: {}", self.connect_mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::designer::events::{ConnectInterceptor, ConnectStartEvent};
    use crate::designer::palette::Palette;
    use crate::designer::rules::Side;
    use crate::designer::types::NodeKind;

    fn diagram_with(kinds: &[(&str, NodeKind)]) -> Diagram {
        let mut diagram = Diagram::new();
        for (id, kind) in kinds {
            let (w, h) = kind.descriptor().default_size;
            diagram
                .add_node(GraphNode::new(*id, kind.type_tag(), Bounds::new(0.0, 0.0, w, h)))
                .unwrap();
        }
        diagram
    }

    #[test]
    fn second_outgoing_from_switch_is_not_created() {
        let pipeline = ConnectPipeline::with_connect_rules();
        let mut diagram = diagram_with(&[
            ("switch", NodeKind::Switch),
            ("a", NodeKind::JoinBroadcast),
            ("b", NodeKind::End),
        ]);

        let first = diagram.connect("switch", "a", &pipeline).unwrap();
        assert!(matches!(first, Connection::Created(_)));

        let second = diagram.connect("switch", "b", &pipeline).unwrap();
        match second {
            Connection::Rejected(rejection) => assert_eq!(rejection.side, Side::Source),
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(diagram.flows().len(), 1);
        assert_eq!(diagram.node("switch").unwrap().outgoing_count(), 1);
        assert_eq!(diagram.node("b").unwrap().incoming_count(), 0);
    }

    #[test]
    fn broadcast_accepts_single_predecessor() {
        let pipeline = ConnectPipeline::with_connect_rules();
        let mut diagram = diagram_with(&[
            ("start", NodeKind::Start),
            ("wait", NodeKind::Wait),
            ("broadcast", NodeKind::Broadcast),
        ]);

        assert!(matches!(
            diagram.connect("start", "broadcast", &pipeline).unwrap(),
            Connection::Created(_)
        ));
        assert!(matches!(
            diagram.connect("wait", "broadcast", &pipeline).unwrap(),
            Connection::Rejected(Rejection {
                side: Side::Target,
                ..
            })
        ));
    }

    #[test]
    fn prevented_default_creates_no_flow() {
        struct PreventOnly;

        impl ConnectInterceptor for PreventOnly {
            fn on_connect_start(&self, event: &mut ConnectStartEvent<'_>) {
                event.prevent_default();
            }
        }

        let mut pipeline = ConnectPipeline::with_connect_rules();
        pipeline.register(PreventOnly);
        let mut diagram = diagram_with(&[("a", NodeKind::Start), ("b", NodeKind::End)]);

        assert_eq!(diagram.connect("a", "b", &pipeline).unwrap(), Connection::Prevented);
        assert!(diagram.flows().is_empty());
        assert_eq!(diagram.node("a").unwrap().outgoing_count(), 0);
        assert_eq!(diagram.node("b").unwrap().incoming_count(), 0);
    }

    #[test]
    fn connect_to_unknown_node_is_an_error() {
        let pipeline = ConnectPipeline::with_connect_rules();
        let mut diagram = diagram_with(&[("start", NodeKind::Start)]);
        assert!(matches!(
            diagram.connect("start", "ghost", &pipeline),
            Err(DesignerError::UnknownNode(id)) if id == "ghost"
        ));
    }

    #[test]
    fn audit_flags_flows_beyond_the_limit() {
        let mut diagram = diagram_with(&[
            ("join", NodeKind::Join),
            ("a", NodeKind::End),
            ("b", NodeKind::End),
            ("c", NodeKind::End),
        ]);
        for (id, target) in [("f1", "a"), ("f2", "b"), ("f3", "c")] {
            diagram
                .add_flow(SequenceFlow {
                    id: id.to_string(),
                    source: "join".to_string(),
                    target: target.to_string(),
                    waypoints: Vec::new(),
                })
                .unwrap();
        }

        let findings = diagram.audit(&ConnectPipeline::with_connect_rules());
        let flagged: Vec<&str> = findings.iter().map(|f| f.flow_id.as_str()).collect();
        assert_eq!(flagged, vec!["f2", "f3"]);
        assert_eq!(diagram.node("join").unwrap().outgoing_count(), 3);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut diagram = diagram_with(&[("a", NodeKind::Start)]);
        assert!(diagram
            .add_node(GraphNode::new("a", "bpmn:EndEvent", Bounds::default()))
            .is_err());
    }

    #[test]
    fn palette_places_shapes_centered_on_gesture() {
        let mut diagram = Diagram::new();
        let palette = Palette::new();

        palette
            .trigger("create.condition-flow-gateway", Gesture::click(100.0, 100.0), &mut diagram)
            .unwrap();
        palette
            .trigger("tool-global-connect", Gesture::click(0.0, 0.0), &mut diagram)
            .unwrap();

        let node = &diagram.nodes()[0];
        assert_eq!(node.type_tag, "bpmn:ExclusiveGateway");
        assert!(node.id.starts_with("Gateway_"));
        assert_eq!(node.bounds, Bounds::new(75.0, 75.0, 50.0, 50.0));
        assert!(diagram.is_connect_mode());
    }

    #[test]
    fn bounding_box_covers_waypoints() {
        let mut diagram = diagram_with(&[("a", NodeKind::Start), ("b", NodeKind::End)]);
        diagram
            .add_flow(SequenceFlow {
                id: "f".to_string(),
                source: "a".to_string(),
                target: "b".to_string(),
                waypoints: vec![(18.0, 18.0), (18.0, 300.0)],
            })
            .unwrap();

        assert_eq!(
            diagram.bounding_box(),
            Some(Bounds::new(0.0, 0.0, 36.0, 300.0))
        );
        assert_eq!(Diagram::new().bounding_box(), None);
    }
}
