use serde::Serialize;

/// Semantic node kinds offered by the designer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Start,
    End,
    Wait,
    Switch,
    Join,
    Broadcast,
    JoinBroadcast,
    ConditionFlow,
    Rollback,
}

/// Upper bound on the number of edges in one direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degree {
    Bounded(usize),
    Unbounded,
}

impl Degree {
    /// True when `current` edges already use up the allowance.
    pub fn is_exhausted(&self, current: usize) -> bool {
        match self {
            Degree::Bounded(max) => current >= *max,
            Degree::Unbounded => false,
        }
    }
}

/// Base shape class of a node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    RoundedTask,
    DiamondGateway,
    DecoratedEvent,
}

/// Icon asset file name, resolved against the configured icon base path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IconRef(pub &'static str);

impl IconRef {
    pub const TIMER: IconRef = IconRef("timer.svg");
    pub const CONDITION_FLOW: IconRef = IconRef("condition-flow.svg");
    pub const ROLLBACK: IconRef = IconRef("rollback.svg");
    pub const DEFAULT_GATEWAY: IconRef = IconRef("default-gateway.svg");
    pub const SWITCH_TASK: IconRef = IconRef("switch-task.svg");
    pub const JOIN_TASK: IconRef = IconRef("join-task.svg");
    pub const BROADCAST_TASK: IconRef = IconRef("broadcast-task.svg");
    pub const JOIN_BROADCAST_TASK: IconRef = IconRef("join-broadcast-task.svg");
    pub const DEFAULT_TASK: IconRef = IconRef("default-task.svg");

    pub fn file_name(&self) -> &'static str {
        self.0
    }
}

/// Axis-aligned bounds of a shape in diagram coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A shape on the canvas, owned by the diagram
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub type_tag: String,
    pub name: Option<String>,
    pub bounds: Bounds,
    pub incoming: Vec<String>,
    pub outgoing: Vec<String>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, type_tag: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            id: id.into(),
            type_tag: type_tag.into(),
            name: None,
            bounds,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn incoming_count(&self) -> usize {
        self.incoming.len()
    }

    pub fn outgoing_count(&self) -> usize {
        self.outgoing.len()
    }
}

/// A sequence flow between two nodes
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceFlow {
    pub id: String,
    pub source: String,
    pub target: String,
    pub waypoints: Vec<(f32, f32)>,
}

/// Candidate endpoints of a connection gesture. Either end may be missing
/// while the user is still dragging.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionAttempt<'a> {
    pub source: Option<&'a GraphNode>,
    pub target: Option<&'a GraphNode>,
}

impl<'a> ConnectionAttempt<'a> {
    pub fn new(source: Option<&'a GraphNode>, target: Option<&'a GraphNode>) -> Self {
        Self { source, target }
    }

    pub fn between(source: &'a GraphNode, target: &'a GraphNode) -> Self {
        Self::new(Some(source), Some(target))
    }
}
