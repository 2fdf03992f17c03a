use super::types::{Degree, IconRef, NodeKind, ShapeKind};

const BPMN_PREFIX: &str = "bpmn:";

const TASK_SIZE: (f32, f32) = (100.0, 80.0);
const GATEWAY_SIZE: (f32, f32) = (50.0, 50.0);
const EVENT_SIZE: (f32, f32) = (36.0, 36.0);

/// Static description of one node kind
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTypeDescriptor {
    pub kind: NodeKind,
    pub type_tag: &'static str,
    pub title: &'static str,
    pub max_incoming: Degree,
    pub max_outgoing: Degree,
    pub shape: ShapeKind,
    /// `None` leaves the node to the built-in renderer.
    pub icon: Option<IconRef>,
    pub default_size: (f32, f32),
}

impl NodeTypeDescriptor {
    pub fn has_custom_rendering(&self) -> bool {
        self.icon.is_some()
    }
}

static DESCRIPTORS: [NodeTypeDescriptor; 9] = [
    NodeTypeDescriptor {
        kind: NodeKind::Start,
        type_tag: "bpmn:StartEvent",
        title: "Start Transition",
        max_incoming: Degree::Unbounded,
        max_outgoing: Degree::Unbounded,
        shape: ShapeKind::DecoratedEvent,
        icon: None,
        default_size: EVENT_SIZE,
    },
    NodeTypeDescriptor {
        kind: NodeKind::End,
        type_tag: "bpmn:EndEvent",
        title: "End Transition",
        max_incoming: Degree::Unbounded,
        max_outgoing: Degree::Unbounded,
        shape: ShapeKind::DecoratedEvent,
        icon: None,
        default_size: EVENT_SIZE,
    },
    NodeTypeDescriptor {
        kind: NodeKind::Wait,
        type_tag: "bpmn:IntermediateCatchEvent",
        title: "Wait Task",
        max_incoming: Degree::Unbounded,
        max_outgoing: Degree::Unbounded,
        shape: ShapeKind::DecoratedEvent,
        icon: Some(IconRef::TIMER),
        default_size: EVENT_SIZE,
    },
    NodeTypeDescriptor {
        kind: NodeKind::Switch,
        type_tag: "bpmn:UserTask",
        title: "Switch Task",
        max_incoming: Degree::Unbounded,
        max_outgoing: Degree::Bounded(1),
        shape: ShapeKind::RoundedTask,
        icon: Some(IconRef::SWITCH_TASK),
        default_size: TASK_SIZE,
    },
    NodeTypeDescriptor {
        kind: NodeKind::Join,
        type_tag: "bpmn:ManualTask",
        title: "Join Task",
        max_incoming: Degree::Unbounded,
        max_outgoing: Degree::Bounded(1),
        shape: ShapeKind::RoundedTask,
        icon: Some(IconRef::JOIN_TASK),
        default_size: TASK_SIZE,
    },
    NodeTypeDescriptor {
        kind: NodeKind::Broadcast,
        type_tag: "bpmn:ScriptTask",
        title: "Broadcast Task",
        max_incoming: Degree::Bounded(1),
        max_outgoing: Degree::Unbounded,
        shape: ShapeKind::RoundedTask,
        icon: Some(IconRef::BROADCAST_TASK),
        default_size: TASK_SIZE,
    },
    NodeTypeDescriptor {
        kind: NodeKind::JoinBroadcast,
        type_tag: "bpmn:ServiceTask",
        title: "Join & Broadcast Task",
        max_incoming: Degree::Unbounded,
        max_outgoing: Degree::Unbounded,
        shape: ShapeKind::RoundedTask,
        icon: Some(IconRef::JOIN_BROADCAST_TASK),
        default_size: TASK_SIZE,
    },
    NodeTypeDescriptor {
        kind: NodeKind::ConditionFlow,
        type_tag: "bpmn:ExclusiveGateway",
        title: "Condition Flow",
        max_incoming: Degree::Unbounded,
        max_outgoing: Degree::Unbounded,
        shape: ShapeKind::DiamondGateway,
        icon: Some(IconRef::CONDITION_FLOW),
        default_size: GATEWAY_SIZE,
    },
    NodeTypeDescriptor {
        kind: NodeKind::Rollback,
        type_tag: "bpmn:ParallelGateway",
        title: "Rollback Flow",
        max_incoming: Degree::Unbounded,
        max_outgoing: Degree::Unbounded,
        shape: ShapeKind::DiamondGateway,
        icon: Some(IconRef::ROLLBACK),
        default_size: GATEWAY_SIZE,
    },
];

impl NodeKind {
    pub const ALL: [NodeKind; 9] = [
        NodeKind::Start,
        NodeKind::End,
        NodeKind::Wait,
        NodeKind::Switch,
        NodeKind::Join,
        NodeKind::Broadcast,
        NodeKind::JoinBroadcast,
        NodeKind::ConditionFlow,
        NodeKind::Rollback,
    ];

    pub fn descriptor(self) -> &'static NodeTypeDescriptor {
        // Table order matches `ALL`.
        &DESCRIPTORS[self as usize]
    }

    pub fn type_tag(self) -> &'static str {
        self.descriptor().type_tag
    }

    /// Resolve a type tag, with or without the `bpmn:` prefix.
    pub fn from_type_tag(tag: &str) -> Option<NodeKind> {
        let bare = strip_prefix(tag);
        DESCRIPTORS
            .iter()
            .find(|d| strip_prefix(d.type_tag) == bare)
            .map(|d| d.kind)
    }
}

fn strip_prefix(tag: &str) -> &str {
    tag.strip_prefix(BPMN_PREFIX).unwrap_or(tag)
}

/// Descriptor for a type tag, if the tag names a known kind.
pub fn lookup(tag: &str) -> Option<&'static NodeTypeDescriptor> {
    NodeKind::from_type_tag(tag).map(NodeKind::descriptor)
}

pub fn descriptors() -> &'static [NodeTypeDescriptor] {
    &DESCRIPTORS
}

/// Base shape class for any tag. Unknown tags are classed by suffix:
/// `*Gateway` as a diamond, `*Event` as an event circle, anything else as a
/// task. The custom renderer only honours the gateway case.
pub fn shape_for_tag(tag: &str) -> ShapeKind {
    match lookup(tag) {
        Some(descriptor) => descriptor.shape,
        None if strip_prefix(tag).ends_with("Gateway") => ShapeKind::DiamondGateway,
        None if strip_prefix(tag).ends_with("Event") => ShapeKind::DecoratedEvent,
        None => ShapeKind::RoundedTask,
    }
}

/// Size given to freshly created shapes of this tag.
pub fn default_size_for_tag(tag: &str) -> (f32, f32) {
    match lookup(tag) {
        Some(descriptor) => descriptor.default_size,
        None => match shape_for_tag(tag) {
            ShapeKind::DiamondGateway => GATEWAY_SIZE,
            ShapeKind::DecoratedEvent => EVENT_SIZE,
            ShapeKind::RoundedTask => TASK_SIZE,
        },
    }
}
