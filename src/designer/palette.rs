use serde::Serialize;

use crate::error::{DesignerError, Result};

use super::types::{GraphNode, NodeKind};

/// Pointer gesture that triggered a palette action
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Gesture {
    pub kind: GestureKind,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureKind {
    Click,
    DragStart,
}

impl Gesture {
    pub fn click(x: f32, y: f32) -> Self {
        Self {
            kind: GestureKind::Click,
            x,
            y,
        }
    }

    pub fn drag_start(x: f32, y: f32) -> Self {
        Self {
            kind: GestureKind::DragStart,
            x,
            y,
        }
    }
}

/// Builds detached shapes for a type tag
pub trait ElementFactory {
    fn create_shape(&mut self, type_tag: &str) -> GraphNode;
}

/// Places a freshly built shape on the canvas
pub trait CreateService {
    fn start_create(&mut self, gesture: Gesture, shape: GraphNode);
}

/// Global "connect" tool
pub trait GlobalConnect {
    fn toggle(&mut self, gesture: Gesture);
}

/// Collaborators a palette action may call
pub trait PaletteHost: ElementFactory + CreateService + GlobalConnect {}

impl<T: ElementFactory + CreateService + GlobalConnect> PaletteHost for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum PaletteAction {
    /// Create a node of this kind on click or drag start.
    Create { kind: NodeKind, type_tag: &'static str },
    ToggleGlobalConnect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaletteEntry {
    pub group: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'static str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub separator: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<PaletteAction>,
}

impl PaletteEntry {
    fn create(group: &'static str, class_name: &'static str, kind: NodeKind) -> Self {
        Self {
            group,
            class_name: Some(class_name),
            title: Some(kind.descriptor().title),
            separator: false,
            action: Some(PaletteAction::Create {
                kind,
                type_tag: kind.type_tag(),
            }),
        }
    }
}

/// Static table of tools offered in the palette
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct Palette {
    entries: Vec<(&'static str, PaletteEntry)>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl Palette {
    pub fn new() -> Self {
        let entries = vec![
            (
                "create.start-event",
                PaletteEntry::create("event", "bpmn-icon-start-event-none", NodeKind::Start),
            ),
            (
                "create.end-event",
                PaletteEntry::create("event", "bpmn-icon-end-event-none", NodeKind::End),
            ),
            (
                "create.wait-event",
                PaletteEntry::create(
                    "event",
                    "bpmn-icon-intermediate-event-catch-timer",
                    NodeKind::Wait,
                ),
            ),
            (
                "create.switch-task",
                PaletteEntry::create("activity", "bpmn-icon-user-task", NodeKind::Switch),
            ),
            (
                "create.join-task",
                PaletteEntry::create("activity", "bpmn-icon-manual-task", NodeKind::Join),
            ),
            (
                "create.broadcast-task",
                PaletteEntry::create("activity", "bpmn-icon-script-task", NodeKind::Broadcast),
            ),
            (
                "create.join-broadcast-task",
                PaletteEntry::create(
                    "activity",
                    "bpmn-icon-service-task",
                    NodeKind::JoinBroadcast,
                ),
            ),
            (
                "create.condition-flow-gateway",
                PaletteEntry::create("gateway", "bpmn-icon-gateway-xor", NodeKind::ConditionFlow),
            ),
            (
                "create.rollback-gateway",
                PaletteEntry::create("gateway", "bpmn-icon-gateway-parallel", NodeKind::Rollback),
            ),
            (
                "tool-separator",
                PaletteEntry {
                    group: "tools",
                    class_name: None,
                    title: None,
                    separator: true,
                    action: None,
                },
            ),
            (
                "tool-global-connect",
                PaletteEntry {
                    group: "tools",
                    class_name: Some("bpmn-icon-connection-multi"),
                    title: Some("Kích hoạt công cụ nối"),
                    separator: false,
                    action: Some(PaletteAction::ToggleGlobalConnect),
                },
            ),
        ];

        Self { entries }
    }

    pub fn entries(&self) -> &[(&'static str, PaletteEntry)] {
        &self.entries
    }

    pub fn entry(&self, tool_id: &str) -> Option<&PaletteEntry> {
        self.entries
            .iter()
            .find(|(id, _)| *id == tool_id)
            .map(|(_, entry)| entry)
    }

    /// Run the action behind `tool_id`. Separators ignore the gesture; the
    /// connect tool responds to clicks only.
    pub fn trigger(
        &self,
        tool_id: &str,
        gesture: Gesture,
        host: &mut impl PaletteHost,
    ) -> Result<()> {
        let entry = self
            .entry(tool_id)
            .ok_or_else(|| DesignerError::UnknownTool(tool_id.to_string()))?;

        match entry.action {
            Some(PaletteAction::Create { type_tag, .. }) => {
                let shape = host.create_shape(type_tag);
                log::debug!("Palette {} created {} ({})", tool_id, shape.id, type_tag);
                host.start_create(gesture, shape);
            }
            Some(PaletteAction::ToggleGlobalConnect) if gesture.kind == GestureKind::Click => {
                host.toggle(gesture);
            }
            _ => {}
        }

        Ok(())
    }
}
