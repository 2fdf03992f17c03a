mod bpmn;
mod context_pad;
mod diagram;
mod events;
mod palette;
mod registry;
mod render;
mod rules;
mod svg;
mod types;

pub use bpmn::parse_bpmn;
pub use context_pad::{
    ALLOWED_ENTRIES, ContextPadEntries, ContextPadEntry, ContextPadProvider, DefaultContextPad,
    FilteredContextPad, filter_context_pad,
};
pub use diagram::{AuditFinding, Connection, Diagram};
pub use events::{
    CONNECT_RULES_PRIORITY, ConnectInterceptor, ConnectPipeline, ConnectRulesInterceptor,
    ConnectStartEvent, DEFAULT_PRIORITY, DispatchOutcome,
};
pub use palette::{
    CreateService, ElementFactory, Gesture, GestureKind, GlobalConnect, Palette, PaletteAction,
    PaletteEntry, PaletteHost,
};
pub use registry::{NodeTypeDescriptor, default_size_for_tag, descriptors, lookup, shape_for_tag};
pub use render::{
    BaseRenderer, BpmnRenderer, CUSTOM_RENDER_PRIORITY, CustomRenderer, DrawRecipe, DrawSurface,
    Paint, Primitive,
};
pub use rules::{
    ConnectionRule, ConnectionValidator, Rejection, Side, SourceOutgoingLimit, TargetIncomingLimit,
    Verdict,
};
pub use svg::{IconInliner, escape_xml, render_document};
pub use types::{
    Bounds, ConnectionAttempt, Degree, GraphNode, IconRef, NodeKind, SequenceFlow, ShapeKind,
};
