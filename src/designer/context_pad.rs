use std::collections::BTreeMap;

use serde::Serialize;

use super::registry;
use super::types::{GraphNode, ShapeKind};

/// Keys kept on the per-node context pad
pub const ALLOWED_ENTRIES: [&str; 2] = ["delete", "connect"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextPadEntry {
    pub group: &'static str,
    pub class_name: &'static str,
    pub title: &'static str,
}

impl ContextPadEntry {
    fn new(group: &'static str, class_name: &'static str, title: &'static str) -> Self {
        Self {
            group,
            class_name,
            title,
        }
    }
}

pub type ContextPadEntries = BTreeMap<String, ContextPadEntry>;

/// Produces the context pad entries for a node
pub trait ContextPadProvider {
    fn entries(&self, node: &GraphNode) -> ContextPadEntries;
}

/// Keep only allow-listed keys.
pub fn filter_context_pad<T>(entries: BTreeMap<String, T>) -> BTreeMap<String, T> {
    entries
        .into_iter()
        .filter(|(key, _)| ALLOWED_ENTRIES.contains(&key.as_str()))
        .collect()
}

/// Wraps a base provider and narrows its output
pub struct FilteredContextPad<P> {
    inner: P,
}

impl<P: ContextPadProvider> FilteredContextPad<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: ContextPadProvider> ContextPadProvider for FilteredContextPad<P> {
    fn entries(&self, node: &GraphNode) -> ContextPadEntries {
        filter_context_pad(self.inner.entries(node))
    }
}

/// The engine's stock context pad
#[derive(Debug, Clone, Default)]
pub struct DefaultContextPad;

impl ContextPadProvider for DefaultContextPad {
    fn entries(&self, node: &GraphNode) -> ContextPadEntries {
        let mut entries = ContextPadEntries::new();
        let is_end = node.type_tag.trim_start_matches("bpmn:") == "EndEvent";

        if !is_end {
            entries.insert(
                "append.end-event".to_string(),
                ContextPadEntry::new("model", "bpmn-icon-end-event-none", "Append end event"),
            );
            entries.insert(
                "append.gateway".to_string(),
                ContextPadEntry::new("model", "bpmn-icon-gateway-none", "Append gateway"),
            );
            entries.insert(
                "append.append-task".to_string(),
                ContextPadEntry::new("model", "bpmn-icon-task", "Append task"),
            );
            entries.insert(
                "append.intermediate-event".to_string(),
                ContextPadEntry::new(
                    "model",
                    "bpmn-icon-intermediate-event-none",
                    "Append intermediate/boundary event",
                ),
            );
            entries.insert(
                "connect".to_string(),
                ContextPadEntry::new("connect", "bpmn-icon-connection-multi", "Connect"),
            );
        }

        if registry::shape_for_tag(&node.type_tag) == ShapeKind::RoundedTask {
            entries.insert(
                "append.text-annotation".to_string(),
                ContextPadEntry::new(
                    "artifact",
                    "bpmn-icon-text-annotation",
                    "Add text annotation",
                ),
            );
        }

        entries.insert(
            "replace".to_string(),
            ContextPadEntry::new("edit", "bpmn-icon-screw-wrench", "Change type"),
        );
        entries.insert(
            "delete".to_string(),
            ContextPadEntry::new("edit", "bpmn-icon-trash", "Delete"),
        );

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::designer::types::{Bounds, NodeKind};

    fn node(kind: NodeKind) -> GraphNode {
        GraphNode::new("n", kind.type_tag(), Bounds::new(0.0, 0.0, 100.0, 80.0))
    }

    #[test]
    fn keeps_only_delete_and_connect() {
        let pad = FilteredContextPad::new(DefaultContextPad);
        let entries = pad.entries(&node(NodeKind::Switch));
        let keys: Vec<&str> = entries.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["connect", "delete"]);
    }

    #[test]
    fn end_event_has_no_connect_entry() {
        let pad = FilteredContextPad::new(DefaultContextPad);
        let entries = pad.entries(&node(NodeKind::End));
        let keys: Vec<&str> = entries.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["delete"]);
    }

    #[test]
    fn filter_preserves_values() {
        let mut input = BTreeMap::new();
        input.insert("delete".to_string(), 1);
        input.insert("replace".to_string(), 2);
        input.insert("connect".to_string(), 3);

        let filtered = filter_context_pad(input);
        assert_eq!(filtered.get("delete"), Some(&1));
        assert_eq!(filtered.get("connect"), Some(&3));
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(filter_context_pad(BTreeMap::<String, ()>::new()).is_empty());
    }
}
