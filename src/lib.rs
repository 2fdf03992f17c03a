//! Connection rules and shape rendering for the FlowHub BPMN process
//! designer.
//!
//! The [`designer`] module holds the node type registry, the `connect.start`
//! rule pipeline, the custom shape renderer, the palette and the context pad
//! filter. [`designer::Diagram`] stands in for the diagram engine that owns
//! shapes and flows.

pub mod config;
pub mod designer;
pub mod error;
pub mod export;

pub use error::{DesignerError, Result};
