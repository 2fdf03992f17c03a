use std::path::PathBuf;

/// Operational failures. Connection rule violations are not errors; they are
/// reported as [`crate::designer::Rejection`] values.
#[derive(Debug, thiserror::Error)]
pub enum DesignerError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("BPMN parse error: {0}")]
    Xml(String),

    #[error("Invalid BPMN document: {0}")]
    InvalidDocument(String),

    #[error("Failed to parse config: {0}")]
    Config(String),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Unknown palette tool: {0}")]
    UnknownTool(String),

    #[error("Export failed: {0}")]
    Export(String),
}

pub type Result<T> = std::result::Result<T, DesignerError>;
