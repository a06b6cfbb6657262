//! Error types for document and markdown operations

use crate::document::NodeId;
use std::fmt;

/// Errors that can occur during document and markdown operations
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasError {
    /// Node id does not belong to the document
    NodeNotFound(NodeId),
    /// Error during markdown serialization
    SerializationError(String),
}

impl fmt::Display for CanvasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanvasError::NodeNotFound(id) => write!(f, "Node {id} not found in document"),
            CanvasError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for CanvasError {}
