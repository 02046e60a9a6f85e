//! Errors raised by the topology exploration core

use serde::{Deserialize, Serialize};

/// Result alias used across the crate
pub type TopologyResult<T> = Result<T, TopologyError>;

/// Errors that can occur while loading, laying out or navigating a topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum TopologyError {
    /// The topology provider could not supply a snapshot
    #[error("Topology data unavailable: {reason}")]
    DataUnavailable { reason: String },

    /// Loading details for a single node failed; retryable
    #[error("Failed to load details for node {node_id}: {reason}")]
    DetailFetchFailed { node_id: String, reason: String },

    /// The drawing surface has no area
    #[error("Degenerate viewport {width}x{height}")]
    DegenerateViewport { width: f64, height: f64 },

    /// A snapshot edge references a node that is not part of the snapshot
    #[error("Edge {edge_id} references missing node {missing_node_id}")]
    InvariantViolation {
        edge_id: String,
        missing_node_id: String,
    },

    /// The requested node is not part of the current snapshot
    #[error("Node not found: {0}")]
    UnknownNode(String),

    /// The requested edge is not part of the current snapshot
    #[error("Edge not found: {0}")]
    UnknownEdge(String),

    /// A breadcrumb index outside the current path
    #[error("Breadcrumb index {index} out of range for path of length {len}")]
    InvalidBreadcrumb { index: usize, len: usize },

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TopologyError {
    /// Whether the user can retry the operation that produced this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TopologyError::DataUnavailable { .. } | TopologyError::DetailFetchFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TopologyError::DetailFetchFailed {
            node_id: "cluster-1".to_string(),
            reason: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to load details for node cluster-1: timeout");
        assert!(err.is_retryable());

        let err = TopologyError::InvariantViolation {
            edge_id: "e1".to_string(),
            missing_node_id: "ghost".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("ghost"));
    }
}
