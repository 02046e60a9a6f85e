//! Topology value objects
//!
//! Value objects are immutable types that describe infrastructure elements and
//! the geometry they are drawn in. They are compared by value rather than identity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Open, string-keyed property bag carried by nodes and edges.
///
/// Ordered so that serialized snapshots and detail metrics are stable.
pub type Properties = BTreeMap<String, serde_json::Value>;

/// Kinds of infrastructure elements in a topology
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    /// A cloud region or datacenter
    Region,
    /// A virtual network (VPC/VNet)
    Network,
    /// An ingress/egress or API gateway
    Gateway,
    /// A load balancer in front of a pool
    LoadBalancer,
    /// A compute cluster
    Cluster,
    /// A managed or self-hosted database
    Database,
    /// Block or object storage
    Storage,
    /// A virtual machine or bare metal instance
    Instance,
    /// A scheduled pod
    Pod,
    /// A logical service
    Service,
    /// A single container inside a pod
    Container,
    /// Anything the provider reports that is not known here
    Custom(String),
}

impl NodeType {
    /// Parse a node type from its provider string (case-insensitive, common aliases accepted)
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "region" | "datacenter" => NodeType::Region,
            "network" | "vpc" | "vnet" => NodeType::Network,
            "gateway" => NodeType::Gateway,
            "loadbalancer" | "load_balancer" | "lb" => NodeType::LoadBalancer,
            "cluster" => NodeType::Cluster,
            "database" | "db" => NodeType::Database,
            "storage" => NodeType::Storage,
            "instance" | "vm" => NodeType::Instance,
            "pod" => NodeType::Pod,
            "service" => NodeType::Service,
            "container" => NodeType::Container,
            _ => NodeType::Custom(s.to_string()),
        }
    }

    /// Get the string representation of the node type
    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Region => "region",
            NodeType::Network => "network",
            NodeType::Gateway => "gateway",
            NodeType::LoadBalancer => "loadbalancer",
            NodeType::Cluster => "cluster",
            NodeType::Database => "database",
            NodeType::Storage => "storage",
            NodeType::Instance => "instance",
            NodeType::Pod => "pod",
            NodeType::Service => "service",
            NodeType::Container => "container",
            NodeType::Custom(s) => s,
        }
    }

    /// Static render priority used by level-of-detail selection. Higher survives longer.
    pub fn priority(&self) -> u8 {
        match self {
            NodeType::Region => 10,
            NodeType::Network => 8,
            NodeType::Gateway | NodeType::LoadBalancer => 7,
            NodeType::Cluster => 6,
            NodeType::Database => 5,
            NodeType::Storage => 4,
            NodeType::Instance | NodeType::Pod => 3,
            NodeType::Service | NodeType::Container | NodeType::Custom(_) => 1,
        }
    }

    /// Radius the layout keeps clear around a node of this type
    pub fn collision_radius(&self) -> f64 {
        match self {
            NodeType::Region => 28.0,
            NodeType::Network => 22.0,
            NodeType::Gateway | NodeType::LoadBalancer | NodeType::Cluster => 18.0,
            NodeType::Database | NodeType::Storage => 14.0,
            NodeType::Instance | NodeType::Pod => 10.0,
            NodeType::Service | NodeType::Container | NodeType::Custom(_) => 8.0,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for NodeType {
    fn from(s: String) -> Self {
        NodeType::parse(&s)
    }
}

impl From<NodeType> for String {
    fn from(node_type: NodeType) -> Self {
        node_type.as_str().to_string()
    }
}

/// Kinds of relationships between infrastructure elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EdgeType {
    /// Parent contains child (region contains network, cluster contains pod, ...)
    Containment,
    /// Network-level connectivity
    Connects,
    /// Runtime dependency of source on target
    Depends,
    /// Dependency on the critical serving path
    CriticalPath,
    /// Custom edge type
    Custom(String),
}

impl EdgeType {
    /// Parse an edge type from its provider string
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "containment" | "contains" => EdgeType::Containment,
            "connects" | "connection" => EdgeType::Connects,
            "depends" | "dependency" => EdgeType::Depends,
            "critical-path" | "critical_path" | "critical" => EdgeType::CriticalPath,
            _ => EdgeType::Custom(s.to_string()),
        }
    }

    /// Get the string representation of the edge type
    pub fn as_str(&self) -> &str {
        match self {
            EdgeType::Containment => "containment",
            EdgeType::Connects => "connects",
            EdgeType::Depends => "depends",
            EdgeType::CriticalPath => "critical-path",
            EdgeType::Custom(s) => s,
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for EdgeType {
    fn from(s: String) -> Self {
        EdgeType::parse(&s)
    }
}

impl From<EdgeType> for String {
    fn from(edge_type: EdgeType) -> Self {
        edge_type.as_str().to_string()
    }
}

/// Health of an element as reported by the topology provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Healthy,
    Warning,
    Critical,
}

/// Represents the position of a node in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

impl Position2D {
    /// Create a new position
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Get the distance to another position
    pub fn distance_to(&self, other: &Position2D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether both coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Pixel size of the drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl ViewportSize {
    /// Create a new viewport size
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A viewport is degenerate when either side is zero, negative or not a number
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }

    /// Centre of the viewport, or the origin for degenerate sizes
    pub fn center(&self) -> Position2D {
        if self.is_degenerate() {
            Position2D::default()
        } else {
            Position2D::new(self.width / 2.0, self.height / 2.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_from_string() {
        assert_eq!(NodeType::parse("region"), NodeType::Region);
        assert_eq!(NodeType::parse("VPC"), NodeType::Network);
        assert_eq!(NodeType::parse("load_balancer"), NodeType::LoadBalancer);
        assert_eq!(NodeType::parse("queue"), NodeType::Custom("queue".to_string()));
    }

    #[test]
    fn test_priorities_follow_containment_tiers() {
        assert!(NodeType::Region.priority() > NodeType::Network.priority());
        assert!(NodeType::Network.priority() > NodeType::Cluster.priority());
        assert!(NodeType::Cluster.priority() > NodeType::Service.priority());
        assert_eq!(NodeType::Service.priority(), 1);
    }

    #[test]
    fn test_edge_type_aliases() {
        assert_eq!(EdgeType::parse("contains"), EdgeType::Containment);
        assert_eq!(EdgeType::parse("critical-path"), EdgeType::CriticalPath);
        assert_eq!(EdgeType::CriticalPath.to_string(), "critical-path");
    }

    #[test]
    fn test_degenerate_viewport_centre() {
        assert!(ViewportSize::new(0.0, 600.0).is_degenerate());
        assert!(ViewportSize::new(800.0, f64::NAN).is_degenerate());
        assert_eq!(ViewportSize::new(0.0, 0.0).center(), Position2D::default());
        assert_eq!(ViewportSize::new(800.0, 600.0).center(), Position2D::new(400.0, 300.0));
    }

    #[test]
    fn test_serialization() {
        let node_type: NodeType = serde_json::from_str("\"cluster\"").unwrap();
        assert_eq!(node_type, NodeType::Cluster);
        assert_eq!(serde_json::to_string(&NodeType::Custom("queue".into())).unwrap(), "\"queue\"");

        let status: NodeStatus = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(status, NodeStatus::Critical);
    }
}
