//! Exploration core for large infrastructure dependency graphs
//!
//! Topology snapshots (regions, networks, clusters, services, databases and the
//! edges between them) are reduced to a bounded visible set by level-of-detail
//! selection, positioned by an owned force-directed simulation, and explored
//! through a breadcrumb drill-down navigator. Rendering is left to the host:
//! it calls [`TopologyExplorer::frame`] once per animation frame and forwards
//! pointer events back.

pub mod config;
pub mod error;
pub mod explorer;
pub mod infrastructure;
pub mod layout;
pub mod navigation;
pub mod performance;
pub mod selection;
pub mod store;
pub mod value_objects;

pub use config::ExplorerConfig;
pub use error::{TopologyError, TopologyResult};
pub use explorer::TopologyExplorer;

// Re-export providers
pub use infrastructure::{
    JsonFileTopologyProvider, StaticTopologyProvider, StoreDetailProvider, TopologyProvider,
};

// Re-export layout types
pub use layout::{ForceConfig, LayoutEngine, NodePosition, SimulationNode};

// Re-export navigation types
pub use navigation::{
    Breadcrumb, DetailSection, DrillDownNavigator, NavigationState, NodeDetailProvider, NodeDetails,
    SelectOutcome,
};

// Re-export LOD and diagnostics
pub use performance::{LodConfig, LodSelector, PerformanceStats, VisibleNode, VisibleSet};

// Re-export selection types
pub use selection::{
    EventQueue, GraphInteractionSink, InteractionEvent, NodePresentation, NoopSink, SelectionController,
    ViewChange, ViewConfig, ViewState,
};

// Re-export data model
pub use store::{GraphData, GraphEdge, GraphMetadata, GraphNode, GraphStore};
pub use value_objects::{EdgeType, NodeStatus, NodeType, Position2D, Properties, ViewportSize};
