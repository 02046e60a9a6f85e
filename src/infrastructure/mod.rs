//! Infrastructure layer implementations
//!
//! Concrete providers that connect the exploration core to topology sources.

mod detail_provider;
mod topology_provider;

pub use detail_provider::StoreDetailProvider;
pub use topology_provider::{JsonFileTopologyProvider, StaticTopologyProvider, TopologyProvider};
