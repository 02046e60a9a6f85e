//! Aggregate configuration for the explorer

use crate::error::{TopologyError, TopologyResult};
use crate::layout::ForceConfig;
use crate::performance::LodConfig;
use crate::selection::ViewConfig;
use serde::{Deserialize, Serialize};

/// All tunables of a [`crate::TopologyExplorer`]. Missing sections and fields
/// fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub lod: LodConfig,
    pub forces: ForceConfig,
    pub view: ViewConfig,
}

impl ExplorerConfig {
    /// Parse a JSON document such as `{"lod": {"max_visible_nodes": 500}}`
    pub fn from_json_str(json: &str) -> TopologyResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| TopologyError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> TopologyResult<()> {
        if !(self.view.min_zoom > 0.0 && self.view.min_zoom <= self.view.max_zoom) {
            return Err(TopologyError::InvalidConfig(format!(
                "zoom range [{}, {}] is empty or non-positive",
                self.view.min_zoom, self.view.max_zoom
            )));
        }
        if !(self.forces.alpha_decay > 0.0 && self.forces.alpha_decay < 1.0) {
            return Err(TopologyError::InvalidConfig(format!(
                "alpha_decay {} must lie in (0, 1)",
                self.forces.alpha_decay
            )));
        }
        if !(self.forces.alpha_min > 0.0 && self.forces.alpha_min < 1.0) {
            return Err(TopologyError::InvalidConfig(format!(
                "alpha_min {} must lie in (0, 1)",
                self.forces.alpha_min
            )));
        }
        for (name, value) in [
            ("drag_alpha_target", self.forces.drag_alpha_target),
            ("reheat_alpha", self.forces.reheat_alpha),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TopologyError::InvalidConfig(format!("{name} {value} must lie in [0, 1]")));
            }
        }
        if !(0.0..=1.0).contains(&self.forces.velocity_decay) {
            return Err(TopologyError::InvalidConfig(format!(
                "velocity_decay {} must lie in [0, 1]",
                self.forces.velocity_decay
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutEngine;
    use crate::performance::VisibleSet;
    use crate::value_objects::ViewportSize;

    #[test]
    fn test_partial_config() {
        let config = ExplorerConfig::from_json_str(
            r#"{"lod": {"max_visible_nodes": 500}, "view": {"max_zoom": 4.0}}"#,
        )
        .unwrap();

        assert_eq!(config.lod.max_visible_nodes, 500);
        assert_eq!(config.lod.min_visible_nodes, 100);
        assert_eq!(config.view.max_zoom, 4.0);
        assert_eq!(config.forces, ForceConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            ExplorerConfig::from_json_str("{"),
            Err(TopologyError::InvalidConfig(_))
        ));
        assert!(matches!(
            ExplorerConfig::from_json_str(r#"{"forces": {"alpha_decay": 0.0}}"#),
            Err(TopologyError::InvalidConfig(_))
        ));
        assert!(matches!(
            ExplorerConfig::from_json_str(r#"{"view": {"min_zoom": 2.0, "max_zoom": 1.0}}"#),
            Err(TopologyError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_alpha_settings_must_let_layout_idle() {
        for json in [
            r#"{"forces": {"alpha_min": 0.0}}"#,
            r#"{"forces": {"alpha_min": -0.5}}"#,
            r#"{"forces": {"alpha_min": 1.5}}"#,
            r#"{"forces": {"reheat_alpha": -0.1}}"#,
            r#"{"forces": {"drag_alpha_target": 2.0}}"#,
        ] {
            assert!(
                matches!(ExplorerConfig::from_json_str(json), Err(TopologyError::InvalidConfig(_))),
                "accepted {json}"
            );
        }

        let config = ExplorerConfig::from_json_str(r#"{"forces": {"alpha_min": 0.0001}}"#).unwrap();
        let mut engine = LayoutEngine::new(config.forces);
        engine.start(&VisibleSet::default(), ViewportSize::new(100.0, 100.0));
        let mut ticks = 0;
        while !engine.is_idle() {
            engine.tick();
            ticks += 1;
            assert!(ticks <= 1000, "layout never settled");
        }
    }
}
