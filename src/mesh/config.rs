use serde::Deserialize;

use crate::mesh::packet::RoutingAlgorithm;
use crate::sim::config::Config;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MeshConfig {
    pub width: usize,
    pub height: usize,
    /// Routing algorithm key: "xy", "yx", or "west_first".
    pub routing: String,
}

impl Config for MeshConfig {}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            width: 4,
            height: 8,
            routing: "xy".to_string(),
        }
    }
}

impl MeshConfig {
    pub fn algorithm(&self) -> RoutingAlgorithm {
        RoutingAlgorithm::parse(&self.routing).unwrap_or_else(|| {
            log::warn!(
                "unknown routing algorithm '{}', falling back to xy",
                self.routing
            );
            RoutingAlgorithm::XyRouting
        })
    }
}
