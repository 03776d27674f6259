use serde::Deserialize;

use crate::sim::config::Config;

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct CollectiveConfig {
    /// Run the collective demo pass after the traffic workload.
    pub enabled: bool,
    pub num_nodes: usize,
}

impl Config for CollectiveConfig {}

impl Default for CollectiveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            num_nodes: 32,
        }
    }
}
