use serde::Deserialize;

use crate::sim::config::Config;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TrafficConfig {
    pub enabled: bool,
    /// Destination pattern: uniform | neighbor | transpose | bit_complement
    /// | hotspot.
    pub pattern: String,
    pub packets_per_node: u32,
    /// Upper bound on packets in flight across the whole mesh.
    pub max_inflight: usize,
    /// Minimum number of cycles a node waits after a refused injection.
    pub retry_backoff_min: u64,
    pub seed: u64,
    pub hotspot_x: usize,
    pub hotspot_y: usize,
}

impl Config for TrafficConfig {}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pattern: "neighbor".to_string(),
            packets_per_node: 8,
            max_inflight: 64,
            retry_backoff_min: 1,
            seed: 0,
            hotspot_x: 0,
            hotspot_y: 0,
        }
    }
}
