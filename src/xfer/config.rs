use serde::Deserialize;

use crate::sim::config::Config;

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct XferConfig {
    pub num_channels: usize,
    pub num_ranks: usize,
    pub num_dpus: usize,
    /// Transfers retired per channel per cycle. A multiplier on channel
    /// bandwidth, never a reordering allowance.
    pub transfers_per_cycle: usize,
}

impl Config for XferConfig {}

impl Default for XferConfig {
    fn default() -> Self {
        Self {
            num_channels: 2,
            num_ranks: 2,
            num_dpus: 8,
            transfers_per_cycle: 1,
        }
    }
}
