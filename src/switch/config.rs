use serde::Deserialize;

use crate::sim::config::Config;

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SwitchConfig {
    pub num_chips: usize,
    pub dq_pins: usize,
    pub num_channels: usize,
}

impl Config for SwitchConfig {}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            num_chips: 4,
            dq_pins: 64,
            num_channels: 4,
        }
    }
}
