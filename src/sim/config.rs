use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::Value;

/// A config struct that can be pulled out of one section of the TOML
/// configuration file. Missing sections fall back to defaults with a
/// warning.
pub trait Config: DeserializeOwned + Default {
    fn from_section(section: Option<&Value>) -> Self {
        match section {
            Some(value) => value.clone().try_into().expect("cannot deserialize config"),
            None => {
                warn!("config section not found, using defaults");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimConfig {
    /// Cycle budget for the whole run.
    pub max_cycles: u64,
    /// Where to dump the JSON run summary; empty disables the dump.
    pub stats_json: String,
}

impl Config for SimConfig {}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_cycles: 10000,
            stats_json: String::new(),
        }
    }
}
