use clap::Parser;
use std::path::{Path, PathBuf};
use toml::Table;

use crate::collective::CollectiveConfig;
use crate::mesh::MeshConfig;
use crate::sim::config::{Config, SimConfig};
use crate::sim::top::Sim;
use crate::traffic::TrafficConfig;

#[derive(Parser)]
#[command(version, about)]
pub struct BetatronArgs {
    #[arg(help = "Path to config.toml")]
    pub config_path: Option<PathBuf>,
    #[arg(long, help = "Override mesh width")]
    pub width: Option<usize>,
    #[arg(long, help = "Override mesh height")]
    pub height: Option<usize>,
    #[arg(long, help = "Override routing algorithm (xy, yx, west_first)")]
    pub routing: Option<String>,
    #[arg(long, help = "Override traffic pattern")]
    pub pattern: Option<String>,
    #[arg(long, help = "Override packets injected per node")]
    pub packets_per_node: Option<u32>,
    #[arg(long, help = "Override run cycle budget")]
    pub max_cycles: Option<u64>,
    #[arg(long, help = "Write the JSON run summary to this path")]
    pub stats_json: Option<String>,
    #[arg(long, help = "Run the collective demo pass")]
    pub collectives: bool,
}

pub fn read_toml(filepath: &Path) -> String {
    std::fs::read_to_string(filepath).unwrap_or_else(|err| {
        eprintln!("failed to read config file {}: {}", filepath.display(), err);
        std::process::exit(1);
    })
}

/// Make a Sim object from the TOML configuration.
/// If `cli_args` is given, override TOML options with CLI arguments.
pub fn make_sim(toml_string: &str, cli_args: Option<BetatronArgs>) -> Sim {
    let config_table: Table = toml::from_str(toml_string).expect("cannot parse config toml");
    let mut sim_config = SimConfig::from_section(config_table.get("sim"));
    let mut mesh_config = MeshConfig::from_section(config_table.get("mesh"));
    let mut traffic_config = TrafficConfig::from_section(config_table.get("traffic"));
    let mut collective_config = CollectiveConfig::from_section(config_table.get("collective"));

    // override toml configs with CLI args
    if let Some(args) = cli_args {
        mesh_config.width = args.width.unwrap_or(mesh_config.width);
        mesh_config.height = args.height.unwrap_or(mesh_config.height);
        mesh_config.routing = args.routing.unwrap_or(mesh_config.routing);
        traffic_config.pattern = args.pattern.unwrap_or(traffic_config.pattern);
        traffic_config.packets_per_node = args
            .packets_per_node
            .unwrap_or(traffic_config.packets_per_node);
        sim_config.max_cycles = args.max_cycles.unwrap_or(sim_config.max_cycles);
        sim_config.stats_json = args.stats_json.unwrap_or(sim_config.stats_json);
        collective_config.enabled = args.collectives || collective_config.enabled;
    }

    Sim::new(sim_config, mesh_config, traffic_config, collective_config)
}
