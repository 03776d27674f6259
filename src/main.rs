use clap::Parser;

use betatron::ui::{make_sim, read_toml, BetatronArgs};

pub fn main() {
    env_logger::init();
    let args = BetatronArgs::parse();

    let toml_string = match &args.config_path {
        Some(path) => read_toml(path),
        None => String::new(),
    };

    let mut sim = make_sim(&toml_string, Some(args));
    sim.run();
    sim.finish();
}
