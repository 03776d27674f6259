use std::fs::File;
use std::io::{BufWriter, Write};

use serde::Serialize;

use crate::collective::{
    BroadcastTopology, CollectiveConfig, CollectiveError, ReduceOp, RingTopology,
};
use crate::mesh::{MeshConfig, MeshNetwork, NetworkStats};
use crate::sim::config::SimConfig;
use crate::traffic::{TrafficConfig, TrafficDriver};

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub completed: bool,
    pub injected: u64,
    pub refused: u64,
    pub network: NetworkStats,
}

/// Top-level simulation: a mesh plus the traffic driver, stepped together
/// until the workload drains or the cycle budget runs out.
pub struct Sim {
    sim_config: SimConfig,
    collective_config: CollectiveConfig,
    network: MeshNetwork,
    traffic: TrafficDriver,
    completed: bool,
}

impl Sim {
    pub fn new(
        sim_config: SimConfig,
        mesh_config: MeshConfig,
        traffic_config: TrafficConfig,
        collective_config: CollectiveConfig,
    ) -> Sim {
        let network = MeshNetwork::new(
            mesh_config.width,
            mesh_config.height,
            mesh_config.algorithm(),
        );
        let traffic = TrafficDriver::new(&traffic_config, (mesh_config.width, mesh_config.height));
        Sim {
            sim_config,
            collective_config,
            network,
            traffic,
            completed: false,
        }
    }

    /// Run the traffic workload to completion (or until the cycle budget is
    /// spent), then the collective demo pass if configured.
    pub fn run(&mut self) {
        for _ in 0..self.sim_config.max_cycles {
            if self.traffic.is_done(&self.network) {
                break;
            }
            self.traffic.tick(&mut self.network);
            self.network.cycle();
        }
        self.completed = self.traffic.is_done(&self.network);
        if !self.completed {
            log::warn!(
                "traffic workload did not drain within {} cycles",
                self.sim_config.max_cycles
            );
        }

        if self.collective_config.enabled {
            if let Err(err) = self.run_collectives() {
                log::warn!("collective demo failed: {}", err);
            }
        }
    }

    /// Exercise the collective layers on the already-built mesh: a ring
    /// all-reduce and a tree broadcast over the configured node count.
    fn run_collectives(&mut self) -> Result<(), CollectiveError> {
        let num_nodes = self.collective_config.num_nodes;

        let values: Vec<i64> = (0..num_nodes as i64).map(|v| v * 10).collect();
        let mut ring = RingTopology::new(&mut self.network, num_nodes);
        let sum = ring.ring_all_reduce_simple(&values, ReduceOp::Sum)?;
        let ring_stats = ring.statistics();
        log::info!(
            "ring all-reduce over {} nodes: sum = {}, {} messages",
            num_nodes,
            sum,
            ring_stats.total_messages
        );

        let mut tree = BroadcastTopology::new(&mut self.network, num_nodes);
        let steps = tree.broadcast_simple(0, b"broadcast payload")?;
        let tree_stats = tree.statistics();
        log::info!(
            "tree broadcast over {} nodes: {} steps, {} messages, efficiency {:.2}",
            num_nodes,
            steps,
            tree_stats.total_messages,
            tree_stats.efficiency
        );
        Ok(())
    }

    pub fn network(&self) -> &MeshNetwork {
        &self.network
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            completed: self.completed,
            injected: self.traffic.injected(),
            refused: self.traffic.refused(),
            network: self.network.statistics(),
        }
    }

    /// Report the run: statistics to the log, and the JSON summary to the
    /// configured path.
    pub fn finish(&mut self) {
        let summary = self.summary();
        log::info!(
            "run finished: {} injected, {} delivered, {} cycles, avg latency {:.2}",
            summary.network.packets_injected,
            summary.network.packets_delivered,
            summary.network.cycles,
            summary.network.avg_latency
        );

        if !self.sim_config.stats_json.is_empty() {
            match File::create(&self.sim_config.stats_json) {
                Ok(file) => {
                    let mut writer = BufWriter::new(file);
                    if let Ok(payload) = serde_json::to_string_pretty(&summary) {
                        let _ = writer.write_all(payload.as_bytes());
                    }
                }
                Err(err) => {
                    log::warn!(
                        "cannot write stats to {}: {}",
                        self.sim_config.stats_json,
                        err
                    );
                }
            }
        }

        self.network.fini();
    }
}
