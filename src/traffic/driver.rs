use crate::mesh::{MeshNetwork, NetworkError};
use crate::traffic::config::TrafficConfig;
use crate::traffic::patterns::TrafficPattern;
use crate::Cycle;

#[derive(Debug, Clone, Copy, Default)]
struct NodeState {
    sent: u32,
    retry_at: Cycle,
}

/// Injects a synthetic workload into the mesh: every node sends
/// `packets_per_node` packets to pattern-chosen destinations, backing off
/// when its router refuses an injection and respecting a global in-flight
/// cap. The driver never blocks; it retries on later ticks.
#[derive(Debug)]
pub struct TrafficDriver {
    pattern: TrafficPattern,
    packets_per_node: u32,
    max_inflight: usize,
    retry_backoff_min: Cycle,
    nodes: Vec<NodeState>,
    dims: (usize, usize),
    injected: u64,
    refused: u64,
    done_injecting: bool,
}

impl TrafficDriver {
    pub fn new(config: &TrafficConfig, dims: (usize, usize)) -> Self {
        let pattern = TrafficPattern::from_config(config);
        Self {
            pattern,
            packets_per_node: if config.enabled {
                config.packets_per_node
            } else {
                0
            },
            max_inflight: config.max_inflight.max(1),
            retry_backoff_min: config.retry_backoff_min.max(1),
            nodes: vec![NodeState::default(); dims.0 * dims.1],
            dims,
            injected: 0,
            refused: 0,
            done_injecting: false,
        }
    }

    /// One driver tick: offer each node the chance to inject its next
    /// packet. Runs before the network cycle so injections land in the
    /// current cycle's LOCAL inputs.
    pub fn tick(&mut self, network: &mut MeshNetwork) {
        if self.done_injecting {
            return;
        }
        let now = network.cycles();
        let (width, height) = self.dims;
        let mut all_sent = true;

        for x in 0..width {
            for y in 0..height {
                let node = &mut self.nodes[x * height + y];
                if node.sent >= self.packets_per_node {
                    continue;
                }
                all_sent = false;
                if node.retry_at > now {
                    continue;
                }
                if network.in_flight() >= self.max_inflight {
                    return;
                }

                let (dx, dy) = self.pattern.destination((x, y), node.sent, self.dims);
                let payload = node.sent.to_le_bytes();
                match network.inject_packet(x, y, dx, dy, &payload) {
                    Ok(_) => {
                        node.sent += 1;
                        node.retry_at = now + 1;
                        self.injected += 1;
                    }
                    Err(NetworkError::RouterBusy { .. }) => {
                        node.retry_at = now + self.retry_backoff_min;
                        self.refused += 1;
                    }
                    Err(err) => {
                        // Pattern destinations are always in range.
                        unreachable!("traffic injection failed: {}", err);
                    }
                }
            }
        }

        if all_sent {
            self.done_injecting = true;
            log::info!(
                "traffic driver: all {} packets injected ({} refusals retried)",
                self.injected,
                self.refused
            );
        }
    }

    /// All packets injected and the network drained.
    pub fn is_done(&self, network: &MeshNetwork) -> bool {
        self.done_injecting && network.is_empty()
    }

    pub fn injected(&self) -> u64 {
        self.injected
    }

    pub fn refused(&self) -> u64 {
        self.refused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::RoutingAlgorithm;

    #[test]
    fn drives_a_neighbor_workload_to_completion() {
        let mut net = MeshNetwork::new(4, 4, RoutingAlgorithm::XyRouting);
        let config = TrafficConfig {
            pattern: "neighbor".to_string(),
            packets_per_node: 4,
            ..TrafficConfig::default()
        };
        let mut driver = TrafficDriver::new(&config, (4, 4));

        let mut budget = 10_000;
        while !driver.is_done(&net) && budget > 0 {
            driver.tick(&mut net);
            net.cycle();
            budget -= 1;
        }

        assert!(driver.is_done(&net), "workload did not drain");
        assert_eq!(driver.injected(), 4 * 16);
        let stats = net.statistics();
        assert_eq!(stats.packets_injected, 64);
        assert_eq!(stats.packets_delivered, 64);
    }

    #[test]
    fn disabled_traffic_is_immediately_done() {
        let mut net = MeshNetwork::new(4, 4, RoutingAlgorithm::XyRouting);
        let config = TrafficConfig {
            enabled: false,
            ..TrafficConfig::default()
        };
        let mut driver = TrafficDriver::new(&config, (4, 4));
        driver.tick(&mut net);
        assert!(driver.is_done(&net));
        assert_eq!(driver.injected(), 0);
    }
}
