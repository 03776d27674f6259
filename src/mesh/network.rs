use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::mesh::packet::{Direction, DpuAddress, Packet, PacketId, RoutingAlgorithm};
use crate::mesh::router::Router;
use crate::Cycle;

/// Errors surfaced by the mesh API. All of them are recoverable: the network
/// state stays valid and the caller may retry or advance further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    CoordinateOutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    /// The LOCAL input of the source router cannot accept an injection this
    /// cycle. Backpressure, not a failure of the network.
    RouterBusy {
        x: usize,
        y: usize,
    },
    /// A cycle budget ran out before the in-flight set drained.
    DeliveryTimeout {
        cycles: Cycle,
    },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::CoordinateOutOfRange {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "position ({},{}) outside {}x{} mesh",
                x, y, width, height
            ),
            Self::RouterBusy { x, y } => {
                write!(f, "router at ({},{}) busy, cannot inject", x, y)
            }
            Self::DeliveryTimeout { cycles } => {
                write!(f, "packet delivery timeout after {} cycles", cycles)
            }
        }
    }
}

impl std::error::Error for NetworkError {}

/// Aggregate network counters. Field names are the stable statistics keys.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkStats {
    pub width: usize,
    pub height: usize,
    pub total_routers: usize,
    pub packets_injected: u64,
    pub packets_delivered: u64,
    pub packets_in_flight: usize,
    pub cycles: Cycle,
    pub avg_latency: f64,
    pub throughput: f64,
    pub total_packets_routed: u64,
    pub total_packets_blocked: u64,
    pub network_block_rate: f64,
}

/// A W x H mesh of bufferless routers. The network owns the router grid,
/// drives the global cycle, and is the hand-off point between neighbors.
pub struct MeshNetwork {
    width: usize,
    height: usize,
    routing: RoutingAlgorithm,
    /// Router grid indexed as `routers[x][y]`.
    routers: Vec<Vec<Router>>,

    in_flight: HashSet<PacketId>,
    next_packet_id: PacketId,

    packets_injected: u64,
    packets_delivered: u64,
    total_latency: u64,
    cycles: Cycle,
}

impl MeshNetwork {
    pub fn new(width: usize, height: usize, routing: RoutingAlgorithm) -> Self {
        assert!(width > 0 && height > 0, "mesh dimensions must be > 0");
        let routers = (0..width)
            .map(|x| (0..height).map(|y| Router::new(x, y, routing)).collect())
            .collect();
        log::info!(
            "mesh network initialized: {}x{} = {} routers, {} routing",
            width,
            height,
            width * height,
            routing
        );
        Self {
            width,
            height,
            routing,
            routers,
            in_flight: HashSet::new(),
            next_packet_id: 0,
            packets_injected: 0,
            packets_delivered: 0,
            total_latency: 0,
            cycles: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn routing(&self) -> RoutingAlgorithm {
        self.routing
    }

    pub fn cycles(&self) -> Cycle {
        self.cycles
    }

    fn valid_position(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Inject a packet at the source DPU. The payload is copied into the
    /// packet; the packet goes into the source router's LOCAL *input* port,
    /// matching the physical picture of a DPU handing data to its router.
    /// Returns the id the packet is tracked under until delivery.
    pub fn inject_packet(
        &mut self,
        src_x: usize,
        src_y: usize,
        dst_x: usize,
        dst_y: usize,
        data: &[u8],
    ) -> Result<PacketId, NetworkError> {
        if !self.valid_position(src_x, src_y) {
            return Err(NetworkError::CoordinateOutOfRange {
                x: src_x,
                y: src_y,
                width: self.width,
                height: self.height,
            });
        }
        if !self.valid_position(dst_x, dst_y) {
            return Err(NetworkError::CoordinateOutOfRange {
                x: dst_x,
                y: dst_y,
                width: self.width,
                height: self.height,
            });
        }

        let mut packet = Packet::new(
            DpuAddress::new(src_x, 0, src_y),
            DpuAddress::new(dst_x, 0, dst_y),
            data.to_vec(),
        );
        packet.timestamp = self.cycles;
        packet.id = self.next_packet_id;

        if self.routers[src_x][src_y]
            .receive_packet(packet, Direction::Local)
            .is_err()
        {
            return Err(NetworkError::RouterBusy { x: src_x, y: src_y });
        }

        let id = self.next_packet_id;
        self.next_packet_id += 1;
        self.in_flight.insert(id);
        self.packets_injected += 1;
        Ok(id)
    }

    /// One network cycle: two strictly ordered sub-phases.
    ///
    /// 1. Router phase: every router advances its own ports. Routers only
    ///    touch their own state here, so the iteration order is immaterial.
    /// 2. Transfer phase: each occupied cardinal output is handed to the
    ///    neighbor's opposite input (left in place on refusal), and LOCAL
    ///    outputs are drained by the mesh itself as deliveries.
    pub fn cycle(&mut self) {
        for column in self.routers.iter_mut() {
            for router in column.iter_mut() {
                router.cycle();
            }
        }

        for x in 0..self.width {
            for y in 0..self.height {
                for dir in Direction::CARDINAL {
                    let Some((nx, ny)) = self.neighbor(x, y, dir) else {
                        continue;
                    };
                    let Some(packet) = self.routers[x][y].take_output(dir) else {
                        continue;
                    };
                    match self.routers[nx][ny].receive_packet(packet, dir.opposite()) {
                        Ok(()) => {}
                        Err(packet) => self.routers[x][y].restore_output(dir, packet),
                    }
                }

                if let Some(packet) = self.routers[x][y].take_output(Direction::Local) {
                    let latency = self.cycles - packet.timestamp;
                    self.packets_delivered += 1;
                    self.total_latency += latency;
                    self.in_flight.remove(&packet.id);
                    log::debug!(
                        "packet {} delivered at ({},{}) after {} hops, latency {}",
                        packet.id,
                        x,
                        y,
                        packet.hop_count,
                        latency
                    );
                }
            }
        }

        self.cycles += 1;
    }

    fn neighbor(&self, x: usize, y: usize, dir: Direction) -> Option<(usize, usize)> {
        match dir {
            Direction::North if y + 1 < self.height => Some((x, y + 1)),
            Direction::South if y > 0 => Some((x, y - 1)),
            Direction::East if x + 1 < self.width => Some((x + 1, y)),
            Direction::West if x > 0 => Some((x - 1, y)),
            _ => None,
        }
    }

    /// Drive the network until all in-flight packets are delivered or the
    /// cycle budget runs out. Returns whether the network drained.
    pub fn run_until_empty(&mut self, max_cycles: Cycle) -> bool {
        let start = self.cycles;
        while !self.in_flight.is_empty() {
            if self.cycles - start >= max_cycles {
                return false;
            }
            self.cycle();
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn get_router(&self, x: usize, y: usize) -> Option<&Router> {
        if !self.valid_position(x, y) {
            return None;
        }
        Some(&self.routers[x][y])
    }

    /// Inject and block the caller until the network drains, up to
    /// `timeout` cycles.
    pub fn send_packet_blocking(
        &mut self,
        src_x: usize,
        src_y: usize,
        dst_x: usize,
        dst_y: usize,
        data: &[u8],
        timeout: Cycle,
    ) -> Result<(), NetworkError> {
        self.inject_packet(src_x, src_y, dst_x, dst_y, data)?;
        if !self.run_until_empty(timeout) {
            return Err(NetworkError::DeliveryTimeout { cycles: timeout });
        }
        Ok(())
    }

    pub fn statistics(&self) -> NetworkStats {
        let mut total_routed = 0;
        let mut total_blocked = 0;
        for column in &self.routers {
            for router in column {
                total_routed += router.packets_routed();
                total_blocked += router.packets_blocked();
            }
        }
        let attempts = total_routed + total_blocked;

        NetworkStats {
            width: self.width,
            height: self.height,
            total_routers: self.width * self.height,
            packets_injected: self.packets_injected,
            packets_delivered: self.packets_delivered,
            packets_in_flight: self.in_flight.len(),
            cycles: self.cycles,
            avg_latency: if self.packets_delivered > 0 {
                self.total_latency as f64 / self.packets_delivered as f64
            } else {
                0.0
            },
            throughput: if self.cycles > 0 {
                self.packets_delivered as f64 / self.cycles as f64
            } else {
                0.0
            },
            total_packets_routed: total_routed,
            total_packets_blocked: total_blocked,
            network_block_rate: if attempts > 0 {
                total_blocked as f64 / attempts as f64
            } else {
                0.0
            },
        }
    }

    /// Sum of port occupancies across all routers. Equals the in-flight set
    /// size whenever every packet was injected through the mesh API.
    pub fn occupied_ports(&self) -> usize {
        self.routers
            .iter()
            .flatten()
            .map(|r| r.occupied_ports())
            .sum()
    }

    /// Tear down the grid and the in-flight set.
    pub fn fini(&mut self) {
        for column in self.routers.iter_mut() {
            for router in column.iter_mut() {
                router.fini();
            }
        }
        self.routers.clear();
        self.in_flight.clear();
    }
}

impl fmt::Display for MeshNetwork {
    /// Occupancy map with y growing upward, `[*]` for a busy router.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "cycle {}, {} packets in flight",
            self.cycles,
            self.in_flight.len()
        )?;
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let mark = if self.routers[x][y].is_idle() { " " } else { "*" };
                write!(f, "[{}]", mark)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
