use serde::Serialize;

use crate::mesh::packet::{Direction, Packet, RoutingAlgorithm};
use crate::Cycle;

/// A single bufferless port: capacity one, no queue. A refused `put` hands
/// the packet back to the caller, which is how backpressure propagates.
#[derive(Debug, Default)]
pub struct RouterPort {
    slot: Option<Packet>,
}

impl RouterPort {
    pub fn occupied(&self) -> bool {
        self.slot.is_some()
    }

    pub fn peek(&self) -> Option<&Packet> {
        self.slot.as_ref()
    }

    /// Place a packet into the port. Fails with the packet returned if the
    /// port is occupied.
    pub fn put(&mut self, packet: Packet) -> Result<(), Packet> {
        if self.slot.is_some() {
            return Err(packet);
        }
        self.slot = Some(packet);
        Ok(())
    }

    pub fn take(&mut self) -> Option<Packet> {
        self.slot.take()
    }
}

/// Per-router counters.
#[derive(Debug, Clone, Serialize)]
pub struct RouterStats {
    pub position_x: usize,
    pub position_y: usize,
    pub packets_routed: u64,
    pub packets_blocked: u64,
    pub total_hops: u64,
    pub cycles: Cycle,
    pub avg_hops: f64,
    pub block_rate: f64,
}

/// A bufferless mesh router: five single-slot input ports, five output
/// ports, and a deterministic routing function. Packets either move in a
/// cycle or stay put at their input; there is no queueing.
#[derive(Debug)]
pub struct Router {
    x: usize,
    y: usize,
    algorithm: RoutingAlgorithm,
    inputs: [RouterPort; 5],
    outputs: [RouterPort; 5],

    packets_routed: u64,
    packets_blocked: u64,
    total_hops: u64,
    cycles: Cycle,
}

impl Router {
    pub fn new(x: usize, y: usize, algorithm: RoutingAlgorithm) -> Self {
        Self {
            x,
            y,
            algorithm,
            inputs: Default::default(),
            outputs: Default::default(),
            packets_routed: 0,
            packets_blocked: 0,
            total_hops: 0,
            cycles: 0,
        }
    }

    pub fn position(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    pub fn input(&self, dir: Direction) -> &RouterPort {
        &self.inputs[dir.index()]
    }

    pub fn output(&self, dir: Direction) -> &RouterPort {
        &self.outputs[dir.index()]
    }

    /// The routing decision for a packet sitting at this router.
    pub fn compute_next_hop(&self, packet: &Packet) -> Direction {
        self.algorithm
            .route((self.x, self.y), (packet.dst_x(), packet.dst_y()))
    }

    /// One router cycle.
    ///
    /// Phase 1 clears the output ports: the network's transfer phase must
    /// have drained them since the previous cycle, so a still-occupied
    /// output is a transfer stall and its packet is dropped here.
    ///
    /// Phase 2 walks the input ports in `Direction::ALL` order and moves
    /// each occupied input to its computed output if that output is free.
    /// The first-encountered input wins a contended output; losers stay in
    /// their input port and count as blocked.
    pub fn cycle(&mut self) {
        for dir in Direction::ALL {
            if let Some(packet) = self.outputs[dir.index()].take() {
                log::debug!(
                    "router ({},{}): dropping stalled packet {} at {} output",
                    self.x,
                    self.y,
                    packet.id,
                    dir
                );
            }
        }

        for dir in Direction::ALL {
            let Some(mut packet) = self.inputs[dir.index()].take() else {
                continue;
            };
            let next = self.compute_next_hop(&packet);
            if self.outputs[next.index()].occupied() {
                self.packets_blocked += 1;
                self.inputs[dir.index()]
                    .put(packet)
                    .expect("input port was just emptied");
                continue;
            }
            packet.hop_count += 1;
            self.packets_routed += 1;
            self.total_hops += packet.hop_count as u64;
            self.outputs[next.index()]
                .put(packet)
                .expect("output port checked free");
        }

        self.cycles += 1;
    }

    /// Injection from the attached DPU: the packet is placed directly at the
    /// computed output port with a fresh hop count. Fails with the packet
    /// returned if that output is occupied this cycle.
    pub fn inject_packet(&mut self, mut packet: Packet) -> Result<(), Packet> {
        packet.x = self.x;
        packet.y = self.y;
        let next = self.compute_next_hop(&packet);
        if self.outputs[next.index()].occupied() {
            return Err(packet);
        }
        packet.hop_count = 0;
        self.outputs[next.index()]
            .put(packet)
            .expect("output port checked free");
        Ok(())
    }

    /// Accept a packet from a neighbor (or from the local DPU via the LOCAL
    /// input). Fails with the packet returned if the input is occupied.
    pub fn receive_packet(&mut self, mut packet: Packet, from: Direction) -> Result<(), Packet> {
        if self.inputs[from.index()].occupied() {
            return Err(packet);
        }
        packet.x = self.x;
        packet.y = self.y;
        self.inputs[from.index()]
            .put(packet)
            .expect("input port checked free");
        Ok(())
    }

    /// Remove the packet sitting at an output port, if any. Used by the
    /// network's transfer phase.
    pub fn take_output(&mut self, dir: Direction) -> Option<Packet> {
        self.outputs[dir.index()].take()
    }

    /// Put a packet back onto an output port after a refused transfer.
    pub fn restore_output(&mut self, dir: Direction, packet: Packet) {
        self.outputs[dir.index()]
            .put(packet)
            .expect("restoring into an output port that was just emptied");
    }

    pub fn is_idle(&self) -> bool {
        self.occupied_ports() == 0
    }

    /// Number of occupied ports, inputs and outputs combined.
    pub fn occupied_ports(&self) -> usize {
        let inputs = self.inputs.iter().filter(|p| p.occupied()).count();
        let outputs = self.outputs.iter().filter(|p| p.occupied()).count();
        inputs + outputs
    }

    pub fn packets_routed(&self) -> u64 {
        self.packets_routed
    }

    pub fn packets_blocked(&self) -> u64 {
        self.packets_blocked
    }

    pub fn statistics(&self) -> RouterStats {
        let attempts = self.packets_routed + self.packets_blocked;
        RouterStats {
            position_x: self.x,
            position_y: self.y,
            packets_routed: self.packets_routed,
            packets_blocked: self.packets_blocked,
            total_hops: self.total_hops,
            cycles: self.cycles,
            avg_hops: if self.packets_routed > 0 {
                self.total_hops as f64 / self.packets_routed as f64
            } else {
                0.0
            },
            block_rate: if attempts > 0 {
                self.packets_blocked as f64 / attempts as f64
            } else {
                0.0
            },
        }
    }

    /// Drop everything still sitting in the ports.
    pub fn fini(&mut self) {
        for dir in Direction::ALL {
            self.inputs[dir.index()].take();
            self.outputs[dir.index()].take();
        }
    }
}
