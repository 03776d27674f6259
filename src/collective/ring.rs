use serde::Serialize;

use crate::collective::reduce::ReduceOp;
use crate::collective::{assert_nodes_fit, node_position, CollectiveError, MAX_STEP_CYCLES};
use crate::mesh::{MeshNetwork, PacketId};

#[derive(Debug, Clone, Serialize)]
pub struct RingStats {
    pub num_nodes: usize,
    pub total_messages: u64,
    pub avg_messages_per_node: f64,
}

/// A logical ring of N nodes layered on the mesh: node i sits at
/// (i / 8, i % 8) and talks to (i + 1) mod N. The topology borrows the mesh;
/// the mesh strictly outlives it.
pub struct RingTopology<'net> {
    network: &'net mut MeshNetwork,
    num_nodes: usize,
    total_messages: u64,
}

impl<'net> RingTopology<'net> {
    pub fn new(network: &'net mut MeshNetwork, num_nodes: usize) -> Self {
        assert_nodes_fit(network, num_nodes);
        log::info!("ring topology initialized: {} nodes", num_nodes);
        Self {
            network,
            num_nodes,
            total_messages: 0,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn next_node(&self, id: usize) -> usize {
        (id + 1) % self.num_nodes
    }

    pub fn prev_node(&self, id: usize) -> usize {
        (id + self.num_nodes - 1) % self.num_nodes
    }

    /// Inject one packet from node `id` to its ring successor.
    pub fn send_to_next(&mut self, id: usize, data: &[u8]) -> Result<PacketId, CollectiveError> {
        if id >= self.num_nodes {
            return Err(CollectiveError::InvalidNode {
                node: id,
                num_nodes: self.num_nodes,
            });
        }
        let (src_x, src_y) = node_position(id);
        let (dst_x, dst_y) = node_position(self.next_node(id));
        let packet_id = self.network.inject_packet(src_x, src_y, dst_x, dst_y, data)?;
        self.total_messages += 1;
        Ok(packet_id)
    }

    /// Ring all-reduce in its simplified form: a partial value travels the
    /// ring once, folded with each node's contribution as it passes, and the
    /// wrap-around send hands the finished reduction back to node 0. Each
    /// fold step is a real packet on the mesh, so the message count and
    /// network counters are observable; the returned scalar always equals
    /// the full fold of `values`.
    pub fn ring_all_reduce_simple(
        &mut self,
        values: &[i64],
        op: ReduceOp,
    ) -> Result<i64, CollectiveError> {
        if values.len() != self.num_nodes {
            return Err(CollectiveError::MismatchedInputs {
                expected: self.num_nodes,
                actual: values.len(),
            });
        }

        let mut partial = values[0];
        for node in 0..self.num_nodes {
            let next = self.next_node(node);
            let payload = partial.to_le_bytes();
            self.send_to_next(node, &payload)?;
            if !self.network.run_until_empty(MAX_STEP_CYCLES) {
                return Err(CollectiveError::Network(
                    crate::mesh::NetworkError::DeliveryTimeout {
                        cycles: MAX_STEP_CYCLES,
                    },
                ));
            }
            if next != 0 {
                partial = op.apply(partial, values[next]);
            }
        }

        log::debug!(
            "ring all-reduce over {} nodes finished: {:?} -> {}",
            self.num_nodes,
            op,
            partial
        );
        Ok(partial)
    }

    pub fn statistics(&self) -> RingStats {
        RingStats {
            num_nodes: self.num_nodes,
            total_messages: self.total_messages,
            avg_messages_per_node: self.total_messages as f64 / self.num_nodes as f64,
        }
    }
}
