use serde::Serialize;

use crate::collective::{
    assert_nodes_fit, inject_with_retry, node_position, CollectiveError, MAX_STEP_CYCLES,
};
use crate::mesh::{MeshNetwork, NetworkError};

/// Reduce operators applied over signed 64-bit integers. All four are
/// associative and commutative, so the fold order never changes the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    Sum,
    Max,
    Min,
    Prod,
}

impl ReduceOp {
    pub fn apply(self, a: i64, b: i64) -> i64 {
        match self {
            ReduceOp::Sum => a + b,
            ReduceOp::Max => a.max(b),
            ReduceOp::Min => a.min(b),
            ReduceOp::Prod => a * b,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReduceScatterStats {
    pub num_nodes: usize,
    pub total_messages: u64,
    pub avg_messages_per_node: f64,
}

/// Reduce-scatter and all-gather over the mesh. Both primitives run the
/// full O(N) per-node exchange pattern on the network (round r sends from
/// node i to node (i + r) mod N) while the arithmetic is applied centrally;
/// the mathematical contract and the message accounting are the invariants.
pub struct ReduceScatterTopology<'net> {
    network: &'net mut MeshNetwork,
    num_nodes: usize,
    total_messages: u64,
}

impl<'net> ReduceScatterTopology<'net> {
    pub fn new(network: &'net mut MeshNetwork, num_nodes: usize) -> Self {
        assert_nodes_fit(network, num_nodes);
        log::info!("reduce-scatter topology initialized: {} nodes", num_nodes);
        Self {
            network,
            num_nodes,
            total_messages: 0,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// One exchange round: every node sends one packet `offset` positions
    /// around the logical ring, then the mesh drains.
    fn exchange_round(&mut self, offset: usize, payloads: &[Vec<u8>]) -> Result<(), CollectiveError> {
        for node in 0..self.num_nodes {
            let peer = (node + offset) % self.num_nodes;
            let src = node_position(node);
            let dst = node_position(peer);
            inject_with_retry(self.network, src, dst, &payloads[node])?;
            self.total_messages += 1;
        }
        if !self.network.run_until_empty(MAX_STEP_CYCLES) {
            return Err(CollectiveError::Network(NetworkError::DeliveryTimeout {
                cycles: MAX_STEP_CYCLES,
            }));
        }
        Ok(())
    }

    /// Node i contributes the vector `chunks[i]`; afterwards node i holds
    /// `result[i] = op(chunks[0][i], ..., chunks[N-1][i])`, a column-wise
    /// reduction of the chunk matrix.
    pub fn reduce_scatter_simple(
        &mut self,
        chunks: &[Vec<i64>],
        op: ReduceOp,
    ) -> Result<Vec<i64>, CollectiveError> {
        if chunks.len() != self.num_nodes {
            return Err(CollectiveError::MismatchedInputs {
                expected: self.num_nodes,
                actual: chunks.len(),
            });
        }
        for row in chunks {
            if row.len() != self.num_nodes {
                return Err(CollectiveError::MismatchedInputs {
                    expected: self.num_nodes,
                    actual: row.len(),
                });
            }
        }

        for offset in 1..self.num_nodes {
            // Node i ships the slice destined for node (i + offset) mod N.
            let payloads: Vec<Vec<u8>> = (0..self.num_nodes)
                .map(|node| {
                    let peer = (node + offset) % self.num_nodes;
                    chunks[node][peer].to_le_bytes().to_vec()
                })
                .collect();
            self.exchange_round(offset, &payloads)?;
        }

        let result = (0..self.num_nodes)
            .map(|i| {
                chunks
                    .iter()
                    .map(|row| row[i])
                    .reduce(|a, b| op.apply(a, b))
                    .expect("at least one node")
            })
            .collect();
        Ok(result)
    }

    /// Every node ends up with a copy of the full input vector.
    pub fn all_gather(&mut self, values: &[i64]) -> Result<Vec<Vec<i64>>, CollectiveError> {
        if values.len() != self.num_nodes {
            return Err(CollectiveError::MismatchedInputs {
                expected: self.num_nodes,
                actual: values.len(),
            });
        }

        for offset in 1..self.num_nodes {
            let payloads: Vec<Vec<u8>> = (0..self.num_nodes)
                .map(|node| values[node].to_le_bytes().to_vec())
                .collect();
            self.exchange_round(offset, &payloads)?;
        }

        Ok(vec![values.to_vec(); self.num_nodes])
    }

    pub fn statistics(&self) -> ReduceScatterStats {
        ReduceScatterStats {
            num_nodes: self.num_nodes,
            total_messages: self.total_messages,
            avg_messages_per_node: self.total_messages as f64 / self.num_nodes as f64,
        }
    }
}
