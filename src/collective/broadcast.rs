use serde::Serialize;

use crate::collective::{
    assert_nodes_fit, inject_with_retry, node_position, CollectiveError, MAX_STEP_CYCLES,
};
use crate::mesh::MeshNetwork;

#[derive(Debug, Clone, Serialize)]
pub struct BroadcastStats {
    pub num_nodes: usize,
    pub branching_factor: usize,
    pub tree_depth: usize,
    pub total_messages: u64,
    pub theoretical_min_messages: usize,
    pub efficiency: f64,
    pub avg_messages_per_node: f64,
    pub network_latency: f64,
    pub network_throughput: f64,
}

/// Tree-based one-to-many distribution over the mesh. The tree is the
/// implicit binary heap layout: parent(i) = (i-1)/k, children(i) =
/// {k*i+1+j}. A broadcast from a non-zero root walks the same edges
/// undirected, so it reaches every node at the cost of extra depth.
pub struct BroadcastTopology<'net> {
    network: &'net mut MeshNetwork,
    num_nodes: usize,
    branching_factor: usize,
    total_messages: u64,
}

impl<'net> BroadcastTopology<'net> {
    pub fn new(network: &'net mut MeshNetwork, num_nodes: usize) -> Self {
        assert_nodes_fit(network, num_nodes);
        log::info!(
            "broadcast topology initialized: {} nodes (binary tree)",
            num_nodes
        );
        Self {
            network,
            num_nodes,
            branching_factor: 2,
            total_messages: 0,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn branching_factor(&self) -> usize {
        self.branching_factor
    }

    /// Parent in the canonical tree; the root has none.
    pub fn parent(&self, id: usize) -> Option<usize> {
        if id == 0 {
            None
        } else {
            Some((id - 1) / self.branching_factor)
        }
    }

    /// Children in the canonical tree, ascending.
    pub fn children(&self, id: usize) -> Vec<usize> {
        (0..self.branching_factor)
            .map(|j| id * self.branching_factor + 1 + j)
            .filter(|&child| child < self.num_nodes)
            .collect()
    }

    /// Depth of the canonical tree: ceil(log_k N).
    pub fn tree_depth(&self) -> usize {
        if self.num_nodes <= 1 {
            return 0;
        }
        let mut depth = 0;
        let mut nodes = 1;
        while nodes < self.num_nodes {
            nodes *= self.branching_factor;
            depth += 1;
        }
        depth
    }

    /// Tree-adjacent nodes: the parent plus the children.
    fn tree_neighbors(&self, id: usize) -> Vec<usize> {
        let mut neighbors = Vec::with_capacity(self.branching_factor + 1);
        if let Some(parent) = self.parent(id) {
            neighbors.push(parent);
        }
        neighbors.extend(self.children(id));
        neighbors
    }

    fn send(&mut self, from: usize, to: usize, data: &[u8]) -> Result<(), CollectiveError> {
        let src = node_position(from);
        let dst = node_position(to);
        inject_with_retry(self.network, src, dst, data)?;
        self.total_messages += 1;
        Ok(())
    }

    /// Level-synchronous broadcast: at each level every node already holding
    /// the data sends to its tree neighbors that still lack it, and the mesh
    /// is drained before the next level starts.
    pub fn broadcast(&mut self, root: usize, data: &[u8]) -> Result<(), CollectiveError> {
        if root >= self.num_nodes {
            return Err(CollectiveError::InvalidNode {
                node: root,
                num_nodes: self.num_nodes,
            });
        }

        let mut received = vec![false; self.num_nodes];
        received[root] = true;
        let mut remaining = self.num_nodes - 1;

        // Rooted at 0 this finishes in tree_depth levels; an off-root
        // broadcast first climbs toward the tree root and may take up to
        // twice that.
        let max_levels = 2 * self.tree_depth() + 2;
        let mut level = 0;
        while remaining > 0 {
            if level >= max_levels {
                return Err(CollectiveError::BroadcastTimeout { steps: level });
            }

            let holders: Vec<usize> = (0..self.num_nodes).filter(|&n| received[n]).collect();
            for node in holders {
                for neighbor in self.tree_neighbors(node) {
                    if received[neighbor] {
                        continue;
                    }
                    log::debug!("broadcast level {}: node {} -> {}", level, node, neighbor);
                    self.send(node, neighbor, data)?;
                    received[neighbor] = true;
                    remaining -= 1;
                }
            }

            if !self.network.run_until_empty(MAX_STEP_CYCLES) {
                return Err(CollectiveError::Network(
                    crate::mesh::NetworkError::DeliveryTimeout {
                        cycles: MAX_STEP_CYCLES,
                    },
                ));
            }
            level += 1;
        }

        Ok(())
    }

    /// Unpaced broadcast: keep sweeping the nodes, each holder forwarding to
    /// tree neighbors that lack the data, until everyone has it. Because the
    /// sweep ascends node ids and marks as it goes, data cascades down whole
    /// subtrees within one outer iteration. Fails with `BroadcastTimeout`
    /// after tree_depth + 5 iterations. Returns the number of iterations.
    pub fn broadcast_simple(&mut self, root: usize, data: &[u8]) -> Result<usize, CollectiveError> {
        if root >= self.num_nodes {
            return Err(CollectiveError::InvalidNode {
                node: root,
                num_nodes: self.num_nodes,
            });
        }

        let mut has_data = vec![false; self.num_nodes];
        has_data[root] = true;
        let mut total_received = 1;
        let mut steps = 0;

        while total_received < self.num_nodes {
            for node in 0..self.num_nodes {
                if !has_data[node] {
                    continue;
                }
                for neighbor in self.tree_neighbors(node) {
                    if has_data[neighbor] {
                        continue;
                    }
                    self.send(node, neighbor, data)?;
                    has_data[neighbor] = true;
                    total_received += 1;
                }
            }

            self.network.run_until_empty(MAX_STEP_CYCLES);
            steps += 1;

            if steps > self.tree_depth() + 5 {
                return Err(CollectiveError::BroadcastTimeout { steps });
            }
        }

        Ok(steps)
    }

    /// Sequential composition of independent broadcasts. Congestion between
    /// them is allowed and shows up as higher measured latencies.
    pub fn multi_root_broadcast(
        &mut self,
        roots: &[usize],
        payloads: &[Vec<u8>],
    ) -> Result<(), CollectiveError> {
        if roots.len() != payloads.len() {
            return Err(CollectiveError::MismatchedInputs {
                expected: roots.len(),
                actual: payloads.len(),
            });
        }

        for (root, payload) in roots.iter().zip(payloads) {
            self.broadcast_simple(*root, payload)?;
        }
        Ok(())
    }

    pub fn statistics(&self) -> BroadcastStats {
        let net = self.network.statistics();
        let theoretical_min = self.num_nodes - 1;
        BroadcastStats {
            num_nodes: self.num_nodes,
            branching_factor: self.branching_factor,
            tree_depth: self.tree_depth(),
            total_messages: self.total_messages,
            theoretical_min_messages: theoretical_min,
            efficiency: if self.total_messages > 0 {
                theoretical_min as f64 / self.total_messages as f64
            } else {
                0.0
            },
            avg_messages_per_node: self.total_messages as f64 / self.num_nodes as f64,
            network_latency: net.avg_latency,
            network_throughput: net.throughput,
        }
    }
}
