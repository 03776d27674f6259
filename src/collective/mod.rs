pub mod broadcast;
pub mod config;
pub mod reduce;
pub mod ring;

mod unit_tests;

pub use broadcast::{BroadcastStats, BroadcastTopology};
pub use config::CollectiveConfig;
pub use reduce::{ReduceOp, ReduceScatterStats, ReduceScatterTopology};
pub use ring::{RingStats, RingTopology};

use std::fmt;

use crate::mesh::{MeshNetwork, NetworkError};
use crate::Cycle;

/// Height of the logical node column used when placing collective node ids
/// on the mesh: node i sits at (i / 8, i % 8).
pub const NODE_GRID_HEIGHT: usize = 8;

/// Cycle budget for draining the mesh between algorithm phases.
pub const MAX_STEP_CYCLES: Cycle = 1000;

/// How many cycles to pump the mesh while waiting for a busy LOCAL input
/// during back-to-back injections from the same node.
const INJECT_RETRY_CYCLES: u32 = 16;

/// Mesh coordinate of a collective node id.
pub fn node_position(id: usize) -> (usize, usize) {
    (id / NODE_GRID_HEIGHT, id % NODE_GRID_HEIGHT)
}

/// Topology constructors assert that every node id maps inside the mesh.
pub(crate) fn assert_nodes_fit(network: &MeshNetwork, num_nodes: usize) {
    assert!(num_nodes > 0, "topology needs at least one node");
    let max_x = (num_nodes - 1) / NODE_GRID_HEIGHT;
    let max_y = (num_nodes - 1).min(NODE_GRID_HEIGHT - 1);
    assert!(
        max_x < network.width() && max_y < network.height(),
        "{} nodes do not fit a {}x{} mesh (column height {})",
        num_nodes,
        network.width(),
        network.height(),
        NODE_GRID_HEIGHT
    );
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectiveError {
    InvalidNode { node: usize, num_nodes: usize },
    /// The unpaced broadcast did not converge within depth + 5 iterations.
    BroadcastTimeout { steps: usize },
    /// Parallel input arrays of unequal length.
    MismatchedInputs { expected: usize, actual: usize },
    Network(NetworkError),
}

impl fmt::Display for CollectiveError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidNode { node, num_nodes } => {
                write!(f, "node {} outside topology of {} nodes", node, num_nodes)
            }
            Self::BroadcastTimeout { steps } => {
                write!(f, "broadcast did not converge after {} steps", steps)
            }
            Self::MismatchedInputs { expected, actual } => {
                write!(f, "expected {} inputs, got {}", expected, actual)
            }
            Self::Network(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for CollectiveError {}

impl From<NetworkError> for CollectiveError {
    fn from(err: NetworkError) -> Self {
        CollectiveError::Network(err)
    }
}

/// Inject a packet, pumping the mesh for a bounded number of cycles when the
/// source LOCAL input is still occupied by a previous injection. Collective
/// algorithms issue several sends from one node back to back; without the
/// pump every send after the first would bounce off the single-slot port.
pub(crate) fn inject_with_retry(
    network: &mut MeshNetwork,
    src: (usize, usize),
    dst: (usize, usize),
    data: &[u8],
) -> Result<(), CollectiveError> {
    for _ in 0..INJECT_RETRY_CYCLES {
        match network.inject_packet(src.0, src.1, dst.0, dst.1, data) {
            Ok(_) => return Ok(()),
            Err(NetworkError::RouterBusy { .. }) => network.cycle(),
            Err(err) => return Err(err.into()),
        }
    }
    Err(NetworkError::RouterBusy { x: src.0, y: src.1 }.into())
}
