use crate::collective::broadcast::BroadcastTopology;
use crate::collective::CollectiveError;
use crate::mesh::{MeshNetwork, RoutingAlgorithm};

fn mesh_4x8() -> MeshNetwork {
    MeshNetwork::new(4, 8, RoutingAlgorithm::XyRouting)
}

#[test]
fn tree_structure_formulas() {
    let mut net = mesh_4x8();
    let tree = BroadcastTopology::new(&mut net, 32);

    assert_eq!(tree.parent(0), None);
    assert_eq!(tree.parent(1), Some(0));
    assert_eq!(tree.parent(2), Some(0));
    assert_eq!(tree.children(0), vec![1, 2]);
    assert_eq!(tree.children(1), vec![3, 4]);
    assert_eq!(tree.children(15), vec![31]);
    assert_eq!(tree.children(16), Vec::<usize>::new());
    assert_eq!(tree.tree_depth(), 5);
}

#[test]
fn every_child_points_back_to_its_parent() {
    let mut net = mesh_4x8();
    let tree = BroadcastTopology::new(&mut net, 32);
    for node in 0..32 {
        for child in tree.children(node) {
            assert_eq!(tree.parent(child), Some(node));
        }
    }
}

#[test]
fn broadcast_simple_reaches_all_32_nodes() {
    let mut net = mesh_4x8();
    let mut tree = BroadcastTopology::new(&mut net, 32);

    let steps = tree.broadcast_simple(0, b"data").unwrap();
    assert!(steps <= tree.tree_depth() + 5);

    let stats = tree.statistics();
    assert!(stats.total_messages >= 31);
    assert_eq!(stats.theoretical_min_messages, 31);
    assert!(stats.efficiency <= 1.0);
}

#[test]
fn level_synchronous_broadcast_delivers_every_edge() {
    let mut net = mesh_4x8();
    let mut tree = BroadcastTopology::new(&mut net, 16);
    tree.broadcast(0, b"payload").unwrap();

    let messages = tree.statistics().total_messages;
    drop(tree);

    // One packet per non-root node, all actually carried by the mesh.
    assert_eq!(messages, 15);
    let stats = net.statistics();
    assert_eq!(stats.packets_delivered, 15);
    assert!(net.is_empty());
}

#[test]
fn broadcast_from_nonzero_root_still_covers_the_tree() {
    let mut net = mesh_4x8();
    let mut tree = BroadcastTopology::new(&mut net, 8);
    tree.broadcast(5, b"off-root").unwrap();
    assert_eq!(tree.statistics().total_messages, 7);
}

#[test]
fn broadcast_rejects_invalid_root() {
    let mut net = mesh_4x8();
    let mut tree = BroadcastTopology::new(&mut net, 8);
    let err = tree.broadcast(8, b"x").unwrap_err();
    assert_eq!(
        err,
        CollectiveError::InvalidNode {
            node: 8,
            num_nodes: 8
        }
    );
}

#[test]
fn multi_root_broadcast_runs_sequentially() {
    let mut net = mesh_4x8();
    let mut tree = BroadcastTopology::new(&mut net, 8);
    tree.multi_root_broadcast(&[0, 3], &[b"first".to_vec(), b"second".to_vec()])
        .unwrap();
    // Two full broadcasts worth of traffic.
    assert_eq!(tree.statistics().total_messages, 14);
}

#[test]
fn multi_root_broadcast_checks_input_lengths() {
    let mut net = mesh_4x8();
    let mut tree = BroadcastTopology::new(&mut net, 8);
    let err = tree
        .multi_root_broadcast(&[0, 1], &[b"only one".to_vec()])
        .unwrap_err();
    assert_eq!(
        err,
        CollectiveError::MismatchedInputs {
            expected: 2,
            actual: 1
        }
    );
}

#[test]
fn two_node_tree_has_depth_one() {
    let mut net = mesh_4x8();
    let mut tree = BroadcastTopology::new(&mut net, 2);
    assert_eq!(tree.tree_depth(), 1);
    let steps = tree.broadcast_simple(0, b"tiny").unwrap();
    assert_eq!(steps, 1);
    assert_eq!(tree.statistics().total_messages, 1);
}
