use crate::collective::reduce::ReduceOp;
use crate::collective::ring::RingTopology;
use crate::collective::CollectiveError;
use crate::mesh::{MeshNetwork, RoutingAlgorithm};

fn mesh_4x8() -> MeshNetwork {
    MeshNetwork::new(4, 8, RoutingAlgorithm::XyRouting)
}

#[test]
fn next_and_prev_wrap_around() {
    let mut net = mesh_4x8();
    let ring = RingTopology::new(&mut net, 32);

    assert_eq!(ring.next_node(0), 1);
    assert_eq!(ring.next_node(31), 0);
    assert_eq!(ring.prev_node(0), 31);
    assert_eq!(ring.prev_node(1), 0);
}

#[test]
fn next_and_prev_are_mutual_inverses() {
    let mut net = mesh_4x8();
    let ring = RingTopology::new(&mut net, 8);
    for i in 0..8 {
        assert_eq!(ring.prev_node(ring.next_node(i)), i);
        assert_eq!(ring.next_node(ring.prev_node(i)), i);
    }
}

#[test]
fn send_to_next_delivers_one_packet() {
    let mut net = mesh_4x8();
    let mut ring = RingTopology::new(&mut net, 8);

    ring.send_to_next(0, b"hello node 1").unwrap();
    drop(ring);

    assert!(net.run_until_empty(100));
    assert_eq!(net.statistics().packets_delivered, 1);
}

#[test]
fn send_to_next_rejects_unknown_node() {
    let mut net = mesh_4x8();
    let mut ring = RingTopology::new(&mut net, 8);
    let err = ring.send_to_next(8, b"x").unwrap_err();
    assert_eq!(
        err,
        CollectiveError::InvalidNode {
            node: 8,
            num_nodes: 8
        }
    );
}

#[test]
fn all_reduce_sum_four_nodes() {
    let mut net = mesh_4x8();
    let mut ring = RingTopology::new(&mut net, 4);
    let result = ring
        .ring_all_reduce_simple(&[10, 20, 30, 40], ReduceOp::Sum)
        .unwrap();
    assert_eq!(result, 100);
}

#[test]
fn all_reduce_eight_nodes() {
    let mut net = mesh_4x8();
    let mut ring = RingTopology::new(&mut net, 8);
    let values = [0, 10, 20, 30, 40, 50, 60, 70];

    assert_eq!(
        ring.ring_all_reduce_simple(&values, ReduceOp::Sum).unwrap(),
        280
    );
    assert_eq!(
        ring.ring_all_reduce_simple(&values, ReduceOp::Max).unwrap(),
        70
    );
    assert_eq!(
        ring.ring_all_reduce_simple(&values, ReduceOp::Min).unwrap(),
        0
    );

    let stats = ring.statistics();
    assert_eq!(stats.num_nodes, 8);
    assert!(stats.total_messages >= 8);
    assert!(stats.avg_messages_per_node >= 1.0);
}

#[test]
fn all_reduce_prod() {
    let mut net = mesh_4x8();
    let mut ring = RingTopology::new(&mut net, 4);
    let result = ring
        .ring_all_reduce_simple(&[1, 2, 3, 4], ReduceOp::Prod)
        .unwrap();
    assert_eq!(result, 24);
}

#[test]
fn all_reduce_result_is_fold_order_independent() {
    // SUM/MAX/MIN/PROD are associative and commutative; shuffling the
    // contributions must not change the scalar.
    let mut net = mesh_4x8();
    let mut ring = RingTopology::new(&mut net, 4);
    let forward = ring
        .ring_all_reduce_simple(&[15, 42, 8, 23], ReduceOp::Max)
        .unwrap();
    let shuffled = ring
        .ring_all_reduce_simple(&[23, 8, 42, 15], ReduceOp::Max)
        .unwrap();
    assert_eq!(forward, 42);
    assert_eq!(forward, shuffled);
}

#[test]
fn all_reduce_rejects_wrong_value_count() {
    let mut net = mesh_4x8();
    let mut ring = RingTopology::new(&mut net, 4);
    let err = ring
        .ring_all_reduce_simple(&[1, 2, 3], ReduceOp::Sum)
        .unwrap_err();
    assert_eq!(
        err,
        CollectiveError::MismatchedInputs {
            expected: 4,
            actual: 3
        }
    );
}

#[test]
fn all_reduce_messages_show_up_in_network_counters() {
    let mut net = mesh_4x8();
    let mut ring = RingTopology::new(&mut net, 8);
    ring.ring_all_reduce_simple(&[1; 8], ReduceOp::Sum).unwrap();
    let messages = ring.statistics().total_messages;
    drop(ring);

    let net_stats = net.statistics();
    assert_eq!(net_stats.packets_injected, messages);
    assert_eq!(net_stats.packets_delivered, messages);
}

#[test]
fn single_node_ring_reduces_to_own_value() {
    let mut net = mesh_4x8();
    let mut ring = RingTopology::new(&mut net, 1);
    assert_eq!(
        ring.ring_all_reduce_simple(&[7], ReduceOp::Sum).unwrap(),
        7
    );
}
