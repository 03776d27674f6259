use crate::mesh::packet::{Direction, DpuAddress, Packet, RoutingAlgorithm};
use crate::mesh::router::Router;

fn packet_to(dst_x: usize, dst_y: usize) -> Packet {
    Packet::new(
        DpuAddress::new(0, 0, 0),
        DpuAddress::new(dst_x, 0, dst_y),
        b"test".to_vec(),
    )
}

#[test]
fn new_router_is_idle() {
    let router = Router::new(0, 0, RoutingAlgorithm::XyRouting);
    assert_eq!(router.position(), (0, 0));
    assert!(router.is_idle());
    for dir in Direction::ALL {
        assert!(!router.input(dir).occupied());
        assert!(!router.output(dir).occupied());
    }
}

#[test]
fn bufferless_injection_blocks_on_occupied_output() {
    let mut router = Router::new(0, 0, RoutingAlgorithm::XyRouting);

    assert!(router.inject_packet(packet_to(1, 0)).is_ok());
    // Second packet wants the same EAST output and must be refused.
    let refused = router.inject_packet(packet_to(2, 0));
    assert!(refused.is_err());

    // A cycle clears the outputs; the port is free again.
    router.cycle();
    assert!(router.inject_packet(refused.unwrap_err()).is_ok());
}

#[test]
fn routes_received_packet_toward_destination() {
    let mut router = Router::new(1, 1, RoutingAlgorithm::XyRouting);
    let packet = packet_to(2, 2);

    router.receive_packet(packet, Direction::West).unwrap();
    router.cycle();

    // X is resolved first under XY routing.
    assert!(router.output(Direction::East).occupied());
    assert!(!router.input(Direction::West).occupied());
    assert_eq!(router.packets_routed(), 1);
}

#[test]
fn receive_refuses_occupied_input() {
    let mut router = Router::new(0, 0, RoutingAlgorithm::XyRouting);
    router
        .receive_packet(packet_to(1, 0), Direction::West)
        .unwrap();
    assert!(router
        .receive_packet(packet_to(2, 0), Direction::West)
        .is_err());
}

#[test]
fn chain_of_routers_carries_packet_across() {
    // (0,0) -> (1,0) -> (2,0), moving the packet by hand the way the
    // network transfer phase does.
    let mut r0 = Router::new(0, 0, RoutingAlgorithm::XyRouting);
    let mut r1 = Router::new(1, 0, RoutingAlgorithm::XyRouting);
    let mut r2 = Router::new(2, 0, RoutingAlgorithm::XyRouting);

    r0.receive_packet(packet_to(2, 0), Direction::Local).unwrap();

    r0.cycle();
    let packet = r0.take_output(Direction::East).expect("routed east");
    r1.receive_packet(packet, Direction::West).unwrap();

    r1.cycle();
    let packet = r1.take_output(Direction::East).expect("routed east");
    r2.receive_packet(packet, Direction::West).unwrap();

    r2.cycle();
    let packet = r2.output(Direction::Local).peek().expect("delivered");
    assert!(packet.hop_count >= 2);
}

#[test]
fn contended_output_blocks_exactly_one_input() {
    // Two packets at (1,1), one on WEST and one on SOUTH, both destined
    // (2,1): both want EAST. SOUTH precedes WEST in the arbitration order,
    // so the SOUTH packet wins.
    let mut router = Router::new(1, 1, RoutingAlgorithm::XyRouting);

    router
        .receive_packet(packet_to(2, 1), Direction::West)
        .unwrap();
    router
        .receive_packet(packet_to(2, 1), Direction::South)
        .unwrap();

    router.cycle();

    assert!(!router.input(Direction::South).occupied());
    assert!(router.input(Direction::West).occupied());
    assert!(router.output(Direction::East).occupied());
    assert!(router.packets_blocked() >= 1);
}

#[test]
fn blocked_packet_retries_next_cycle() {
    let mut router = Router::new(1, 1, RoutingAlgorithm::XyRouting);
    router
        .receive_packet(packet_to(2, 1), Direction::West)
        .unwrap();
    router
        .receive_packet(packet_to(2, 1), Direction::South)
        .unwrap();

    router.cycle();
    assert!(router.input(Direction::West).occupied());

    // The mesh would normally drain the EAST output between cycles;
    // emulate that, then the loser moves on the retry.
    router.take_output(Direction::East).unwrap();
    router.cycle();
    assert!(!router.input(Direction::West).occupied());
    assert!(router.output(Direction::East).occupied());
}

#[test]
fn stalled_output_drops_packet_in_clear_phase() {
    let mut router = Router::new(1, 1, RoutingAlgorithm::XyRouting);
    router.inject_packet(packet_to(2, 1)).unwrap();
    assert!(router.output(Direction::East).occupied());

    // Nothing drained the output; the clear phase discards it.
    router.cycle();
    assert!(!router.output(Direction::East).occupied());
}

#[test]
fn algorithm_selection_changes_first_turn() {
    let packet = packet_to(2, 2);

    let xy = Router::new(0, 0, RoutingAlgorithm::XyRouting);
    assert_eq!(xy.compute_next_hop(&packet), Direction::East);

    let yx = Router::new(0, 0, RoutingAlgorithm::YxRouting);
    assert_eq!(yx.compute_next_hop(&packet), Direction::North);

    let wf = Router::new(0, 0, RoutingAlgorithm::WestFirst);
    assert_eq!(wf.compute_next_hop(&packet), Direction::North);
}

#[test]
fn statistics_track_routed_packets() {
    let mut router = Router::new(0, 0, RoutingAlgorithm::XyRouting);
    for _ in 0..5 {
        router
            .receive_packet(packet_to(1, 0), Direction::Local)
            .unwrap();
        router.cycle();
    }

    let stats = router.statistics();
    assert_eq!(stats.packets_routed, 5);
    assert_eq!(stats.cycles, 5);
    assert!(stats.avg_hops >= 1.0);
}

#[test]
fn fini_clears_all_ports() {
    let mut router = Router::new(0, 0, RoutingAlgorithm::XyRouting);
    router
        .receive_packet(packet_to(1, 0), Direction::West)
        .unwrap();
    router.inject_packet(packet_to(1, 0)).unwrap();
    assert!(!router.is_idle());

    router.fini();
    assert!(router.is_idle());
}
