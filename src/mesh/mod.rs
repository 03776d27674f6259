pub mod config;
pub mod network;
pub mod packet;
pub mod router;

mod unit_tests;

pub use config::MeshConfig;
pub use network::{MeshNetwork, NetworkError, NetworkStats};
pub use packet::{Direction, DpuAddress, Packet, PacketId, RoutingAlgorithm};
pub use router::{Router, RouterPort, RouterStats};
