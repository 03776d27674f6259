pub mod collective;
pub mod mesh;
pub mod sim;
pub mod switch;
pub mod traffic;
pub mod ui;
pub mod xfer;

// type to use for simulation time
pub type Cycle = u64;
