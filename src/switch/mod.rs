pub mod config;
pub mod crossbar;
pub mod inter_chip;
pub mod partition;

pub use config::SwitchConfig;
pub use crossbar::{CrossbarStats, CrossbarSwitch};
pub use inter_chip::{ChipTransfer, InterChipStats, InterChipSwitch, TransferId};
pub use partition::DqPinPartition;

use std::fmt;

/// Errors of the inter-chip switching fabric. All recoverable; statistics
/// keep being maintained across every error path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchError {
    /// DQ pin count is not a multiple of the channel count.
    NonDivisiblePartition { pins: usize, channels: usize },
    InvalidChip { chip: usize, num_chips: usize },
    InvalidChannel { channel: usize, num_channels: usize },
    /// The requested crossbar output is already claimed.
    CrossbarBlocked { src: usize, dst: usize },
    TransferNotFound { id: u64 },
}

impl fmt::Display for SwitchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NonDivisiblePartition { pins, channels } => write!(
                f,
                "{} DQ pins not evenly divisible into {} channels",
                pins, channels
            ),
            Self::InvalidChip { chip, num_chips } => {
                write!(f, "chip {} outside [0,{})", chip, num_chips)
            }
            Self::InvalidChannel {
                channel,
                num_channels,
            } => write!(f, "channel {} outside [0,{})", channel, num_channels),
            Self::CrossbarBlocked { src, dst } => {
                write!(f, "crossbar blocked: output {} busy (input {})", dst, src)
            }
            Self::TransferNotFound { id } => write!(f, "transfer {} not found", id),
        }
    }
}

impl std::error::Error for SwitchError {}
