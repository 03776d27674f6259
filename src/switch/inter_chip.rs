use std::collections::HashMap;

use serde::Serialize;

use crate::switch::config::SwitchConfig;
use crate::switch::crossbar::CrossbarSwitch;
use crate::switch::partition::DqPinPartition;
use crate::switch::SwitchError;
use crate::Cycle;

pub type TransferId = u64;

/// A chip-to-chip transfer holding a crossbar connection from start to
/// completion.
#[derive(Debug, Clone)]
pub struct ChipTransfer {
    pub id: TransferId,
    pub src_chip: usize,
    pub dst_chip: usize,
    pub channel: usize,
    pub data: Vec<u8>,
    pub start_cycle: Cycle,
    pub end_cycle: Option<Cycle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterChipStats {
    pub num_chips: usize,
    pub dq_pins: usize,
    pub num_channels: usize,
    pub pins_per_channel: usize,
    pub total_transfers: u64,
    pub total_bytes: u64,
    pub active_transfers: usize,
    pub cycles: Cycle,
    pub crossbar_switches: u64,
    pub crossbar_blocks: u64,
    pub crossbar_block_rate: f64,
}

/// Inter-chip switching fabric: a DQ pin partition providing the channels
/// and an numChips x numChips crossbar providing the point-to-point paths.
pub struct InterChipSwitch {
    num_chips: usize,
    partition: DqPinPartition,
    crossbar: CrossbarSwitch,

    active: HashMap<TransferId, ChipTransfer>,
    next_transfer_id: TransferId,

    total_transfers: u64,
    total_bytes: u64,
    cycles: Cycle,
}

impl InterChipSwitch {
    pub fn new(
        num_chips: usize,
        total_dq_pins: usize,
        num_channels: usize,
    ) -> Result<Self, SwitchError> {
        let partition = DqPinPartition::new(total_dq_pins, num_channels)?;
        let crossbar = CrossbarSwitch::new(num_chips, num_chips);
        log::info!(
            "inter-chip switch initialized: {} chips, {} channels",
            num_chips,
            num_channels
        );
        Ok(Self {
            num_chips,
            partition,
            crossbar,
            active: HashMap::new(),
            next_transfer_id: 0,
            total_transfers: 0,
            total_bytes: 0,
            cycles: 0,
        })
    }

    pub fn from_config(config: &SwitchConfig) -> Result<Self, SwitchError> {
        Self::new(config.num_chips, config.dq_pins, config.num_channels)
    }

    pub fn num_chips(&self) -> usize {
        self.num_chips
    }

    pub fn partition(&self) -> &DqPinPartition {
        &self.partition
    }

    pub fn crossbar(&self) -> &CrossbarSwitch {
        &self.crossbar
    }

    fn check_chip(&self, chip: usize) -> Result<(), SwitchError> {
        if chip >= self.num_chips {
            return Err(SwitchError::InvalidChip {
                chip,
                num_chips: self.num_chips,
            });
        }
        Ok(())
    }

    /// Open a transfer from `src_chip` to `dst_chip` over `channel`. The
    /// crossbar connection is held until `complete_transfer`; a claimed
    /// destination surfaces as `CrossbarBlocked`.
    pub fn start_transfer(
        &mut self,
        src_chip: usize,
        dst_chip: usize,
        channel: usize,
        data: Vec<u8>,
    ) -> Result<TransferId, SwitchError> {
        self.check_chip(src_chip)?;
        self.check_chip(dst_chip)?;
        if channel >= self.partition.num_channels() {
            return Err(SwitchError::InvalidChannel {
                channel,
                num_channels: self.partition.num_channels(),
            });
        }

        if !self.crossbar.connect(src_chip, dst_chip) {
            return Err(SwitchError::CrossbarBlocked {
                src: src_chip,
                dst: dst_chip,
            });
        }

        let id = self.next_transfer_id;
        self.next_transfer_id += 1;
        let bytes = data.len() as u64;
        self.active.insert(
            id,
            ChipTransfer {
                id,
                src_chip,
                dst_chip,
                channel,
                data,
                start_cycle: self.cycles,
                end_cycle: None,
            },
        );
        self.total_transfers += 1;
        self.total_bytes += bytes;
        Ok(id)
    }

    /// Close a transfer: stamp its end cycle, release the crossbar path and
    /// drop it from the active table. Returns the finished record.
    pub fn complete_transfer(&mut self, id: TransferId) -> Result<ChipTransfer, SwitchError> {
        let mut transfer = self
            .active
            .remove(&id)
            .ok_or(SwitchError::TransferNotFound { id })?;
        transfer.end_cycle = Some(self.cycles);
        self.crossbar.disconnect(transfer.src_chip);
        Ok(transfer)
    }

    pub fn active_transfers(&self) -> usize {
        self.active.len()
    }

    pub fn cycle(&mut self) {
        self.crossbar.cycle();
        self.cycles += 1;
    }

    pub fn statistics(&self) -> InterChipStats {
        let crossbar = self.crossbar.statistics();
        InterChipStats {
            num_chips: self.num_chips,
            dq_pins: self.partition.total_pins(),
            num_channels: self.partition.num_channels(),
            pins_per_channel: self.partition.pins_per_channel(),
            total_transfers: self.total_transfers,
            total_bytes: self.total_bytes,
            active_transfers: self.active.len(),
            cycles: self.cycles,
            crossbar_switches: crossbar.total_switches,
            crossbar_blocks: crossbar.blocked_attempts,
            crossbar_block_rate: crossbar.block_rate,
        }
    }

    pub fn fini(&mut self) {
        self.active.clear();
        self.crossbar.disconnect_all();
    }
}
