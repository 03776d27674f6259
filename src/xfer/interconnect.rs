use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use serde::Serialize;

use crate::mesh::DpuAddress;
use crate::xfer::{XferConfig, XferError};
use crate::Cycle;

/// A queued DPU-to-DPU transfer.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub src: DpuAddress,
    pub dst: DpuAddress,
    pub data: Vec<u8>,
    pub timestamp: Cycle,
}

#[derive(Debug, Clone, Serialize)]
pub struct XferStats {
    pub total_transfers: u64,
    pub total_bytes_transferred: u64,
    pub cycles: Cycle,
    pub avg_bytes_per_transfer: f64,
    pub bandwidth_utilization: f64,
}

#[derive(Debug, Default)]
struct XferState {
    shared: HashMap<DpuAddress, Vec<u8>>,
    /// One FIFO per channel, indexed by source channel id.
    queues: Vec<VecDeque<TransferRequest>>,
    total_transfers: u64,
    total_bytes: u64,
    cycles: Cycle,
}

/// Coarse-grained DPU-to-DPU communication: (channel, rank, dpu)-addressed
/// byte buffers shared across worker contexts, plus per-channel transfer
/// FIFOs draining a fixed number of entries per cycle. This abstraction
/// lives beside the mesh, not on top of it; tests that do not care about
/// routing use this path.
///
/// The buffer table is shared between concurrent writers and readers:
/// readers take the lock shared, mutators take it exclusively.
pub struct Interconnect {
    num_channels: usize,
    num_ranks: usize,
    num_dpus: usize,
    transfers_per_cycle: usize,
    state: RwLock<XferState>,
}

impl Interconnect {
    pub fn new(config: &XferConfig) -> Self {
        assert!(
            config.num_channels > 0 && config.num_ranks > 0 && config.num_dpus > 0,
            "interconnect dimensions must be > 0"
        );
        let queues = (0..config.num_channels).map(|_| VecDeque::new()).collect();
        Self {
            num_channels: config.num_channels,
            num_ranks: config.num_ranks,
            num_dpus: config.num_dpus,
            transfers_per_cycle: config.transfers_per_cycle.max(1),
            state: RwLock::new(XferState {
                shared: HashMap::new(),
                queues,
                ..XferState::default()
            }),
        }
    }

    fn validate(&self, addr: DpuAddress) -> Result<(), XferError> {
        if addr.channel >= self.num_channels
            || addr.rank >= self.num_ranks
            || addr.dpu >= self.num_dpus
        {
            return Err(XferError::InvalidCoordinate {
                channel: addr.channel,
                rank: addr.rank,
                dpu: addr.dpu,
            });
        }
        Ok(())
    }

    /// Replace the buffer under `addr` with a copy of `data`.
    pub fn write(&self, addr: DpuAddress, data: &[u8]) -> Result<(), XferError> {
        self.validate(addr)?;
        let mut state = self.state.write().expect("lock poisoned");
        state.shared.insert(addr, data.to_vec());
        state.total_transfers += 1;
        state.total_bytes += data.len() as u64;
        Ok(())
    }

    /// Copy out the buffer under `addr`.
    pub fn read(&self, addr: DpuAddress) -> Result<Vec<u8>, XferError> {
        self.validate(addr)?;
        let state = self.state.read().expect("lock poisoned");
        state
            .shared
            .get(&addr)
            .cloned()
            .ok_or(XferError::NoDataPresent {
                channel: addr.channel,
                rank: addr.rank,
                dpu: addr.dpu,
            })
    }

    /// Queue a transfer onto its source channel's FIFO. The transfer counts
    /// toward the totals when it retires in `cycle`, not here.
    pub fn transfer(&self, request: TransferRequest) -> Result<(), XferError> {
        self.validate(request.src)?;
        self.validate(request.dst)?;
        let mut state = self.state.write().expect("lock poisoned");
        let channel = request.src.channel;
        state.queues[channel].push_back(request);
        Ok(())
    }

    /// Retire up to `transfers_per_cycle` queued transfers per channel, in
    /// FIFO order within each channel.
    pub fn cycle(&self) {
        let mut state = self.state.write().expect("lock poisoned");
        for channel in 0..self.num_channels {
            for _ in 0..self.transfers_per_cycle {
                let Some(request) = state.queues[channel].pop_front() else {
                    break;
                };
                let bytes = request.data.len() as u64;
                state.shared.insert(request.dst, request.data);
                state.total_transfers += 1;
                state.total_bytes += bytes;
            }
        }
        state.cycles += 1;
    }

    /// Whether all channel FIFOs have drained.
    pub fn is_empty(&self) -> bool {
        let state = self.state.read().expect("lock poisoned");
        state.queues.iter().all(|q| q.is_empty())
    }

    /// Drop the buffer under one key.
    pub fn clear(&self, addr: DpuAddress) {
        let mut state = self.state.write().expect("lock poisoned");
        state.shared.remove(&addr);
    }

    pub fn statistics(&self) -> XferStats {
        let state = self.state.read().expect("lock poisoned");
        // One retired transfer per channel per cycle is the nominal rate.
        let capacity =
            state.cycles as f64 * (self.num_channels * self.transfers_per_cycle) as f64;
        XferStats {
            total_transfers: state.total_transfers,
            total_bytes_transferred: state.total_bytes,
            cycles: state.cycles,
            avg_bytes_per_transfer: if state.total_transfers > 0 {
                state.total_bytes as f64 / state.total_transfers as f64
            } else {
                0.0
            },
            bandwidth_utilization: if capacity > 0.0 {
                state.total_transfers as f64 / capacity
            } else {
                0.0
            },
        }
    }

    pub fn fini(&self) {
        let mut state = self.state.write().expect("lock poisoned");
        state.shared.clear();
        state.queues.clear();
    }
}
