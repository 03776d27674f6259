use std::sync::Mutex;

use serde::Serialize;

use crate::Cycle;

#[derive(Debug, Clone, Serialize)]
pub struct CrossbarStats {
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub total_switches: u64,
    pub blocked_attempts: u64,
    pub cycles: Cycle,
    pub block_rate: f64,
    pub active_connections: usize,
}

#[derive(Debug)]
struct CrossbarState {
    /// Forward map: `inputs[i]` is the output claimed by input i.
    inputs: Vec<Option<usize>>,
    /// Reverse map, kept in lockstep: `outputs[j] = Some(i)` iff
    /// `inputs[i] = Some(j)`.
    outputs: Vec<Option<usize>>,
    total_switches: u64,
    blocked_attempts: u64,
    cycles: Cycle,
}

/// An N_in x N_out crossbar switching matrix. Any input may connect to any
/// free output; contention on an output is the only blocking condition. The
/// connection table is shared state and is guarded by a mutex, so all
/// methods take `&self`.
#[derive(Debug)]
pub struct CrossbarSwitch {
    num_inputs: usize,
    num_outputs: usize,
    state: Mutex<CrossbarState>,
}

impl CrossbarSwitch {
    pub fn new(num_inputs: usize, num_outputs: usize) -> Self {
        log::info!("crossbar switch: {}x{} matrix", num_inputs, num_outputs);
        Self {
            num_inputs,
            num_outputs,
            state: Mutex::new(CrossbarState {
                inputs: vec![None; num_inputs],
                outputs: vec![None; num_outputs],
                total_switches: 0,
                blocked_attempts: 0,
                cycles: 0,
            }),
        }
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Claim output `output` for input `input`. Fails and counts a blocked
    /// attempt when the output is already claimed by another input. If the
    /// input previously held a different output, that output is released
    /// first: latest write wins for the same input.
    pub fn connect(&self, input: usize, output: usize) -> bool {
        if input >= self.num_inputs || output >= self.num_outputs {
            return false;
        }
        let mut state = self.state.lock().expect("lock poisoned");

        if state.outputs[output].is_some() {
            state.blocked_attempts += 1;
            return false;
        }

        if let Some(previous) = state.inputs[input] {
            state.outputs[previous] = None;
        }

        state.inputs[input] = Some(output);
        state.outputs[output] = Some(input);
        state.total_switches += 1;
        true
    }

    /// Release whatever output `input` holds. Idempotent.
    pub fn disconnect(&self, input: usize) {
        if input >= self.num_inputs {
            return;
        }
        let mut state = self.state.lock().expect("lock poisoned");
        if let Some(output) = state.inputs[input].take() {
            state.outputs[output] = None;
        }
    }

    pub fn is_connected(&self, input: usize) -> bool {
        self.get_connection(input).is_some()
    }

    pub fn get_connection(&self, input: usize) -> Option<usize> {
        if input >= self.num_inputs {
            return None;
        }
        self.state.lock().expect("lock poisoned").inputs[input]
    }

    pub fn disconnect_all(&self) {
        let mut state = self.state.lock().expect("lock poisoned");
        state.inputs.fill(None);
        state.outputs.fill(None);
    }

    pub fn cycle(&self) {
        self.state.lock().expect("lock poisoned").cycles += 1;
    }

    pub fn statistics(&self) -> CrossbarStats {
        let state = self.state.lock().expect("lock poisoned");
        let attempts = state.total_switches + state.blocked_attempts;
        CrossbarStats {
            num_inputs: self.num_inputs,
            num_outputs: self.num_outputs,
            total_switches: state.total_switches,
            blocked_attempts: state.blocked_attempts,
            cycles: state.cycles,
            block_rate: if attempts > 0 {
                state.blocked_attempts as f64 / attempts as f64
            } else {
                0.0
            },
            active_connections: state.inputs.iter().filter(|c| c.is_some()).count(),
        }
    }
}
