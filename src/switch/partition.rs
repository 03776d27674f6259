use std::ops::Range;

use crate::switch::SwitchError;

/// Partition of the DQ (data) pins of a chip interface into equally wide
/// channels. Channel c owns the contiguous pins [c*T/C, (c+1)*T/C).
#[derive(Debug, Clone)]
pub struct DqPinPartition {
    total_pins: usize,
    num_channels: usize,
    pins_per_channel: usize,
}

impl DqPinPartition {
    pub fn new(total_pins: usize, num_channels: usize) -> Result<Self, SwitchError> {
        if num_channels == 0 || total_pins % num_channels != 0 {
            return Err(SwitchError::NonDivisiblePartition {
                pins: total_pins,
                channels: num_channels,
            });
        }
        let pins_per_channel = total_pins / num_channels;
        log::info!(
            "DQ pin partition: {} pins -> {} channels x {} pins",
            total_pins,
            num_channels,
            pins_per_channel
        );
        Ok(Self {
            total_pins,
            num_channels,
            pins_per_channel,
        })
    }

    pub fn total_pins(&self) -> usize {
        self.total_pins
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn pins_per_channel(&self) -> usize {
        self.pins_per_channel
    }

    /// The pin range owned by a channel.
    pub fn channel_pins(&self, channel: usize) -> Option<Range<usize>> {
        if channel >= self.num_channels {
            return None;
        }
        let start = channel * self.pins_per_channel;
        Some(start..start + self.pins_per_channel)
    }

    /// Per-channel bandwidth in bits per transfer beat.
    pub fn channel_bandwidth(&self) -> usize {
        self.pins_per_channel
    }
}
