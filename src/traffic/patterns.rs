use crate::traffic::config::TrafficConfig;

/// Synthetic destination patterns for mesh traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficPattern {
    /// Destination drawn per request from a seeded hash of (source, index).
    Uniform { seed: u64 },
    /// Each node talks to its east neighbor, wrapping at the edge.
    Neighbor,
    /// (x, y) sends to (y, x), coordinates folded into the grid.
    Transpose,
    /// (x, y) sends to the mirrored corner (W-1-x, H-1-y).
    BitComplement,
    /// Everyone hammers one fixed node.
    Hotspot { x: usize, y: usize },
}

impl TrafficPattern {
    pub fn from_config(config: &TrafficConfig) -> TrafficPattern {
        match config.pattern.trim().to_ascii_lowercase().as_str() {
            "uniform" | "random" => TrafficPattern::Uniform { seed: config.seed },
            "neighbor" => TrafficPattern::Neighbor,
            "transpose" => TrafficPattern::Transpose,
            "bit_complement" | "complement" => TrafficPattern::BitComplement,
            "hotspot" => TrafficPattern::Hotspot {
                x: config.hotspot_x,
                y: config.hotspot_y,
            },
            other => panic!(
                "unsupported traffic pattern '{}' (expected uniform|neighbor|transpose|bit_complement|hotspot)",
                other
            ),
        }
    }

    /// Destination of request `req_idx` from `src` on a `dims.0` x `dims.1`
    /// mesh. Pure in all arguments, so a run replays identically.
    pub fn destination(
        &self,
        src: (usize, usize),
        req_idx: u32,
        dims: (usize, usize),
    ) -> (usize, usize) {
        let (width, height) = dims;
        match *self {
            TrafficPattern::Uniform { seed } => {
                let key = seed
                    ^ ((src.0 as u64) << 40)
                    ^ ((src.1 as u64) << 24)
                    ^ req_idx as u64;
                let sample = mix64(key) as usize % (width * height);
                (sample / height, sample % height)
            }
            TrafficPattern::Neighbor => ((src.0 + 1) % width, src.1),
            TrafficPattern::Transpose => (src.1 % width, src.0 % height),
            TrafficPattern::BitComplement => (width - 1 - src.0, height - 1 - src.1),
            TrafficPattern::Hotspot { x, y } => (x.min(width - 1), y.min(height - 1)),
        }
    }
}

fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destinations_stay_inside_the_grid() {
        let patterns = [
            TrafficPattern::Uniform { seed: 7 },
            TrafficPattern::Neighbor,
            TrafficPattern::Transpose,
            TrafficPattern::BitComplement,
            TrafficPattern::Hotspot { x: 3, y: 7 },
        ];
        for pattern in patterns {
            for x in 0..4 {
                for y in 0..8 {
                    for req in 0..16 {
                        let (dx, dy) = pattern.destination((x, y), req, (4, 8));
                        assert!(dx < 4 && dy < 8, "{:?} escaped the grid", pattern);
                    }
                }
            }
        }
    }

    #[test]
    fn uniform_is_deterministic_per_seed() {
        let a = TrafficPattern::Uniform { seed: 42 };
        let b = TrafficPattern::Uniform { seed: 42 };
        for req in 0..32 {
            assert_eq!(
                a.destination((1, 2), req, (4, 8)),
                b.destination((1, 2), req, (4, 8))
            );
        }
    }

    #[test]
    fn bit_complement_mirrors_corners() {
        let pattern = TrafficPattern::BitComplement;
        assert_eq!(pattern.destination((0, 0), 0, (4, 8)), (3, 7));
        assert_eq!(pattern.destination((3, 7), 0, (4, 8)), (0, 0));
    }
}
