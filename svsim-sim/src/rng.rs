//! Random number source for measurement, noise and readout sampling

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seedable RNG owned by a simulator state
#[derive(Debug, Clone)]
pub struct RngEngine {
    rng: StdRng,
}

impl RngEngine {
    /// Seeded from `seed`, or from entropy when `None`
    pub fn new(seed: Option<u64>) -> Self {
        let rng = if let Some(seed) = seed {
            StdRng::seed_from_u64(seed)
        } else {
            StdRng::from_entropy()
        };
        Self { rng }
    }

    /// Restart the stream from `seed`
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Uniform deviate in `[0, 1)`
    pub fn rand(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Weighted choice of an index of `probs`
    ///
    /// Uses a cumulative search. A deviate at or past the final cumulative
    /// probability selects the last index.
    pub fn rand_int(&mut self, probs: &[f64]) -> usize {
        let r = self.rand();
        weighted_index(probs, r)
    }
}

/// Index selected by deviate `r` under a cumulative search over `probs`
pub fn weighted_index(probs: &[f64], r: f64) -> usize {
    let mut accum = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        accum += p;
        if r < accum {
            return i;
        }
    }
    let last = probs.len().saturating_sub(1);
    log::warn!(
        "deviate {} beyond cumulative probability {}; selecting outcome {}",
        r,
        accum,
        last
    );
    last
}
