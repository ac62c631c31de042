//! Simulator state configuration

use svsim_state::pool::available_threads;

/// Configuration for a [`State`](crate::State)
#[derive(Debug, Clone, PartialEq)]
pub struct StateConfig {
    /// Below this qubit count every kernel runs on the calling thread
    pub parallel_qubit_threshold: usize,

    /// Upper bound on worker threads (0 = all available cores)
    pub max_threads: usize,

    /// Magnitudes below this are dropped from ket-form outputs
    pub zero_threshold: f64,

    /// Qubits bucketed by the multi-shot sampler index
    pub sample_measure_index_size: usize,

    /// Seed for the simulator RNG (None = seeded from entropy)
    pub seed: Option<u64>,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            parallel_qubit_threshold: 14,
            max_threads: 0, // Auto-detect
            zero_threshold: 1e-10,
            sample_measure_index_size: 10,
            seed: None,
        }
    }
}

impl StateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything on the calling thread
    pub fn sequential() -> Self {
        Self {
            max_threads: 1,
            ..Default::default()
        }
    }

    /// Parallelize from small states upward
    pub fn parallel() -> Self {
        Self {
            parallel_qubit_threshold: 8,
            max_threads: 0,
            ..Default::default()
        }
    }

    /// Builder: set parallel threshold
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_qubit_threshold = threshold;
        self
    }

    /// Builder: set maximum thread count
    pub fn with_max_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads;
        self
    }

    /// Builder: set zero threshold
    pub fn with_zero_threshold(mut self, threshold: f64) -> Self {
        self.zero_threshold = threshold;
        self
    }

    /// Builder: set sampler index size
    pub fn with_sample_index_size(mut self, size: usize) -> Self {
        self.sample_measure_index_size = size;
        self
    }

    /// Builder: set RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Worker count for a state of `num_qubits` qubits
    pub fn resolve_threads(&self, num_qubits: usize) -> usize {
        if num_qubits < self.parallel_qubit_threshold {
            return 1;
        }
        let available = available_threads();
        if self.max_threads == 0 {
            available
        } else {
            self.max_threads.min(available).max(1)
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.zero_threshold >= 0.0 && self.zero_threshold < 1.0) {
            return Err("zero_threshold must be in [0.0, 1.0)".to_string());
        }

        if self.sample_measure_index_size == 0 || self.sample_measure_index_size > 30 {
            return Err("sample_measure_index_size must be between 1 and 30".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StateConfig::default();
        assert_eq!(config.parallel_qubit_threshold, 14);
        assert_eq!(config.max_threads, 0);
        assert_eq!(config.sample_measure_index_size, 10);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_threads() {
        let config = StateConfig::default().with_max_threads(2);
        assert_eq!(config.resolve_threads(4), 1);
        assert!(config.resolve_threads(20) <= 2);
        assert_eq!(StateConfig::sequential().resolve_threads(30), 1);
    }

    #[test]
    fn test_builders_and_validation() {
        let config = StateConfig::parallel().with_seed(7).with_zero_threshold(-1.0);
        assert_eq!(config.seed, Some(7));
        assert!(config.validate().is_err());
        assert!(StateConfig::new().with_sample_index_size(0).validate().is_err());
    }
}
