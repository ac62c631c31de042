//! Statevector simulation for svsim
//!
//! This crate turns typed circuit operations into amplitude updates. It
//! dispatches named gates, measures and resets qubits, samples Kraus noise,
//! extracts reduced density matrices and collects saved data.
//!
//! # Features
//!
//! - **Closed gate set**: every supported gate name maps to one [`Gates`] variant
//! - **Measurement & reset**: projective collapse with exact weighted sampling
//! - **Kraus sampling**: exactly one branch applied per channel invocation
//! - **Save instructions**: probabilities, amplitudes, state vectors, density matrices, expectation values
//!
//! # Example
//!
//! ```
//! use svsim_core::Op;
//! use svsim_sim::{State, StateConfig};
//!
//! let mut state = State::new(2, StateConfig::default().with_seed(7)).unwrap();
//! state.initialize_creg(2, 2);
//! let ops = vec![
//!     Op::gate("h", &[0], &[]),
//!     Op::gate("cx", &[0, 1], &[]),
//!     Op::measure(&[0, 1], &[0, 1], &[0, 1]),
//! ];
//! let result = state.run_shots(&ops, 100).unwrap();
//! assert_eq!(result.total_shots(), 100);
//! assert!(result.counts.keys().all(|k| k == "0x0" || k == "0x3"));
//! ```

pub mod config;
pub mod creg;
pub mod error;
pub mod gateset;
pub mod result;
pub mod rng;
pub mod state;

pub use config::StateConfig;
pub use creg::ClassicalRegister;
pub use error::{ExecutionError, Result};
pub use gateset::Gates;
pub use result::{ExperimentResult, SaveValue, SavedData};
pub use rng::RngEngine;
pub use state::State;
