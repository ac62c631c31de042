//! Amplitude addressing and dense storage for the svsim statevector simulator
//!
//! This crate maps gate qubit lists onto amplitude index blocks and drives
//! closures over those blocks, sequentially or on a rayon pool.
//!
//! # Layers
//!
//! - **Bit-index engine** ([`indexes`]): `BITS`/`MASKS` tables, `index0` and index blocks
//! - **Traversal** ([`lambda`]): apply and reduce closures over reduced index spaces
//! - **Storage** ([`QubitVector`]): the dense [`AmplitudeStore`] implementation
//!
//! # Example
//!
//! ```
//! use svsim_state::{indexes, AmplitudeStore, QubitVector};
//!
//! let block = indexes::indexes(&[1, 4], &[1, 4], 77);
//! assert_eq!(block.as_slice(), &[297, 299, 313, 315]);
//!
//! let mut qv = QubitVector::new(2);
//! qv.apply_mcx(&[0]);
//! qv.apply_mcx(&[0, 1]);
//! assert_eq!(qv.probability(3), 1.0);
//! ```

pub mod backend;
pub mod error;
pub mod indexes;
pub mod lambda;
pub mod pauli;
pub mod pool;
pub mod qubit_vector;
pub mod view;

pub use backend::{AmplitudeStore, Rotation};
pub use error::{Result, StateError};
pub use indexes::{IndexBlock, QubitList, BITS, MASKS};
pub use pauli::{Pauli, PauliMasks};
pub use qubit_vector::{hex_key, QubitVector};
pub use view::AmplitudeView;
