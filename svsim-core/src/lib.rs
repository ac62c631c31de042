//! Core types for the svsim statevector simulator
//!
//! This crate provides the records the simulator consumes:
//! - [`Op`]: a typed circuit operation (gate, measurement, noise, save instruction)
//! - [`Matrix`]: row-major dense complex matrix plus the standard gate matrices
//! - [`noise`]: Kraus channels that can be turned into `Op`s
//!
//! # Example
//! ```
//! use svsim_core::{Op, OpType};
//!
//! let op = Op::gate("cx", &[0, 1], &[]);
//! assert_eq!(op.op_type, OpType::Gate);
//! ```

pub mod error;
pub mod matrix;
pub mod noise;
pub mod operation;

pub use error::{CoreError, Result};
pub use matrix::Matrix;
pub use num_complex::Complex64;
pub use operation::{BFunc, ExpvalTerm, Op, OpType, Reg, RegComparison, SaveType};
