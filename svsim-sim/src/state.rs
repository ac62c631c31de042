//! Statevector simulator state
//!
//! [`State`] owns the amplitude store, the classical register and the RNG,
//! and turns each [`Op`] into calls on the store. Every failure is reported
//! as an [`ExecutionError`] at the point of detection.

use crate::config::StateConfig;
use crate::creg::ClassicalRegister;
use crate::error::{ExecutionError, Result};
use crate::gateset::Gates;
use crate::result::{ExperimentResult, SaveValue};
use crate::rng::RngEngine;
use num_complex::Complex64;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use svsim_core::{matrix, Matrix, Op, OpType};
use svsim_state::indexes::{indexes, sorted};
use svsim_state::lambda::apply_lambda;
use svsim_state::{hex_key, AmplitudeStore, AmplitudeView, QubitVector, Rotation, StateError};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);

/// Result key that is replaced by the simulation method name
const METHOD_KEY: &str = "_method_";
const METHOD_NAME: &str = "statevector";

/// Simulator state over an amplitude store `Q`
#[derive(Debug)]
pub struct State<Q: AmplitudeStore = QubitVector> {
    qreg: Q,
    creg: ClassicalRegister,
    rng: RngEngine,
    config: StateConfig,
    global_phase: Option<Complex64>,
}

impl State<QubitVector> {
    /// Dense state of `num_qubits` qubits in `|0…0⟩`
    pub fn new(num_qubits: usize, config: StateConfig) -> Result<Self> {
        let mut qreg = QubitVector::new(num_qubits);
        qreg.set_sample_index_size(config.sample_measure_index_size);
        Self::with_store(qreg, config)
    }
}

impl<Q: AmplitudeStore> State<Q> {
    /// Wrap an existing store; its amplitudes are left untouched
    pub fn with_store(mut qreg: Q, config: StateConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|reason| ExecutionError::invalid_parameters("config", reason))?;
        qreg.set_threads(config.resolve_threads(qreg.num_qubits()));
        Ok(Self {
            qreg,
            creg: ClassicalRegister::default(),
            rng: RngEngine::new(config.seed),
            config,
            global_phase: None,
        })
    }

    /// Number of qubits in the quantum register
    pub fn num_qubits(&self) -> usize {
        self.qreg.num_qubits()
    }

    /// Amplitude store backing the quantum register
    pub fn qreg(&self) -> &Q {
        &self.qreg
    }

    /// Mutable access to the amplitude store; qubit indices are not checked
    pub fn qreg_mut(&mut self) -> &mut Q {
        &mut self.qreg
    }

    /// Classical memory and register bits
    pub fn creg(&self) -> &ClassicalRegister {
        &self.creg
    }

    /// Mutable access to the classical register
    pub fn creg_mut(&mut self) -> &mut ClassicalRegister {
        &mut self.creg
    }

    /// Configuration the state was built with
    pub fn config(&self) -> &StateConfig {
        &self.config
    }

    /// Reseed the sampling RNG
    pub fn set_seed(&mut self, seed: u64) {
        self.rng.set_seed(seed);
    }

    /// Reallocate to `num_qubits` qubits in `|0…0⟩` with the global phase applied
    pub fn initialize_qreg(&mut self, num_qubits: usize) -> Result<()> {
        self.qreg.set_num_qubits(num_qubits);
        self.qreg.set_threads(self.config.resolve_threads(num_qubits));
        self.qreg.initialize();
        self.apply_global_phase()
    }

    /// Clear the classical register to the given sizes
    pub fn initialize_creg(&mut self, num_memory: usize, num_registers: usize) {
        self.creg.initialize(num_memory, num_registers);
    }

    /// Global phase `e^{i·angle}` applied on every (re)initialization
    pub fn set_global_phase(&mut self, angle: f64) {
        self.global_phase = if angle.abs() < f64::EPSILON {
            None
        } else {
            Some(Complex64::from_polar(1.0, angle))
        };
    }

    fn apply_global_phase(&mut self) -> Result<()> {
        if let Some(phase) = self.global_phase {
            self.qreg.apply_diagonal_matrix(&[0], &[phase, phase])?;
        }
        Ok(())
    }

    fn validate_qubits(&self, qubits: &[usize]) -> Result<()> {
        let num_qubits = self.num_qubits();
        match qubits.iter().find(|&&q| q >= num_qubits) {
            Some(&index) => Err(StateError::InvalidQubitIndex { index, num_qubits }.into()),
            None => Ok(()),
        }
    }

    fn is_full_register(&self, qubits: &[usize]) -> bool {
        qubits.len() == self.num_qubits() && qubits.iter().enumerate().all(|(i, &q)| i == q)
    }

    //-------------------------------------------------------------------------
    // Operation dispatch
    //-------------------------------------------------------------------------

    /// Apply a sequence of ops; `final_ops` marks the last op of the circuit
    pub fn apply_ops(
        &mut self,
        ops: &[Op],
        result: &mut ExperimentResult,
        final_ops: bool,
    ) -> Result<()> {
        for (i, op) in ops.iter().enumerate() {
            self.apply_op(op, result, final_ops && i + 1 == ops.len())?;
        }
        Ok(())
    }

    /// Apply one op, writing any saved data into `result`
    pub fn apply_op(&mut self, op: &Op, result: &mut ExperimentResult, final_op: bool) -> Result<()> {
        if !self.creg.check_conditional(op) {
            log::trace!("skipping {}: condition not met", op);
            return Ok(());
        }
        log::trace!("applying {}", op);
        self.validate_qubits(&op.qubits)?;

        match op.op_type {
            OpType::Barrier | OpType::Nop => {}
            OpType::Reset => self.apply_reset(&op.qubits)?,
            OpType::Initialize => self.apply_initialize(&op.qubits, &op.params)?,
            OpType::Measure => self.apply_measure(&op.qubits, &op.memory, &op.registers)?,
            OpType::Bfunc => self.creg.apply_bfunc(op)?,
            OpType::Roerror => self.creg.apply_roerror(op, &mut self.rng)?,
            OpType::Gate => self.apply_gate(op)?,
            OpType::Matrix => {
                let mat = op
                    .mats
                    .first()
                    .ok_or_else(|| ExecutionError::invalid_parameters(&op.name, "missing matrix"))?;
                self.apply_matrix(&op.qubits, mat)?
            }
            OpType::DiagonalMatrix => self.apply_diagonal_matrix(&op.qubits, &op.params)?,
            OpType::Multiplexer => self.apply_multiplexer_op(op)?,
            OpType::Kraus => self.apply_kraus(&op.qubits, &op.mats)?,
            OpType::SetStatevec => self.set_statevector(&op.qubits, &op.params)?,
            OpType::SaveExpval | OpType::SaveExpvalVar => self.apply_save_expval(op, result)?,
            OpType::SaveDensmat => self.apply_save_density_matrix(op, result)?,
            OpType::SaveState | OpType::SaveStatevec => {
                self.apply_save_statevector(op, result, final_op)?
            }
            OpType::SaveStatevecDict => self.apply_save_statevector_dict(op, result)?,
            OpType::SaveProbs | OpType::SaveProbsKet => self.apply_save_probs(op, result)?,
            OpType::SaveAmps | OpType::SaveAmpsSq => self.apply_save_amplitudes(op, result)?,
        }
        Ok(())
    }

    /// Run `ops` for `shots` shots from `|0…0⟩`, collecting counts and saved data
    pub fn run_shots(&mut self, ops: &[Op], shots: usize) -> Result<ExperimentResult> {
        let num_qubits = self.num_qubits();
        let (num_memory, num_registers) = (self.creg.memory_size(), self.creg.register_size());
        let mut result = ExperimentResult::new();
        result.add_metadata("method", METHOD_NAME);
        for shot in 0..shots {
            self.initialize_qreg(num_qubits)?;
            self.initialize_creg(num_memory, num_registers);
            self.apply_ops(ops, &mut result, shot + 1 == shots)?;
            result.add_memory_count(&self.creg);
        }
        log::debug!("ran {} shots of {} ops on {} qubits", shots, ops.len(), num_qubits);
        Ok(result)
    }

    //-------------------------------------------------------------------------
    // Gates
    //-------------------------------------------------------------------------

    /// Apply a named gate from the supported gate set
    pub fn apply_gate(&mut self, op: &Op) -> Result<()> {
        let gate = Gates::from_name(&op.name).ok_or_else(|| ExecutionError::unsupported(&op.name))?;
        if op.qubits.len() < gate.min_qubits() {
            return Err(ExecutionError::invalid_parameters(
                &op.name,
                format!("requires at least {} qubits, got {}", gate.min_qubits(), op.qubits.len()),
            ));
        }
        let p = gate_params(op, gate)?;
        let qubits = op.qubits.as_slice();
        self.validate_qubits(qubits)?;

        match gate {
            Gates::Id => {}
            Gates::Mcx => self.qreg.apply_mcx(qubits),
            Gates::Mcy => self.qreg.apply_mcy(qubits),
            Gates::Mcz => self.qreg.apply_mcphase(qubits, -ONE),
            Gates::Mcr => self.qreg.apply_mcu(qubits, &matrix::r(p[0], p[1]))?,
            Gates::Mcrx => self.qreg.apply_rotation(qubits, Rotation::X, p[0])?,
            Gates::Mcry => self.qreg.apply_rotation(qubits, Rotation::Y, p[0])?,
            Gates::Mcrz => self.qreg.apply_rotation(qubits, Rotation::Z, p[0])?,
            Gates::Rxx => self.qreg.apply_rotation(qubits, Rotation::XX, p[0])?,
            Gates::Ryy => self.qreg.apply_rotation(qubits, Rotation::YY, p[0])?,
            Gates::Rzz => self.qreg.apply_rotation(qubits, Rotation::ZZ, p[0])?,
            Gates::Rzx => self.qreg.apply_rotation(qubits, Rotation::ZX, p[0])?,
            Gates::Ecr => self.apply_matrix(qubits, &matrix::ecr())?,
            Gates::Mcu => self.apply_gate_mcu(qubits, p[0], p[1], p[2], p[3])?,
            Gates::Mcu2 => self.apply_gate_mcu(qubits, FRAC_PI_2, p[0], p[1], 0.0)?,
            Gates::Mcu3 => self.apply_gate_mcu(qubits, p[0], p[1], p[2], 0.0)?,
            Gates::H => self.apply_gate_mcu(qubits, FRAC_PI_2, 0.0, PI, 0.0)?,
            Gates::Hs => self.apply_gate_mcu(qubits, FRAC_PI_2, FRAC_PI_2, PI, 0.0)?,
            Gates::SdgH => self.apply_gate_mcu(qubits, FRAC_PI_2, 0.0, FRAC_PI_2, 0.0)?,
            Gates::Mcswap => self.qreg.apply_mcswap(qubits),
            Gates::Mcsx => self.qreg.apply_mcu(qubits, &matrix::sx())?,
            Gates::Mcsxdg => self.qreg.apply_mcu(qubits, &matrix::sxdg())?,
            Gates::Mcp => self
                .qreg
                .apply_mcphase(qubits, Complex64::from_polar(1.0, p[0])),
            Gates::S => self.apply_gate_phase(qubits[0], Complex64::i())?,
            Gates::Sdg => self.apply_gate_phase(qubits[0], -Complex64::i())?,
            Gates::T => self.apply_gate_phase(qubits[0], Complex64::from_polar(1.0, FRAC_PI_4))?,
            Gates::Tdg => self.apply_gate_phase(qubits[0], Complex64::from_polar(1.0, -FRAC_PI_4))?,
            Gates::Pauli => {
                let pauli = op.string_params.first().ok_or_else(|| {
                    ExecutionError::invalid_parameters(&op.name, "missing Pauli string")
                })?;
                self.qreg.apply_pauli(qubits, pauli)?
            }
        }
        Ok(())
    }

    /// Multi-controlled `u4(θ, φ, λ, γ)` on the last listed qubit
    pub fn apply_gate_mcu(
        &mut self,
        qubits: &[usize],
        theta: f64,
        phi: f64,
        lambda: f64,
        gamma: f64,
    ) -> Result<()> {
        self.qreg
            .apply_mcu(qubits, &matrix::u4(theta, phi, lambda, gamma))?;
        Ok(())
    }

    /// Single-qubit phase gate as the diagonal `[1, phase]`
    pub fn apply_gate_phase(&mut self, qubit: usize, phase: Complex64) -> Result<()> {
        self.apply_diagonal_matrix(&[qubit], &[ONE, phase])
    }

    /// Dense unitary; diagonal matrices are routed to the diagonal kernel
    pub fn apply_matrix(&mut self, qubits: &[usize], mat: &Matrix) -> Result<()> {
        self.validate_qubits(qubits)?;
        let dim = 1usize << qubits.len();
        if mat.rows() != dim || mat.cols() != dim {
            let actual = if mat.rows() != dim { mat.rows() } else { mat.cols() };
            return Err(ExecutionError::dimension_mismatch("unitary", dim, actual));
        }
        if mat.is_diagonal(0.0) {
            log::debug!("diagonal matrix on {:?} routed to diagonal kernel", qubits);
            return self.apply_diagonal_matrix(qubits, &mat.diagonal());
        }
        self.qreg.apply_matrix(qubits, mat)?;
        Ok(())
    }

    /// Diagonal of length `2^|qubits|`
    pub fn apply_diagonal_matrix(&mut self, qubits: &[usize], diag: &[Complex64]) -> Result<()> {
        self.validate_qubits(qubits)?;
        let dim = 1usize << qubits.len();
        if diag.len() != dim {
            return Err(ExecutionError::dimension_mismatch("diagonal", dim, diag.len()));
        }
        self.qreg.apply_diagonal_matrix(qubits, diag)?;
        Ok(())
    }

    fn apply_multiplexer_op(&mut self, op: &Op) -> Result<()> {
        let [controls, targets] = op.regs.as_slice() else {
            return Err(ExecutionError::invalid_parameters(
                &op.name,
                "expected control and target qubit lists",
            ));
        };
        self.apply_multiplexer(controls, targets, &op.mats)
    }

    /// Apply `mats[c]` to `targets` when `controls` read `c`
    pub fn apply_multiplexer(
        &mut self,
        controls: &[usize],
        targets: &[usize],
        mats: &[Matrix],
    ) -> Result<()> {
        self.validate_qubits(controls)?;
        self.validate_qubits(targets)?;
        let blocks = 1usize << controls.len();
        if mats.len() != blocks {
            return Err(ExecutionError::dimension_mismatch("multiplexer", blocks, mats.len()));
        }
        let dim = 1usize << targets.len();
        if let Some(bad) = mats.iter().find(|m| m.rows() != dim || m.cols() != dim) {
            return Err(ExecutionError::dimension_mismatch("multiplexer", dim, bad.rows()));
        }
        let stacked = Matrix::stacked(mats)?;
        self.qreg.apply_multiplexer(controls, targets, &stacked)?;
        Ok(())
    }

    //-------------------------------------------------------------------------
    // Measurement, reset and initialization
    //-------------------------------------------------------------------------

    /// Outcome probabilities over `qubits`
    pub fn measure_probs(&self, qubits: &[usize]) -> Vec<f64> {
        self.qreg.probabilities(qubits)
    }

    /// Draw one outcome over `qubits` and return it with its probability
    pub fn sample_measure_with_prob(&mut self, qubits: &[usize]) -> (u64, f64) {
        let probs = self.measure_probs(qubits);
        let outcome = self.rng.rand_int(&probs);
        let prob = probs.get(outcome).copied().unwrap_or(0.0);
        log::trace!("sampled outcome {} on {:?} with p = {}", outcome, qubits, prob);
        (outcome as u64, prob)
    }

    /// Project onto `meas_state` and move it to `final_state`
    ///
    /// Measurement passes the same value for both; reset passes 0 as the
    /// final state.
    pub fn measure_reset_update(
        &mut self,
        qubits: &[usize],
        final_state: u64,
        meas_state: u64,
        meas_prob: f64,
    ) -> Result<()> {
        self.validate_qubits(qubits)?;
        let dim = 1usize << qubits.len();
        if let Some(&bad) = [final_state, meas_state].iter().find(|&&s| s >= dim as u64) {
            return Err(ExecutionError::invalid_parameters(
                "measure_reset_update",
                format!("basis state {} out of range for {} qubits", bad, qubits.len()),
            ));
        }
        let mut mdiag = vec![ZERO; dim];
        mdiag[meas_state as usize] = Complex64::new(1.0 / meas_prob.sqrt(), 0.0);
        self.qreg.apply_diagonal_matrix(qubits, &mdiag)?;

        if final_state == meas_state {
            return Ok(());
        }
        if qubits.len() == 1 {
            self.qreg.apply_mcx(qubits);
        } else {
            let (a, b) = (final_state as usize, meas_state as usize);
            let mut perm = Matrix::identity(dim);
            perm[(a, a)] = ZERO;
            perm[(b, b)] = ZERO;
            perm[(a, b)] = ONE;
            perm[(b, a)] = ONE;
            self.qreg.apply_matrix(qubits, &perm)?;
        }
        Ok(())
    }

    /// Measure `qubits`, collapse the state and record the outcome
    pub fn apply_measure(
        &mut self,
        qubits: &[usize],
        memory: &[usize],
        registers: &[usize],
    ) -> Result<()> {
        self.validate_qubits(qubits)?;
        let (outcome, prob) = self.sample_measure_with_prob(qubits);
        self.measure_reset_update(qubits, outcome, outcome, prob)?;
        self.creg.store_measure(outcome, memory, registers);
        Ok(())
    }

    /// Reset `qubits` to `|0⟩`
    pub fn apply_reset(&mut self, qubits: &[usize]) -> Result<()> {
        self.validate_qubits(qubits)?;
        let (outcome, prob) = self.sample_measure_with_prob(qubits);
        self.measure_reset_update(qubits, 0, outcome, prob)
    }

    /// Initialize `qubits` to `amplitudes`
    ///
    /// The global phase is folded into the amplitudes. The full register in
    /// order replaces the whole vector. Any other list is reset first and then
    /// tensored with the given amplitudes.
    pub fn apply_initialize(&mut self, qubits: &[usize], amplitudes: &[Complex64]) -> Result<()> {
        let dim = 1usize << qubits.len();
        if amplitudes.len() != dim {
            return Err(ExecutionError::dimension_mismatch("initialize", dim, amplitudes.len()));
        }
        self.validate_qubits(qubits)?;
        let phased: Vec<Complex64> = match self.global_phase {
            Some(phase) => amplitudes.iter().map(|a| a * phase).collect(),
            None => amplitudes.to_vec(),
        };
        if self.is_full_register(qubits) {
            self.qreg.initialize_from_vector(&phased)?;
            return Ok(());
        }
        self.apply_reset(qubits)?;
        self.qreg.initialize_component(qubits, &phased)?;
        Ok(())
    }

    /// Replace the full state vector
    pub fn set_statevector(&mut self, qubits: &[usize], amplitudes: &[Complex64]) -> Result<()> {
        let num_qubits = self.num_qubits();
        if qubits.len() != num_qubits {
            return Err(ExecutionError::dimension_mismatch(
                "set_statevector",
                num_qubits,
                qubits.len(),
            ));
        }
        let dim = 1usize << num_qubits;
        if amplitudes.len() != dim {
            return Err(ExecutionError::dimension_mismatch(
                "set_statevector",
                dim,
                amplitudes.len(),
            ));
        }
        self.qreg.initialize_from_vector(amplitudes)?;
        Ok(())
    }

    /// Sample `shots` outcomes over `qubits` without collapsing the state
    ///
    /// Entry `j` of each shot is the value of `qubits[j]`.
    pub fn sample_measure(&mut self, qubits: &[usize], shots: usize) -> Result<Vec<Vec<u8>>> {
        self.validate_qubits(qubits)?;
        let rnds: Vec<f64> = (0..shots).map(|_| self.rng.rand()).collect();
        let samples = self.qreg.sample_measure(&rnds);
        Ok(samples
            .into_iter()
            .map(|s| qubits.iter().map(|&q| ((s >> q) & 1) as u8).collect())
            .collect())
    }

    //-------------------------------------------------------------------------
    // Noise
    //-------------------------------------------------------------------------

    /// Apply exactly one branch of a Kraus channel
    ///
    /// One deviate `r` is drawn. Branch probabilities are accumulated for all
    /// but the last operator; the first branch whose running total exceeds
    /// `r` is applied, renormalized. Otherwise the last operator is applied,
    /// renormalized by the remaining probability.
    pub fn apply_kraus(&mut self, qubits: &[usize], kmats: &[Matrix]) -> Result<()> {
        let Some((last, rest)) = kmats.split_last() else {
            return Err(ExecutionError::InvalidNoiseModel {
                reason: "empty Kraus operator list".to_string(),
            });
        };
        self.validate_qubits(qubits)?;
        let dim = 1usize << qubits.len();
        if let Some(bad) = kmats.iter().find(|m| m.rows() != dim || m.cols() != dim) {
            return Err(ExecutionError::dimension_mismatch("kraus", dim, bad.rows()));
        }

        let r = self.rng.rand();
        let mut accum = 0.0;
        for (i, kmat) in rest.iter().enumerate() {
            let p = self.qreg.norm_with_matrix(qubits, kmat)?;
            accum += p;
            if accum > r {
                log::debug!("kraus branch {} selected on {:?} (p = {})", i, qubits, p);
                let scaled = kmat.scaled(Complex64::new(1.0 / p.sqrt(), 0.0));
                return self.apply_matrix(qubits, &scaled);
            }
        }
        log::debug!("kraus branch {} selected on {:?} (p = {})", rest.len(), qubits, 1.0 - accum);
        let scaled = last.scaled(Complex64::new(1.0 / (1.0 - accum).sqrt(), 0.0));
        self.apply_matrix(qubits, &scaled)
    }

    //-------------------------------------------------------------------------
    // Density extraction
    //-------------------------------------------------------------------------

    /// Reduced density matrix over `qubits`
    ///
    /// An empty list yields the 1x1 matrix holding the norm.
    pub fn density_matrix(&self, qubits: &[usize]) -> Result<Matrix> {
        self.validate_qubits(qubits)?;
        if qubits.is_empty() {
            let mut rho = Matrix::zeros(1, 1);
            rho[(0, 0)] = Complex64::new(self.qreg.norm(), 0.0);
            return Ok(rho);
        }
        let vec = self.qreg.copy_to_vector();
        if self.is_full_register(qubits) {
            return self.vec2density(&vec);
        }

        let dim = 1usize << qubits.len();
        let qubits_sorted = sorted(qubits);
        let end = (vec.len() as u64) >> qubits.len();
        let mut rho = Matrix::zeros(dim, dim);
        for k in 0..end {
            let inds = indexes(qubits, &qubits_sorted, k);
            for (row, &i) in inds.iter().enumerate() {
                let a = vec[i as usize];
                for (col, &j) in inds.iter().enumerate() {
                    rho[(row, col)] += a * vec[j as usize].conj();
                }
            }
        }
        Ok(rho)
    }

    /// Outer product `|v⟩⟨v|` of the full vector
    fn vec2density(&self, vec: &[Complex64]) -> Result<Matrix> {
        let dim = vec.len();
        let threads = if 2 * self.num_qubits() > self.config.parallel_qubit_threshold {
            self.qreg.threads()
        } else {
            1
        };
        let mut data = vec![ZERO; dim * dim];
        let view = AmplitudeView::new(&mut data);
        apply_lambda(0, (dim * dim) as u64, threads, |idx| {
            let (row, col) = (idx as usize / dim, idx as usize % dim);
            // SAFETY: each flat index is visited exactly once
            unsafe { view.set(idx, vec[row] * vec[col].conj()) };
        });
        Ok(Matrix::new(dim, dim, data)?)
    }

    //-------------------------------------------------------------------------
    // Save instructions
    //-------------------------------------------------------------------------

    fn save_key(op: &Op) -> Result<String> {
        match op.key() {
            Some(METHOD_KEY) => Ok(METHOD_NAME.to_string()),
            Some(key) => Ok(key.to_string()),
            None => Err(ExecutionError::invalid_parameters(&op.name, "missing result key")),
        }
    }

    fn check_full_register(&self, op: &Op) -> Result<()> {
        let num_qubits = self.num_qubits();
        if op.qubits.len() != num_qubits {
            return Err(ExecutionError::dimension_mismatch(
                op.name.clone(),
                num_qubits,
                op.qubits.len(),
            ));
        }
        Ok(())
    }

    fn apply_save_probs(&self, op: &Op, result: &mut ExperimentResult) -> Result<()> {
        let key = Self::save_key(op)?;
        let probs = self.measure_probs(&op.qubits);
        let value = if op.op_type == OpType::SaveProbsKet {
            let threshold = self.config.zero_threshold;
            SaveValue::RealMap(
                probs
                    .iter()
                    .enumerate()
                    .filter(|(_, &p)| p.abs() > threshold)
                    .map(|(i, &p)| (hex_key(i as u64), p))
                    .collect(),
            )
        } else {
            SaveValue::RealVector(probs)
        };
        result.save_data_average(&self.creg, &key, value, op.save_type)
    }

    fn apply_save_amplitudes(&self, op: &Op, result: &mut ExperimentResult) -> Result<()> {
        let key = Self::save_key(op)?;
        if op.int_params.is_empty() {
            return Err(ExecutionError::invalid_parameters(
                &op.name,
                "empty amplitude index list",
            ));
        }
        let size = 1u64 << self.num_qubits();
        if let Some(&bad) = op.int_params.iter().find(|&&i| i >= size) {
            return Err(ExecutionError::invalid_parameters(
                &op.name,
                format!("amplitude index {} out of range for {} amplitudes", bad, size),
            ));
        }
        if op.op_type == OpType::SaveAmpsSq {
            let probs = op.int_params.iter().map(|&i| self.qreg.probability(i)).collect();
            result.save_data_average(&self.creg, &key, SaveValue::RealVector(probs), op.save_type)
        } else {
            let amps = op.int_params.iter().map(|&i| self.qreg.amplitude(i)).collect();
            result.save_data_pershot(&self.creg, &key, SaveValue::ComplexVector(amps), op.save_type)
        }
    }

    fn apply_save_statevector(
        &mut self,
        op: &Op,
        result: &mut ExperimentResult,
        last_op: bool,
    ) -> Result<()> {
        self.check_full_register(op)?;
        let key = Self::save_key(op)?;
        let vec = if last_op {
            self.qreg.move_to_vector()
        } else {
            self.qreg.copy_to_vector()
        };
        result.save_data_pershot(&self.creg, &key, SaveValue::ComplexVector(vec), op.save_type)
    }

    fn apply_save_statevector_dict(&self, op: &Op, result: &mut ExperimentResult) -> Result<()> {
        self.check_full_register(op)?;
        let key = Self::save_key(op)?;
        let ket = self.qreg.vector_ket(self.config.zero_threshold);
        result.save_data_pershot(&self.creg, &key, SaveValue::ComplexMap(ket), op.save_type)
    }

    fn apply_save_density_matrix(&self, op: &Op, result: &mut ExperimentResult) -> Result<()> {
        let key = Self::save_key(op)?;
        let rho = self.density_matrix(&op.qubits)?;
        result.save_data_average(&self.creg, &key, SaveValue::Matrix(rho), op.save_type)
    }

    /// Expectation value `Σ coeff·⟨P⟩`, plus the variance for `save_expval_var`
    pub fn expval(&self, qubits: &[usize], op: &Op) -> Result<(f64, f64)> {
        let mut expval = 0.0;
        let mut sq_expval = 0.0;
        for term in &op.expval_params {
            let val = self.qreg.expval_pauli(qubits, &term.pauli)?;
            expval += term.coeff * val;
            sq_expval += term.sq_coeff * val;
        }
        Ok((expval, sq_expval - expval * expval))
    }

    fn apply_save_expval(&self, op: &Op, result: &mut ExperimentResult) -> Result<()> {
        let key = Self::save_key(op)?;
        if op.expval_params.is_empty() {
            return Err(ExecutionError::invalid_parameters(&op.name, "empty Pauli term list"));
        }
        let (expval, variance) = self.expval(&op.qubits, op)?;
        let value = if op.op_type == OpType::SaveExpvalVar {
            SaveValue::RealVector(vec![expval, variance])
        } else {
            SaveValue::Real(expval)
        };
        result.save_data_average(&self.creg, &key, value, op.save_type)
    }
}

/// Real gate parameters, checked against the count the gate needs
fn gate_params(op: &Op, gate: Gates) -> Result<[f64; 4]> {
    let needed = gate.num_params();
    if op.params.len() < needed {
        return Err(ExecutionError::invalid_parameters(
            &op.name,
            format!("expected {} parameters, got {}", needed, op.params.len()),
        ));
    }
    let mut params = [0.0; 4];
    for (slot, p) in params.iter_mut().zip(&op.params).take(needed) {
        *slot = p.re;
    }
    Ok(params)
}
