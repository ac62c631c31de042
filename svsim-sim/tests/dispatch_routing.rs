use approx::assert_relative_eq;
use num_complex::Complex64;
use std::collections::BTreeMap;
use svsim_core::{matrix, Matrix, Op};
use svsim_sim::{ExperimentResult, State, StateConfig};
use svsim_state::{AmplitudeStore, QubitVector, Rotation};

/// Dense store that logs every mutating kernel it receives
#[derive(Debug)]
struct RecordingStore {
    inner: QubitVector,
    calls: Vec<&'static str>,
}

impl RecordingStore {
    fn new(num_qubits: usize) -> Self {
        Self {
            inner: QubitVector::new(num_qubits),
            calls: Vec::new(),
        }
    }
}

impl AmplitudeStore for RecordingStore {
    fn num_qubits(&self) -> usize {
        self.inner.num_qubits()
    }

    fn set_num_qubits(&mut self, num_qubits: usize) {
        self.inner.set_num_qubits(num_qubits)
    }

    fn set_threads(&mut self, threads: usize) {
        self.inner.set_threads(threads)
    }

    fn threads(&self) -> usize {
        self.inner.threads()
    }

    fn initialize(&mut self) {
        self.inner.initialize()
    }

    fn initialize_from_vector(&mut self, amplitudes: &[Complex64]) -> svsim_state::Result<()> {
        self.calls.push("initialize_from_vector");
        self.inner.initialize_from_vector(amplitudes)
    }

    fn initialize_component(
        &mut self,
        qubits: &[usize],
        state: &[Complex64],
    ) -> svsim_state::Result<()> {
        self.calls.push("initialize_component");
        self.inner.initialize_component(qubits, state)
    }

    fn apply_mcx(&mut self, qubits: &[usize]) {
        self.calls.push("apply_mcx");
        self.inner.apply_mcx(qubits)
    }

    fn apply_mcy(&mut self, qubits: &[usize]) {
        self.calls.push("apply_mcy");
        self.inner.apply_mcy(qubits)
    }

    fn apply_mcphase(&mut self, qubits: &[usize], phase: Complex64) {
        self.calls.push("apply_mcphase");
        self.inner.apply_mcphase(qubits, phase)
    }

    fn apply_mcswap(&mut self, qubits: &[usize]) {
        self.calls.push("apply_mcswap");
        self.inner.apply_mcswap(qubits)
    }

    fn apply_mcu(&mut self, qubits: &[usize], mat: &Matrix) -> svsim_state::Result<()> {
        self.calls.push("apply_mcu");
        self.inner.apply_mcu(qubits, mat)
    }

    fn apply_rotation(
        &mut self,
        qubits: &[usize],
        rotation: Rotation,
        theta: f64,
    ) -> svsim_state::Result<()> {
        self.calls.push("apply_rotation");
        self.inner.apply_rotation(qubits, rotation, theta)
    }

    fn apply_matrix(&mut self, qubits: &[usize], mat: &Matrix) -> svsim_state::Result<()> {
        self.calls.push("apply_matrix");
        self.inner.apply_matrix(qubits, mat)
    }

    fn apply_diagonal_matrix(
        &mut self,
        qubits: &[usize],
        diag: &[Complex64],
    ) -> svsim_state::Result<()> {
        self.calls.push("apply_diagonal_matrix");
        self.inner.apply_diagonal_matrix(qubits, diag)
    }

    fn apply_multiplexer(
        &mut self,
        controls: &[usize],
        targets: &[usize],
        stacked: &Matrix,
    ) -> svsim_state::Result<()> {
        self.calls.push("apply_multiplexer");
        self.inner.apply_multiplexer(controls, targets, stacked)
    }

    fn apply_pauli(&mut self, qubits: &[usize], pauli: &str) -> svsim_state::Result<()> {
        self.calls.push("apply_pauli");
        self.inner.apply_pauli(qubits, pauli)
    }

    fn probabilities(&self, qubits: &[usize]) -> Vec<f64> {
        self.inner.probabilities(qubits)
    }

    fn probability(&self, index: u64) -> f64 {
        self.inner.probability(index)
    }

    fn amplitude(&self, index: u64) -> Complex64 {
        self.inner.amplitude(index)
    }

    fn norm(&self) -> f64 {
        self.inner.norm()
    }

    fn norm_with_matrix(&self, qubits: &[usize], mat: &Matrix) -> svsim_state::Result<f64> {
        self.inner.norm_with_matrix(qubits, mat)
    }

    fn expval_pauli(&self, qubits: &[usize], pauli: &str) -> svsim_state::Result<f64> {
        self.inner.expval_pauli(qubits, pauli)
    }

    fn sample_measure(&self, rnds: &[f64]) -> Vec<u64> {
        self.inner.sample_measure(rnds)
    }

    fn copy_to_vector(&self) -> Vec<Complex64> {
        self.inner.copy_to_vector()
    }

    fn move_to_vector(&mut self) -> Vec<Complex64> {
        self.inner.move_to_vector()
    }

    fn vector_ket(&self, threshold: f64) -> BTreeMap<String, Complex64> {
        self.inner.vector_ket(threshold)
    }
}

fn recording_state(num_qubits: usize) -> State<RecordingStore> {
    let _ = env_logger::builder().is_test(true).try_init();
    State::with_store(
        RecordingStore::new(num_qubits),
        StateConfig::sequential().with_seed(99),
    )
    .unwrap()
}

fn run(st: &mut State<RecordingStore>, ops: &[Op]) {
    let mut result = ExperimentResult::new();
    st.apply_ops(ops, &mut result, false).unwrap();
}

fn take_calls(st: &mut State<RecordingStore>) -> Vec<&'static str> {
    std::mem::take(&mut st.qreg_mut().calls)
}

#[test]
fn test_diagonal_matrix_op_uses_diagonal_kernel() {
    let mut st = recording_state(2);
    run(&mut st, &[Op::gate("h", &[0], &[]), Op::gate("h", &[1], &[])]);
    take_calls(&mut st);

    let diag = Matrix::from_diagonal(&[
        Complex64::new(1.0, 0.0),
        Complex64::new(0.0, 1.0),
        Complex64::new(-1.0, 0.0),
        Complex64::new(0.0, -1.0),
    ]);
    run(&mut st, &[Op::matrix(&[0, 1], diag)]);
    assert_eq!(take_calls(&mut st), vec!["apply_diagonal_matrix"]);
    assert_relative_eq!(st.qreg().amplitude(1).im, 0.5, epsilon = 1e-12);

    run(&mut st, &[Op::matrix(&[0, 1], matrix::ecr())]);
    assert_eq!(take_calls(&mut st), vec!["apply_matrix"]);
}

#[test]
fn test_phase_gates_use_diagonal_kernel() {
    let mut st = recording_state(1);
    run(&mut st, &[Op::gate("t", &[0], &[]), Op::gate("sdg", &[0], &[])]);
    assert_eq!(
        take_calls(&mut st),
        vec!["apply_diagonal_matrix", "apply_diagonal_matrix"]
    );
}

#[test]
fn test_single_qubit_reset_flips_with_mcx() {
    let mut st = recording_state(2);
    run(&mut st, &[Op::gate("x", &[1], &[])]);
    take_calls(&mut st);

    run(&mut st, &[Op::reset(&[1])]);
    assert_eq!(take_calls(&mut st), vec!["apply_diagonal_matrix", "apply_mcx"]);
    assert_relative_eq!(st.qreg().probability(0), 1.0, epsilon = 1e-12);
}

#[test]
fn test_reset_of_zero_qubit_only_projects() {
    let mut st = recording_state(1);
    run(&mut st, &[Op::reset(&[0])]);
    assert_eq!(take_calls(&mut st), vec!["apply_diagonal_matrix"]);
}

#[test]
fn test_multi_qubit_reset_uses_permutation() {
    let mut st = recording_state(2);
    run(&mut st, &[Op::gate("x", &[0], &[]), Op::gate("x", &[1], &[])]);
    take_calls(&mut st);

    run(&mut st, &[Op::reset(&[0, 1])]);
    assert_eq!(take_calls(&mut st), vec!["apply_diagonal_matrix", "apply_matrix"]);
    assert_relative_eq!(st.qreg().probability(0), 1.0, epsilon = 1e-12);
}
