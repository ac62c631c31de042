//! Typed circuit operations consumed by the simulator state
//!
//! An [`Op`] is an immutable record built by the circuit executor. The state
//! layer reads it exactly once and never mutates it.

use crate::matrix::Matrix;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Ordered list of qubit (or classical bit) positions
pub type Reg = SmallVec<[usize; 4]>;

/// Category of an operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpType {
    Gate,
    Measure,
    Reset,
    Initialize,
    Barrier,
    Nop,
    Bfunc,
    Roerror,
    Matrix,
    DiagonalMatrix,
    Multiplexer,
    Kraus,
    SetStatevec,
    SaveExpval,
    SaveExpvalVar,
    SaveProbs,
    SaveProbsKet,
    SaveAmps,
    SaveAmpsSq,
    SaveState,
    SaveStatevec,
    SaveStatevecDict,
    SaveDensmat,
}

impl OpType {
    pub fn as_str(self) -> &'static str {
        match self {
            OpType::Gate => "gate",
            OpType::Measure => "measure",
            OpType::Reset => "reset",
            OpType::Initialize => "initialize",
            OpType::Barrier => "barrier",
            OpType::Nop => "nop",
            OpType::Bfunc => "bfunc",
            OpType::Roerror => "roerror",
            OpType::Matrix => "unitary",
            OpType::DiagonalMatrix => "diagonal",
            OpType::Multiplexer => "multiplexer",
            OpType::Kraus => "kraus",
            OpType::SetStatevec => "set_statevector",
            OpType::SaveExpval => "save_expval",
            OpType::SaveExpvalVar => "save_expval_var",
            OpType::SaveProbs => "save_probs",
            OpType::SaveProbsKet => "save_probs_ket",
            OpType::SaveAmps => "save_amplitudes",
            OpType::SaveAmpsSq => "save_amplitudes_sq",
            OpType::SaveState => "save_state",
            OpType::SaveStatevec => "save_statevector",
            OpType::SaveStatevecDict => "save_statevector_dict",
            OpType::SaveDensmat => "save_density_matrix",
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How saved data is accumulated across shots
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveType {
    /// Keep only the last value
    Single,
    /// Average over shots
    #[default]
    Average,
    /// Average over shots, separated by classical memory value
    CAverage,
    /// One entry per shot
    List,
    /// One entry per shot, separated by classical memory value
    CList,
}

/// Comparison used by a classical boolean function
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegComparison {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl RegComparison {
    pub fn compare(self, lhs: u64, rhs: u64) -> bool {
        match self {
            RegComparison::Equal => lhs == rhs,
            RegComparison::NotEqual => lhs != rhs,
            RegComparison::Less => lhs < rhs,
            RegComparison::LessEqual => lhs <= rhs,
            RegComparison::Greater => lhs > rhs,
            RegComparison::GreaterEqual => lhs >= rhs,
        }
    }
}

/// Boolean function over the classical register: `(register & mask) <relation> target`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BFunc {
    pub mask: u64,
    pub target: u64,
    pub relation: RegComparison,
}

/// One weighted Pauli term of an observable
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpvalTerm {
    /// Pauli string, big-endian over the op's qubits
    pub pauli: String,
    /// Coefficient for the expectation value
    pub coeff: f64,
    /// Coefficient for the squared-observable expectation
    pub sq_coeff: f64,
}

/// A single circuit operation
///
/// Only the fields relevant to `op_type` are populated; the rest stay empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Op {
    pub op_type: OpType,
    pub name: String,
    pub qubits: Reg,
    /// Grouped qubit lists (multiplexer: `[controls, targets]`)
    pub regs: Vec<Reg>,
    pub params: Vec<Complex64>,
    pub int_params: Vec<u64>,
    pub string_params: Vec<String>,
    pub mats: Vec<Matrix>,
    /// Readout-error probability table, one row per memory value
    pub probs: Vec<Vec<f64>>,
    /// Classical memory bits written by the op
    pub memory: Reg,
    /// Classical register bits written by the op
    pub registers: Reg,
    /// Register bit that must be 1 for the op to execute
    pub conditional: Option<usize>,
    pub bfunc: Option<BFunc>,
    pub expval_params: Vec<ExpvalTerm>,
    pub save_type: SaveType,
}

impl Op {
    fn base(op_type: OpType, name: impl Into<String>, qubits: &[usize]) -> Self {
        Self {
            op_type,
            name: name.into(),
            qubits: Reg::from_slice(qubits),
            regs: Vec::new(),
            params: Vec::new(),
            int_params: Vec::new(),
            string_params: Vec::new(),
            mats: Vec::new(),
            probs: Vec::new(),
            memory: Reg::new(),
            registers: Reg::new(),
            conditional: None,
            bfunc: None,
            expval_params: Vec::new(),
            save_type: SaveType::default(),
        }
    }

    /// Named gate with real parameters
    pub fn gate(name: impl Into<String>, qubits: &[usize], params: &[f64]) -> Self {
        let mut op = Self::base(OpType::Gate, name, qubits);
        op.params = params.iter().map(|&p| Complex64::new(p, 0.0)).collect();
        op
    }

    /// Pauli-string gate; `pauli[0]` acts on the last listed qubit
    pub fn pauli(qubits: &[usize], pauli: &str) -> Self {
        let mut op = Self::base(OpType::Gate, "pauli", qubits);
        op.string_params.push(pauli.to_string());
        op
    }

    /// Measurement of `qubits` into memory and register bits
    pub fn measure(qubits: &[usize], memory: &[usize], registers: &[usize]) -> Self {
        let mut op = Self::base(OpType::Measure, "measure", qubits);
        op.memory = Reg::from_slice(memory);
        op.registers = Reg::from_slice(registers);
        op
    }

    pub fn reset(qubits: &[usize]) -> Self {
        Self::base(OpType::Reset, "reset", qubits)
    }

    /// Initialize `qubits` to the given amplitudes
    pub fn initialize(qubits: &[usize], amplitudes: Vec<Complex64>) -> Self {
        let mut op = Self::base(OpType::Initialize, "initialize", qubits);
        op.params = amplitudes;
        op
    }

    /// Replace the full state vector
    pub fn set_statevector(qubits: &[usize], amplitudes: Vec<Complex64>) -> Self {
        let mut op = Self::base(OpType::SetStatevec, "set_statevector", qubits);
        op.params = amplitudes;
        op
    }

    /// Dense unitary on `qubits`
    pub fn matrix(qubits: &[usize], mat: Matrix) -> Self {
        let mut op = Self::base(OpType::Matrix, "unitary", qubits);
        op.mats.push(mat);
        op
    }

    /// Diagonal unitary on `qubits`
    pub fn diagonal(qubits: &[usize], diag: Vec<Complex64>) -> Self {
        let mut op = Self::base(OpType::DiagonalMatrix, "diagonal", qubits);
        op.params = diag;
        op
    }

    /// Uniformly controlled unitary: `mats[c]` is applied to `targets` when the
    /// controls read `c`
    pub fn multiplexer(controls: &[usize], targets: &[usize], mats: Vec<Matrix>) -> Self {
        let qubits: Vec<usize> = targets.iter().chain(controls).copied().collect();
        let mut op = Self::base(OpType::Multiplexer, "multiplexer", &qubits);
        op.regs = vec![Reg::from_slice(controls), Reg::from_slice(targets)];
        op.mats = mats;
        op
    }

    /// Kraus channel on `qubits`
    pub fn kraus(qubits: &[usize], mats: Vec<Matrix>) -> Self {
        let mut op = Self::base(OpType::Kraus, "kraus", qubits);
        op.mats = mats;
        op
    }

    /// Boolean function writing its result to register bit `register`
    /// (and memory bit `memory`, if given)
    pub fn bfunc(func: BFunc, register: usize, memory: Option<usize>) -> Self {
        let mut op = Self::base(OpType::Bfunc, "bfunc", &[]);
        op.bfunc = Some(func);
        op.registers.push(register);
        op.memory.extend(memory);
        op
    }

    /// Readout error on memory bits; `probs[m]` is the outcome distribution
    /// given stored value `m`
    pub fn roerror(memory: &[usize], probs: Vec<Vec<f64>>) -> Self {
        let mut op = Self::base(OpType::Roerror, "roerror", &[]);
        op.memory = Reg::from_slice(memory);
        op.probs = probs;
        op
    }

    /// Save outcome probabilities, as a vector or as a ket map
    pub fn save_probs(qubits: &[usize], key: &str, ket: bool) -> Self {
        let op_type = if ket { OpType::SaveProbsKet } else { OpType::SaveProbs };
        Self::base(op_type, op_type.as_str(), qubits).with_key(key)
    }

    /// Save amplitudes (or their squared magnitudes) at basis indices
    pub fn save_amplitudes(qubits: &[usize], key: &str, indices: &[u64], squared: bool) -> Self {
        let op_type = if squared { OpType::SaveAmpsSq } else { OpType::SaveAmps };
        let mut op = Self::base(op_type, op_type.as_str(), qubits).with_key(key);
        op.int_params = indices.to_vec();
        if !squared {
            op.save_type = SaveType::Single;
        }
        op
    }

    /// Save the full state vector
    pub fn save_statevector(qubits: &[usize], key: &str) -> Self {
        Self::base(OpType::SaveStatevec, "save_statevector", qubits)
            .with_key(key)
            .with_save_type(SaveType::Single)
    }

    /// Save the full state vector as a ket map
    pub fn save_statevector_dict(qubits: &[usize], key: &str) -> Self {
        Self::base(OpType::SaveStatevecDict, "save_statevector_dict", qubits)
            .with_key(key)
            .with_save_type(SaveType::Single)
    }

    /// Save the reduced density matrix over `qubits`
    pub fn save_density_matrix(qubits: &[usize], key: &str) -> Self {
        Self::base(OpType::SaveDensmat, "save_density_matrix", qubits).with_key(key)
    }

    /// Save the expectation value (and optionally variance) of a Pauli observable
    pub fn save_expval(qubits: &[usize], key: &str, terms: Vec<ExpvalTerm>, variance: bool) -> Self {
        let op_type = if variance { OpType::SaveExpvalVar } else { OpType::SaveExpval };
        let mut op = Self::base(op_type, op_type.as_str(), qubits).with_key(key);
        op.expval_params = terms;
        op
    }

    /// Execute only when register bit `bit` is set
    pub fn with_condition(mut self, bit: usize) -> Self {
        self.conditional = Some(bit);
        self
    }

    pub fn with_save_type(mut self, save_type: SaveType) -> Self {
        self.save_type = save_type;
        self
    }

    /// Set complex parameters, replacing any existing ones
    pub fn with_params(mut self, params: Vec<Complex64>) -> Self {
        self.params = params;
        self
    }

    fn with_key(mut self, key: &str) -> Self {
        self.string_params = vec![key.to_string()];
        self
    }

    /// Result key for save instructions
    pub fn key(&self) -> Option<&str> {
        self.string_params.first().map(String::as_str)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, q) in self.qubits.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "q{}", q)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_params_are_real() {
        let op = Op::gate("rx", &[0], &[0.5]);
        assert_eq!(op.op_type, OpType::Gate);
        assert_eq!(op.params.as_slice(), &[Complex64::new(0.5, 0.0)]);
    }

    #[test]
    fn test_multiplexer_layout() {
        let op = Op::multiplexer(&[2, 3], &[0], vec![Matrix::identity(2); 4]);
        assert_eq!(op.qubits.as_slice(), &[0, 2, 3]);
        assert_eq!(op.regs[0].as_slice(), &[2, 3]);
        assert_eq!(op.regs[1].as_slice(), &[0]);
    }

    #[test]
    fn test_save_ops_carry_key() {
        let op = Op::save_probs(&[0, 1], "probs", true);
        assert_eq!(op.op_type, OpType::SaveProbsKet);
        assert_eq!(op.key(), Some("probs"));
    }

    #[test]
    fn test_conditional_builder() {
        let op = Op::gate("x", &[1], &[]).with_condition(3);
        assert_eq!(op.conditional, Some(3));
    }

    #[test]
    fn test_comparison() {
        assert!(RegComparison::Equal.compare(3, 3));
        assert!(RegComparison::Less.compare(2, 3));
        assert!(!RegComparison::Greater.compare(2, 3));
        assert!(RegComparison::GreaterEqual.compare(3, 3));
    }

    #[test]
    fn test_display() {
        assert_eq!(Op::gate("cx", &[0, 1], &[]).to_string(), "cx(q0, q1)");
    }
}
