//! Named gate table
//!
//! The supported gate set is closed. Every accepted name maps to one [`Gates`]
//! variant through a table built on first use; anything else is rejected.

use ahash::AHashMap;
use std::sync::LazyLock;

/// Gate variants understood by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gates {
    Id,
    H,
    S,
    Sdg,
    T,
    Tdg,
    Mcx,
    Mcy,
    Mcz,
    Mcr,
    Mcrx,
    Mcry,
    Mcrz,
    Rxx,
    Ryy,
    Rzz,
    Rzx,
    Mcu,
    Mcu2,
    Mcu3,
    Mcswap,
    Mcsx,
    Mcsxdg,
    Mcp,
    Pauli,
    Ecr,
    /// Hadamard followed by S
    Hs,
    /// S-dagger followed by Hadamard
    SdgH,
}

impl Gates {
    /// Look up a gate by instruction name
    pub fn from_name(name: &str) -> Option<Self> {
        GATESET.get(name).copied()
    }

    /// Number of real parameters the gate reads from its op
    pub fn num_params(self) -> usize {
        match self {
            Gates::Mcp
            | Gates::Mcrx
            | Gates::Mcry
            | Gates::Mcrz
            | Gates::Rxx
            | Gates::Ryy
            | Gates::Rzz
            | Gates::Rzx => 1,
            Gates::Mcr | Gates::Mcu2 => 2,
            Gates::Mcu3 => 3,
            Gates::Mcu => 4,
            _ => 0,
        }
    }

    /// Minimum number of qubits the gate acts on
    pub fn min_qubits(self) -> usize {
        match self {
            Gates::Rxx | Gates::Ryy | Gates::Rzz | Gates::Rzx | Gates::Mcswap | Gates::Ecr => 2,
            Gates::Pauli => 0,
            _ => 1,
        }
    }
}

static GATESET: LazyLock<AHashMap<&'static str, Gates>> = LazyLock::new(|| {
    use Gates::*;
    let entries: [(&'static str, Gates); 65] = [
        // Identity
        ("delay", Id),
        ("id", Id),
        // Pauli and Clifford
        ("x", Mcx),
        ("y", Mcy),
        ("z", Mcz),
        ("h", H),
        ("s", S),
        ("sdg", Sdg),
        ("t", T),
        ("tdg", Tdg),
        ("sx", Mcsx),
        ("sxdg", Mcsxdg),
        ("H+S", Hs),
        ("SDG+H", SdgH),
        // Parametrized single-qubit
        ("r", Mcr),
        ("rx", Mcrx),
        ("ry", Mcry),
        ("rz", Mcrz),
        ("p", Mcp),
        ("u1", Mcp),
        ("u2", Mcu2),
        ("u3", Mcu3),
        ("u", Mcu3),
        ("U", Mcu3),
        // Two-qubit
        ("CX", Mcx),
        ("cx", Mcx),
        ("cy", Mcy),
        ("cz", Mcz),
        ("cp", Mcp),
        ("cu1", Mcp),
        ("cu2", Mcu2),
        ("cu3", Mcu3),
        ("cu", Mcu),
        ("csx", Mcsx),
        ("csxdg", Mcsxdg),
        ("crx", Mcrx),
        ("cry", Mcry),
        ("crz", Mcrz),
        ("swap", Mcswap),
        ("rxx", Rxx),
        ("ryy", Ryy),
        ("rzz", Rzz),
        ("rzx", Rzx),
        ("ecr", Ecr),
        // Three-qubit
        ("ccx", Mcx),
        ("ccz", Mcz),
        ("cswap", Mcswap),
        // Multi-controlled
        ("mcx", Mcx),
        ("mcx_gray", Mcx),
        ("mcy", Mcy),
        ("mcz", Mcz),
        ("mcr", Mcr),
        ("mcrx", Mcrx),
        ("mcry", Mcry),
        ("mcrz", Mcrz),
        ("mcp", Mcp),
        ("mcphase", Mcp),
        ("mcu1", Mcp),
        ("mcu2", Mcu2),
        ("mcu3", Mcu3),
        ("mcu", Mcu),
        ("mcswap", Mcswap),
        ("mcsx", Mcsx),
        ("mcsxdg", Mcsxdg),
        // Pauli string
        ("pauli", Pauli),
    ];
    entries.into_iter().collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(Gates::from_name("cx"), Some(Gates::Mcx));
        assert_eq!(Gates::from_name("CX"), Some(Gates::Mcx));
        assert_eq!(Gates::from_name("mcx_gray"), Some(Gates::Mcx));
        assert_eq!(Gates::from_name("SDG+H"), Some(Gates::SdgH));
        assert_eq!(Gates::from_name("delay"), Some(Gates::Id));
        assert_eq!(Gates::from_name("mcsxdg"), Some(Gates::Mcsxdg));
        assert_eq!(Gates::from_name("pauli"), Some(Gates::Pauli));
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(Gates::from_name("mosq"), None);
        assert_eq!(Gates::from_name("MOSQ_CR"), None);
        assert_eq!(Gates::from_name("Cx"), None);
        assert_eq!(Gates::from_name(""), None);
    }

    #[test]
    fn test_table_size() {
        assert_eq!(GATESET.len(), 65);
    }

    #[test]
    fn test_param_counts() {
        assert_eq!(Gates::Mcu.num_params(), 4);
        assert_eq!(Gates::Mcu3.num_params(), 3);
        assert_eq!(Gates::Mcr.num_params(), 2);
        assert_eq!(Gates::Mcp.num_params(), 1);
        assert_eq!(Gates::H.num_params(), 0);
        assert_eq!(Gates::Mcswap.min_qubits(), 2);
    }
}
