//! Classical memory and register bits

use crate::error::{ExecutionError, Result};
use crate::rng::RngEngine;
use svsim_core::Op;

/// Classical bits written by measurements and read by conditional ops
///
/// Bit `i` of both the memory and the register is stored at position `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassicalRegister {
    memory: Vec<bool>,
    register: Vec<bool>,
}

fn write_bits(bits: &mut Vec<bool>, positions: &[usize], value: u64) {
    for (i, &pos) in positions.iter().enumerate() {
        if pos >= bits.len() {
            bits.resize(pos + 1, false);
        }
        bits[pos] = (value >> i) & 1 == 1;
    }
}

fn read_bits(bits: &[bool], positions: &[usize]) -> u64 {
    positions
        .iter()
        .enumerate()
        .filter(|(_, &pos)| bits.get(pos).copied().unwrap_or(false))
        .fold(0, |acc, (i, _)| acc | (1 << i))
}

fn hex_string(bits: &[bool]) -> String {
    let mut digits: Vec<char> = bits
        .chunks(4)
        .map(|nibble| {
            let value = nibble
                .iter()
                .enumerate()
                .fold(0u32, |acc, (i, &b)| acc | ((b as u32) << i));
            std::char::from_digit(value, 16).unwrap_or('0')
        })
        .collect();
    while digits.len() > 1 && digits.last() == Some(&'0') {
        digits.pop();
    }
    if digits.is_empty() {
        digits.push('0');
    }
    let mut out = String::from("0x");
    out.extend(digits.iter().rev());
    out
}

impl ClassicalRegister {
    pub fn new(num_memory: usize, num_registers: usize) -> Self {
        Self {
            memory: vec![false; num_memory],
            register: vec![false; num_registers],
        }
    }

    /// Clear all bits, resizing to the given widths
    pub fn initialize(&mut self, num_memory: usize, num_registers: usize) {
        self.memory = vec![false; num_memory];
        self.register = vec![false; num_registers];
    }

    pub fn memory_size(&self) -> usize {
        self.memory.len()
    }

    pub fn register_size(&self) -> usize {
        self.register.len()
    }

    /// Write bit `i` of `outcome` to `memory[i]` and `registers[i]`
    pub fn store_measure(&mut self, outcome: u64, memory: &[usize], registers: &[usize]) {
        write_bits(&mut self.memory, memory, outcome);
        write_bits(&mut self.register, registers, outcome);
    }

    pub fn memory_bit(&self, pos: usize) -> bool {
        self.memory.get(pos).copied().unwrap_or(false)
    }

    pub fn register_bit(&self, pos: usize) -> bool {
        self.register.get(pos).copied().unwrap_or(false)
    }

    /// Low 64 register bits as an integer
    pub fn register_value(&self) -> u64 {
        let positions: Vec<usize> = (0..self.register.len().min(64)).collect();
        read_bits(&self.register, &positions)
    }

    /// True if `op` has no condition or its condition bit is set
    pub fn check_conditional(&self, op: &Op) -> bool {
        op.conditional.map_or(true, |bit| self.register_bit(bit))
    }

    /// Evaluate a boolean function op and store its result
    pub fn apply_bfunc(&mut self, op: &Op) -> Result<()> {
        let func = op
            .bfunc
            .ok_or_else(|| ExecutionError::invalid_parameters(&op.name, "missing boolean function"))?;
        let &target = op
            .registers
            .first()
            .ok_or_else(|| ExecutionError::invalid_parameters(&op.name, "missing result register"))?;
        let value = func
            .relation
            .compare(self.register_value() & func.mask, func.target);
        write_bits(&mut self.register, &[target], value as u64);
        if let Some(&mem) = op.memory.first() {
            write_bits(&mut self.memory, &[mem], value as u64);
        }
        Ok(())
    }

    /// Resample the memory bits of a readout-error op
    ///
    /// `op.probs[m]` is the distribution of the recorded value given the
    /// currently stored value `m`.
    pub fn apply_roerror(&mut self, op: &Op, rng: &mut RngEngine) -> Result<()> {
        let stored = read_bits(&self.memory, &op.memory);
        let row = op.probs.get(stored as usize).ok_or_else(|| {
            ExecutionError::invalid_parameters(
                &op.name,
                format!("no probability row for memory value {}", stored),
            )
        })?;
        let sampled = rng.rand_int(row) as u64;
        write_bits(&mut self.memory, &op.memory, sampled);
        Ok(())
    }

    /// Memory as a hex string, e.g. `0x5`
    pub fn memory_hex(&self) -> String {
        hex_string(&self.memory)
    }

    /// Memory as a bit string with bit 0 last
    pub fn memory_bits(&self) -> String {
        self.memory
            .iter()
            .rev()
            .map(|&b| if b { '1' } else { '0' })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svsim_core::{BFunc, RegComparison};

    #[test]
    fn test_store_measure() {
        let mut creg = ClassicalRegister::new(4, 2);
        creg.store_measure(0b10, &[0, 3], &[1, 0]);
        assert!(!creg.memory_bit(0));
        assert!(creg.memory_bit(3));
        assert!(creg.register_bit(0));
        assert!(!creg.register_bit(1));
        assert_eq!(creg.memory_hex(), "0x8");
        assert_eq!(creg.memory_bits(), "1000");
    }

    #[test]
    fn test_memory_grows() {
        let mut creg = ClassicalRegister::default();
        creg.store_measure(1, &[5], &[]);
        assert_eq!(creg.memory_size(), 6);
        assert_eq!(creg.memory_hex(), "0x20");
        assert_eq!(ClassicalRegister::new(3, 0).memory_hex(), "0x0");
    }

    #[test]
    fn test_conditional() {
        let mut creg = ClassicalRegister::new(1, 1);
        let op = Op::gate("x", &[0], &[]).with_condition(0);
        assert!(!creg.check_conditional(&op));
        creg.store_measure(1, &[], &[0]);
        assert!(creg.check_conditional(&op));
        assert!(creg.check_conditional(&Op::gate("x", &[0], &[])));
    }

    #[test]
    fn test_bfunc() {
        let mut creg = ClassicalRegister::new(1, 4);
        creg.store_measure(0b11, &[], &[0, 1]);
        let func = BFunc {
            mask: 0b011,
            target: 0b011,
            relation: RegComparison::Equal,
        };
        creg.apply_bfunc(&Op::bfunc(func, 3, Some(0))).unwrap();
        assert!(creg.register_bit(3));
        assert!(creg.memory_bit(0));

        let func = BFunc {
            relation: RegComparison::Less,
            ..func
        };
        creg.apply_bfunc(&Op::bfunc(func, 2, None)).unwrap();
        assert!(!creg.register_bit(2));
    }

    #[test]
    fn test_roerror_certain_flip() {
        let mut creg = ClassicalRegister::new(1, 0);
        let mut rng = RngEngine::new(Some(0));
        let op = Op::roerror(&[0], vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        creg.apply_roerror(&op, &mut rng).unwrap();
        assert!(creg.memory_bit(0));
        creg.apply_roerror(&op, &mut rng).unwrap();
        assert!(!creg.memory_bit(0));
        let bad = Op::roerror(&[0], vec![]);
        assert!(creg.apply_roerror(&bad, &mut rng).is_err());
    }
}
