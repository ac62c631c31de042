//! Result sink for save instructions and measurement counts

use crate::creg::ClassicalRegister;
use crate::error::{ExecutionError, Result};
use num_complex::Complex64;
use serde::Serialize;
use std::collections::BTreeMap;
use svsim_core::{Matrix, SaveType};

/// One saved value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SaveValue {
    Real(f64),
    RealVector(Vec<f64>),
    RealMap(BTreeMap<String, f64>),
    ComplexVector(Vec<Complex64>),
    ComplexMap(BTreeMap<String, Complex64>),
    Matrix(Matrix),
}

impl SaveValue {
    fn kind(&self) -> &'static str {
        match self {
            SaveValue::Real(_) => "real",
            SaveValue::RealVector(_) => "real vector",
            SaveValue::RealMap(_) => "real map",
            SaveValue::ComplexVector(_) => "complex vector",
            SaveValue::ComplexMap(_) => "complex map",
            SaveValue::Matrix(_) => "matrix",
        }
    }

    /// Elementwise `self += other`
    fn accumulate(&mut self, other: SaveValue, key: &str) -> Result<()> {
        let (lhs, rhs) = (self.kind(), other.kind());
        match (self, other) {
            (SaveValue::Real(a), SaveValue::Real(b)) => *a += b,
            (SaveValue::RealVector(a), SaveValue::RealVector(b)) if a.len() == b.len() => {
                a.iter_mut().zip(b).for_each(|(x, y)| *x += y)
            }
            (SaveValue::ComplexVector(a), SaveValue::ComplexVector(b)) if a.len() == b.len() => {
                a.iter_mut().zip(b).for_each(|(x, y)| *x += y)
            }
            (SaveValue::RealMap(a), SaveValue::RealMap(b)) => {
                for (k, v) in b {
                    *a.entry(k).or_insert(0.0) += v;
                }
            }
            (SaveValue::ComplexMap(a), SaveValue::ComplexMap(b)) => {
                for (k, v) in b {
                    *a.entry(k).or_default() += v;
                }
            }
            (SaveValue::Matrix(a), SaveValue::Matrix(b))
                if a.rows() == b.rows() && a.cols() == b.cols() =>
            {
                for r in 0..a.rows() {
                    for c in 0..a.cols() {
                        a[(r, c)] += b[(r, c)];
                    }
                }
            }
            _ => {
                return Err(ExecutionError::invalid_parameters(
                    key,
                    format!("cannot accumulate {} into {}", rhs, lhs),
                ))
            }
        }
        Ok(())
    }

    fn scaled(&self, factor: f64) -> SaveValue {
        match self {
            SaveValue::Real(x) => SaveValue::Real(x * factor),
            SaveValue::RealVector(v) => SaveValue::RealVector(v.iter().map(|x| x * factor).collect()),
            SaveValue::RealMap(m) => {
                SaveValue::RealMap(m.iter().map(|(k, v)| (k.clone(), v * factor)).collect())
            }
            SaveValue::ComplexVector(v) => {
                SaveValue::ComplexVector(v.iter().map(|x| x * factor).collect())
            }
            SaveValue::ComplexMap(m) => {
                SaveValue::ComplexMap(m.iter().map(|(k, v)| (k.clone(), v * factor)).collect())
            }
            SaveValue::Matrix(m) => SaveValue::Matrix(m.scaled(Complex64::new(factor, 0.0))),
        }
    }
}

/// Running average over shots
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Accumulator {
    sum: SaveValue,
    count: usize,
}

impl Accumulator {
    fn new(value: SaveValue) -> Self {
        Self { sum: value, count: 1 }
    }

    fn add(&mut self, value: SaveValue, key: &str) -> Result<()> {
        self.sum.accumulate(value, key)?;
        self.count += 1;
        Ok(())
    }

    /// Mean over the accumulated shots
    pub fn mean(&self) -> SaveValue {
        self.sum.scaled(1.0 / self.count as f64)
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// Data stored under one key
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SavedData {
    Single(SaveValue),
    Average(Accumulator),
    CAverage(BTreeMap<String, Accumulator>),
    List(Vec<SaveValue>),
    CList(BTreeMap<String, Vec<SaveValue>>),
}

/// Everything a circuit execution produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExperimentResult {
    /// Saved data by key
    pub data: BTreeMap<String, SavedData>,
    /// Measurement counts by memory hex string
    pub counts: BTreeMap<String, usize>,
    /// Free-form metadata such as the simulation method
    pub metadata: BTreeMap<String, String>,
}

impl ExperimentResult {
    pub fn new() -> Self {
        Self::default()
    }

    fn type_conflict(key: &str, save_type: SaveType) -> ExecutionError {
        ExecutionError::invalid_parameters(
            key,
            format!("key already holds data of a different kind than {:?}", save_type),
        )
    }

    /// Save a value that is averaged over shots
    ///
    /// `Single` keeps the latest value, `Average` sums across shots and
    /// `CAverage` does so separately for each classical memory value.
    /// List save types are rejected.
    pub fn save_data_average(
        &mut self,
        creg: &ClassicalRegister,
        key: &str,
        value: SaveValue,
        save_type: SaveType,
    ) -> Result<()> {
        match save_type {
            SaveType::Single => {
                self.data.insert(key.to_string(), SavedData::Single(value));
            }
            SaveType::Average => match self.data.get_mut(key) {
                None => {
                    self.data
                        .insert(key.to_string(), SavedData::Average(Accumulator::new(value)));
                }
                Some(SavedData::Average(acc)) => acc.add(value, key)?,
                Some(_) => return Err(Self::type_conflict(key, save_type)),
            },
            SaveType::CAverage => {
                let memory = creg.memory_hex();
                let entry = self
                    .data
                    .entry(key.to_string())
                    .or_insert_with(|| SavedData::CAverage(BTreeMap::new()));
                let SavedData::CAverage(map) = entry else {
                    return Err(Self::type_conflict(key, save_type));
                };
                match map.get_mut(&memory) {
                    Some(acc) => acc.add(value, key)?,
                    None => {
                        map.insert(memory, Accumulator::new(value));
                    }
                }
            }
            SaveType::List | SaveType::CList => {
                return Err(ExecutionError::invalid_parameters(
                    key,
                    format!("{:?} is not an averaging save type", save_type),
                ))
            }
        }
        Ok(())
    }

    /// Save a value recorded per shot
    ///
    /// `Single` keeps the latest value, `List` appends one entry per shot and
    /// `CList` does so separately for each classical memory value. Averaging
    /// save types are rejected.
    pub fn save_data_pershot(
        &mut self,
        creg: &ClassicalRegister,
        key: &str,
        value: SaveValue,
        save_type: SaveType,
    ) -> Result<()> {
        match save_type {
            SaveType::Single => {
                self.data.insert(key.to_string(), SavedData::Single(value));
            }
            SaveType::List => {
                let entry = self
                    .data
                    .entry(key.to_string())
                    .or_insert_with(|| SavedData::List(Vec::new()));
                let SavedData::List(list) = entry else {
                    return Err(Self::type_conflict(key, save_type));
                };
                list.push(value);
            }
            SaveType::CList => {
                let memory = creg.memory_hex();
                let entry = self
                    .data
                    .entry(key.to_string())
                    .or_insert_with(|| SavedData::CList(BTreeMap::new()));
                let SavedData::CList(map) = entry else {
                    return Err(Self::type_conflict(key, save_type));
                };
                map.entry(memory).or_default().push(value);
            }
            SaveType::Average | SaveType::CAverage => {
                return Err(ExecutionError::invalid_parameters(
                    key,
                    format!("{:?} is not a per-shot save type", save_type),
                ))
            }
        }
        Ok(())
    }

    /// Record the current memory value as one shot
    pub fn add_memory_count(&mut self, creg: &ClassicalRegister) {
        *self.counts.entry(creg.memory_hex()).or_insert(0) += 1;
    }

    pub fn add_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    /// Single or averaged value stored under `key`
    pub fn value(&self, key: &str) -> Option<SaveValue> {
        match self.data.get(key)? {
            SavedData::Single(v) => Some(v.clone()),
            SavedData::Average(acc) => Some(acc.mean()),
            _ => None,
        }
    }

    /// Averaged value stored under `key` for memory value `memory`
    pub fn conditional_value(&self, key: &str, memory: &str) -> Option<SaveValue> {
        match self.data.get(key)? {
            SavedData::CAverage(map) => map.get(memory).map(Accumulator::mean),
            _ => None,
        }
    }

    /// Per-shot values stored under `key`
    pub fn list(&self, key: &str) -> Option<&[SaveValue]> {
        match self.data.get(key)? {
            SavedData::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn total_shots(&self) -> usize {
        self.counts.values().sum()
    }

    /// Serialize the whole result as JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ExecutionError::invalid_parameters("result", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_average() {
        let creg = ClassicalRegister::new(1, 0);
        let mut result = ExperimentResult::new();
        for x in [1.0, 2.0, 6.0] {
            result
                .save_data_average(&creg, "e", SaveValue::Real(x), SaveType::Average)
                .unwrap();
        }
        match result.value("e") {
            Some(SaveValue::Real(x)) => assert_relative_eq!(x, 3.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_conditional_average() {
        let mut creg = ClassicalRegister::new(1, 0);
        let mut result = ExperimentResult::new();
        let probs = |p: f64| SaveValue::RealVector(vec![p, 1.0 - p]);
        result.save_data_average(&creg, "p", probs(1.0), SaveType::CAverage).unwrap();
        creg.store_measure(1, &[0], &[]);
        result.save_data_average(&creg, "p", probs(0.2), SaveType::CAverage).unwrap();
        result.save_data_average(&creg, "p", probs(0.4), SaveType::CAverage).unwrap();
        assert_eq!(result.conditional_value("p", "0x0"), Some(probs(1.0)));
        match result.conditional_value("p", "0x1") {
            Some(SaveValue::RealVector(v)) => assert_relative_eq!(v[0], 0.3, epsilon = 1e-12),
            other => panic!("unexpected {:?}", other),
        }
        assert!(result.value("p").is_none());
    }

    #[test]
    fn test_pershot_list() {
        let creg = ClassicalRegister::new(1, 0);
        let mut result = ExperimentResult::new();
        let amps = SaveValue::ComplexVector(vec![Complex64::new(1.0, 0.0)]);
        result.save_data_pershot(&creg, "a", amps.clone(), SaveType::List).unwrap();
        result.save_data_pershot(&creg, "a", amps.clone(), SaveType::List).unwrap();
        assert_eq!(result.list("a").map(|l| l.len()), Some(2));
        assert!(result
            .save_data_pershot(&creg, "a", amps.clone(), SaveType::Average)
            .is_err());
        assert!(result
            .save_data_average(&creg, "a", amps, SaveType::List)
            .is_err());
    }

    #[test]
    fn test_mismatched_accumulation() {
        let creg = ClassicalRegister::new(0, 0);
        let mut result = ExperimentResult::new();
        result
            .save_data_average(&creg, "x", SaveValue::RealVector(vec![1.0]), SaveType::Average)
            .unwrap();
        let err = result
            .save_data_average(&creg, "x", SaveValue::RealVector(vec![1.0, 2.0]), SaveType::Average)
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_parameters");
    }

    #[test]
    fn test_counts_and_json() {
        let mut creg = ClassicalRegister::new(2, 0);
        let mut result = ExperimentResult::new();
        result.add_memory_count(&creg);
        creg.store_measure(3, &[0, 1], &[]);
        result.add_memory_count(&creg);
        result.add_memory_count(&creg);
        assert_eq!(result.counts["0x3"], 2);
        assert_eq!(result.total_shots(), 3);
        result.add_metadata("method", "statevector");
        result
            .save_data_average(&creg, "m", SaveValue::Matrix(Matrix::identity(2)), SaveType::Single)
            .unwrap();
        let json = result.to_json().unwrap();
        assert!(json.contains("\"0x3\":2"));
        assert!(json.contains("statevector"));
    }
}
