//! Readout (measurement assignment) errors
//!
//! Gantree: L3_Noise → ReadoutError
//!
//! A readout error on `k` qubits is a row-stochastic `2^k × 2^k` matrix:
//! row = true outcome, column = reported outcome.

use qlab_core::{limits, tolerance, Probability, QlabError, QlabResult};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classical assignment error for one or more measured qubits
/// Gantree: ReadoutError // 판독 오류
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReadoutErrorData")]
pub struct ReadoutError {
    /// Number of qubits covered
    num_qubits: usize,

    /// Row-major assignment probabilities `P(reported | true)`
    matrix: Vec<f64>,
}

/// Unchecked wire form of [`ReadoutError`]
#[derive(Deserialize)]
struct ReadoutErrorData {
    num_qubits: usize,
    matrix: Vec<f64>,
}

impl TryFrom<ReadoutErrorData> for ReadoutError {
    type Error = QlabError;

    fn try_from(raw: ReadoutErrorData) -> QlabResult<Self> {
        if raw.num_qubits == 0 || raw.num_qubits > limits::MAX_CHANNEL_QUBITS {
            return Err(QlabError::InvalidReadout(format!(
                "readout covers 1..={} qubits, got {}",
                limits::MAX_CHANNEL_QUBITS,
                raw.num_qubits
            )));
        }
        let dim = 1usize << raw.num_qubits;
        if raw.matrix.len() != dim * dim {
            return Err(QlabError::dimension(
                dim * dim,
                raw.matrix.len(),
                "readout matrix entries",
            ));
        }
        ReadoutError::from_matrix(raw.matrix.chunks(dim).map(<[f64]>::to_vec).collect())
    }
}

impl ReadoutError {
    /// Symmetric single-qubit flip with probability `p`
    /// Gantree: symmetric(p) -> Result<Self> // 대칭 판독 오류
    pub fn symmetric(p: f64) -> QlabResult<Self> {
        Self::asymmetric(p, p)
    }

    /// Single-qubit error with `p01 = P(read 1 | 0)` and `p10 = P(read 0 | 1)`
    pub fn asymmetric(p01: f64, p10: f64) -> QlabResult<Self> {
        let (p01, p10) = (Probability::new(p01)?, Probability::new(p10)?);
        Ok(Self {
            num_qubits: 1,
            matrix: vec![p01.complement(), p01.value(), p10.value(), p10.complement()],
        })
    }

    /// Build from explicit rows (correlated errors on `k` qubits)
    ///
    /// Outcome index bit `i` corresponds to the `i`-th qubit the error is
    /// attached to.
    /// Gantree: from_matrix(rows) -> Result<Self> // 행렬 생성
    pub fn from_matrix(rows: Vec<Vec<f64>>) -> QlabResult<Self> {
        let dim = rows.len();
        if dim < 2 || !dim.is_power_of_two() {
            return Err(QlabError::InvalidReadout(format!(
                "matrix dimension {} is not a power of two >= 2",
                dim
            )));
        }
        let num_qubits = dim.trailing_zeros() as usize;
        if num_qubits > limits::MAX_CHANNEL_QUBITS {
            return Err(QlabError::InvalidReadout(format!(
                "correlated readout on {} qubits exceeds {}",
                num_qubits,
                limits::MAX_CHANNEL_QUBITS
            )));
        }

        let mut matrix = Vec::with_capacity(dim * dim);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(QlabError::dimension(dim, row.len(), format!("readout row {}", i)));
            }
            if let Some(&bad) = row.iter().find(|p| !(0.0..=1.0).contains(*p)) {
                return Err(QlabError::InvalidProbability(bad));
            }
            let total: f64 = row.iter().sum();
            if (total - 1.0).abs() > tolerance::ROW_STOCHASTIC {
                return Err(QlabError::InvalidReadout(format!(
                    "row {} sums to {}",
                    i, total
                )));
            }
            matrix.extend(row);
        }

        Ok(Self { num_qubits, matrix })
    }

    /// Number of qubits covered
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Outcome space size `2^k`
    pub fn dim(&self) -> usize {
        1 << self.num_qubits
    }

    /// `P(reported | true)`
    pub fn probability(&self, true_outcome: usize, reported: usize) -> f64 {
        self.matrix[true_outcome * self.dim() + reported]
    }

    /// Assignment matrix rows
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.matrix.chunks(self.dim()).map(<[f64]>::to_vec).collect()
    }

    /// Check whether the matrix is the identity
    pub fn is_ideal(&self) -> bool {
        let dim = self.dim();
        (0..dim).all(|i| (self.probability(i, i) - 1.0).abs() <= tolerance::ROW_STOCHASTIC)
    }

    /// Sample the reported outcome for `true_outcome` (one uniform draw)
    /// Gantree: sample(&self, true_outcome, rng) -> Result<usize> // 판독 샘플링
    pub fn sample<R: Rng + ?Sized>(&self, true_outcome: usize, rng: &mut R) -> QlabResult<usize> {
        let dim = self.dim();
        if true_outcome >= dim {
            return Err(QlabError::dimension(dim, true_outcome, "readout true outcome"));
        }
        let row = &self.matrix[true_outcome * dim..(true_outcome + 1) * dim];
        let dist = WeightedIndex::new(row).map_err(|e| {
            QlabError::InternalError(format!("readout row {}: {}", true_outcome, e))
        })?;
        Ok(dist.sample(rng))
    }

    /// Apply to a full distribution over the covered qubits
    pub fn apply_to_distribution(&self, probs: &[f64]) -> QlabResult<Vec<f64>> {
        let dim = self.dim();
        if probs.len() != dim {
            return Err(QlabError::dimension(dim, probs.len(), "readout distribution"));
        }
        let mut out = vec![0.0; dim];
        for (t, &p) in probs.iter().enumerate() {
            for (r, slot) in out.iter_mut().enumerate() {
                *slot += p * self.probability(t, r);
            }
        }
        Ok(out)
    }
}

impl fmt::Display for ReadoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.num_qubits == 1 {
            write!(
                f,
                "ReadoutError(p01={:.4}, p10={:.4})",
                self.probability(0, 1),
                self.probability(1, 0)
            )
        } else {
            write!(f, "ReadoutError({}q correlated)", self.num_qubits)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_symmetric() {
        let err = ReadoutError::symmetric(0.1).unwrap();
        assert_eq!(err.num_qubits(), 1);
        assert_relative_eq!(err.probability(0, 1), 0.1);
        assert_relative_eq!(err.probability(1, 1), 0.9);
        assert!(!err.is_ideal());
        assert!(ReadoutError::symmetric(0.0).unwrap().is_ideal());
        assert!(ReadoutError::symmetric(1.5).is_err());
    }

    #[test]
    fn test_from_matrix_validation() {
        assert!(ReadoutError::from_matrix(vec![vec![1.0]]).is_err());
        assert!(ReadoutError::from_matrix(vec![vec![0.5, 0.4], vec![0.0, 1.0]]).is_err());
        assert!(ReadoutError::from_matrix(vec![vec![1.0, 0.0], vec![0.0]]).is_err());

        let rows = vec![
            vec![0.9, 0.05, 0.05, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.1, 0.9],
        ];
        let err = ReadoutError::from_matrix(rows.clone()).unwrap();
        assert_eq!(err.num_qubits(), 2);
        assert_eq!(err.rows(), rows);
    }

    #[test]
    fn test_sample_frequency() {
        let err = ReadoutError::asymmetric(0.0, 0.2).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let n = 10_000;
        let flips = (0..n).filter(|_| err.sample(1, &mut rng).unwrap() == 0).count();
        // 3σ = 0.012
        assert!((flips as f64 / n as f64 - 0.2).abs() < 0.012);
        assert!((0..100).all(|_| err.sample(0, &mut rng).unwrap() == 0));
        assert!(err.sample(2, &mut rng).is_err());
    }

    #[test]
    fn test_apply_to_distribution() {
        let err = ReadoutError::symmetric(0.25).unwrap();
        let out = err.apply_to_distribution(&[1.0, 0.0]).unwrap();
        assert_relative_eq!(out[0], 0.75);
        assert_relative_eq!(out[1], 0.25);
        assert!(err.apply_to_distribution(&[1.0]).is_err());
    }

    #[test]
    fn test_deserialize_rechecks_matrix() {
        let err = ReadoutError::asymmetric(0.02, 0.1).unwrap();
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(serde_json::from_str::<ReadoutError>(&json).unwrap(), err);

        for bad in [
            r#"{"num_qubits":1,"matrix":[]}"#,
            r#"{"num_qubits":1,"matrix":[0.5,0.4,0.0,1.0]}"#,
            r#"{"num_qubits":1,"matrix":[1.5,-0.5,0.0,1.0]}"#,
            r#"{"num_qubits":0,"matrix":[1.0]}"#,
            r#"{"num_qubits":99,"matrix":[]}"#,
        ] {
            assert!(serde_json::from_str::<ReadoutError>(bad).is_err(), "{}", bad);
        }
    }
}
