//! Dense statevector
//!
//! Gantree: L2_State → StateVector
//!
//! `2^n` complex amplitudes; qubit `q` is bit `q` of the basis index.

use crate::density_matrix::DensityMatrix;
use crate::gates::gate_unitary;
use crate::kernel::{self, check_qubits};
use crate::operator::Operator;
use num_complex::Complex64;
use qlab_core::{limits, tolerance, Gate, QlabError, QlabResult, QubitId};
use serde::{Deserialize, Serialize};

/// Pure quantum state
/// Gantree: StateVector // 상태 벡터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    num_qubits: usize,
    amplitudes: Vec<Complex64>,
}

impl StateVector {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create |0...0⟩
    /// Gantree: new(n) -> Result<Self> // 초기 상태
    pub fn new(num_qubits: usize) -> QlabResult<Self> {
        Self::basis_state(num_qubits, 0)
    }

    /// Create the computational basis state `|index⟩`
    pub fn basis_state(num_qubits: usize, index: usize) -> QlabResult<Self> {
        check_size(num_qubits)?;
        let dim = 1usize << num_qubits;
        if index >= dim {
            return Err(QlabError::dimension(dim, index, "basis state index"));
        }
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); dim];
        amplitudes[index] = Complex64::new(1.0, 0.0);
        Ok(Self {
            num_qubits,
            amplitudes,
        })
    }

    /// Create from explicit amplitudes (length `2^n`, unit norm)
    pub fn from_amplitudes(amplitudes: Vec<Complex64>) -> QlabResult<Self> {
        let dim = amplitudes.len();
        if !dim.is_power_of_two() {
            return Err(QlabError::dimension(
                dim.next_power_of_two(),
                dim,
                "statevector length",
            ));
        }
        let num_qubits = dim.trailing_zeros() as usize;
        check_size(num_qubits)?;
        let state = Self {
            num_qubits,
            amplitudes,
        };
        let total = state.norm_squared();
        if (total - 1.0).abs() > tolerance::NORMALIZATION {
            return Err(QlabError::Normalization {
                total,
                tolerance: tolerance::NORMALIZATION,
            });
        }
        Ok(state)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of qubits
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Hilbert space dimension
    #[inline]
    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    /// Amplitudes in basis-index order
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Amplitude of basis state `index`
    pub fn amplitude(&self, index: usize) -> Option<Complex64> {
        self.amplitudes.get(index).copied()
    }

    /// Squared norm `Σ|a|²`
    pub fn norm_squared(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum()
    }

    // ========================================================================
    // Evolution
    // ========================================================================

    /// Apply a gate
    /// Gantree: apply_gate(&mut, gate) -> Result // 게이트 적용
    pub fn apply_gate(&mut self, gate: &Gate) -> QlabResult<()> {
        gate.validate(self.num_qubits)?;
        let action = gate_unitary(gate);
        kernel::apply_operator(
            &mut self.amplitudes,
            self.num_qubits,
            &action.op,
            &action.targets,
            &action.controls,
        );
        Ok(())
    }

    /// Apply an arbitrary operator on `targets` (not necessarily unitary)
    pub fn apply_operator(
        &mut self,
        op: &Operator,
        targets: &[QubitId],
        controls: &[QubitId],
    ) -> QlabResult<()> {
        if op.num_qubits() != targets.len() {
            return Err(QlabError::dimension(
                targets.len(),
                op.num_qubits(),
                "operator arity",
            ));
        }
        let all: Vec<QubitId> = targets.iter().chain(controls).copied().collect();
        check_qubits(&all, self.num_qubits)?;
        kernel::apply_operator(&mut self.amplitudes, self.num_qubits, op, targets, controls);
        Ok(())
    }

    /// Rescale to unit norm
    pub fn normalize(&mut self) -> QlabResult<()> {
        let norm = self.norm_squared().sqrt();
        if norm <= f64::EPSILON {
            return Err(QlabError::InvalidState(
                "cannot normalize a zero vector".to_string(),
            ));
        }
        for a in &mut self.amplitudes {
            *a /= norm;
        }
        Ok(())
    }

    // ========================================================================
    // Measurement Support
    // ========================================================================

    /// Born-rule probabilities `|a_i|²`
    /// Gantree: probabilities(&self) -> Vec<f64> // 확률 분포
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    /// Marginal distribution over `qubits` (outcome bit `i` = `qubits[i]`)
    pub fn marginal_probabilities(&self, qubits: &[QubitId]) -> QlabResult<Vec<f64>> {
        check_qubits(qubits, self.num_qubits)?;
        Ok(crate::marginalize(&self.probabilities(), qubits))
    }

    /// Probability that `qubit` reads 1
    pub fn probability_of_one(&self, qubit: QubitId) -> QlabResult<f64> {
        check_qubits(&[qubit], self.num_qubits)?;
        let mask = 1usize << qubit;
        Ok(self
            .amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum())
    }

    /// Project `qubit` onto `outcome` and renormalise
    ///
    /// Returns the probability the outcome had before projection. Projecting
    /// onto an outcome of zero probability is an `InvalidState`.
    /// Gantree: project(&mut, q, outcome) -> Result<f64> // 사영 측정
    pub fn project(&mut self, qubit: QubitId, outcome: bool) -> QlabResult<f64> {
        let p_one = self.probability_of_one(qubit)?;
        let p = if outcome { p_one } else { 1.0 - p_one };
        if p <= 0.0 {
            return Err(QlabError::InvalidState(format!(
                "projection of qubit {} onto {} has zero probability",
                qubit,
                u8::from(outcome)
            )));
        }
        let mask = 1usize << qubit;
        let scale = 1.0 / p.sqrt();
        for (i, a) in self.amplitudes.iter_mut().enumerate() {
            if (i & mask != 0) == outcome {
                *a *= scale;
            } else {
                *a = Complex64::new(0.0, 0.0);
            }
        }
        Ok(p)
    }

    /// Measure `qubit` with a uniform draw `u ∈ [0, 1)` and collapse
    ///
    /// Outcome 1 when `u < P(1)`.
    pub fn measure(&mut self, qubit: QubitId, u: f64) -> QlabResult<bool> {
        let outcome = u < self.probability_of_one(qubit)?;
        self.project(qubit, outcome)?;
        Ok(outcome)
    }

    // ========================================================================
    // Comparison
    // ========================================================================

    /// Inner product `⟨self|other⟩`
    pub fn inner(&self, other: &StateVector) -> QlabResult<Complex64> {
        if self.dim() != other.dim() {
            return Err(QlabError::DimensionMismatch {
                left: self.dim(),
                right: other.dim(),
            });
        }
        Ok(self
            .amplitudes
            .iter()
            .zip(&other.amplitudes)
            .map(|(a, b)| a.conj() * b)
            .sum())
    }

    /// Outer product `|ψ⟩⟨ψ|`
    pub fn to_density_matrix(&self) -> QlabResult<DensityMatrix> {
        DensityMatrix::from_pure(self)
    }
}

fn check_size(num_qubits: usize) -> QlabResult<()> {
    if num_qubits > limits::MAX_STATEVECTOR_QUBITS {
        return Err(QlabError::QubitLimitExceeded {
            kind: "statevector",
            qubits: num_qubits,
            max: limits::MAX_STATEVECTOR_QUBITS,
        });
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_new_state() {
        let sv = StateVector::new(3).unwrap();
        assert_eq!(sv.dim(), 8);
        assert_relative_eq!(sv.probabilities()[0], 1.0);
    }

    #[test]
    fn test_qubit_limit() {
        let err = StateVector::new(limits::MAX_STATEVECTOR_QUBITS + 1).unwrap_err();
        assert!(err.is_dimension_error());
    }

    #[test]
    fn test_hadamard() {
        let mut sv = StateVector::new(1).unwrap();
        sv.apply_gate(&Gate::H(0)).unwrap();
        let p = sv.probabilities();
        assert_relative_eq!(p[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(p[1], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_bell_state() {
        let mut sv = StateVector::new(2).unwrap();
        sv.apply_gate(&Gate::H(0)).unwrap();
        sv.apply_gate(&Gate::Cnot(0, 1)).unwrap();
        let p = sv.probabilities();
        assert_relative_eq!(p[0b00], 0.5, epsilon = 1e-12);
        assert_relative_eq!(p[0b11], 0.5, epsilon = 1e-12);
        assert_relative_eq!(p[0b01] + p[0b10], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_little_endian_ordering() {
        let mut sv = StateVector::new(3).unwrap();
        sv.apply_gate(&Gate::X(1)).unwrap();
        assert_relative_eq!(sv.probabilities()[0b010], 1.0);
    }

    #[test]
    fn test_toffoli_and_fredkin() {
        let mut sv = StateVector::basis_state(3, 0b011).unwrap();
        sv.apply_gate(&Gate::Ccx(0, 1, 2)).unwrap();
        assert_relative_eq!(sv.probabilities()[0b111], 1.0);

        // Control 2 set, swap qubits 0 and 1: |101> -> |110>
        let mut sv = StateVector::basis_state(3, 0b101).unwrap();
        sv.apply_gate(&Gate::Cswap(2, 0, 1)).unwrap();
        assert_relative_eq!(sv.probabilities()[0b110], 1.0);
    }

    #[test]
    fn test_rotation_gates() {
        let mut sv = StateVector::new(1).unwrap();
        sv.apply_gate(&Gate::Rx(0, PI)).unwrap();
        assert_relative_eq!(sv.probabilities()[1], 1.0, epsilon = 1e-12);

        let mut sv = StateVector::new(1).unwrap();
        sv.apply_gate(&Gate::Ry(0, PI / 2.0)).unwrap();
        assert_relative_eq!(sv.probabilities()[1], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_unitary_preserves_norm() {
        let gates = [
            Gate::H(0),
            Gate::Rx(1, 0.3),
            Gate::Cnot(0, 2),
            Gate::U(2, 0.4, 1.2, -0.8),
            Gate::Crz(1, 0, 2.2),
            Gate::Ccx(2, 1, 0),
            Gate::Swap(0, 2),
            Gate::Sx(1),
        ];
        let mut sv = StateVector::new(3).unwrap();
        for g in &gates {
            sv.apply_gate(g).unwrap();
        }
        let total: f64 = sv.probabilities().iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_gate_rejected() {
        let mut sv = StateVector::new(2).unwrap();
        assert!(sv.apply_gate(&Gate::H(2)).unwrap_err().is_qubit_index_error());
        assert_eq!(
            sv.apply_gate(&Gate::Cnot(1, 1)),
            Err(QlabError::DuplicateQubit(1))
        );
    }

    #[test]
    fn test_marginals() {
        let mut sv = StateVector::new(3).unwrap();
        sv.apply_gate(&Gate::X(2)).unwrap();
        sv.apply_gate(&Gate::H(0)).unwrap();
        let m = sv.marginal_probabilities(&[2, 1]).unwrap();
        // outcome bit 0 = qubit 2 (always 1), bit 1 = qubit 1 (always 0)
        assert_relative_eq!(m[0b01], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_project_and_measure() {
        let mut sv = StateVector::new(2).unwrap();
        sv.apply_gate(&Gate::H(0)).unwrap();
        sv.apply_gate(&Gate::Cnot(0, 1)).unwrap();
        let p = sv.project(0, true).unwrap();
        assert_relative_eq!(p, 0.5, epsilon = 1e-12);
        assert_relative_eq!(sv.probabilities()[0b11], 1.0, epsilon = 1e-12);
        assert!(sv.project(1, false).is_err());

        let mut sv = StateVector::new(1).unwrap();
        sv.apply_gate(&Gate::H(0)).unwrap();
        assert!(!sv.measure(0, 0.9).unwrap());
        assert_relative_eq!(sv.probabilities()[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_amplitudes_validation() {
        let h = Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0);
        assert!(StateVector::from_amplitudes(vec![h, h]).is_ok());
        assert!(matches!(
            StateVector::from_amplitudes(vec![h, h, h, h]),
            Err(QlabError::Normalization { .. })
        ));
        assert!(StateVector::from_amplitudes(vec![h; 3]).is_err());
    }

    #[test]
    fn test_inner_product() {
        let zero = StateVector::new(1).unwrap();
        let one = StateVector::basis_state(1, 1).unwrap();
        assert_relative_eq!(zero.inner(&one).unwrap().norm(), 0.0);
        assert_relative_eq!(zero.inner(&zero).unwrap().re, 1.0);
        assert!(zero.inner(&StateVector::new(2).unwrap()).is_err());
    }
}
