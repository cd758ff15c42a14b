//! Dense density matrix
//!
//! Gantree: L2_State → DensityMatrix
//!
//! Row-major `2^n × 2^n` matrix. Index `r * dim + c` has row bits at
//! positions `n..2n` and column bits at `0..n`, so the contraction kernel
//! evolves `ρ ← UρU†` by applying `U` on the row axes and `conj(U)` on the
//! column axes.

use crate::gates::gate_unitary;
use crate::kernel::{self, check_qubits};
use crate::operator::Operator;
use crate::statevector::StateVector;
use nalgebra::DMatrix;
use num_complex::Complex64;
use qlab_core::{limits, tolerance, Gate, QlabError, QlabResult, QubitId};
use serde::{Deserialize, Serialize};

/// Mixed quantum state
/// Gantree: DensityMatrix // 밀도 행렬
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityMatrix {
    num_qubits: usize,
    data: Vec<Complex64>,
}

impl DensityMatrix {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create |0...0⟩⟨0...0|
    /// Gantree: new(n) -> Result<Self> // 초기 상태
    pub fn new(num_qubits: usize) -> QlabResult<Self> {
        let mut rho = Self::zeros(num_qubits)?;
        rho.data[0] = Complex64::new(1.0, 0.0);
        Ok(rho)
    }

    /// All-zero matrix, used as an accumulator for ensembles
    pub fn zeros(num_qubits: usize) -> QlabResult<Self> {
        check_size(num_qubits)?;
        let dim = 1usize << num_qubits;
        Ok(Self {
            num_qubits,
            data: vec![Complex64::new(0.0, 0.0); dim * dim],
        })
    }

    /// Maximally mixed state I / 2^n
    pub fn maximally_mixed(num_qubits: usize) -> QlabResult<Self> {
        let mut rho = Self::zeros(num_qubits)?;
        let dim = rho.dim();
        let w = Complex64::new(1.0 / dim as f64, 0.0);
        for i in 0..dim {
            rho.data[i * dim + i] = w;
        }
        Ok(rho)
    }

    /// Outer product `|ψ⟩⟨ψ|`
    pub fn from_pure(state: &StateVector) -> QlabResult<Self> {
        check_size(state.num_qubits())?;
        let amps = state.amplitudes();
        let data = amps
            .iter()
            .flat_map(|a| amps.iter().map(move |b| a * b.conj()))
            .collect();
        Ok(Self {
            num_qubits: state.num_qubits(),
            data,
        })
    }

    /// Create from row-major entries and validate physicality
    pub fn from_matrix(num_qubits: usize, data: Vec<Complex64>) -> QlabResult<Self> {
        check_size(num_qubits)?;
        let dim = 1usize << num_qubits;
        if data.len() != dim * dim {
            return Err(QlabError::dimension(dim * dim, data.len(), "density matrix entries"));
        }
        let rho = Self { num_qubits, data };
        rho.validate()?;
        Ok(rho)
    }

    pub(crate) fn from_raw(num_qubits: usize, data: Vec<Complex64>) -> Self {
        Self { num_qubits, data }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of qubits
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Matrix dimension `2^n`
    #[inline]
    pub fn dim(&self) -> usize {
        1 << self.num_qubits
    }

    /// Entry at (row, col)
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.dim() + col]
    }

    /// Row-major entries
    pub fn data(&self) -> &[Complex64] {
        &self.data
    }

    /// Trace (real part)
    pub fn trace(&self) -> f64 {
        let dim = self.dim();
        (0..dim).map(|i| self.data[i * dim + i].re).sum()
    }

    /// Copy into an `nalgebra` matrix
    pub fn to_matrix(&self) -> DMatrix<Complex64> {
        let dim = self.dim();
        DMatrix::from_row_slice(dim, dim, &self.data)
    }

    // ========================================================================
    // Evolution
    // ========================================================================

    /// Apply a gate: `ρ ← UρU†`
    /// Gantree: apply_gate(&mut, gate) -> Result // 게이트 적용
    pub fn apply_gate(&mut self, gate: &Gate) -> QlabResult<()> {
        gate.validate(self.num_qubits)?;
        let action = gate_unitary(gate);
        self.conjugate_by(&action.op, &action.targets, &action.controls);
        Ok(())
    }

    /// Apply `ρ ← KρK†` for an arbitrary operator `K` on `targets`
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
        self.conjugate_by(op, targets, controls);
        Ok(())
    }

    fn conjugate_by(&mut self, op: &Operator, targets: &[QubitId], controls: &[QubitId]) {
        let n = self.num_qubits;
        let row_targets: Vec<usize> = targets.iter().map(|q| q + n).collect();
        let row_controls: Vec<usize> = controls.iter().map(|q| q + n).collect();
        kernel::apply_operator(&mut self.data, 2 * n, op, &row_targets, &row_controls);
        kernel::apply_operator(&mut self.data, 2 * n, &op.conj(), targets, controls);
    }

    /// Entry-wise `self += other`
    pub fn add_assign(&mut self, other: &DensityMatrix) -> QlabResult<()> {
        if self.num_qubits != other.num_qubits {
            return Err(QlabError::DimensionMismatch {
                left: self.dim(),
                right: other.dim(),
            });
        }
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += *b;
        }
        Ok(())
    }

    /// Multiply every entry by `factor`
    pub fn scale(&mut self, factor: f64) {
        for a in &mut self.data {
            *a *= factor;
        }
    }

    /// Zero every entry inconsistent with `qubit = outcome` (no
    /// renormalisation); returns the remaining trace
    /// Gantree: project(&mut, q, outcome) -> f64 // 비정규 사영
    pub fn project(&mut self, qubit: QubitId, outcome: bool) -> QlabResult<f64> {
        check_qubits(&[qubit], self.num_qubits)?;
        let dim = self.dim();
        let mask = 1usize << qubit;
        for r in 0..dim {
            for c in 0..dim {
                let keep = ((r & mask != 0) == outcome) && ((c & mask != 0) == outcome);
                if !keep {
                    self.data[r * dim + c] = Complex64::new(0.0, 0.0);
                }
            }
        }
        Ok(self.trace())
    }

    // ========================================================================
    // Measurement Support
    // ========================================================================

    /// Born-rule probabilities (diagonal)
    /// Gantree: probabilities(&self) -> Vec<f64> // 확률 분포
    pub fn probabilities(&self) -> Vec<f64> {
        let dim = self.dim();
        (0..dim).map(|i| self.data[i * dim + i].re.max(0.0)).collect()
    }

    /// Marginal distribution over `qubits` (outcome bit `i` = `qubits[i]`)
    pub fn marginal_probabilities(&self, qubits: &[QubitId]) -> QlabResult<Vec<f64>> {
        check_qubits(qubits, self.num_qubits)?;
        Ok(crate::marginalize(&self.probabilities(), qubits))
    }

    /// Expectation value `Tr(ρ · P)` of a Pauli label on `qubits`
    /// (`qubits[0]` carries the rightmost character)
    pub fn expectation_pauli(&self, label: &str, qubits: &[QubitId]) -> QlabResult<f64> {
        let op = Operator::pauli(label)?;
        if op.num_qubits() != qubits.len() {
            return Err(QlabError::dimension(qubits.len(), op.num_qubits(), "Pauli label"));
        }
        check_qubits(qubits, self.num_qubits)?;
        // Tr(Pρ) only needs P on the row axes
        let mut rotated = self.data.clone();
        let n = self.num_qubits;
        let row_targets: Vec<usize> = qubits.iter().map(|q| q + n).collect();
        kernel::apply_operator(&mut rotated, 2 * n, &op, &row_targets, &[]);
        let dim = self.dim();
        Ok((0..dim).map(|i| rotated[i * dim + i].re).sum())
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Eigenvalues in ascending order
    pub fn eigenvalues(&self) -> Vec<f64> {
        let eigen = self.to_matrix().symmetric_eigen();
        let mut values: Vec<f64> = eigen.eigenvalues.iter().copied().collect();
        values.sort_by(f64::total_cmp);
        values
    }

    /// Purity `Tr(ρ²)`
    pub fn purity(&self) -> f64 {
        // Tr(ρ²) = Σ |ρ_ij|² for Hermitian ρ
        self.data.iter().map(|z| z.norm_sqr()).sum()
    }

    /// Check Hermitian, unit trace, and positive semidefinite within
    /// the density-matrix tolerance
    /// Gantree: validate(&self) -> Result // 물리성 검증
    pub fn validate(&self) -> QlabResult<()> {
        let dim = self.dim();
        let tol = tolerance::DENSITY_MATRIX;

        for r in 0..dim {
            for c in r..dim {
                let dev = (self.get(r, c) - self.get(c, r).conj()).norm();
                if dev > tol {
                    return Err(QlabError::InvalidState(format!(
                        "not Hermitian: |ρ[{},{}] - conj(ρ[{},{}])| = {:e}",
                        r, c, c, r, dev
                    )));
                }
            }
        }

        let total = self.trace();
        if (total - 1.0).abs() > tol {
            return Err(QlabError::Normalization {
                total,
                tolerance: tol,
            });
        }

        if let Some(&min) = self.eigenvalues().first() {
            if min < -tol {
                return Err(QlabError::InvalidState(format!(
                    "not positive semidefinite: minimum eigenvalue {:e}",
                    min
                )));
            }
        }
        Ok(())
    }
}

fn check_size(num_qubits: usize) -> QlabResult<()> {
    if num_qubits > limits::MAX_DENSITY_MATRIX_QUBITS {
        return Err(QlabError::QubitLimitExceeded {
            kind: "density matrix",
            qubits: num_qubits,
            max: limits::MAX_DENSITY_MATRIX_QUBITS,
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

    fn evolve_both(n: usize, gates: &[Gate]) -> (StateVector, DensityMatrix) {
        let mut sv = StateVector::new(n).unwrap();
        let mut rho = DensityMatrix::new(n).unwrap();
        for g in gates {
            sv.apply_gate(g).unwrap();
            rho.apply_gate(g).unwrap();
        }
        (sv, rho)
    }

    #[test]
    fn test_new_is_valid() {
        let rho = DensityMatrix::new(2).unwrap();
        assert!(rho.validate().is_ok());
        assert_relative_eq!(rho.purity(), 1.0);
    }

    #[test]
    fn test_size_limit() {
        let err = DensityMatrix::new(limits::MAX_DENSITY_MATRIX_QUBITS + 1).unwrap_err();
        assert!(matches!(err, QlabError::QubitLimitExceeded { .. }));
    }

    #[test]
    fn test_matches_statevector() {
        let gates = [
            Gate::H(0),
            Gate::Cnot(0, 1),
            Gate::Ry(2, 0.7),
            Gate::Crx(2, 0, 1.3),
            Gate::T(1),
            Gate::Cswap(0, 1, 2),
            Gate::Cy(1, 2),
        ];
        let (sv, rho) = evolve_both(3, &gates);
        let expected = DensityMatrix::from_pure(&sv).unwrap();
        for (a, b) in rho.data().iter().zip(expected.data()) {
            assert!((a - b).norm() < 1e-12);
        }
        assert!(rho.validate().is_ok());
    }

    #[test]
    fn test_probabilities_sum() {
        let (_, rho) = evolve_both(2, &[Gate::H(0), Gate::Rx(1, 0.4), Gate::Cz(0, 1)]);
        let total: f64 = rho.probabilities().iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_maximally_mixed() {
        let rho = DensityMatrix::maximally_mixed(2).unwrap();
        assert!(rho.validate().is_ok());
        assert_relative_eq!(rho.purity(), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_validate_rejects() {
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        // Trace 2
        let err = DensityMatrix::from_matrix(1, vec![one, zero, zero, one]).unwrap_err();
        assert!(matches!(err, QlabError::Normalization { .. }));
        // Not Hermitian
        let err = DensityMatrix::from_matrix(
            1,
            vec![one * 0.5, one * 0.3, zero, one * 0.5],
        )
        .unwrap_err();
        assert!(matches!(err, QlabError::InvalidState(_)));
        // Negative eigenvalue: diag(1.5, -0.5)
        let err =
            DensityMatrix::from_matrix(1, vec![one * 1.5, zero, zero, -one * 0.5]).unwrap_err();
        assert!(matches!(err, QlabError::InvalidState(_)));
    }

    #[test]
    fn test_project_unnormalized() {
        let (_, mut rho) = evolve_both(1, &[Gate::H(0)]);
        let weight = rho.project(0, true).unwrap();
        assert_relative_eq!(weight, 0.5, epsilon = 1e-12);
        assert_relative_eq!(rho.get(0, 1).norm(), 0.0);
    }

    #[test]
    fn test_expectation_pauli() {
        let (_, rho) = evolve_both(2, &[Gate::H(0), Gate::Cnot(0, 1)]);
        assert_relative_eq!(rho.expectation_pauli("XX", &[0, 1]).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(rho.expectation_pauli("ZZ", &[0, 1]).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(rho.expectation_pauli("Z", &[0]).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_add_and_scale() {
        let mut acc = DensityMatrix::zeros(1).unwrap();
        acc.add_assign(&DensityMatrix::new(1).unwrap()).unwrap();
        let mut one = DensityMatrix::new(1).unwrap();
        one.apply_gate(&Gate::X(0)).unwrap();
        acc.add_assign(&one).unwrap();
        acc.scale(0.5);
        assert!(acc.validate().is_ok());
        assert!(acc.add_assign(&DensityMatrix::new(2).unwrap()).is_err());
    }
}
