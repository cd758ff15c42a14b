//! Reduction and comparison utilities
//!
//! Gantree: L2_State → Reduction
//!
//! Partial trace, fidelity, purity and entropy over dense states. Matrix
//! square roots go through the Hermitian eigen-decomposition of `nalgebra`.

use crate::density_matrix::DensityMatrix;
use crate::kernel::check_qubits;
use crate::statevector::StateVector;
use nalgebra::DMatrix;
use num_complex::Complex64;
use qlab_core::{tolerance, QlabError, QlabResult, QubitId};

// ============================================================================
// Partial Trace
// ============================================================================

/// Reduced state over `keep` (reduced qubit `i` is `keep[i]`)
///
/// The result is validated Hermitian, unit trace and PSD.
/// Gantree: partial_trace(rho, keep) -> Result<DensityMatrix> // 부분 대각합
pub fn partial_trace(rho: &DensityMatrix, keep: &[QubitId]) -> QlabResult<DensityMatrix> {
    let n = rho.num_qubits();
    check_qubits(keep, n)?;

    let traced: Vec<QubitId> = (0..n).filter(|q| !keep.contains(q)).collect();
    let m = keep.len();
    let dim_out = 1usize << m;

    let spread = |value: usize, qubits: &[QubitId]| -> usize {
        qubits
            .iter()
            .enumerate()
            .filter(|(b, _)| (value >> b) & 1 == 1)
            .fold(0usize, |acc, (_, &q)| acc | (1 << q))
    };

    let keep_index: Vec<usize> = (0..dim_out).map(|v| spread(v, keep)).collect();
    let traced_index: Vec<usize> = (0..1usize << traced.len())
        .map(|v| spread(v, &traced))
        .collect();

    let mut data = vec![Complex64::new(0.0, 0.0); dim_out * dim_out];
    for (r, &kr) in keep_index.iter().enumerate() {
        for (c, &kc) in keep_index.iter().enumerate() {
            data[r * dim_out + c] = traced_index
                .iter()
                .map(|&t| rho.get(kr | t, kc | t))
                .sum();
        }
    }

    let reduced = DensityMatrix::from_raw(m, data);
    reduced.validate()?;
    Ok(reduced)
}

/// Trace out `qubits`, keeping the rest in ascending order
pub fn trace_out(rho: &DensityMatrix, qubits: &[QubitId]) -> QlabResult<DensityMatrix> {
    check_qubits(qubits, rho.num_qubits())?;
    let keep: Vec<QubitId> = (0..rho.num_qubits())
        .filter(|q| !qubits.contains(q))
        .collect();
    partial_trace(rho, &keep)
}

// ============================================================================
// Fidelity
// ============================================================================

/// Uhlmann fidelity `(Tr√(√ρ σ √ρ))²`, clamped to `[0, 1]`
/// Gantree: fidelity(a, b) -> Result<f64> // 충실도
pub fn fidelity(rho: &DensityMatrix, sigma: &DensityMatrix) -> QlabResult<f64> {
    check_dims(rho.dim(), sigma.dim())?;

    let sqrt_rho = hermitian_sqrt(rho.to_matrix());
    let inner = &sqrt_rho * sigma.to_matrix() * &sqrt_rho;
    let trace_sqrt: f64 = clipped_eigenvalues(inner).iter().map(|l| l.sqrt()).sum();

    Ok((trace_sqrt * trace_sqrt).clamp(0.0, 1.0))
}

/// Fidelity of a pure state against a mixed one, `⟨ψ|ρ|ψ⟩`
pub fn fidelity_pure(psi: &StateVector, rho: &DensityMatrix) -> QlabResult<f64> {
    check_dims(psi.dim(), rho.dim())?;
    let amps = psi.amplitudes();
    let value: Complex64 = amps
        .iter()
        .enumerate()
        .flat_map(|(r, a)| {
            amps.iter()
                .enumerate()
                .map(move |(c, b)| a.conj() * rho.get(r, c) * b)
        })
        .sum();
    Ok(value.re.clamp(0.0, 1.0))
}

/// Overlap of two pure states, `|⟨ψ|φ⟩|²`
pub fn state_fidelity(psi: &StateVector, phi: &StateVector) -> QlabResult<f64> {
    Ok(psi.inner(phi)?.norm_sqr().clamp(0.0, 1.0))
}

// ============================================================================
// Mixedness
// ============================================================================

/// Purity `Tr(ρ²)`
pub fn purity(rho: &DensityMatrix) -> f64 {
    rho.purity()
}

/// Von Neumann entropy in bits, `-Σ λ log₂ λ`
pub fn von_neumann_entropy(rho: &DensityMatrix) -> f64 {
    clipped_eigenvalues(rho.to_matrix())
        .iter()
        .filter(|&&l| l > 0.0)
        .map(|&l| -l * l.log2())
        .sum()
}

// ============================================================================
// Helpers
// ============================================================================

fn check_dims(left: usize, right: usize) -> QlabResult<()> {
    if left != right {
        return Err(QlabError::DimensionMismatch { left, right });
    }
    Ok(())
}

/// Eigenvalues of a Hermitian matrix with values below the cutoff set to 0
fn clipped_eigenvalues(m: DMatrix<Complex64>) -> Vec<f64> {
    m.symmetric_eigen()
        .eigenvalues
        .iter()
        .map(|&l| if l < tolerance::EIGEN_CUTOFF { 0.0 } else { l })
        .collect()
}

/// Principal square root of a PSD Hermitian matrix
fn hermitian_sqrt(m: DMatrix<Complex64>) -> DMatrix<Complex64> {
    let eigen = m.symmetric_eigen();
    let roots = eigen.eigenvalues.map(|l| {
        let l = if l < tolerance::EIGEN_CUTOFF { 0.0 } else { l };
        Complex64::new(l.sqrt(), 0.0)
    });
    let v = &eigen.eigenvectors;
    v * DMatrix::from_diagonal(&roots) * v.adjoint()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use qlab_core::Gate;

    fn pure(n: usize, gates: &[Gate]) -> StateVector {
        let mut sv = StateVector::new(n).unwrap();
        for g in gates {
            sv.apply_gate(g).unwrap();
        }
        sv
    }

    fn mixed(n: usize, gates: &[Gate]) -> DensityMatrix {
        pure(n, gates).to_density_matrix().unwrap()
    }

    #[test]
    fn test_partial_trace_bell() {
        let rho = mixed(2, &[Gate::H(0), Gate::Cnot(0, 1)]);
        let reduced = partial_trace(&rho, &[0]).unwrap();
        assert_eq!(reduced.num_qubits(), 1);
        assert_relative_eq!(reduced.get(0, 0).re, 0.5, epsilon = 1e-12);
        assert_relative_eq!(reduced.get(1, 1).re, 0.5, epsilon = 1e-12);
        assert_relative_eq!(reduced.get(0, 1).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_partial_trace_product_state() {
        // |1> on qubit 2, |+> on qubit 0
        let rho = mixed(3, &[Gate::H(0), Gate::X(2)]);
        let reduced = partial_trace(&rho, &[2]).unwrap();
        assert_relative_eq!(reduced.get(1, 1).re, 1.0, epsilon = 1e-12);

        let plus = partial_trace(&rho, &[0]).unwrap();
        assert_relative_eq!(plus.get(0, 1).re, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_partial_trace_keep_order() {
        // qubit 0 = |1>, qubit 1 = |0>; keep [1, 0] puts qubit 1 at bit 0
        let rho = mixed(2, &[Gate::X(0)]);
        let reduced = partial_trace(&rho, &[1, 0]).unwrap();
        assert_relative_eq!(reduced.get(0b10, 0b10).re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_partial_trace_associative() {
        let rho = mixed(
            4,
            &[
                Gate::H(0),
                Gate::Cnot(0, 1),
                Gate::Ry(2, 0.9),
                Gate::Crx(2, 3, 1.7),
                Gate::Cnot(1, 2),
            ],
        );
        // Trace out {3} then {1} (index 1 of the remaining [0,1,2])
        let step = trace_out(&rho, &[3]).unwrap();
        let two_step = trace_out(&step, &[1]).unwrap();
        let one_step = trace_out(&rho, &[1, 3]).unwrap();
        for (a, b) in two_step.data().iter().zip(one_step.data()) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_partial_trace_errors() {
        let rho = mixed(2, &[]);
        assert!(partial_trace(&rho, &[2]).unwrap_err().is_qubit_index_error());
        assert_eq!(
            partial_trace(&rho, &[0, 0]),
            Err(QlabError::DuplicateQubit(0))
        );
    }

    #[test]
    fn test_fidelity_identities() {
        let rho = mixed(2, &[Gate::H(0), Gate::Cnot(0, 1)]);
        assert_relative_eq!(fidelity(&rho, &rho).unwrap(), 1.0, epsilon = 1e-9);

        let zero = mixed(1, &[]);
        let one = mixed(1, &[Gate::X(0)]);
        assert_relative_eq!(fidelity(&zero, &one).unwrap(), 0.0, epsilon = 1e-9);

        let mm = DensityMatrix::maximally_mixed(1).unwrap();
        assert_relative_eq!(fidelity(&zero, &mm).unwrap(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_fidelity_pure_fast_path_agrees() {
        let psi = pure(2, &[Gate::Ry(0, 0.8), Gate::Cnot(0, 1), Gate::Rz(1, 0.3)]);
        let mut sigma = mixed(2, &[Gate::H(0)]);
        sigma.scale(0.7);
        sigma
            .add_assign(&{
                let mut mm = DensityMatrix::maximally_mixed(2).unwrap();
                mm.scale(0.3);
                mm
            })
            .unwrap();

        let fast = fidelity_pure(&psi, &sigma).unwrap();
        let general = fidelity(&psi.to_density_matrix().unwrap(), &sigma).unwrap();
        assert!((fast - general).abs() < 1e-9, "{} vs {}", fast, general);
    }

    #[test]
    fn test_state_fidelity() {
        let a = pure(1, &[Gate::H(0)]);
        let b = pure(1, &[]);
        assert_relative_eq!(state_fidelity(&a, &b).unwrap(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(state_fidelity(&a, &a).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fidelity_dimension_mismatch() {
        let a = mixed(1, &[]);
        let b = mixed(2, &[]);
        assert_eq!(
            fidelity(&a, &b),
            Err(QlabError::DimensionMismatch { left: 2, right: 4 })
        );
    }

    #[test]
    fn test_entropy_and_purity() {
        let pure_state = mixed(2, &[Gate::H(0), Gate::Cnot(0, 1)]);
        assert_relative_eq!(von_neumann_entropy(&pure_state), 0.0, epsilon = 1e-9);
        assert_relative_eq!(purity(&pure_state), 1.0, epsilon = 1e-12);

        let half = partial_trace(&pure_state, &[0]).unwrap();
        assert_relative_eq!(von_neumann_entropy(&half), 1.0, epsilon = 1e-9);
        assert_relative_eq!(purity(&half), 0.5, epsilon = 1e-12);
    }
}
