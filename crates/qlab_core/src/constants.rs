//! Constants for QLAB
//!
//! Gantree: L0_Foundation → Constants
//!
//! Numerical tolerances and dense-representation limits shared by the
//! state, noise, and backend crates.

// ============================================================================
// Numerical Tolerances
// Gantree: tolerance // 허용 오차
// ============================================================================

pub mod tolerance {
    //! Floating-point tolerances

    /// Allowed drift of total probability before sampling
    /// Gantree: NORMALIZATION: f64 = 1e-6
    pub const NORMALIZATION: f64 = 1e-6;

    /// Tolerance for Kraus completeness `Σ K†K = I`
    pub const KRAUS_COMPLETENESS: f64 = 1e-9;

    /// Tolerance for Hermiticity, trace, and positivity checks on
    /// density matrices
    pub const DENSITY_MATRIX: f64 = 1e-9;

    /// Tolerance for unitarity checks on gate matrices
    pub const UNITARY: f64 = 1e-10;

    /// Eigenvalues below this are treated as exact zeros in matrix
    /// square roots
    pub const EIGEN_CUTOFF: f64 = 1e-12;

    /// Branch weights below this are dropped during exact evolution
    pub const BRANCH_WEIGHT: f64 = 1e-15;

    /// Readout confusion matrix row sums
    pub const ROW_STOCHASTIC: f64 = 1e-9;
}

// ============================================================================
// Dense Representation Limits
// Gantree: limits // 크기 제한
// ============================================================================

pub mod limits {
    //! Size limits of the dense engine

    /// Maximum qubits for a dense statevector (2^24 amplitudes)
    pub const MAX_STATEVECTOR_QUBITS: usize = 24;

    /// Maximum qubits for a dense density matrix (4^12 entries)
    pub const MAX_DENSITY_MATRIX_QUBITS: usize = 12;

    /// Maximum classical bits (one u64 register)
    pub const MAX_CLBITS: usize = 64;

    /// Maximum qubits a single noise channel or readout error may span
    pub const MAX_CHANNEL_QUBITS: usize = 3;

    /// Minimum shots per execution
    pub const MIN_SHOTS: u64 = 1;

    /// Maximum shots per execution
    pub const MAX_SHOTS: u64 = 100_000_000;
}

// ============================================================================
// Sampling Defaults
// Gantree: sampling // 샘플링 기본값
// ============================================================================

pub mod sampling {
    //! Default sampling parameters

    /// Default shot count used by configuration types
    pub const DEFAULT_SHOTS: u64 = 4096;

    /// Derive an independent seed for item `index` of a batch
    ///
    /// SplitMix64 finaliser over `base + index * golden gamma`.
    #[inline]
    pub const fn derive_seed(base: u64, index: u64) -> u64 {
        let mut z = base.wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerances_ordering() {
        assert!(tolerance::KRAUS_COMPLETENESS < tolerance::NORMALIZATION);
        assert!(tolerance::EIGEN_CUTOFF < tolerance::DENSITY_MATRIX);
    }

    #[test]
    fn test_limits() {
        assert!(limits::MAX_DENSITY_MATRIX_QUBITS <= limits::MAX_STATEVECTOR_QUBITS);
        assert!(limits::MIN_SHOTS >= 1);
    }

    #[test]
    fn test_derive_seed_distinct() {
        let a = sampling::derive_seed(42, 0);
        let b = sampling::derive_seed(42, 1);
        let c = sampling::derive_seed(43, 0);
        assert_ne!(a, b);
        assert_ne!(a, c);
        // Deterministic
        assert_eq!(a, sampling::derive_seed(42, 0));
    }
}
