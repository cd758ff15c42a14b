//! # QLAB State
//!
//! Dense quantum states and the unitary application engine.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qlab_state // L2: State Representation (완료)
//!     Operator // 소형 연산자 (완료)
//!     GateUnitary // 게이트 행렬 (완료)
//!     Kernel // 텐서 축약 커널 (완료)
//!     StateVector // 상태 벡터 (완료)
//!     DensityMatrix // 밀도 행렬 (완료)
//!     Reduction // 부분 대각합/충실도 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qlab_core::Gate;
//! use qlab_state::prelude::*;
//!
//! let mut rho = DensityMatrix::new(2).unwrap();
//! rho.apply_gate(&Gate::H(0)).unwrap();
//! rho.apply_gate(&Gate::Cnot(0, 1)).unwrap();
//!
//! let half = partial_trace(&rho, &[0]).unwrap();
//! assert!((half.purity() - 0.5).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Dense operators (Gantree: L2_State → Operator)
pub mod operator;

/// Gate matrices (Gantree: L2_State → GateUnitary)
pub mod gates;

/// Contraction kernel (Gantree: L2_State → Kernel)
pub mod kernel;

/// Statevector (Gantree: L2_State → StateVector)
pub mod statevector;

/// Density matrix (Gantree: L2_State → DensityMatrix)
pub mod density_matrix;

/// Partial trace and fidelity (Gantree: L2_State → Reduction)
pub mod reduction;

// ============================================================================
// Re-exports
// ============================================================================

pub use density_matrix::DensityMatrix;
pub use gates::{gate_unitary, GateAction};
pub use operator::Operator;
pub use reduction::{
    fidelity, fidelity_pure, partial_trace, purity, state_fidelity, trace_out,
    von_neumann_entropy,
};
pub use statevector::StateVector;

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases

    pub use crate::density_matrix::DensityMatrix;
    pub use crate::gates::{gate_unitary, GateAction};
    pub use crate::operator::Operator;
    pub use crate::reduction::{
        fidelity, fidelity_pure, partial_trace, purity, state_fidelity, trace_out,
        von_neumann_entropy,
    };
    pub use crate::statevector::StateVector;
}

/// Sum a full distribution down to `qubits` (outcome bit `i` = `qubits[i]`)
pub(crate) fn marginalize(probs: &[f64], qubits: &[qlab_core::QubitId]) -> Vec<f64> {
    let mut out = vec![0.0; 1usize << qubits.len()];
    for (index, &p) in probs.iter().enumerate() {
        let outcome = qubits
            .iter()
            .enumerate()
            .fold(0usize, |acc, (b, &q)| acc | (((index >> q) & 1) << b));
        out[outcome] += p;
    }
    out
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Integration Tests
// ============================================================================
